//! Structured records recovered from the importer's text log.
//!
//! Importers only hand out lines such as `"Warn, T3: Found no UVs"`. The parser turns
//! those into [`LogRecord`]s and the [`LogStore`] keeps them in arrival order.

use std::{
    fmt,
    sync::{Arc, Mutex, PoisonError},
};

use instant::Instant;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LogCategory {
    Error,
    Warn,
    Info,
    Debug,
}

impl LogCategory {
    /// Line prefixes in the order they are matched.
    const PREFIXES: [(&'static str, LogCategory); 4] = [
        ("Error, ", LogCategory::Error),
        ("Warn, ", LogCategory::Warn),
        ("Debug, ", LogCategory::Debug),
        ("Info, ", LogCategory::Info),
    ];

    fn from_line(line: &str) -> Option<Self> {
        Self::PREFIXES
            .iter()
            .find(|(prefix, _)| line.starts_with(prefix))
            .map(|&(_, category)| category)
    }

    pub fn level(&self) -> log::Level {
        match self {
            LogCategory::Error => log::Level::Error,
            LogCategory::Warn => log::Level::Warn,
            LogCategory::Info => log::Level::Info,
            LogCategory::Debug => log::Level::Debug,
        }
    }
}

impl fmt::Display for LogCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LogCategory::Error => "Error",
            LogCategory::Warn => "Warn",
            LogCategory::Info => "Info",
            LogCategory::Debug => "Debug",
        };
        f.write_str(name)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LogRecord {
    pub category: LogCategory,
    pub message: String,
    /// Milliseconds since the parser saw its first line.
    pub elapsed_ms: u64,
    pub thread_id: u64,
}

/// Parses `"<Severity>, T<thread>: <message>"` lines.
///
/// The clock belongs to the parser instance and starts with the first line it is
/// given, whether or not that line turns out to be well-formed.
#[derive(Debug, Default)]
pub struct LogRecordParser {
    started: Option<Instant>,
}

impl LogRecordParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `None` for lines that don't follow the format. Those are dropped
    /// without a trace; reporting them through the log would feed back into it.
    pub fn parse(&mut self, line: &str) -> Option<LogRecord> {
        let started = *self.started.get_or_insert_with(Instant::now);

        let colon = line.find(':')?;
        let category = LogCategory::from_line(line)?;
        let thread_marker = line.find('T').filter(|&t| t < colon)?;
        let thread_id = line[thread_marker + 1..colon].trim().parse().unwrap_or(0);
        let message = line[colon + 1..].trim().to_string();

        Some(LogRecord {
            category,
            message,
            elapsed_ms: started.elapsed().as_millis() as u64,
            thread_id,
        })
    }
}

/// Append-only, shareable record store.
#[derive(Clone, Debug, Default)]
pub struct LogStore {
    records: Arc<Mutex<Vec<LogRecord>>>,
}

impl LogStore {
    pub fn push(&self, record: LogRecord) {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(record);
    }

    /// Snapshot of all records in arrival order.
    pub fn records(&self) -> Vec<LogRecord> {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn by_category(&self, category: LogCategory) -> Vec<LogRecord> {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|record| record.category == category)
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Binds one parser to one store. Importers call [`LogCollector::accept`] for every
/// raw line, possibly from threads of their own.
#[derive(Debug)]
pub struct LogCollector {
    parser: Mutex<LogRecordParser>,
    store: LogStore,
}

impl LogCollector {
    pub fn new(store: LogStore) -> Self {
        Self {
            parser: Mutex::new(LogRecordParser::new()),
            store,
        }
    }

    pub fn accept(&self, line: &str) {
        let record = self
            .parser
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .parse(line);
        if let Some(record) = record {
            log::log!(
                target: "import",
                record.category.level(),
                "[T{}] {}",
                record.thread_id,
                record.message
            );
            self.store.push(record);
        }
    }

    pub fn store(&self) -> &LogStore {
        &self.store
    }
}

/// Numeric id of the calling thread, for tagging emitted log lines.
pub fn current_thread_number() -> u64 {
    format!("{:?}", std::thread::current().id())
        .chars()
        .filter(char::is_ascii_digit)
        .collect::<String>()
        .parse()
        .unwrap_or(0)
}
