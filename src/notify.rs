//! Cross-thread "textures changed" signal between texture loading and rendering.
//!
//! Background completions call [`ChangeNotifier::notify`] at arbitrary times. The
//! render thread brackets every frame with [`begin_frame`](ChangeNotifier::begin_frame)
//! and [`end_frame`](ChangeNotifier::end_frame). Once a notification arrives,
//! `committed` stays set until a whole frame has passed without any further
//! notification, so a texture finishing mid-frame is seen by the next frame at the
//! latest and is never dropped.
//!
//! The mutex only ever guards the two booleans. It is never held while rendering,
//! decoding or doing I/O.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::resources::texture::ChangeCallback;

#[derive(Debug, Default)]
struct Flags {
    /// A notification arrived since the current frame began.
    pending: bool,
    /// Visible to the render thread as "textures changed".
    committed: bool,
}

#[derive(Clone, Debug, Default)]
pub struct ChangeNotifier {
    flags: Arc<Mutex<Flags>>,
}

impl ChangeNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    fn flags(&self) -> MutexGuard<'_, Flags> {
        self.flags.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Callable from any thread.
    pub fn notify(&self) {
        let mut flags = self.flags();
        flags.pending = true;
        flags.committed = true;
    }

    /// Clears the per-frame marker and returns whether the frame about to be drawn
    /// must treat textures as changed.
    pub fn begin_frame(&self) -> bool {
        let mut flags = self.flags();
        flags.pending = false;
        flags.committed
    }

    /// Drops `committed` if nothing was notified since [`begin_frame`](Self::begin_frame).
    /// Returns the flag as it stands for the next frame.
    pub fn end_frame(&self) -> bool {
        let mut flags = self.flags();
        if !flags.pending {
            flags.committed = false;
        }
        flags.committed
    }

    pub fn is_committed(&self) -> bool {
        self.flags().committed
    }

    /// A texture-set change callback that forwards into this notifier.
    pub fn callback(&self) -> ChangeCallback {
        let notifier = self.clone();
        Arc::new(move |path: &str| {
            log::trace!("texture '{}' changed", path);
            notifier.notify();
        })
    }
}
