//! Scene data structures: the imported graph and what is derived from it at load time.
//!
//! - `graph` holds the index-based node/mesh/material arena produced by importers
//! - `bounds` computes the world-space bounding box of a graph
//! - `stats` aggregates vertex and primitive counts

pub mod bounds;
pub mod graph;
pub mod stats;
