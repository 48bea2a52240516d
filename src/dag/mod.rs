// src/dag/mod.rs

//! DAG representation and dependency counting.
//!
//! - [`graph`] holds the mutable [`GraphDefinition`] builder.
//! - [`instance`] contains the per-run [`GraphInstance`] that decides which
//!   tasks become runnable as their predecessors complete.

pub mod graph;
pub mod instance;

pub use graph::GraphDefinition;
pub use instance::GraphInstance;
