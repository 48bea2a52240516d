// src/exec/mod.rs

//! Multi-threaded execution layer.
//!
//! Tasks emitted by a [`GraphInstance`](crate::dag::GraphInstance) are
//! stepped on a fixed pool of OS threads, and their completions are routed
//! back to the run that owns them.
//!
//! - [`worker`] owns one dedicated thread with a private queue and load counter.
//! - [`context`] is the bookkeeping for a single "run graph to completion" call.
//! - [`scheduler`] owns the worker pool and the registry of live contexts.
//! - [`backend`] holds the `TaskDispatcher` / `CompletionSink` seams between
//!   the three.

use std::fmt;

use crate::task::{SharedTask, TaskId};

pub mod backend;
pub mod context;
pub mod scheduler;
pub mod worker;

pub use backend::{CompletionSink, TaskDispatcher};
pub use context::ExecutionContext;
pub use scheduler::{SchedulerConfig, TaskScheduler};
pub use worker::WorkerThread;

/// Scheduler-assigned identifier of an [`ExecutionContext`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ContextId(pub u64);

impl fmt::Display for ContextId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Final outcome of running a graph instance to completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionResult {
    /// Every task in the graph reported completion.
    Complete,
    /// Nothing is in flight any more, but some tasks never completed
    /// (e.g. they sit on a dependency cycle).
    UnableToProgress,
}

/// A unit of work placed on a worker's queue.
#[derive(Clone)]
pub struct PackagedTask {
    pub task_id: TaskId,
    pub task: SharedTask,
    pub context_id: ContextId,
}

impl PackagedTask {
    pub fn new(task_id: TaskId, task: SharedTask, context_id: ContextId) -> Self {
        Self {
            task_id,
            task,
            context_id,
        }
    }
}

impl fmt::Debug for PackagedTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PackagedTask")
            .field("task_id", &self.task_id)
            .field("context_id", &self.context_id)
            .finish_non_exhaustive()
    }
}

/// Signals that `task_id` of context `context_id` has completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompletionMessage {
    pub context_id: ContextId,
    pub task_id: TaskId,
}

impl CompletionMessage {
    pub fn new(context_id: ContextId, task_id: TaskId) -> Self {
        Self {
            context_id,
            task_id,
        }
    }
}
