// src/task.rs

//! The unit of work the scheduler drives.
//!
//! A [`Task`] is polled through [`Task::step`] until it reports
//! [`StepResult::Complete`]. Tasks are shared between the graph that owns
//! them and the worker currently stepping them, so they are handed around as
//! [`SharedTask`] (`Arc<dyn Task>`) and keep any mutable state behind their
//! own interior mutability.

use std::fmt;
use std::sync::Arc;

/// Outcome of a single [`Task::step`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepResult {
    /// The task needs another turn.
    Continue,
    /// The task is done; its dependents may now be released.
    Complete,
}

/// A steppable unit of work.
///
/// The scheduler never steps the same task from two threads at once, but it
/// may step it from different threads over its lifetime, hence `Send + Sync`.
pub trait Task: Send + Sync {
    fn step(&self) -> StepResult;
}

impl<F> Task for F
where
    F: Fn() -> StepResult + Send + Sync,
{
    fn step(&self) -> StepResult {
        self()
    }
}

/// Shared handle to a task, as stored in graphs and work items.
pub type SharedTask = Arc<dyn Task>;

/// Stable handle for a task within one [`GraphDefinition`](crate::dag::GraphDefinition).
///
/// IDs are handed out densely from 0 in insertion order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TaskId(pub usize);

impl TaskId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<usize> for TaskId {
    fn from(value: usize) -> Self {
        TaskId(value)
    }
}
