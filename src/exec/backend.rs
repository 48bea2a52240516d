// src/exec/backend.rs

//! Pluggable seams between contexts, workers and the scheduler.
//!
//! An [`ExecutionContext`](super::ExecutionContext) hands runnable work to a
//! [`TaskDispatcher`] instead of talking to worker threads directly, and a
//! [`WorkerThread`](super::WorkerThread) reports finished work to a
//! [`CompletionSink`] instead of holding a reference to the scheduler.
//!
//! - The scheduler's worker pool is the production `TaskDispatcher`.
//! - The scheduler's context registry is the production `CompletionSink`.
//! - Tests can provide their own implementations, e.g. a sink that records
//!   completion batches or a dispatcher that steps tasks inline.

use super::{CompletionMessage, PackagedTask};

/// Something that accepts runnable work.
pub trait TaskDispatcher: Send + Sync {
    /// Hand `task` to an executor. Posting never fails.
    fn dispatch(&self, task: PackagedTask);
}

/// Something that accepts batches of completion messages from workers.
pub trait CompletionSink: Send + Sync {
    /// Deliver one batch. Called from worker threads.
    fn deliver_completions(&self, batch: Vec<CompletionMessage>);
}
