// src/exec/context.rs

//! Bookkeeping for one "run this graph to completion" call.

use std::collections::VecDeque;
use std::mem;

use parking_lot::{Condvar, Mutex};
use tracing::{debug, info};

use crate::dag::GraphInstance;

use super::backend::TaskDispatcher;
use super::{CompletionMessage, ContextId, ExecutionResult, PackagedTask};

/// Per-call execution state.
///
/// A context lives exactly as long as one call to
/// [`TaskScheduler::execute`](super::TaskScheduler::execute). Worker threads
/// only ever touch it through [`ExecutionContext::post_completion`]; the
/// inbox is consumed solely by the thread blocked in
/// [`ExecutionContext::run_to_completion`].
#[derive(Debug)]
pub struct ExecutionContext {
    id: ContextId,
    inbox: Mutex<VecDeque<CompletionMessage>>,
    completions_ready: Condvar,
}

impl ExecutionContext {
    pub fn new(id: ContextId) -> Self {
        Self {
            id,
            inbox: Mutex::new(VecDeque::new()),
            completions_ready: Condvar::new(),
        }
    }

    pub fn id(&self) -> ContextId {
        self.id
    }

    /// Drive `graph` until nothing is left in flight.
    ///
    /// Returns [`ExecutionResult::UnableToProgress`] if the run drained but
    /// the graph still has tasks that never completed.
    pub fn run_to_completion(
        &self,
        graph: &mut GraphInstance,
        dispatcher: &dyn TaskDispatcher,
    ) -> ExecutionResult {
        let mut runnable: Vec<PackagedTask> = Vec::new();

        graph.get_initial_tasks_to_execute(|task_id, task| {
            runnable.push(PackagedTask::new(task_id, task.clone(), self.id));
        });
        let mut pending = runnable.len();

        debug!(context = %self.id, roots = pending, "starting graph run");

        while pending != 0 {
            for work in runnable.drain(..) {
                dispatcher.dispatch(work);
            }

            let batch = self.wait_for_completions();
            pending = pending.saturating_sub(batch.len());

            graph.get_tasks_to_execute(batch.iter().map(|msg| msg.task_id), |task_id, task| {
                runnable.push(PackagedTask::new(task_id, task.clone(), self.id));
            });
            pending += runnable.len();

            debug!(
                context = %self.id,
                completed = batch.len(),
                released = runnable.len(),
                pending,
                "processed completion batch"
            );
        }

        let result = if graph.has_unexecuted_tasks() {
            ExecutionResult::UnableToProgress
        } else {
            ExecutionResult::Complete
        };

        info!(
            context = %self.id,
            completed = graph.completed(),
            total = graph.len(),
            ?result,
            "graph run finished"
        );

        result
    }

    /// Queue a completion message and wake the waiting run. Callable from
    /// any thread.
    pub fn post_completion(&self, msg: CompletionMessage) {
        let mut inbox = self.inbox.lock();
        inbox.push_back(msg);
        self.completions_ready.notify_one();
    }

    /// Block until at least one completion is available, then take all of
    /// them.
    fn wait_for_completions(&self) -> VecDeque<CompletionMessage> {
        let mut inbox = self.inbox.lock();
        while inbox.is_empty() {
            self.completions_ready.wait(&mut inbox);
        }
        mem::take(&mut *inbox)
    }
}
