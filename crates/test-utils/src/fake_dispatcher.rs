use std::sync::Arc;

use dagpool::exec::{CompletionMessage, ExecutionContext, PackagedTask, TaskDispatcher};
use dagpool::{StepResult, TaskId};
use parking_lot::Mutex;

/// A dispatcher that steps every task to completion on the calling thread
/// and posts the completion straight back to one context.
///
/// Makes `ExecutionContext::run_to_completion` fully deterministic: no
/// worker threads, and dispatch order is recorded.
#[derive(Debug)]
pub struct InlineDispatcher {
    context: Arc<ExecutionContext>,
    dispatched: Mutex<Vec<TaskId>>,
    steps: Mutex<usize>,
}

impl InlineDispatcher {
    pub fn new(context: Arc<ExecutionContext>) -> Self {
        Self {
            context,
            dispatched: Mutex::new(Vec::new()),
            steps: Mutex::new(0),
        }
    }

    /// Task IDs in the order they were dispatched.
    pub fn dispatched(&self) -> Vec<TaskId> {
        self.dispatched.lock().clone()
    }

    /// Total `step()` calls made, across all tasks.
    pub fn steps(&self) -> usize {
        *self.steps.lock()
    }

    pub fn clear(&self) {
        self.dispatched.lock().clear();
        *self.steps.lock() = 0;
    }
}

impl TaskDispatcher for InlineDispatcher {
    fn dispatch(&self, task: PackagedTask) {
        self.dispatched.lock().push(task.task_id);

        loop {
            *self.steps.lock() += 1;
            if task.task.step() == StepResult::Complete {
                break;
            }
        }

        self.context
            .post_completion(CompletionMessage::new(task.context_id, task.task_id));
    }
}
