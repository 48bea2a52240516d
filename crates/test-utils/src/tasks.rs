use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::thread;

use dagpool::{StepResult, Task};
use parking_lot::Mutex;

/// Shared, ordered log of task labels in completion order.
pub type CompletionLog = Arc<Mutex<Vec<String>>>;

pub fn completion_log() -> CompletionLog {
    Arc::new(Mutex::new(Vec::new()))
}

/// A task that returns `Continue` a fixed number of times, then `Complete`.
///
/// - counts every step and every completion
/// - flags any overlapping `step()` calls (the scheduler must never step a
///   task from two threads at once)
/// - optionally appends its label to a shared [`CompletionLog`] on completion
#[derive(Debug)]
pub struct CountingTask {
    label: String,
    continues: usize,
    steps: AtomicUsize,
    completions: AtomicUsize,
    in_step: AtomicBool,
    overlapped: AtomicBool,
    log: Option<CompletionLog>,
}

impl CountingTask {
    pub fn new(label: &str, continues: usize) -> Self {
        Self {
            label: label.to_string(),
            continues,
            steps: AtomicUsize::new(0),
            completions: AtomicUsize::new(0),
            in_step: AtomicBool::new(false),
            overlapped: AtomicBool::new(false),
            log: None,
        }
    }

    pub fn with_log(mut self, log: CompletionLog) -> Self {
        self.log = Some(log);
        self
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn steps(&self) -> usize {
        self.steps.load(Ordering::SeqCst)
    }

    pub fn completions(&self) -> usize {
        self.completions.load(Ordering::SeqCst)
    }

    pub fn overlapped(&self) -> bool {
        self.overlapped.load(Ordering::SeqCst)
    }

    /// Forget previous steps so the task runs its full `continues` again.
    pub fn reset(&self) {
        self.steps.store(0, Ordering::SeqCst);
    }
}

impl Task for CountingTask {
    fn step(&self) -> StepResult {
        if self.in_step.swap(true, Ordering::SeqCst) {
            self.overlapped.store(true, Ordering::SeqCst);
        }

        let step = self.steps.fetch_add(1, Ordering::SeqCst);
        let result = if step >= self.continues {
            self.completions.fetch_add(1, Ordering::SeqCst);
            if let Some(log) = &self.log {
                log.lock().push(self.label.clone());
            }
            StepResult::Complete
        } else {
            StepResult::Continue
        };

        self.in_step.store(false, Ordering::SeqCst);
        result
    }
}

/// A task that keeps returning `Continue` until its gate is opened.
///
/// Records the name of the worker thread that first stepped it.
#[derive(Debug)]
pub struct GateTask {
    gate: Arc<AtomicBool>,
    first_thread: Mutex<Option<String>>,
}

impl GateTask {
    pub fn new(gate: Arc<AtomicBool>) -> Self {
        Self {
            gate,
            first_thread: Mutex::new(None),
        }
    }

    pub fn first_thread(&self) -> Option<String> {
        self.first_thread.lock().clone()
    }
}

impl Task for GateTask {
    fn step(&self) -> StepResult {
        {
            let mut first = self.first_thread.lock();
            if first.is_none() {
                *first = thread::current().name().map(str::to_string);
            }
        }

        if self.gate.load(Ordering::SeqCst) {
            StepResult::Complete
        } else {
            thread::yield_now();
            StepResult::Continue
        }
    }
}
