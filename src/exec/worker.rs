// src/exec/worker.rs

//! A single executor thread with a private work queue.

use std::collections::VecDeque;
use std::fmt;
use std::mem;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::thread::{self, JoinHandle};

use parking_lot::{Condvar, Mutex};
use tracing::{debug, info, trace, warn};

use crate::errors::Result;
use crate::task::StepResult;

use super::backend::CompletionSink;
use super::{CompletionMessage, PackagedTask};

/// State shared between the owning [`WorkerThread`] handle (producers) and
/// the thread itself (sole consumer).
struct WorkerShared {
    queue: Mutex<VecDeque<PackagedTask>>,
    wake: Condvar,
    /// Tasks queued on, or held for retry by, this worker.
    load: AtomicUsize,
    stop: AtomicBool,
}

/// One dedicated OS thread that steps posted tasks.
///
/// Each wakeup the thread:
/// 1. swaps the whole queue out into a local batch,
/// 2. steps every task of that batch once,
/// 3. steps every task it was already holding from earlier wakeups once
///    more,
/// 4. delivers all completions of the wakeup to the sink in one batch.
///
/// Tasks that return [`StepResult::Continue`] stay with this worker. A
/// worker that holds such tasks does not go to sleep, so they keep getting
/// turns even when nothing new is posted to it. No task is stepped twice
/// within one wakeup.
pub struct WorkerThread {
    id: usize,
    shared: Arc<WorkerShared>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl fmt::Debug for WorkerThread {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkerThread")
            .field("id", &self.id)
            .field("load", &self.load())
            .field("stopping", &self.shared.stop.load(Ordering::Relaxed))
            .finish()
    }
}

impl WorkerThread {
    /// Start a new worker thread that reports completions to `sink`.
    pub fn spawn(id: usize, sink: Arc<dyn CompletionSink>) -> Result<Self> {
        let shared = Arc::new(WorkerShared {
            queue: Mutex::new(VecDeque::new()),
            wake: Condvar::new(),
            load: AtomicUsize::new(0),
            stop: AtomicBool::new(false),
        });

        let thread_shared = Arc::clone(&shared);
        let handle = thread::Builder::new()
            .name(format!("dagpool-worker-{id}"))
            .spawn(move || run_loop(id, &thread_shared, sink.as_ref()))?;

        debug!(worker = id, "worker thread spawned");

        Ok(Self {
            id,
            shared,
            handle: Mutex::new(Some(handle)),
        })
    }

    pub fn id(&self) -> usize {
        self.id
    }

    /// Current load: tasks queued on or held for retry by this worker.
    pub fn load(&self) -> usize {
        self.shared.load.load(Ordering::Acquire)
    }

    /// Append a task to this worker's queue and wake it.
    pub fn post_task(&self, task: PackagedTask) {
        trace!(
            worker = self.id,
            task = %task.task_id,
            context = %task.context_id,
            "posting task to worker"
        );

        let mut queue = self.shared.queue.lock();
        queue.push_back(task);
        self.shared.load.fetch_add(1, Ordering::AcqRel);
        self.shared.wake.notify_one();
    }

    /// Ask the thread to stop and wait for it to exit.
    ///
    /// The thread notices the request on its next wakeup; a task currently
    /// inside `step()` is allowed to return first. Safe to call repeatedly.
    pub fn join(&self) {
        self.shared.stop.store(true, Ordering::Release);
        {
            // Notify under the lock so the request cannot slip in between
            // the thread's check and its wait.
            let _queue = self.shared.queue.lock();
            self.shared.wake.notify_one();
        }

        let Some(handle) = self.handle.lock().take() else {
            return;
        };

        if handle.join().is_err() {
            warn!(worker = self.id, "worker thread panicked");
        } else {
            debug!(worker = self.id, "worker thread joined");
        }
    }
}

impl Drop for WorkerThread {
    fn drop(&mut self) {
        self.join();
    }
}

fn run_loop(id: usize, shared: &WorkerShared, sink: &dyn CompletionSink) {
    info!(worker = id, "worker thread started");

    let mut held: Vec<PackagedTask> = Vec::new();

    loop {
        let batch = {
            let mut queue = shared.queue.lock();
            while queue.is_empty() && held.is_empty() && !shared.stop.load(Ordering::Acquire) {
                shared.wake.wait(&mut queue);
            }

            if shared.stop.load(Ordering::Acquire) {
                break;
            }

            mem::take(&mut *queue)
        };

        let carried = mem::take(&mut held);
        let mut completions = Vec::new();

        for work in batch {
            step_once(id, shared, work, &mut completions, &mut held);
        }
        for work in carried {
            step_once(id, shared, work, &mut completions, &mut held);
        }

        if !completions.is_empty() {
            debug!(
                worker = id,
                completed = completions.len(),
                held = held.len(),
                "delivering completion batch"
            );
            sink.deliver_completions(completions);
        }
    }

    let abandoned = held.len() + shared.queue.lock().len();
    if abandoned > 0 {
        warn!(worker = id, abandoned, "worker stopping with unfinished tasks");
    }
    info!(worker = id, "worker thread exiting");
}

fn step_once(
    worker: usize,
    shared: &WorkerShared,
    work: PackagedTask,
    completions: &mut Vec<CompletionMessage>,
    held: &mut Vec<PackagedTask>,
) {
    match work.task.step() {
        StepResult::Complete => {
            trace!(worker, task = %work.task_id, context = %work.context_id, "task complete");
            completions.push(CompletionMessage::new(work.context_id, work.task_id));
            shared.load.fetch_sub(1, Ordering::AcqRel);
        }
        StepResult::Continue => {
            trace!(worker, task = %work.task_id, context = %work.context_id, "task continues");
            held.push(work);
        }
    }
}
