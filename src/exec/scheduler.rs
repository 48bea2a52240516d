// src/exec/scheduler.rs

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::dag::GraphInstance;
use crate::errors::Result;

use super::backend::{CompletionSink, TaskDispatcher};
use super::context::ExecutionContext;
use super::worker::WorkerThread;
use super::{CompletionMessage, ContextId, ExecutionResult, PackagedTask};

/// Worker pool sizing.
///
/// The pool has exactly `workers + extra_workers` threads. `extra_workers`
/// exists so that any headroom on top of the requested parallelism is an
/// explicit choice rather than a silent increment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct SchedulerConfig {
    #[serde(default = "default_workers")]
    pub workers: usize,

    #[serde(default)]
    pub extra_workers: usize,
}

/// Default worker count: available parallelism, or 4 if unknown.
pub fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4)
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            extra_workers: 0,
        }
    }
}

impl SchedulerConfig {
    pub fn with_workers(workers: usize) -> Self {
        Self {
            workers,
            extra_workers: 0,
        }
    }

    pub fn total_workers(&self) -> usize {
        self.workers.saturating_add(self.extra_workers)
    }
}

/// Live contexts, keyed by ID, plus the next ID to hand out.
#[derive(Debug, Default)]
struct Contexts {
    by_id: HashMap<ContextId, Arc<ExecutionContext>>,
    next_id: u64,
}

/// Registry of live contexts. Workers deliver completions here.
#[derive(Debug, Default)]
struct ContextRegistry {
    contexts: RwLock<Contexts>,
}

impl ContextRegistry {
    fn create(&self) -> Arc<ExecutionContext> {
        let mut contexts = self.contexts.write();
        let id = ContextId(contexts.next_id);
        contexts.next_id += 1;

        let context = Arc::new(ExecutionContext::new(id));
        contexts.by_id.insert(id, Arc::clone(&context));
        context
    }

    fn remove(&self, id: ContextId) {
        self.contexts.write().by_id.remove(&id);
    }

    fn len(&self) -> usize {
        self.contexts.read().by_id.len()
    }
}

impl CompletionSink for ContextRegistry {
    fn deliver_completions(&self, batch: Vec<CompletionMessage>) {
        let contexts = self.contexts.read();

        for msg in batch {
            match contexts.by_id.get(&msg.context_id) {
                Some(context) => context.post_completion(msg),
                None => {
                    warn!(
                        context = %msg.context_id,
                        task = %msg.task_id,
                        "completion for unknown context; dropping"
                    );
                }
            }
        }
    }
}

/// The worker pool, load-balancing posted tasks.
#[derive(Debug)]
struct WorkerPool {
    workers: RwLock<Vec<WorkerThread>>,
}

impl TaskDispatcher for WorkerPool {
    /// Post to the least-loaded worker.
    ///
    /// The pick is greedy and not atomic with the post: two concurrent
    /// dispatches may both choose the same worker. Nothing is lost, the
    /// balance is just occasionally off by a little.
    fn dispatch(&self, task: PackagedTask) {
        let workers = self.workers.read();

        // `min_by_key` keeps the first of equally loaded workers.
        match workers.iter().min_by_key(|worker| worker.load()) {
            Some(worker) => {
                debug!(
                    worker = worker.id(),
                    task = %task.task_id,
                    context = %task.context_id,
                    "dispatching task"
                );
                worker.post_task(task);
            }
            None => {
                warn!(task = %task.task_id, "no workers available; task dropped");
            }
        }
    }
}

/// Executes [`GraphInstance`]s on a fixed pool of worker threads.
///
/// `execute` may be called concurrently from several threads; each call
/// gets its own [`ExecutionContext`] and completions are routed back to the
/// right call by context ID.
///
/// Dropping the scheduler (or calling [`TaskScheduler::join`]) stops and
/// joins every worker. No `execute` call may be in progress at that point.
pub struct TaskScheduler {
    pool: WorkerPool,
    registry: Arc<ContextRegistry>,
}

impl fmt::Debug for TaskScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskScheduler")
            .field("workers", &self.worker_count())
            .field("active_contexts", &self.active_contexts())
            .finish()
    }
}

impl TaskScheduler {
    /// Build a pool of exactly `workers` threads.
    pub fn new(workers: usize) -> Result<Self> {
        Self::with_config(&SchedulerConfig::with_workers(workers))
    }

    /// Build a pool of `workers + extra_workers` threads and start them.
    pub fn with_config(config: &SchedulerConfig) -> Result<Self> {
        let mut total = config.total_workers();
        if total == 0 {
            warn!("scheduler requested with zero workers; using one");
            total = 1;
        }

        let registry = Arc::new(ContextRegistry::default());

        let mut workers = Vec::with_capacity(total);
        for id in 0..total {
            let sink: Arc<dyn CompletionSink> = registry.clone();
            workers.push(WorkerThread::spawn(id, sink)?);
        }

        info!(
            workers = config.workers,
            extra_workers = config.extra_workers,
            total,
            "task scheduler started"
        );

        Ok(Self {
            pool: WorkerPool {
                workers: RwLock::new(workers),
            },
            registry,
        })
    }

    /// Run `graph` to completion on the pool, blocking the calling thread.
    pub fn execute(&self, graph: &mut GraphInstance) -> ExecutionResult {
        let context = self.registry.create();
        debug!(context = %context.id(), tasks = graph.len(), "created execution context");

        let result = context.run_to_completion(graph, &self.pool);

        self.registry.remove(context.id());
        debug!(context = %context.id(), "removed execution context");

        result
    }

    pub fn worker_count(&self) -> usize {
        self.pool.workers.read().len()
    }

    /// Snapshot of every worker's current load, indexed by worker ID.
    pub fn worker_loads(&self) -> Vec<usize> {
        self.pool.workers.read().iter().map(WorkerThread::load).collect()
    }

    /// Number of `execute` calls currently in progress.
    pub fn active_contexts(&self) -> usize {
        self.registry.len()
    }

    /// Stop and join every worker thread. Safe to call repeatedly.
    pub fn join(&self) {
        let active = self.active_contexts();
        if active > 0 {
            warn!(active, "joining scheduler while executions are still active");
        }

        for worker in self.pool.workers.read().iter() {
            worker.join();
        }
    }
}

impl Drop for TaskScheduler {
    fn drop(&mut self) {
        self.join();
        info!("task scheduler stopped");
    }
}
