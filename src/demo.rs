// src/demo.rs

//! Demonstration tasks and graph construction for the `dagpool` binary.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::thread;
use std::time::Duration;

use tracing::info;

use crate::config::model::{ConfigFile, TaskConfig};
use crate::dag::GraphDefinition;
use crate::errors::{DagpoolError, Result};
use crate::task::{StepResult, Task, TaskId};

/// A task that sleeps for `delay` on every step and completes after a fixed
/// number of steps.
#[derive(Debug)]
pub struct DemoTask {
    label: String,
    delay: Duration,
    iterations: u32,
    remaining: AtomicU32,
}

impl DemoTask {
    pub fn new(label: impl Into<String>, delay: Duration, iterations: u32) -> Self {
        Self {
            label: label.into(),
            delay,
            iterations,
            remaining: AtomicU32::new(iterations),
        }
    }

    pub fn from_config(label: &str, cfg: &TaskConfig) -> Self {
        Self::new(label, Duration::from_millis(cfg.delay_ms), cfg.iterations)
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Steps still needed before the task completes.
    pub fn remaining(&self) -> u32 {
        self.remaining.load(Ordering::Acquire)
    }

    /// Restore the step counter so the task can run again.
    pub fn reset(&self) {
        self.remaining.store(self.iterations, Ordering::Release);
    }
}

impl Task for DemoTask {
    fn step(&self) -> StepResult {
        if !self.delay.is_zero() {
            thread::sleep(self.delay);
        }

        // Only one worker steps a task at a time, so load + store is enough.
        let left = self.remaining().saturating_sub(1);
        self.remaining.store(left, Ordering::Release);

        if left == 0 {
            info!(task = %self.label, "done");
            StepResult::Complete
        } else {
            info!(task = %self.label, iterations_left = left, "step finished");
            StepResult::Continue
        }
    }
}

/// A graph definition together with the concrete demo tasks it holds.
#[derive(Debug)]
pub struct DemoGraph {
    pub definition: GraphDefinition,
    pub tasks: Vec<(TaskId, Arc<DemoTask>)>,
}

impl DemoGraph {
    /// Reset every demo task's step counter.
    pub fn reset_tasks(&self) {
        for (_, task) in &self.tasks {
            task.reset();
        }
    }

    pub fn id_of(&self, label: &str) -> Option<TaskId> {
        self.tasks
            .iter()
            .find(|(_, task)| task.label() == label)
            .map(|(id, _)| *id)
    }
}

/// Build the graph described by a validated [`ConfigFile`].
///
/// Task IDs follow the config's (sorted) task-name order.
pub fn build_graph(cfg: &ConfigFile) -> Result<DemoGraph> {
    let mut definition = GraphDefinition::new();
    let mut tasks = Vec::with_capacity(cfg.task.len());
    let mut ids: HashMap<&str, TaskId> = HashMap::new();

    for (name, task_cfg) in cfg.task.iter() {
        let task = Arc::new(DemoTask::from_config(name, task_cfg));
        let id = definition.add_task(task.clone());
        ids.insert(name.as_str(), id);
        tasks.push((id, task));
    }

    for (name, task_cfg) in cfg.task.iter() {
        let from = ids[name.as_str()];
        for dep in &task_cfg.after {
            let to = ids.get(dep.as_str()).copied().ok_or_else(|| {
                DagpoolError::ConfigError(format!(
                    "task '{name}' has unknown dependency '{dep}' in `after`"
                ))
            })?;
            definition.add_dependency(from, to)?;
        }
    }

    Ok(DemoGraph { definition, tasks })
}
