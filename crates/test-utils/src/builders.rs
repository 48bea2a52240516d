#![allow(dead_code)]

use std::collections::BTreeMap;
use std::sync::Arc;

use dagpool::{GraphDefinition, SharedTask, TaskId};

use crate::tasks::{CompletionLog, CountingTask, completion_log};

/// Builder for `GraphDefinition`s keyed by label, to simplify test setup.
///
/// Tasks added with [`GraphBuilder::task`] are [`CountingTask`]s that log
/// their label into a shared completion log.
pub struct GraphBuilder {
    definition: GraphDefinition,
    ids: BTreeMap<String, TaskId>,
    tasks: BTreeMap<String, Arc<CountingTask>>,
    log: CompletionLog,
}

impl GraphBuilder {
    pub fn new() -> Self {
        Self {
            definition: GraphDefinition::new(),
            ids: BTreeMap::new(),
            tasks: BTreeMap::new(),
            log: completion_log(),
        }
    }

    /// Add a task that completes on its first step.
    pub fn task(self, label: &str) -> Self {
        self.task_continuing(label, 0)
    }

    /// Add a task that returns `Continue` `continues` times before completing.
    pub fn task_continuing(mut self, label: &str, continues: usize) -> Self {
        let task = Arc::new(CountingTask::new(label, continues).with_log(self.log.clone()));
        let id = self.definition.add_task(task.clone());
        self.ids.insert(label.to_string(), id);
        self.tasks.insert(label.to_string(), task);
        self
    }

    /// Add an arbitrary task.
    pub fn custom(mut self, label: &str, task: SharedTask) -> Self {
        let id = self.definition.add_task(task);
        self.ids.insert(label.to_string(), id);
        self
    }

    /// `label` depends on every task in `deps`.
    pub fn after(mut self, label: &str, deps: &[&str]) -> Self {
        let from = self.ids[label];
        for dep in deps {
            let to = self.ids[*dep];
            self.definition
                .add_dependency(from, to)
                .expect("builder ids are always valid");
        }
        self
    }

    pub fn build(self) -> BuiltGraph {
        BuiltGraph {
            definition: self.definition,
            ids: self.ids,
            tasks: self.tasks,
            log: self.log,
        }
    }
}

impl Default for GraphBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Result of [`GraphBuilder::build`].
pub struct BuiltGraph {
    pub definition: GraphDefinition,
    pub ids: BTreeMap<String, TaskId>,
    pub tasks: BTreeMap<String, Arc<CountingTask>>,
    pub log: CompletionLog,
}

impl BuiltGraph {
    pub fn id(&self, label: &str) -> TaskId {
        self.ids[label]
    }

    pub fn label(&self, id: TaskId) -> &str {
        self.ids
            .iter()
            .find(|(_, v)| **v == id)
            .map(|(k, _)| k.as_str())
            .expect("unknown task id")
    }

    pub fn task(&self, label: &str) -> &Arc<CountingTask> {
        &self.tasks[label]
    }

    /// Labels in the order tasks completed.
    pub fn completion_order(&self) -> Vec<String> {
        self.log.lock().clone()
    }

    /// Reset every counting task and clear the completion log.
    pub fn reset_tasks(&self) {
        for task in self.tasks.values() {
            task.reset();
        }
        self.log.lock().clear();
    }
}

/// The A0/B0/C0 -> A1 -> A2 graph:
///
/// ```text
/// A0 B0 C0
///  \ /  /
///   A1 /
///   | /
///   A2
/// ```
pub fn diamond_scenario() -> BuiltGraph {
    GraphBuilder::new()
        .task("A0")
        .task_continuing("B0", 1)
        .task("C0")
        .task("A1")
        .task("A2")
        .after("A1", &["A0", "B0"])
        .after("A2", &["A1", "C0"])
        .build()
}
