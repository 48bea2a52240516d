// src/dag/graph.rs

use std::fmt;

use petgraph::Direction;
use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;
use tracing::debug;

use crate::dag::instance::{GraphInstance, TaskState};
use crate::errors::{DagpoolError, Result};
use crate::task::{SharedTask, TaskId};

/// Mutable builder for a task DAG.
///
/// Edges live in a `DiGraphMap` pointing predecessor -> successor, which
/// gives set semantics (adding the same dependency twice is a no-op) and
/// both directions, so clearing a task's dependencies also drops the
/// back-references on its former predecessors.
///
/// `DiGraphMap` reorders neighbours when an edge is removed, so each task
/// also keeps its own successor list in declaration order. That list fixes
/// the order in which a [`GraphInstance`] releases dependents.
///
/// Acyclicity is *not* enforced while building; call
/// [`GraphDefinition::check_acyclic`] if you want it verified up front.
#[derive(Default)]
pub struct GraphDefinition {
    tasks: Vec<SharedTask>,
    edges: DiGraphMap<TaskId, ()>,
    /// Successors per task, in the order the dependencies were added.
    successors: Vec<Vec<TaskId>>,
}

impl fmt::Debug for GraphDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GraphDefinition")
            .field("tasks", &self.tasks.len())
            .field("edges", &self.edges.edge_count())
            .finish_non_exhaustive()
    }
}

impl GraphDefinition {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a task and return its ID.
    pub fn add_task(&mut self, task: SharedTask) -> TaskId {
        let id = TaskId(self.tasks.len());
        self.tasks.push(task);
        self.successors.push(Vec::new());
        self.edges.add_node(id);
        debug!(task = %id, "added task to graph definition");
        id
    }

    /// Record that `from` depends on `to`.
    ///
    /// `to` becomes a predecessor of `from`; `from` becomes a successor of
    /// `to`. Fails without touching either vertex if an ID is unknown.
    pub fn add_dependency(&mut self, from: TaskId, to: TaskId) -> Result<()> {
        self.ensure_known(from)?;
        self.ensure_known(to)?;

        if self.edges.add_edge(to, from, ()).is_some() {
            debug!(from = %from, to = %to, "dependency already present; ignoring");
        } else {
            self.successors[to.index()].push(from);
            debug!(from = %from, to = %to, "added dependency");
        }
        Ok(())
    }

    /// Remove every predecessor edge of `task`.
    pub fn clear_dependencies(&mut self, task: TaskId) -> Result<()> {
        self.ensure_known(task)?;

        let preds = self.predecessors_of(task);
        for pred in &preds {
            self.edges.remove_edge(*pred, task);
            // `retain` keeps the remaining successors in declaration order.
            self.successors[pred.index()].retain(|succ| *succ != task);
        }

        debug!(task = %task, removed = preds.len(), "cleared dependencies");
        Ok(())
    }

    /// Snapshot the current topology into a runnable [`GraphInstance`].
    ///
    /// Later changes to this builder do not affect the returned instance.
    pub fn construct_graph(&self) -> GraphInstance {
        let states = self
            .tasks
            .iter()
            .enumerate()
            .map(|(idx, task)| {
                let id = TaskId(idx);
                TaskState::new(
                    task.clone(),
                    self.successors_of(id),
                    self.edges.neighbors_directed(id, Direction::Incoming).count(),
                )
            })
            .collect();

        GraphInstance::new(states)
    }

    /// Verify the graph has no cycles.
    ///
    /// Building and executing a cyclic graph is allowed (the run ends with
    /// `UnableToProgress`), so this is an opt-in check.
    pub fn check_acyclic(&self) -> Result<()> {
        match toposort(&self.edges, None) {
            Ok(_order) => Ok(()),
            Err(cycle) => Err(DagpoolError::DagCycle(format!(
                "cycle detected in task DAG involving task {}",
                cycle.node_id()
            ))),
        }
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn task(&self, id: TaskId) -> Option<&SharedTask> {
        self.tasks.get(id.index())
    }

    /// Tasks that `id` depends on. Empty for unknown IDs.
    pub fn predecessors_of(&self, id: TaskId) -> Vec<TaskId> {
        self.edges
            .neighbors_directed(id, Direction::Incoming)
            .collect()
    }

    /// Tasks that depend on `id`, in the order the dependencies were added.
    /// Empty for unknown IDs.
    pub fn successors_of(&self, id: TaskId) -> Vec<TaskId> {
        self.successors.get(id.index()).cloned().unwrap_or_default()
    }

    fn ensure_known(&self, id: TaskId) -> Result<()> {
        if id.index() < self.tasks.len() {
            Ok(())
        } else {
            Err(DagpoolError::InvalidTaskId {
                id,
                len: self.tasks.len(),
            })
        }
    }
}
