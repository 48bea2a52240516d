// src/dag/instance.rs

//! Per-run dependency counting over a fixed topology.

use std::fmt;

use tracing::{trace, warn};

use crate::task::{SharedTask, TaskId};

/// Where a task is within the current run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RunState {
    Waiting,
    Emitted,
    Done,
}

/// Per-task state inside a [`GraphInstance`].
pub(crate) struct TaskState {
    task: SharedTask,
    /// Dependents, in the order their dependencies were declared.
    successors: Vec<TaskId>,
    original_predecessors: usize,
    /// Predecessors that have not completed yet in this run.
    remaining_predecessors: usize,
    run_state: RunState,
}

impl TaskState {
    pub(crate) fn new(task: SharedTask, successors: Vec<TaskId>, predecessors: usize) -> Self {
        Self {
            task,
            successors,
            original_predecessors: predecessors,
            remaining_predecessors: predecessors,
            run_state: RunState::Waiting,
        }
    }
}

/// A runnable snapshot of a [`GraphDefinition`](crate::dag::GraphDefinition).
///
/// The topology is frozen at construction; only the dependency counters and
/// the run-scoped in-flight / completed counters change. Calling the
/// `get_*_tasks_to_execute` methods is a promise to run every task they
/// emit and to report its completion back through
/// [`GraphInstance::get_tasks_to_execute`].
pub struct GraphInstance {
    tasks: Vec<TaskState>,
    /// Tasks with no predecessors at snapshot time.
    initial: Vec<TaskId>,
    in_flight: usize,
    completed: usize,
}

impl fmt::Debug for GraphInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GraphInstance")
            .field("tasks", &self.tasks.len())
            .field("initial", &self.initial)
            .field("in_flight", &self.in_flight)
            .field("completed", &self.completed)
            .finish()
    }
}

impl GraphInstance {
    pub(crate) fn new(tasks: Vec<TaskState>) -> Self {
        let initial = tasks
            .iter()
            .enumerate()
            .filter(|(_, state)| state.original_predecessors == 0)
            .map(|(idx, _)| TaskId(idx))
            .collect();

        Self {
            tasks,
            initial,
            in_flight: 0,
            completed: 0,
        }
    }

    /// Whether some task has not reported completion in the current run.
    pub fn has_unexecuted_tasks(&self) -> bool {
        self.completed < self.tasks.len()
    }

    /// Emit every root task (no predecessors).
    pub fn get_initial_tasks_to_execute<F>(&mut self, mut emit: F)
    where
        F: FnMut(TaskId, &SharedTask),
    {
        for &id in &self.initial {
            self.in_flight += 1;
            self.tasks[id.index()].run_state = RunState::Emitted;
            trace!(task = %id, "emitting root task");
            emit(id, &self.tasks[id.index()].task);
        }
    }

    /// Feed a batch of completed tasks and emit every dependent whose last
    /// outstanding predecessor was among them.
    ///
    /// Dependents are released in each completed task's successor order.
    pub fn get_tasks_to_execute<I, F>(&mut self, completed: I, mut emit: F)
    where
        I: IntoIterator<Item = TaskId>,
        F: FnMut(TaskId, &SharedTask),
    {
        for id in completed {
            let Some(state) = self.tasks.get(id.index()) else {
                warn!(task = %id, "completion for unknown task id; ignoring");
                continue;
            };
            match state.run_state {
                RunState::Emitted => {}
                RunState::Waiting => {
                    warn!(task = %id, "completion for a task that was never emitted; ignoring");
                    continue;
                }
                RunState::Done => {
                    warn!(task = %id, "duplicate completion; ignoring");
                    continue;
                }
            }
            let successor_count = state.successors.len();

            self.tasks[id.index()].run_state = RunState::Done;
            self.in_flight = self.in_flight.saturating_sub(1);
            self.completed += 1;

            for i in 0..successor_count {
                let succ = self.tasks[id.index()].successors[i];
                let succ_state = &mut self.tasks[succ.index()];

                if succ_state.remaining_predecessors == 0 {
                    warn!(
                        task = %succ,
                        completed = %id,
                        "dependency count already zero; not emitting again"
                    );
                    continue;
                }

                succ_state.remaining_predecessors -= 1;
                if succ_state.remaining_predecessors == 0 {
                    succ_state.run_state = RunState::Emitted;
                    self.in_flight += 1;
                    trace!(task = %succ, after = %id, "dependencies satisfied; emitting");
                    emit(succ, &succ_state.task);
                }
            }
        }
    }

    /// Restore every dependency counter and clear run-scoped counters so the
    /// same topology can be executed again.
    pub fn reset(&mut self) {
        for state in &mut self.tasks {
            state.remaining_predecessors = state.original_predecessors;
            state.run_state = RunState::Waiting;
        }
        self.in_flight = 0;
        self.completed = 0;
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Root tasks, in ID order.
    pub fn initial_tasks(&self) -> &[TaskId] {
        &self.initial
    }

    /// Tasks emitted but not yet reported complete.
    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    /// Completions observed since construction or the last reset.
    pub fn completed(&self) -> usize {
        self.completed
    }

    pub fn remaining_predecessors(&self, id: TaskId) -> Option<usize> {
        self.tasks.get(id.index()).map(|s| s.remaining_predecessors)
    }

    pub fn original_predecessors(&self, id: TaskId) -> Option<usize> {
        self.tasks.get(id.index()).map(|s| s.original_predecessors)
    }

    pub fn successors_of(&self, id: TaskId) -> &[TaskId] {
        self.tasks
            .get(id.index())
            .map(|s| s.successors.as_slice())
            .unwrap_or(&[])
    }
}
