// tests/property_graph.rs

mod common;
use crate::common::builders::{BuiltGraph, GraphBuilder};

use std::collections::BTreeSet;

use dagpool::{ExecutionResult, TaskId, TaskScheduler};
use proptest::prelude::*;

// Acyclic by construction: task N may only depend on tasks 0..N-1.
fn dag_strategy(max_tasks: usize) -> impl Strategy<Value = Vec<Vec<usize>>> {
    (1..=max_tasks).prop_flat_map(|num_tasks| {
        proptest::collection::vec(
            proptest::collection::vec(any::<usize>(), 0..num_tasks),
            num_tasks,
        )
        .prop_map(|raw| {
            raw.into_iter()
                .enumerate()
                .map(|(i, potential)| {
                    if i == 0 {
                        return Vec::new();
                    }
                    let deps: BTreeSet<usize> = potential.into_iter().map(|d| d % i).collect();
                    deps.into_iter().collect()
                })
                .collect()
        })
    })
}

fn label(i: usize) -> String {
    format!("t{i}")
}

fn build(deps: &[Vec<usize>], continues: &[usize]) -> BuiltGraph {
    let mut builder = GraphBuilder::new();
    for i in 0..deps.len() {
        let extra = continues.get(i).copied().unwrap_or(0);
        builder = builder.task_continuing(&label(i), extra);
    }
    for (i, task_deps) in deps.iter().enumerate() {
        let names: Vec<String> = task_deps.iter().map(|&d| label(d)).collect();
        let names: Vec<&str> = names.iter().map(String::as_str).collect();
        builder = builder.after(&label(i), &names);
    }
    builder.build()
}

proptest! {
    #[test]
    fn every_task_is_emitted_once_after_all_its_predecessors(
        deps in dag_strategy(12),
        picks in proptest::collection::vec(any::<usize>(), 0..64),
    ) {
        let graph = build(&deps, &[]);
        let mut instance = graph.definition.construct_graph();
        let n = deps.len();

        let mut emitted = vec![0usize; n];
        let mut completed = vec![false; n];
        let mut in_flight: Vec<TaskId> = Vec::new();

        instance.get_initial_tasks_to_execute(|id, _| in_flight.push(id));
        let roots = in_flight.clone();
        for id in &in_flight {
            emitted[id.index()] += 1;
            prop_assert!(deps[id.index()].is_empty());
        }

        let mut picks = picks.into_iter();
        while !in_flight.is_empty() {
            prop_assert_eq!(instance.in_flight(), in_flight.len());

            // Complete one or two in-flight tasks, chosen by the strategy.
            let mut batch = Vec::new();
            let take = if in_flight.len() > 1 && picks.len() % 2 == 0 { 2 } else { 1 };
            for _ in 0..take {
                let at = picks.next().unwrap_or(0) % in_flight.len();
                batch.push(in_flight.swap_remove(at));
            }
            for id in &batch {
                completed[id.index()] = true;
            }

            let mut released = Vec::new();
            instance.get_tasks_to_execute(batch.iter().copied(), |id, _| released.push(id));

            for id in released {
                emitted[id.index()] += 1;
                for &dep in &deps[id.index()] {
                    prop_assert!(completed[dep], "{} released before {}", label(id.index()), label(dep));
                }
                in_flight.push(id);
            }
        }

        prop_assert!(emitted.iter().all(|&count| count == 1), "{:?}", emitted);
        prop_assert!(!instance.has_unexecuted_tasks());
        prop_assert_eq!(instance.completed(), n);
        for i in 0..n {
            prop_assert_eq!(instance.remaining_predecessors(TaskId(i)), Some(0));
        }

        instance.reset();
        let mut again = Vec::new();
        instance.get_initial_tasks_to_execute(|id, _| again.push(id));
        prop_assert_eq!(again, roots);
        for (i, task_deps) in deps.iter().enumerate() {
            prop_assert_eq!(instance.remaining_predecessors(TaskId(i)), Some(task_deps.len()));
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn scheduler_completes_random_dags_in_dependency_order(
        deps in dag_strategy(10),
        continues in proptest::collection::vec(0usize..3, 10),
        workers in 1usize..4,
    ) {
        let graph = build(&deps, &continues);
        let scheduler = TaskScheduler::new(workers).unwrap();
        let mut instance = graph.definition.construct_graph();

        for _ in 0..2 {
            prop_assert_eq!(scheduler.execute(&mut instance), ExecutionResult::Complete);

            let order = graph.completion_order();
            prop_assert_eq!(order.len(), deps.len());
            let position = |i: usize| order.iter().position(|l| *l == label(i));
            for (i, task_deps) in deps.iter().enumerate() {
                for &dep in task_deps {
                    prop_assert!(position(dep) < position(i), "{:?}", order);
                }
            }

            instance.reset();
            graph.reset_tasks();
        }

        for task in graph.tasks.values() {
            prop_assert_eq!(task.completions(), 2);
            prop_assert!(!task.overlapped());
        }
        prop_assert_eq!(scheduler.active_contexts(), 0);
    }
}
