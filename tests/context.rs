// tests/context.rs

mod common;
use crate::common::builders::{GraphBuilder, diamond_scenario};
use crate::common::init_tracing;

use std::sync::Arc;

use dagpool::exec::{
    CompletionMessage, ContextId, ExecutionContext, ExecutionResult, PackagedTask, TaskDispatcher,
};
use dagpool::TaskId;
use dagpool_test_utils::fake_dispatcher::InlineDispatcher;

fn inline_context(id: u64) -> (Arc<ExecutionContext>, InlineDispatcher) {
    let context = Arc::new(ExecutionContext::new(ContextId(id)));
    let dispatcher = InlineDispatcher::new(Arc::clone(&context));
    (context, dispatcher)
}

#[test]
fn scenario_dispatch_order_is_deterministic_inline() {
    init_tracing();

    let graph = diamond_scenario();
    let mut instance = graph.definition.construct_graph();
    let (context, dispatcher) = inline_context(0);

    let result = context.run_to_completion(&mut instance, &dispatcher);

    assert_eq!(result, ExecutionResult::Complete);
    let labels: Vec<&str> = dispatcher
        .dispatched()
        .into_iter()
        .map(|id| graph.label(id))
        .collect();
    assert_eq!(labels, vec!["A0", "B0", "C0", "A1", "A2"]);
    // B0 continues once.
    assert_eq!(dispatcher.steps(), 6);
    assert_eq!(instance.in_flight(), 0);
    assert!(!instance.has_unexecuted_tasks());
}

#[test]
fn context_can_drive_the_same_instance_again_after_reset() {
    init_tracing();

    let graph = diamond_scenario();
    let mut instance = graph.definition.construct_graph();
    let (context, dispatcher) = inline_context(3);

    assert_eq!(
        context.run_to_completion(&mut instance, &dispatcher),
        ExecutionResult::Complete
    );
    let first = dispatcher.dispatched();

    instance.reset();
    graph.reset_tasks();
    dispatcher.clear();

    assert_eq!(
        context.run_to_completion(&mut instance, &dispatcher),
        ExecutionResult::Complete
    );
    assert_eq!(dispatcher.dispatched(), first);
}

#[test]
fn cyclic_remainder_is_unable_to_progress() {
    init_tracing();

    let graph = GraphBuilder::new()
        .task("root")
        .task("x")
        .task("y")
        .after("x", &["root", "y"])
        .after("y", &["x"])
        .build();
    let mut instance = graph.definition.construct_graph();
    let (context, dispatcher) = inline_context(0);

    let result = context.run_to_completion(&mut instance, &dispatcher);

    assert_eq!(result, ExecutionResult::UnableToProgress);
    assert_eq!(dispatcher.dispatched(), vec![graph.id("root")]);
    assert_eq!(instance.completed(), 1);
    assert_eq!(instance.remaining_predecessors(graph.id("x")), Some(1));
}

/// Runs `target` inline and drops every other task.
struct Only<'a> {
    target: TaskId,
    inline: &'a InlineDispatcher,
}

impl TaskDispatcher for Only<'_> {
    fn dispatch(&self, task: PackagedTask) {
        if task.task_id == self.target {
            self.inline.dispatch(task);
        }
    }
}

#[test]
fn completions_posted_before_the_wait_are_not_lost() {
    init_tracing();

    let graph = GraphBuilder::new()
        .task("a")
        .task("b")
        .task("c")
        .after("c", &["a", "b"])
        .build();
    let mut instance = graph.definition.construct_graph();
    let (context, inline) = inline_context(9);
    assert_eq!(context.id(), ContextId(9));

    // Nobody is waiting yet; both messages must stay queued.
    context.post_completion(CompletionMessage::new(ContextId(9), graph.id("a")));
    context.post_completion(CompletionMessage::new(ContextId(9), graph.id("b")));

    let only_c = Only {
        target: graph.id("c"),
        inline: &inline,
    };
    let result = context.run_to_completion(&mut instance, &only_c);

    assert_eq!(result, ExecutionResult::Complete);
    assert_eq!(inline.dispatched(), vec![graph.id("c")]);
    assert_eq!(graph.completion_order(), vec!["c".to_string()]);
}
