// tests/config_loading.rs

mod common;
use crate::common::{init_tracing, with_timeout};

use std::error::Error;
use std::io::Write;
use std::path::PathBuf;

use dagpool::config::{ConfigFile, load_and_validate, load_from_path};
use dagpool::demo::{DemoTask, build_graph};
use dagpool::errors::DagpoolError;
use dagpool::logging::parse_level_str;
use dagpool::{ExecutionResult, StepResult, Task, TaskScheduler};
use tempfile::NamedTempFile;
use tracing::Level;

type TestResult = Result<(), Box<dyn Error>>;

fn write_config(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "{contents}").unwrap();
    file
}

fn demo_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("demos")
        .join(name)
}

#[test]
fn diamond_demo_loads_with_defaults_applied() -> TestResult {
    init_tracing();

    let cfg = load_and_validate(demo_path("diamond.toml"))?;

    assert_eq!(cfg.scheduler.workers, 4);
    assert_eq!(cfg.scheduler.extra_workers, 1);
    assert_eq!(cfg.scheduler.total_workers(), 5);

    assert_eq!(cfg.task.len(), 5);
    assert_eq!(cfg.task["A0"].iterations, 1);
    assert_eq!(cfg.task["B0"].iterations, 2);
    assert_eq!(cfg.task["A2"].after, vec!["A1".to_string(), "C0".to_string()]);
    assert!(cfg.task["C0"].after.is_empty());

    Ok(())
}

#[test]
fn missing_scheduler_section_uses_default_pool() -> TestResult {
    init_tracing();

    let file = write_config(
        r#"
[task.only]
"#,
    );
    let cfg = load_and_validate(file.path())?;

    assert!(cfg.scheduler.workers >= 1);
    assert_eq!(cfg.scheduler.extra_workers, 0);
    assert_eq!(cfg.task["only"].delay_ms, 0);
    assert_eq!(cfg.task["only"].iterations, 1);

    Ok(())
}

#[test]
fn dag_cycle_returns_structured_error() {
    init_tracing();

    match load_and_validate(demo_path("cycle.toml")) {
        Err(DagpoolError::DagCycle(msg)) => {
            assert!(msg.contains("cycle detected"));
            assert!(msg.contains('A') || msg.contains('B') || msg.contains('C'));
        }
        Err(e) => panic!("Expected DagCycle error, got: {e:?}"),
        Ok(_) => panic!("Expected error, got Ok"),
    }
}

#[test]
fn unknown_dependency_returns_config_error() {
    init_tracing();

    let file = write_config(
        r#"
[task.A]
after = ["NonExistent"]
"#,
    );

    match load_and_validate(file.path()) {
        Err(DagpoolError::ConfigError(msg)) => {
            assert!(msg.contains("unknown dependency"));
            assert!(msg.contains("NonExistent"));
        }
        Err(e) => panic!("Expected ConfigError, got: {e:?}"),
        Ok(_) => panic!("Expected error, got Ok"),
    }
}

#[test]
fn self_dependency_is_rejected() {
    init_tracing();

    let file = write_config(
        r#"
[task.A]
after = ["A"]
"#,
    );

    let err = load_and_validate(file.path()).unwrap_err();
    assert!(err.to_string().contains("cannot depend on itself"), "{err}");
}

#[test]
fn zero_iterations_is_rejected() {
    init_tracing();

    let file = write_config(
        r#"
[task.A]
iterations = 0
"#,
    );

    match load_and_validate(file.path()) {
        Err(DagpoolError::ConfigError(msg)) => assert!(msg.contains("iterations >= 1")),
        other => panic!("Expected ConfigError, got: {other:?}"),
    }
}

#[test]
fn empty_pool_is_rejected() {
    init_tracing();

    let file = write_config(
        r#"
[scheduler]
workers = 0

[task.A]
"#,
    );

    match load_and_validate(file.path()) {
        Err(DagpoolError::ConfigError(msg)) => assert!(msg.contains("workers")),
        other => panic!("Expected ConfigError, got: {other:?}"),
    }

    // Headroom alone is enough.
    let file = write_config(
        r#"
[scheduler]
workers = 0
extra_workers = 2

[task.A]
"#,
    );
    let cfg = load_and_validate(file.path()).unwrap();
    assert_eq!(cfg.scheduler.total_workers(), 2);
}

#[test]
fn config_without_tasks_is_rejected() {
    init_tracing();

    let file = write_config(
        r#"
[scheduler]
workers = 2
"#,
    );

    // Parsing alone accepts it.
    let raw = load_from_path(file.path()).unwrap();
    assert!(raw.task.is_empty());

    let err = ConfigFile::try_from(raw).unwrap_err();
    assert!(matches!(err, DagpoolError::ConfigError(_)));
}

#[test]
fn malformed_toml_and_missing_files_are_reported() {
    init_tracing();

    let file = write_config("[task.A\n");
    assert!(matches!(
        load_and_validate(file.path()),
        Err(DagpoolError::TomlError(_))
    ));

    assert!(matches!(
        load_and_validate(demo_path("does-not-exist.toml")),
        Err(DagpoolError::IoError(_))
    ));
}

#[test]
fn builtin_graph_has_the_expected_shape() -> TestResult {
    init_tracing();

    let cfg = ConfigFile::builtin();
    assert_eq!(cfg.scheduler.total_workers(), 5);

    let demo = build_graph(&cfg)?;
    demo.definition.check_acyclic()?;

    let id = |label: &str| demo.id_of(label).unwrap();
    assert_eq!(demo.tasks.len(), 5);

    let mut a1_deps = demo.definition.predecessors_of(id("A1"));
    a1_deps.sort();
    let mut expected = vec![id("A0"), id("B0")];
    expected.sort();
    assert_eq!(a1_deps, expected);

    let instance = demo.definition.construct_graph();
    let mut roots = instance.initial_tasks().to_vec();
    roots.sort();
    let mut expected = vec![id("A0"), id("B0"), id("C0")];
    expected.sort();
    assert_eq!(roots, expected);

    assert!(demo.id_of("Z9").is_none());

    Ok(())
}

#[test]
fn demo_task_counts_down_and_resets() {
    init_tracing();

    let task = DemoTask::new("t", std::time::Duration::ZERO, 3);
    assert_eq!(task.label(), "t");
    assert_eq!(task.remaining(), 3);

    assert_eq!(task.step(), StepResult::Continue);
    assert_eq!(task.step(), StepResult::Continue);
    assert_eq!(task.step(), StepResult::Complete);
    assert_eq!(task.remaining(), 0);

    task.reset();
    assert_eq!(task.remaining(), 3);
}

#[test]
fn diamond_demo_executes_repeatedly() {
    init_tracing();

    with_timeout(|| {
        let cfg = load_and_validate(demo_path("diamond.toml")).unwrap();
        let demo = build_graph(&cfg).unwrap();
        let scheduler = TaskScheduler::with_config(&cfg.scheduler).unwrap();
        assert_eq!(scheduler.worker_count(), 5);

        let mut instance = demo.definition.construct_graph();
        for _ in 0..2 {
            assert_eq!(scheduler.execute(&mut instance), ExecutionResult::Complete);
            assert!(demo.tasks.iter().all(|(_, t)| t.remaining() == 0));
            instance.reset();
            demo.reset_tasks();
        }
    });
}

#[test]
fn log_level_names_are_parsed_leniently() {
    assert_eq!(parse_level_str("debug"), Some(Level::DEBUG));
    assert_eq!(parse_level_str(" WARN "), Some(Level::WARN));
    assert_eq!(parse_level_str("warning"), Some(Level::WARN));
    assert_eq!(parse_level_str("trace"), Some(Level::TRACE));
    assert_eq!(parse_level_str("loud"), None);
}
