// src/lib.rs

//! Dependency-graph task scheduler.
//!
//! Build a DAG of steppable [`Task`]s with a [`GraphDefinition`], snapshot
//! it into a [`GraphInstance`], and run it on a [`TaskScheduler`]'s fixed
//! pool of worker threads. A task is only dispatched once every task it
//! depends on has completed; instances can be [`reset`](GraphInstance::reset)
//! and run again.

pub mod cli;
pub mod config;
pub mod dag;
pub mod demo;
pub mod errors;
pub mod exec;
pub mod logging;
pub mod task;

pub use dag::{GraphDefinition, GraphInstance};
pub use exec::{ExecutionResult, SchedulerConfig, TaskScheduler};
pub use task::{SharedTask, StepResult, Task, TaskId};

use std::time::Instant;

use anyhow::{Result, bail};
use tracing::{debug, info};

use crate::cli::CliArgs;
use crate::config::ConfigFile;
use crate::config::loader::load_and_validate;
use crate::demo::DemoGraph;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading (or the built-in demo graph)
/// - graph construction
/// - the worker pool
/// - the execute / reset loop
pub fn run(args: CliArgs) -> Result<()> {
    let mut cfg = match &args.config {
        Some(path) => load_and_validate(path)?,
        None => ConfigFile::builtin(),
    };
    if let Some(workers) = args.workers {
        cfg.scheduler.workers = workers;
    }

    let demo = demo::build_graph(&cfg)?;

    if args.dry_run {
        print_dry_run(&cfg, &demo);
        return Ok(());
    }

    let scheduler = TaskScheduler::with_config(&cfg.scheduler)?;
    let mut instance = demo.definition.construct_graph();
    info!(
        tasks = instance.len(),
        roots = ?instance.initial_tasks(),
        "graph constructed"
    );

    let mut run_no: u64 = 0;
    while args.iterations == 0 || run_no < args.iterations {
        run_no += 1;
        let started = Instant::now();

        let result = scheduler.execute(&mut instance);
        info!(
            run = run_no,
            ?result,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "all tasks finished; resetting graph"
        );

        if result == ExecutionResult::UnableToProgress {
            bail!(
                "run {run_no} stalled: {} of {} tasks completed",
                instance.completed(),
                instance.len()
            );
        }

        instance.reset();
        demo.reset_tasks();
    }

    Ok(())
}

/// Simple dry-run output: print scheduler settings, tasks and dependencies.
fn print_dry_run(cfg: &ConfigFile, demo: &DemoGraph) {
    println!("dagpool dry-run");
    println!("  scheduler.workers = {}", cfg.scheduler.workers);
    println!("  scheduler.extra_workers = {}", cfg.scheduler.extra_workers);
    println!();

    println!("tasks ({}):", cfg.task.len());
    for (name, task) in cfg.task.iter() {
        let id = demo
            .id_of(name)
            .map(|id| id.to_string())
            .unwrap_or_else(|| "?".to_string());
        println!("  - {name} (id {id})");
        println!("      delay_ms: {}", task.delay_ms);
        println!("      iterations: {}", task.iterations);
        if !task.after.is_empty() {
            println!("      after: {:?}", task.after);
        }
    }

    debug!("dry-run complete (no execution)");
}
