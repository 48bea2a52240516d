// src/cli.rs

//! CLI argument parsing for the demonstration harness, using `clap`.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

/// Command-line arguments for `dagpool`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "dagpool",
    version,
    about = "Run a dependency graph of steppable tasks on a fixed worker pool.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to a graph config file (TOML).
    ///
    /// If omitted, the built-in A0/B0/C0 -> A1 -> A2 demo graph is used.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Number of worker threads (overrides `[scheduler].workers`).
    #[arg(long, value_name = "N")]
    pub workers: Option<usize>,

    /// How many times to execute the graph, resetting it in between.
    ///
    /// `0` keeps running until interrupted.
    #[arg(long, value_name = "N", default_value_t = 1)]
    pub iterations: u64,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `DAGPOOL_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Parse + validate, print the graph, but don't execute anything.
    #[arg(long)]
    pub dry_run: bool,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
