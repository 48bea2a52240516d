// src/config/model.rs

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::exec::SchedulerConfig;

/// Top-level configuration as read from a TOML file, before validation.
///
/// ```toml
/// [scheduler]
/// workers = 4
/// extra_workers = 0
///
/// [task.A0]
/// delay_ms = 500
/// iterations = 1
///
/// [task.A1]
/// delay_ms = 500
/// after = ["A0", "B0"]
/// ```
///
/// All sections are optional and have reasonable defaults.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawConfigFile {
    /// Worker pool sizing from `[scheduler]`.
    #[serde(default)]
    pub scheduler: SchedulerConfig,

    /// All tasks from `[task.<name>]`.
    ///
    /// Keys are the task names; task IDs are assigned in key order.
    #[serde(default)]
    pub task: BTreeMap<String, TaskConfig>,
}

/// A validated configuration.
///
/// Can only be obtained through `TryFrom<RawConfigFile>` (see
/// `config::validate`) or [`ConfigFile::builtin`].
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub scheduler: SchedulerConfig,
    pub task: BTreeMap<String, TaskConfig>,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(
        scheduler: SchedulerConfig,
        task: BTreeMap<String, TaskConfig>,
    ) -> Self {
        Self { scheduler, task }
    }

    /// The demonstration graph used when no config file is given.
    ///
    /// ```text
    /// A0 B0 C0
    ///  \ /  /
    ///   A1 /
    ///   | /
    ///   A2
    /// ```
    pub fn builtin() -> Self {
        let mut task = BTreeMap::new();
        task.insert("A0".to_string(), TaskConfig::new(500, 1, &[]));
        task.insert("B0".to_string(), TaskConfig::new(250, 2, &[]));
        task.insert("C0".to_string(), TaskConfig::new(750, 1, &[]));
        task.insert("A1".to_string(), TaskConfig::new(500, 1, &["A0", "B0"]));
        task.insert("A2".to_string(), TaskConfig::new(500, 1, &["A1", "C0"]));

        Self::new_unchecked(SchedulerConfig::with_workers(5), task)
    }
}

/// `[task.<name>]` section.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TaskConfig {
    /// Time each step sleeps before reporting, in milliseconds.
    #[serde(default)]
    pub delay_ms: u64,

    /// Number of steps until the task reports completion (>= 1).
    #[serde(default = "default_iterations")]
    pub iterations: u32,

    /// Dependency list: this task waits for all tasks listed here.
    #[serde(default)]
    pub after: Vec<String>,
}

fn default_iterations() -> u32 {
    1
}

impl TaskConfig {
    pub fn new(delay_ms: u64, iterations: u32, after: &[&str]) -> Self {
        Self {
            delay_ms,
            iterations,
            after: after.iter().map(|s| s.to_string()).collect(),
        }
    }
}
