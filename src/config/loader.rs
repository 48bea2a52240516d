// src/config/loader.rs

use std::fs;
use std::path::Path;

use tracing::{debug, info};

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::Result;

/// Read and deserialize a graph config without checking it.
///
/// Missing sections and fields are filled in from their serde defaults.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawConfigFile> {
    let path = path.as_ref();
    debug!(path = %path.display(), "reading graph config");

    let text = fs::read_to_string(path)?;
    let raw: RawConfigFile = toml::from_str(&text)?;

    debug!(
        tasks = raw.task.len(),
        workers = raw.scheduler.workers,
        extra_workers = raw.scheduler.extra_workers,
        "parsed graph config"
    );
    Ok(raw)
}

/// Read a graph config and reject anything that could not run: no tasks,
/// an empty pool, zero-iteration tasks, dangling or self `after` entries,
/// and dependency cycles.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<ConfigFile> {
    let path = path.as_ref();
    let cfg = ConfigFile::try_from(load_from_path(path)?)?;

    info!(path = %path.display(), tasks = cfg.task.len(), "graph config loaded");
    Ok(cfg)
}
