// src/errors.rs

//! Error type shared by the library modules.
//!
//! Library code returns [`Result`]; the binary wraps everything in
//! `anyhow` at the top.

use thiserror::Error;

use crate::task::TaskId;

#[derive(Error, Debug)]
pub enum DagpoolError {
    /// A task ID that the graph never handed out.
    #[error("unknown task id {id}: graph only has {len} tasks")]
    InvalidTaskId { id: TaskId, len: usize },

    #[error("dependency cycle: {0}")]
    DagCycle(String),

    #[error("invalid config: {0}")]
    ConfigError(String),

    #[error("i/o failure: {0}")]
    IoError(#[from] std::io::Error),

    #[error("malformed TOML: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, DagpoolError>;
