// src/config/mod.rs

//! Configuration loading and validation for the dagpool harness.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Load a config file from disk (`loader.rs`).
//! - Validate basic invariants like DAG correctness (`validate.rs`).

pub mod loader;
pub mod model;
pub mod validate;

pub use crate::exec::SchedulerConfig;
pub use loader::{load_and_validate, load_from_path};
pub use model::{ConfigFile, RawConfigFile, TaskConfig};
