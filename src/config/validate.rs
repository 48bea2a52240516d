// src/config/validate.rs

use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::{DagpoolError, Result};

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = DagpoolError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        Ok(ConfigFile::new_unchecked(raw.scheduler, raw.task))
    }
}

fn validate_raw_config(cfg: &RawConfigFile) -> Result<()> {
    ensure_has_tasks(cfg)?;
    validate_scheduler(cfg)?;
    validate_tasks(cfg)?;
    validate_dependencies(cfg)?;
    Ok(())
}

fn ensure_has_tasks(cfg: &RawConfigFile) -> Result<()> {
    if cfg.task.is_empty() {
        return Err(DagpoolError::ConfigError(
            "config must contain at least one [task.<name>] section".to_string(),
        ));
    }
    Ok(())
}

fn validate_scheduler(cfg: &RawConfigFile) -> Result<()> {
    if cfg.scheduler.total_workers() == 0 {
        return Err(DagpoolError::ConfigError(
            "[scheduler] workers + extra_workers must be >= 1 (got 0)".to_string(),
        ));
    }
    Ok(())
}

fn validate_tasks(cfg: &RawConfigFile) -> Result<()> {
    for (name, task) in cfg.task.iter() {
        if task.iterations == 0 {
            return Err(DagpoolError::ConfigError(format!(
                "task '{name}' must have iterations >= 1 (got 0)"
            )));
        }
    }
    Ok(())
}

/// Check `after` references and acyclicity in one pass over the tasks.
///
/// Edges point dep -> task, so `A1.after = ["A0"]` adds A0 -> A1.
fn validate_dependencies(cfg: &RawConfigFile) -> Result<()> {
    let mut graph: DiGraphMap<&str, ()> = DiGraphMap::new();

    for (name, task) in cfg.task.iter() {
        graph.add_node(name.as_str());

        for dep in task.after.iter() {
            if dep == name {
                return Err(DagpoolError::ConfigError(format!(
                    "task '{name}' cannot depend on itself in `after`"
                )));
            }
            if !cfg.task.contains_key(dep) {
                return Err(DagpoolError::ConfigError(format!(
                    "task '{name}' has unknown dependency '{dep}' in `after`"
                )));
            }
            graph.add_edge(dep.as_str(), name.as_str(), ());
        }
    }

    toposort(&graph, None).map(|_order| ()).map_err(|cycle| {
        DagpoolError::DagCycle(format!(
            "cycle detected in task DAG involving task '{}'",
            cycle.node_id()
        ))
    })
}
