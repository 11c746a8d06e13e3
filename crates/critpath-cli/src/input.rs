//! Task table loading
//!
//! Accepts either a bare JSON array of task records or an object with a
//! `tasks` array (the shape produced by most schedule exporters).

use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use critpath_core::TaskRecord;
use serde_json::Value;

/// Read and parse a task table from disk
pub fn load_tasks(path: &Path) -> Result<Vec<TaskRecord>> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read task file {}", path.display()))?;
    parse_tasks(&raw).with_context(|| format!("invalid task file {}", path.display()))
}

/// Parse a task table from JSON text
pub fn parse_tasks(raw: &str) -> Result<Vec<TaskRecord>> {
    let value: Value = serde_json::from_str(raw).context("not valid JSON")?;

    let records = match value {
        Value::Array(_) => value,
        Value::Object(mut map) => match map.remove("tasks") {
            Some(tasks @ Value::Array(_)) => tasks,
            Some(_) => bail!("`tasks` must be an array of task records"),
            None => bail!("expected a `tasks` array at the top level"),
        },
        _ => bail!("expected an array of task records or an object with a `tasks` array"),
    };

    let tasks: Vec<TaskRecord> =
        serde_json::from_value(records).context("malformed task record")?;
    tracing::debug!(count = tasks.len(), "loaded task records");
    Ok(tasks)
}
