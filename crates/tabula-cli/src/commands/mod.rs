//! Subcommand implementations.

pub mod create;
pub mod delete;
pub mod get;
pub mod list;
pub mod serve;
pub mod update;

use std::io::{self, Read};

use anyhow::{Context, Result};
use serde_json::Value;

use tabula_core::RecordId;

/// Read a JSON payload from a file, or stdin for `-`. No path means `{}`.
fn read_json(path: Option<&str>) -> Result<Value> {
    match path {
        Some("-") => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read from stdin")?;
            serde_json::from_str(&buf).context("Invalid JSON from stdin")
        }
        Some(path) => {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read JSON file {path}"))?;
            serde_json::from_str(&content).context("Invalid JSON in file")
        }
        None => Ok(Value::Object(serde_json::Map::new())),
    }
}

fn parse_id(raw: &str) -> Result<RecordId> {
    raw.parse::<RecordId>().context("Invalid record id")
}
