//! Shared utilities for CLI commands.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use hb_core::TypedEventTables;

use crate::Config;

/// Picks the export to analyze: `--input` wins over `input_path` from config.
pub fn resolve_input(cli_input: Option<&Path>, config: &Config) -> Result<PathBuf> {
    cli_input
        .map(Path::to_path_buf)
        .or_else(|| config.input_path.clone())
        .context("no input file: pass --input <FILE> or set input_path in the config")
}

/// Reads an export and partitions it by event type.
pub fn load_log(path: &Path) -> Result<TypedEventTables> {
    let table = hb_core::read_events_from_path(path)
        .with_context(|| format!("failed to read log {}", path.display()))?;
    let tables = table.partition();
    tracing::debug!(path = %path.display(), types = tables.len(), "loaded log");
    Ok(tables)
}

/// Formats a probability for the hourly tables.
pub fn format_probability(p: f64) -> String {
    format!("{p:.2}")
}
