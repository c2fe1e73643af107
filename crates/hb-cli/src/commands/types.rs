//! Types command listing the event types found in a log.

use std::io::Write;

use anyhow::Result;
use hb_core::{ProcessorKind, TypedEventTables};
use serde::Serialize;

/// One event type and its entry count.
#[derive(Debug, Serialize)]
pub struct TypeEntry {
    #[serde(rename = "type")]
    pub type_name: String,
    pub entries: usize,
    /// Whether `hb` has a processor for this type.
    pub processed: bool,
}

pub fn summarize(tables: &TypedEventTables) -> Vec<TypeEntry> {
    tables
        .iter()
        .map(|(type_name, table)| TypeEntry {
            type_name: type_name.to_string(),
            entries: table.len(),
            processed: type_name.parse::<ProcessorKind>().is_ok_and(|k| k.type_name() == type_name),
        })
        .collect()
}

pub fn format_types(entries: &[TypeEntry]) -> String {
    use std::fmt::Write;

    let mut output = String::new();
    let total: usize = entries.iter().map(|e| e.entries).sum();
    writeln!(output, "EVENT TYPES: {} types, {total} entries", entries.len()).unwrap();

    for entry in entries {
        let marker = if entry.processed { "  (processed)" } else { "" };
        writeln!(output, "  {:<14}{:>6}{marker}", entry.type_name, entry.entries).unwrap();
    }

    output
}

/// Runs the types command.
pub fn run<W: Write>(writer: &mut W, tables: &TypedEventTables, json: bool) -> Result<()> {
    let entries = summarize(tables);
    if json {
        writeln!(writer, "{}", serde_json::to_string_pretty(&entries)?)?;
    } else {
        write!(writer, "{}", format_types(&entries))?;
    }
    Ok(())
}
