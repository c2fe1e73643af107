//! Export command writing one event type with its derived columns as CSV.
//!
//! The raw columns keep the export's header names so the output can be read
//! back by `hb` itself; derived columns follow, named `<Type>_<Field>`.

use std::io::Write;

use anyhow::{Context, Result};
use hb_core::{
    AugmentedTable, EventField, EventProcessor, Processor, ProcessorKind, TypedEventTables,
};

use crate::Config;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const TEXT_FIELDS: [EventField; 5] = [
    EventField::Duration,
    EventField::StartCondition,
    EventField::StartLocation,
    EventField::EndCondition,
    EventField::Notes,
];

/// Writes an augmented table as CSV.
pub fn write_csv<W: Write>(writer: W, table: &AugmentedTable<'_>) -> Result<()> {
    let mut csv = csv::Writer::from_writer(writer);

    let mut header = vec!["Type", "Start", "End"];
    header.extend(TEXT_FIELDS.iter().map(|f| f.header()));
    header.extend(table.columns.iter().map(String::as_str));
    csv.write_record(&header)?;

    for row in &table.rows {
        let event = row.event;
        let mut record = vec![
            event.event_type.clone(),
            event.start.format(TIMESTAMP_FORMAT).to_string(),
            event
                .end
                .map(|t| t.format(TIMESTAMP_FORMAT).to_string())
                .unwrap_or_default(),
        ];
        record.extend(
            TEXT_FIELDS
                .iter()
                .map(|f| event.field(*f).unwrap_or_default().to_string()),
        );
        record.extend(row.values.iter().map(|v| v.clone().unwrap_or_default()));
        csv.write_record(&record)?;
    }

    csv.flush().context("failed to flush CSV output")?;
    Ok(())
}

/// Runs the export command.
pub fn run<W: Write>(
    writer: W,
    tables: &TypedEventTables,
    config: &Config,
    kind: ProcessorKind,
) -> Result<()> {
    let processor = Processor::build(kind, tables, &config.processors())?;
    let table = processor.augment();
    tracing::debug!(
        type_name = processor.type_name(),
        rows = table.rows.len(),
        "exporting augmented table"
    );
    write_csv(writer, &table)
}
