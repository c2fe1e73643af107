//! CSV ingestion of exported tracking logs.
//!
//! The export has one row per entry with the columns
//! `Type,Start,End,Duration,Start Condition,Start Location,End Condition,Notes`.
//! Columns are located by header name, so reordered or extra columns are
//! tolerated. Only `Type` and `Start` are required.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use chrono::{DateTime, NaiveDateTime};
use csv::StringRecord;
use thiserror::Error;

use crate::event::{EventField, RawEvent};
use crate::table::EventTable;

/// Timestamp layouts seen in exports, tried in order.
const TIMESTAMP_FORMATS: [&str; 3] = ["%Y-%m-%d %H:%M", "%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];

/// Ingestion errors.
#[derive(Debug, Error)]
pub enum IngestError {
    /// The file could not be opened.
    #[error("failed to open {path}")]
    Open {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// The CSV itself is malformed.
    #[error("malformed CSV at row {row}")]
    Csv {
        row: usize,
        #[source]
        source: csv::Error,
    },
    /// A required column is missing from the header row.
    #[error("missing required column: {column}")]
    MissingColumn { column: &'static str },
    /// A required value is empty.
    #[error("row {row}: {column} is empty")]
    MissingValue { row: usize, column: &'static str },
    /// A timestamp matched none of the known layouts.
    #[error("row {row}: invalid {column} timestamp: {value}")]
    Timestamp {
        row: usize,
        column: &'static str,
        value: String,
    },
}

/// Positions of the known columns within a header row.
#[derive(Debug)]
struct ColumnIndex {
    event_type: usize,
    start: usize,
    end: Option<usize>,
    text: Vec<(EventField, usize)>,
}

impl ColumnIndex {
    fn from_headers(headers: &StringRecord) -> Result<Self, IngestError> {
        let find = |name: &str| {
            headers
                .iter()
                .position(|h| h.trim_start_matches('\u{feff}').trim() == name)
        };

        let event_type = find("Type").ok_or(IngestError::MissingColumn { column: "Type" })?;
        let start = find("Start").ok_or(IngestError::MissingColumn { column: "Start" })?;

        let text = [
            EventField::Duration,
            EventField::StartCondition,
            EventField::StartLocation,
            EventField::EndCondition,
            EventField::Notes,
        ]
        .into_iter()
        .filter_map(|field| find(field.header()).map(|idx| (field, idx)))
        .collect();

        Ok(Self {
            event_type,
            start,
            end: find("End"),
            text,
        })
    }

    fn event(&self, record: &StringRecord, row: usize) -> Result<RawEvent, IngestError> {
        let event_type = non_empty(record.get(self.event_type)).ok_or(IngestError::MissingValue {
            row,
            column: "Type",
        })?;
        let start_text = non_empty(record.get(self.start)).ok_or(IngestError::MissingValue {
            row,
            column: "Start",
        })?;
        let start = parse_timestamp(start_text).ok_or_else(|| IngestError::Timestamp {
            row,
            column: "Start",
            value: start_text.to_string(),
        })?;

        let mut event = RawEvent::new(event_type, start);

        if let Some(end_text) = self.end.and_then(|idx| non_empty(record.get(idx))) {
            event.end = Some(parse_timestamp(end_text).ok_or_else(|| {
                IngestError::Timestamp {
                    row,
                    column: "End",
                    value: end_text.to_string(),
                }
            })?);
        }

        for &(field, idx) in &self.text {
            // Text cells are kept verbatim; only blank cells become absent.
            let value = record
                .get(idx)
                .filter(|cell| !cell.trim().is_empty())
                .map(str::to_string);
            match field {
                EventField::Duration => event.duration = value,
                EventField::StartCondition => event.start_condition = value,
                EventField::StartLocation => event.start_location = value,
                EventField::EndCondition => event.end_condition = value,
                EventField::Notes => event.notes = value,
            }
        }

        Ok(event)
    }
}

/// Treats missing and whitespace-only cells as absent.
fn non_empty(cell: Option<&str>) -> Option<&str> {
    cell.map(str::trim).filter(|s| !s.is_empty())
}

/// Parses an export timestamp into local wall-clock time.
///
/// RFC 3339 values keep their wall-clock reading; the offset is dropped so
/// hour buckets reflect the time of day the entry was logged.
pub fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .or_else(|| {
            DateTime::parse_from_rfc3339(s)
                .ok()
                .map(|dt| dt.naive_local())
        })
}

/// Reads all events from CSV data.
///
/// Row numbers in errors are 1-based and count data rows only.
pub fn read_events<R: Read>(reader: R) -> Result<EventTable, IngestError> {
    let mut rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(reader);

    let headers = rdr
        .headers()
        .map_err(|source| IngestError::Csv { row: 0, source })?
        .clone();
    let columns = ColumnIndex::from_headers(&headers)?;

    let mut events = Vec::new();
    for (idx, result) in rdr.records().enumerate() {
        let row = idx + 1;
        let record = result.map_err(|source| IngestError::Csv { row, source })?;
        events.push(columns.event(&record, row)?);
    }

    tracing::debug!(events = events.len(), "read events from CSV");
    Ok(EventTable::new(events))
}

/// Reads all events from a CSV file on disk.
pub fn read_events_from_path(path: &Path) -> Result<EventTable, IngestError> {
    let file = File::open(path).map_err(|source| IngestError::Open {
        path: path.display().to_string(),
        source,
    })?;
    read_events(file)
}
