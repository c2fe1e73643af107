//! Core logic for analyzing baby-care tracking logs.
//!
//! This crate contains the fundamental types and logic for:
//! - Ingestion: reading exported CSV logs and partitioning them by event type
//! - Extraction: recovering amounts and flags from free-text columns
//! - Aggregation: hour-of-day probability distributions for charting
//! - Processors: per-type derivation for diaper and feed entries

pub mod amount;
pub mod diaper;
pub mod distribution;
pub mod event;
pub mod extract;
pub mod feed;
pub mod ingest;
pub mod processor;
pub mod table;

pub use amount::{AmountLabel, AmountLevel};
pub use diaper::{DiaperConfig, DiaperKind, DiaperProcessor, DiaperTable};
pub use distribution::{DomainPolicy, HourlyDistribution};
pub use event::{EventField, HOURS_PER_DAY, HourBucket, RawEvent};
pub use extract::{ExtractionRule, FlagRule, PatternExtractor};
pub use feed::{FeedConfig, FeedProcessor, FeedSummary};
pub use ingest::{IngestError, read_events, read_events_from_path};
pub use processor::{
    AugmentedRow, AugmentedTable, EventProcessor, ProcessError, Processor, ProcessorConfig,
    ProcessorKind,
};
pub use table::{EventTable, TypedEventTables};
