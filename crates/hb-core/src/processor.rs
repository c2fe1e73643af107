//! Per-type processors and the registry that selects them.
//!
//! A processor is built from the partitioned log, requires the partition of
//! its own type, and produces an [`AugmentedTable`]: the raw entries of that
//! type plus type-qualified derived columns. Processors never mutate the
//! partition they read.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::diaper::{DIAPER_TYPE, DiaperConfig, DiaperProcessor};
use crate::event::RawEvent;
use crate::feed::{FEED_TYPE, FeedConfig, FeedProcessor};
use crate::table::TypedEventTables;

/// Errors raised while building a processor.
#[derive(Debug, Error)]
pub enum ProcessError {
    /// The log has no entries of the type the processor requires.
    #[error("{type_name} data is required but the log contains no {type_name} entries")]
    MissingType { type_name: String },
    /// An extraction pattern failed to compile.
    #[error("invalid extraction pattern `{pattern}`")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
    /// An extraction pattern has nothing to capture.
    #[error("extraction pattern `{pattern}` has no capture group")]
    MissingCapture { pattern: String },
    /// A rolling window of zero rows was configured.
    #[error("rolling window must be at least 1")]
    EmptyWindow,
}

/// Raw entries of one type with derived columns attached.
#[derive(Debug, Clone, PartialEq)]
pub struct AugmentedTable<'a> {
    pub type_name: String,
    /// Names of the derived columns, in order.
    pub columns: Vec<String>,
    pub rows: Vec<AugmentedRow<'a>>,
}

/// One raw entry and its derived values, aligned with [`AugmentedTable::columns`].
#[derive(Debug, Clone, PartialEq)]
pub struct AugmentedRow<'a> {
    pub event: &'a RawEvent,
    pub values: Vec<Option<String>>,
}

/// The capability every per-type processor provides.
pub trait EventProcessor<'a> {
    /// The type discriminator this processor handles.
    fn type_name(&self) -> &'static str;

    /// Derives the processor's columns for every entry of its type.
    fn augment(&self) -> AugmentedTable<'a>;
}

/// Settings for all processors.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessorConfig {
    pub diaper: DiaperConfig,
    pub feed: FeedConfig,
}

/// Event types that have a processor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProcessorKind {
    Diaper,
    Feed,
}

impl ProcessorKind {
    pub const ALL: [Self; 2] = [Self::Diaper, Self::Feed];

    /// The type discriminator the processor is keyed on.
    pub const fn type_name(self) -> &'static str {
        match self {
            Self::Diaper => DIAPER_TYPE,
            Self::Feed => FEED_TYPE,
        }
    }
}

impl fmt::Display for ProcessorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.type_name())
    }
}

impl FromStr for ProcessorKind {
    type Err = UnknownProcessor;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.type_name().eq_ignore_ascii_case(s))
            .ok_or_else(|| UnknownProcessor(s.to_string()))
    }
}

/// Error type for type names without a processor.
#[derive(Debug, Clone)]
pub struct UnknownProcessor(String);

impl fmt::Display for UnknownProcessor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "no processor for event type: {}", self.0)
    }
}

impl std::error::Error for UnknownProcessor {}

/// A processor selected by type discriminator.
#[derive(Debug, Clone)]
pub enum Processor<'a> {
    Diaper(DiaperProcessor<'a>),
    Feed(FeedProcessor<'a>),
}

impl<'a> Processor<'a> {
    /// Builds the processor for `kind`.
    pub fn build(
        kind: ProcessorKind,
        tables: &'a TypedEventTables,
        config: &ProcessorConfig,
    ) -> Result<Self, ProcessError> {
        tracing::debug!(%kind, "building processor");
        match kind {
            ProcessorKind::Diaper => DiaperProcessor::new(tables, &config.diaper).map(Self::Diaper),
            ProcessorKind::Feed => FeedProcessor::new(tables, &config.feed).map(Self::Feed),
        }
    }

    /// Builds a processor for every registered type present in the log.
    ///
    /// Types without entries are skipped; other construction errors propagate.
    pub fn build_available(
        tables: &'a TypedEventTables,
        config: &ProcessorConfig,
    ) -> Result<Vec<Self>, ProcessError> {
        ProcessorKind::ALL
            .into_iter()
            .filter(|kind| tables.get(kind.type_name()).is_some())
            .map(|kind| Self::build(kind, tables, config))
            .collect()
    }
}

impl<'a> EventProcessor<'a> for Processor<'a> {
    fn type_name(&self) -> &'static str {
        match self {
            Self::Diaper(p) => p.type_name(),
            Self::Feed(p) => p.type_name(),
        }
    }

    fn augment(&self) -> AugmentedTable<'a> {
        match self {
            Self::Diaper(p) => p.augment(),
            Self::Feed(p) => p.augment(),
        }
    }
}
