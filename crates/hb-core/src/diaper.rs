//! Diaper event processing.
//!
//! Each diaper entry is reduced to a fixed set of derived fields:
//!
//! 1. Pass-through copies: the export stores the poop color under
//!    `Duration` and the poop consistency under `Start Condition`.
//! 2. Flags: a whole-word "fart" in the notes, "diaper rash" in the start
//!    location.
//! 3. Amounts: pee and poo amounts are extracted independently with their
//!    own fallback rules and mapped onto the ordinal amount scale.
//!
//! Derivation reads only the raw columns, so processing the same table
//! twice yields identical results.

use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::amount::{AmountLabel, AmountLevel};
use crate::distribution::{DomainPolicy, HourlyDistribution};
use crate::event::{EventField, HOURS_PER_DAY, RawEvent};
use crate::extract::{ExtractionRule, FlagDetector, FlagRule, PatternExtractor};
use crate::processor::{AugmentedRow, AugmentedTable, EventProcessor, ProcessError};
use crate::table::{EventTable, TypedEventTables};

/// Type discriminator of diaper entries.
pub const DIAPER_TYPE: &str = "Diaper";

/// What a diaper contained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiaperKind {
    Pee,
    Poo,
}

impl DiaperKind {
    pub const ALL: [Self; 2] = [Self::Pee, Self::Poo];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pee => "pee",
            Self::Poo => "poo",
        }
    }

    /// Capitalized form used in derived column names.
    const fn column_name(self) -> &'static str {
        match self {
            Self::Pee => "Pee",
            Self::Poo => "Poo",
        }
    }
}

/// Extraction settings for diaper entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiaperConfig {
    /// Pee amount rules, in fallback order.
    pub pee: Vec<ExtractionRule>,
    /// Poo amount rules, in fallback order.
    pub poo: Vec<ExtractionRule>,
    pub fart: FlagRule,
    pub rash: FlagRule,
    /// Category domain used by [`DiaperTable::distribution`].
    pub domain_policy: DomainPolicy,
}

impl Default for DiaperConfig {
    fn default() -> Self {
        Self {
            pee: amount_rules("pee"),
            poo: amount_rules("poo"),
            fart: FlagRule::new(EventField::Notes, "fart"),
            rash: FlagRule::new(EventField::StartLocation, "diaper rash"),
            domain_policy: DomainPolicy::Fixed,
        }
    }
}

/// `<kind>:<amount>` in the end condition first, then in the notes.
///
/// Spaces after the colon are allowed, line breaks are not, and the amount
/// must not itself be followed by a colon. An empty `pee:` therefore never
/// picks up the next `poo:` token.
fn amount_rules(kind: &str) -> Vec<ExtractionRule> {
    let pattern = format!(r"\b{kind}:[ \t]*(\w+)\b(?:[^:\w]|$)");
    vec![
        ExtractionRule::new(EventField::EndCondition, pattern.clone()),
        ExtractionRule::new(EventField::Notes, pattern),
    ]
}

/// Attributes derived from one diaper entry.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DiaperFields {
    pub pee_amount: Option<AmountLabel>,
    pub poo_amount: Option<AmountLabel>,
    pub had_fart: bool,
    pub had_rash: bool,
    pub poop_color: Option<String>,
    pub poop_type: Option<String>,
}

impl DiaperFields {
    pub const fn amount(&self, kind: DiaperKind) -> Option<&AmountLabel> {
        match kind {
            DiaperKind::Pee => self.pee_amount.as_ref(),
            DiaperKind::Poo => self.poo_amount.as_ref(),
        }
    }

    /// The recognized amount level, if the label is in the domain.
    pub fn level(&self, kind: DiaperKind) -> Option<AmountLevel> {
        self.amount(kind).and_then(AmountLabel::level)
    }

    /// Values in the order of [`derived_columns`].
    fn column_values(&self) -> Vec<Option<String>> {
        let mut values = Vec::with_capacity(8);
        for kind in DiaperKind::ALL {
            let label = self.amount(kind);
            values.push(label.map(|l| l.as_str().to_string()));
            values.push(label.and_then(AmountLabel::value).map(|v| v.to_string()));
        }
        values.push(Some(self.had_fart.to_string()));
        values.push(Some(self.had_rash.to_string()));
        values.push(self.poop_color.clone());
        values.push(self.poop_type.clone());
        values
    }
}

/// Type-qualified names of the derived columns.
pub fn derived_columns(type_name: &str) -> Vec<String> {
    let mut columns = Vec::with_capacity(8);
    for kind in DiaperKind::ALL {
        let kind = kind.column_name();
        columns.push(format!("{type_name}_{kind}_Amount"));
        columns.push(format!("{type_name}_{kind}_Amount_Value"));
    }
    for suffix in ["Had_Fart", "Had_Rash", "Poop_Color", "Poop_Type"] {
        columns.push(format!("{type_name}_{suffix}"));
    }
    columns
}

/// A diaper entry together with its derived fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiaperRecord<'a> {
    pub event: &'a RawEvent,
    pub fields: DiaperFields,
}

/// Derives diaper fields from the `Diaper` partition of a log.
#[derive(Debug, Clone)]
pub struct DiaperProcessor<'a> {
    table: &'a EventTable,
    pee: PatternExtractor,
    poo: PatternExtractor,
    fart: FlagDetector,
    rash: FlagDetector,
    domain_policy: DomainPolicy,
}

impl<'a> DiaperProcessor<'a> {
    /// Fails if the log has no diaper entries or a configured pattern is invalid.
    pub fn new(tables: &'a TypedEventTables, config: &DiaperConfig) -> Result<Self, ProcessError> {
        Ok(Self {
            table: tables.require(DIAPER_TYPE)?,
            pee: PatternExtractor::compile(&config.pee)?,
            poo: PatternExtractor::compile(&config.poo)?,
            fart: FlagDetector::compile(&config.fart)?,
            rash: FlagDetector::compile(&config.rash)?,
            domain_policy: config.domain_policy,
        })
    }

    /// Derives the fields of a single entry from its raw columns.
    pub fn derive(&self, event: &RawEvent) -> DiaperFields {
        DiaperFields {
            poop_color: event.duration.clone(),
            poop_type: event.start_condition.clone(),
            had_fart: self.fart.detect(event),
            had_rash: self.rash.detect(event),
            pee_amount: self.pee.extract(event).map(|t| AmountLabel::classify(&t)),
            poo_amount: self.poo.extract(event).map(|t| AmountLabel::classify(&t)),
        }
    }

    /// Derives fields for every entry, leaving the source table untouched.
    pub fn process(&self) -> DiaperTable<'a> {
        let started = Instant::now();

        let records: Vec<DiaperRecord<'a>> = self
            .table
            .events()
            .iter()
            .map(|event| DiaperRecord {
                event,
                fields: self.derive(event),
            })
            .collect();

        let unrecognized = records
            .iter()
            .flat_map(|r| DiaperKind::ALL.map(|kind| r.fields.amount(kind)))
            .filter(|label| matches!(label, Some(AmountLabel::Unrecognized(_))))
            .count();

        tracing::debug!(
            records = records.len(),
            unrecognized,
            elapsed_ms = started.elapsed().as_secs_f64() * 1000.0,
            "processed diaper events"
        );

        DiaperTable {
            records,
            domain_policy: self.domain_policy,
        }
    }
}

impl<'a> EventProcessor<'a> for DiaperProcessor<'a> {
    fn type_name(&self) -> &'static str {
        DIAPER_TYPE
    }

    /// Produces the table with the type-qualified derived columns attached.
    fn augment(&self) -> AugmentedTable<'a> {
        let processed = self.process();
        AugmentedTable {
            type_name: DIAPER_TYPE.to_string(),
            columns: derived_columns(DIAPER_TYPE),
            rows: processed
                .records
                .iter()
                .map(|r| AugmentedRow {
                    event: r.event,
                    values: r.fields.column_values(),
                })
                .collect(),
        }
    }
}

/// Processed diaper entries and the hourly queries over them.
#[derive(Debug, Clone)]
pub struct DiaperTable<'a> {
    records: Vec<DiaperRecord<'a>>,
    domain_policy: DomainPolicy,
}

impl<'a> DiaperTable<'a> {
    pub fn records(&self) -> &[DiaperRecord<'a>] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub const fn domain_policy(&self) -> DomainPolicy {
        self.domain_policy
    }

    /// Per-hour distribution over the four amount levels.
    ///
    /// Unrecognized labels carry no level and are excluded.
    pub fn amount_distribution(&self, kind: DiaperKind) -> HourlyDistribution<AmountLevel> {
        HourlyDistribution::with_domain(
            AmountLevel::ALL,
            self.records
                .iter()
                .filter_map(|r| r.fields.level(kind).map(|level| (r.event.hour(), level))),
        )
    }

    /// Per-hour distribution over label strings under the given policy.
    ///
    /// With [`DomainPolicy::Observed`] unrecognized labels become categories
    /// of their own; with [`DomainPolicy::Fixed`] the domain is the four
    /// amount levels and unrecognized labels are dropped.
    pub fn label_distribution(
        &self,
        kind: DiaperKind,
        policy: DomainPolicy,
    ) -> HourlyDistribution<String> {
        HourlyDistribution::with_policy(
            policy,
            AmountLevel::ALL.map(|level| level.as_str().to_string()),
            self.records.iter().filter_map(|r| {
                r.fields
                    .amount(kind)
                    .map(|label| (r.event.hour(), label.as_str().to_string()))
            }),
        )
    }

    /// Per-hour label distribution under the configured policy.
    pub fn distribution(&self, kind: DiaperKind) -> HourlyDistribution<String> {
        self.label_distribution(kind, self.domain_policy)
    }

    /// Probability, at each hour, that a `kind` diaper had the given level.
    pub fn level_probabilities(&self, kind: DiaperKind, level: AmountLevel) -> [f64; HOURS_PER_DAY] {
        self.amount_distribution(kind).probability_series(&level)
    }

    /// Share of all `kind` diapers of the given level that fell in each hour.
    pub fn level_hour_share(&self, kind: DiaperKind, level: AmountLevel) -> [f64; HOURS_PER_DAY] {
        self.amount_distribution(kind).hour_share(&level)
    }

    /// Number of `kind` diapers with a recognized amount, per hour.
    pub fn event_counts(&self, kind: DiaperKind) -> [u32; HOURS_PER_DAY] {
        self.amount_distribution(kind).hour_totals()
    }

    pub fn fart_count(&self) -> usize {
        self.records.iter().filter(|r| r.fields.had_fart).count()
    }

    pub fn rash_count(&self) -> usize {
        self.records.iter().filter(|r| r.fields.had_rash).count()
    }
}
