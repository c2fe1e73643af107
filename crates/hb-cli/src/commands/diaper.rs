//! Diaper command for hourly amount distributions.
//!
//! For pee and poo separately, prints one row per hour of the day with the
//! number of diapers whose amount was recognized and the probability of each
//! amount category at that hour. All 24 hours are always listed; hours
//! without diapers show zeros.

use std::fmt::Write as _;
use std::io::Write;

use anyhow::Result;
use hb_core::{
    AmountLabel, DiaperKind, DiaperProcessor, DomainPolicy, HourBucket, TypedEventTables,
};
use serde::Serialize;

use crate::Config;
use crate::commands::util::format_probability;

/// One hour of one kind's distribution.
#[derive(Debug, Serialize)]
pub struct HourRow {
    pub hour: u8,
    /// Diapers of this kind with a recognized amount.
    pub events: u32,
    /// Count per category, aligned with [`KindReport::categories`].
    pub counts: Vec<u32>,
    /// Probability per category; all zero when the hour has no observations.
    pub probabilities: Vec<f64>,
}

/// Hourly distribution for pee or poo.
#[derive(Debug, Serialize)]
pub struct KindReport {
    pub kind: DiaperKind,
    pub categories: Vec<String>,
    /// Labels found in the log that are not amount levels.
    pub unrecognized: usize,
    pub hours: Vec<HourRow>,
}

/// Computed diaper report.
#[derive(Debug, Serialize)]
pub struct DiaperReport {
    pub entries: usize,
    pub domain: DomainPolicy,
    pub farts: usize,
    pub rashes: usize,
    pub kinds: Vec<KindReport>,
}

/// Processes the diaper entries of a log into report data.
pub fn generate_report(
    tables: &TypedEventTables,
    config: &Config,
    domain: Option<DomainPolicy>,
) -> Result<DiaperReport> {
    let processor = DiaperProcessor::new(tables, &config.diaper)?;
    let table = processor.process();
    let domain = domain.unwrap_or_else(|| table.domain_policy());

    let kinds = DiaperKind::ALL
        .into_iter()
        .map(|kind| {
            let distribution = table.label_distribution(kind, domain);
            let events = table.event_counts(kind);
            let unrecognized = table
                .records()
                .iter()
                .filter(|r| matches!(r.fields.amount(kind), Some(AmountLabel::Unrecognized(_))))
                .count();

            KindReport {
                kind,
                categories: distribution.domain().to_vec(),
                unrecognized,
                hours: HourBucket::all()
                    .map(|hour| HourRow {
                        hour: hour.value(),
                        events: events[hour.index()],
                        counts: distribution.counts(hour).to_vec(),
                        probabilities: distribution.probabilities(hour),
                    })
                    .collect(),
            }
        })
        .collect();

    Ok(DiaperReport {
        entries: table.len(),
        domain,
        farts: table.fart_count(),
        rashes: table.rash_count(),
        kinds,
    })
}

/// Formats the human-readable report output.
pub fn format_report(report: &DiaperReport) -> String {
    let mut output = String::new();

    writeln!(output, "DIAPER REPORT: {} entries", report.entries).unwrap();
    writeln!(output, "Farts: {}  Rashes: {}", report.farts, report.rashes).unwrap();

    for kind in &report.kinds {
        let title = format!("{} BY HOUR", kind.kind.as_str().to_uppercase());
        writeln!(output).unwrap();
        writeln!(output, "{title}").unwrap();
        writeln!(output, "{}", "─".repeat(title.chars().count())).unwrap();

        if kind.categories.is_empty() {
            writeln!(output, "(no {} amounts recorded)", kind.kind.as_str()).unwrap();
            continue;
        }

        write!(output, "Hour  Events").unwrap();
        for category in &kind.categories {
            write!(output, "  {category:>8}").unwrap();
        }
        writeln!(output).unwrap();

        for row in &kind.hours {
            write!(output, "  {:02}  {:>6}", row.hour, row.events).unwrap();
            for p in &row.probabilities {
                write!(output, "  {:>8}", format_probability(*p)).unwrap();
            }
            writeln!(output).unwrap();
        }

        if kind.unrecognized > 0 {
            writeln!(
                output,
                "({} unrecognized {} amount labels)",
                kind.unrecognized,
                kind.kind.as_str()
            )
            .unwrap();
        }
    }

    output
}

/// Runs the diaper command.
pub fn run<W: Write>(
    writer: &mut W,
    tables: &TypedEventTables,
    config: &Config,
    domain: Option<DomainPolicy>,
    json: bool,
) -> Result<()> {
    let report = generate_report(tables, config, domain)?;
    if json {
        writeln!(writer, "{}", serde_json::to_string_pretty(&report)?)?;
    } else {
        write!(writer, "{}", format_report(&report))?;
    }
    Ok(())
}
