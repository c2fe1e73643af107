//! Feed command for amount trends.

use std::fmt::Write as _;
use std::io::Write;

use anyhow::Result;
use hb_core::{FeedProcessor, TypedEventTables};
use serde::Serialize;

use crate::Config;

/// Estimated date for one threshold.
#[derive(Debug, Serialize)]
pub struct JsonCrossing {
    pub threshold_ml: u32,
    /// `YYYY-MM-DD`, absent when the trend never reaches the threshold.
    pub date: Option<String>,
}

/// Computed feed report.
#[derive(Debug, Serialize)]
pub struct FeedReport {
    pub feeds: usize,
    pub missing_amounts: usize,
    pub mean_ml: Option<f64>,
    pub latest_rolling_average_ml: Option<f64>,
    pub slope_ml_per_day: Option<f64>,
    pub crossings: Vec<JsonCrossing>,
}

/// Processes the feed entries of a log into report data.
pub fn generate_report(tables: &TypedEventTables, config: &Config) -> Result<FeedReport> {
    let processor = FeedProcessor::new(tables, &config.feed)?;
    let summary = processor.process();

    Ok(FeedReport {
        feeds: summary.samples.len(),
        missing_amounts: summary.missing_amounts(),
        mean_ml: summary.mean_amount(),
        latest_rolling_average_ml: summary
            .samples
            .iter()
            .rev()
            .find_map(|s| s.rolling_average),
        slope_ml_per_day: summary.trend.map(|t| t.slope_per_day),
        crossings: summary
            .crossings
            .iter()
            .map(|c| JsonCrossing {
                threshold_ml: c.threshold_ml,
                date: c.date.map(|d| d.format("%Y-%m-%d").to_string()),
            })
            .collect(),
    })
}

/// Formats the human-readable report output.
pub fn format_report(report: &FeedReport) -> String {
    let mut output = String::new();

    writeln!(
        output,
        "FEED REPORT: {} feeds ({} without amount)",
        report.feeds, report.missing_amounts
    )
    .unwrap();
    writeln!(output).unwrap();

    match report.mean_ml {
        Some(mean) => writeln!(output, "Mean amount:     {mean:.1} ml").unwrap(),
        None => writeln!(output, "Mean amount:     n/a").unwrap(),
    }
    match report.latest_rolling_average_ml {
        Some(avg) => writeln!(output, "Rolling average: {avg:.1} ml").unwrap(),
        None => writeln!(output, "Rolling average: n/a").unwrap(),
    }
    match report.slope_ml_per_day {
        Some(slope) => writeln!(output, "Trend:           {slope:+.2} ml/day").unwrap(),
        None => writeln!(output, "Trend:           n/a (needs feeds at two distinct times)").unwrap(),
    }

    for crossing in &report.crossings {
        let date = crossing.date.as_deref().unwrap_or("not projected");
        writeln!(output, "Reaches {} ml:  {date}", crossing.threshold_ml).unwrap();
    }

    output
}

/// Runs the feed command.
pub fn run<W: Write>(
    writer: &mut W,
    tables: &TypedEventTables,
    config: &Config,
    json: bool,
) -> Result<()> {
    let report = generate_report(tables, config)?;
    if json {
        writeln!(writer, "{}", serde_json::to_string_pretty(&report)?)?;
    } else {
        write!(writer, "{}", format_report(&report))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use chrono::NaiveDate;
    use hb_core::{EventTable, FeedConfig, RawEvent};
    use insta::assert_snapshot;

    fn feed(day: u32, end_condition: &str) -> RawEvent {
        let start = NaiveDate::from_ymd_opt(2025, 3, day)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap();
        let mut event = RawEvent::new("Feed", start);
        event.end_condition = Some(end_condition.to_string());
        event
    }

    fn config() -> Config {
        Config {
            feed: FeedConfig {
                rolling_window: 2,
                ..FeedConfig::default()
            },
            ..Config::default()
        }
    }

    #[test]
    fn feed_text_report() {
        let tables = EventTable::new(vec![
            feed(1, "40ml"),
            feed(2, "50ml"),
            feed(3, "60ml"),
            feed(4, "Refused"),
        ])
        .partition();
        let report = generate_report(&tables, &config()).unwrap();
        assert_snapshot!(format_report(&report), @r"
        FEED REPORT: 4 feeds (1 without amount)

        Mean amount:     50.0 ml
        Rolling average: 55.0 ml
        Trend:           +10.00 ml/day
        Reaches 90 ml:  2025-03-06
        Reaches 120 ml:  2025-03-09
        ");
    }

    #[test]
    fn feed_report_without_trend() {
        let tables = EventTable::new(vec![feed(1, "Bottle")]).partition();
        let report = generate_report(&tables, &config()).unwrap();
        assert_snapshot!(format_report(&report), @r"
        FEED REPORT: 1 feeds (1 without amount)

        Mean amount:     n/a
        Rolling average: n/a
        Trend:           n/a (needs feeds at two distinct times)
        Reaches 90 ml:  not projected
        Reaches 120 ml:  not projected
        ");
    }

    #[test]
    fn feed_json_report() {
        let tables = EventTable::new(vec![feed(1, "40ml"), feed(2, "50ml")]).partition();
        let mut output = Vec::new();
        run(&mut output, &tables, &config(), true).unwrap();
        let parsed: serde_json::Value = serde_json::from_slice(&output).unwrap();

        assert_eq!(parsed["feeds"], 2);
        assert_eq!(parsed["slope_ml_per_day"], 10.0);
        assert_eq!(parsed["crossings"][0]["threshold_ml"], 90);
        assert_eq!(parsed["crossings"][0]["date"], "2025-03-06");
    }
}
