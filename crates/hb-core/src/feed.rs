//! Feed event processing.
//!
//! Feed entries record the bottle amount in the end condition (e.g. `45ml`).
//! The processor extracts that amount, smooths it with a trailing rolling
//! average, and fits a least-squares line of amount against time to estimate
//! when the daily amount reaches configured thresholds.

use std::time::Instant;

use chrono::{Duration, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::event::{EventField, RawEvent};
use crate::extract::{ExtractionRule, PatternExtractor};
use crate::processor::{AugmentedRow, AugmentedTable, EventProcessor, ProcessError};
use crate::table::{EventTable, TypedEventTables};

/// Type discriminator of feed entries.
pub const FEED_TYPE: &str = "Feed";

const SECONDS_PER_DAY: f64 = 86_400.0;

/// Settings for feed processing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedConfig {
    /// Amount rules, in fallback order. The capture must be a bare integer.
    pub amount: Vec<ExtractionRule>,
    /// Number of consecutive feeds averaged by the rolling average.
    pub rolling_window: usize,
    /// Amounts (ml) whose crossing date the trend should estimate.
    pub thresholds_ml: Vec<u32>,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            amount: vec![ExtractionRule::new(EventField::EndCondition, r"(\d+)")],
            rolling_window: 7,
            thresholds_ml: vec![90, 120],
        }
    }
}

/// One feed with its extracted amount.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedSample<'a> {
    pub event: &'a RawEvent,
    /// Amount in ml; `None` when the entry holds no integer.
    pub amount: Option<u32>,
    /// Mean of the trailing window ending at this feed, when the window is
    /// full and every amount in it is known.
    pub rolling_average: Option<f64>,
}

/// A least-squares line of amount against days since `origin`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearTrend {
    pub origin: NaiveDateTime,
    pub slope_per_day: f64,
    pub intercept: f64,
}

impl LinearTrend {
    /// Fits a line through `(timestamp, amount)` points.
    ///
    /// Needs at least two points at distinct times.
    pub fn fit(points: &[(NaiveDateTime, f64)]) -> Option<Self> {
        let origin = points.iter().map(|(t, _)| *t).min()?;
        let xs: Vec<f64> = points.iter().map(|(t, _)| days_between(origin, *t)).collect();
        let ys: Vec<f64> = points.iter().map(|(_, y)| *y).collect();

        #[expect(clippy::cast_precision_loss, reason = "point counts are small")]
        let n = xs.len() as f64;
        let x_mean = xs.iter().sum::<f64>() / n;
        let y_mean = ys.iter().sum::<f64>() / n;

        let sxx: f64 = xs.iter().map(|x| (x - x_mean).powi(2)).sum();
        let sxy: f64 = xs
            .iter()
            .zip(&ys)
            .map(|(x, y)| (x - x_mean) * (y - y_mean))
            .sum();

        if sxx <= f64::EPSILON {
            return None;
        }

        let slope_per_day = sxy / sxx;
        Some(Self {
            origin,
            slope_per_day,
            intercept: slope_per_day.mul_add(-x_mean, y_mean),
        })
    }

    /// Trend value at a point in time.
    pub fn value_at(&self, at: NaiveDateTime) -> f64 {
        self.slope_per_day
            .mul_add(days_between(self.origin, at), self.intercept)
    }

    /// The date on which a rising trend reaches `threshold`.
    ///
    /// `None` when the trend is flat or falling, or the date is out of range.
    #[expect(
        clippy::cast_possible_truncation,
        reason = "non-finite and oversized offsets are rejected by checked_add_signed"
    )]
    pub fn crossing(&self, threshold: f64) -> Option<NaiveDate> {
        if self.slope_per_day <= 0.0 {
            return None;
        }
        let days = (threshold - self.intercept) / self.slope_per_day;
        if !days.is_finite() {
            return None;
        }
        let offset = Duration::try_seconds((days * SECONDS_PER_DAY).round() as i64)?;
        self.origin.checked_add_signed(offset).map(|dt| dt.date())
    }
}

#[expect(clippy::cast_precision_loss, reason = "second counts fit an f64 mantissa")]
fn days_between(origin: NaiveDateTime, at: NaiveDateTime) -> f64 {
    (at - origin).num_seconds() as f64 / SECONDS_PER_DAY
}

/// Estimated crossing of one threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThresholdCrossing {
    pub threshold_ml: u32,
    pub date: Option<NaiveDate>,
}

/// Processed feeds, in chronological order.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedSummary<'a> {
    pub samples: Vec<FeedSample<'a>>,
    pub trend: Option<LinearTrend>,
    pub crossings: Vec<ThresholdCrossing>,
}

impl FeedSummary<'_> {
    /// Feeds whose amount could not be extracted.
    pub fn missing_amounts(&self) -> usize {
        self.samples.iter().filter(|s| s.amount.is_none()).count()
    }

    /// Mean of all known amounts.
    pub fn mean_amount(&self) -> Option<f64> {
        let known: Vec<f64> = self
            .samples
            .iter()
            .filter_map(|s| s.amount.map(f64::from))
            .collect();
        if known.is_empty() {
            return None;
        }
        #[expect(clippy::cast_precision_loss, reason = "sample counts are small")]
        let n = known.len() as f64;
        Some(known.iter().sum::<f64>() / n)
    }
}

/// Derives feed amounts and trends from the `Feed` partition of a log.
#[derive(Debug, Clone)]
pub struct FeedProcessor<'a> {
    table: &'a EventTable,
    amount: PatternExtractor,
    rolling_window: usize,
    thresholds_ml: Vec<u32>,
}

impl<'a> FeedProcessor<'a> {
    /// Fails if the log has no feed entries or the settings are invalid.
    pub fn new(tables: &'a TypedEventTables, config: &FeedConfig) -> Result<Self, ProcessError> {
        if config.rolling_window == 0 {
            return Err(ProcessError::EmptyWindow);
        }
        Ok(Self {
            table: tables.require(FEED_TYPE)?,
            amount: PatternExtractor::compile(&config.amount)?,
            rolling_window: config.rolling_window,
            thresholds_ml: config.thresholds_ml.clone(),
        })
    }

    /// Extracts the amount of one feed; a capture that is not an integer
    /// counts as missing.
    pub fn amount(&self, event: &RawEvent) -> Option<u32> {
        let token = self.amount.extract(event)?;
        match token.parse() {
            Ok(amount) => Some(amount),
            Err(_) => {
                tracing::debug!(%token, start = %event.start, "feed amount is not an integer");
                None
            }
        }
    }

    pub fn process(&self) -> FeedSummary<'a> {
        let started = Instant::now();

        let mut events: Vec<&'a RawEvent> = self.table.events().iter().collect();
        events.sort_by_key(|e| e.start);

        let amounts: Vec<Option<u32>> = events.iter().map(|e| self.amount(e)).collect();
        let averages = rolling_average(&amounts, self.rolling_window);

        let samples: Vec<FeedSample<'a>> = events
            .into_iter()
            .zip(amounts)
            .zip(averages)
            .map(|((event, amount), rolling_average)| FeedSample {
                event,
                amount,
                rolling_average,
            })
            .collect();

        let points: Vec<(NaiveDateTime, f64)> = samples
            .iter()
            .filter_map(|s| s.amount.map(|a| (s.event.start, f64::from(a))))
            .collect();
        let trend = LinearTrend::fit(&points);

        let crossings = self
            .thresholds_ml
            .iter()
            .map(|&threshold_ml| ThresholdCrossing {
                threshold_ml,
                date: trend.and_then(|t| t.crossing(f64::from(threshold_ml))),
            })
            .collect();

        tracing::debug!(
            samples = samples.len(),
            with_amount = points.len(),
            elapsed_ms = started.elapsed().as_secs_f64() * 1000.0,
            "processed feed events"
        );

        FeedSummary {
            samples,
            trend,
            crossings,
        }
    }
}

impl<'a> EventProcessor<'a> for FeedProcessor<'a> {
    fn type_name(&self) -> &'static str {
        FEED_TYPE
    }

    /// Rows are in chronological order, matching the rolling average.
    fn augment(&self) -> AugmentedTable<'a> {
        let summary = self.process();
        AugmentedTable {
            type_name: FEED_TYPE.to_string(),
            columns: vec![
                format!("{FEED_TYPE}_Amount"),
                format!("{FEED_TYPE}_Rolling_Avg"),
            ],
            rows: summary
                .samples
                .iter()
                .map(|s| AugmentedRow {
                    event: s.event,
                    values: vec![
                        s.amount.map(|a| a.to_string()),
                        s.rolling_average.map(|avg| format!("{avg:.2}")),
                    ],
                })
                .collect(),
        }
    }
}

/// Trailing mean over `window` values; undefined until the window is full or
/// while any value in it is missing.
fn rolling_average(values: &[Option<u32>], window: usize) -> Vec<Option<f64>> {
    (0..values.len())
        .map(|end| {
            if end + 1 < window {
                return None;
            }
            let slice = &values[end + 1 - window..=end];
            let sum = slice
                .iter()
                .map(|v| v.map(f64::from))
                .sum::<Option<f64>>()?;
            #[expect(clippy::cast_precision_loss, reason = "window sizes are small")]
            let n = window as f64;
            Some(sum / n)
        })
        .collect()
}
