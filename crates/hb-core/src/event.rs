//! Raw log entries as exported by the tracking app.

use std::fmt;

use chrono::{NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};

/// One logged entry.
///
/// The text columns are reused by different event types for different
/// purposes (a diaper entry stores the poop color under `duration`, a feed
/// entry stores the amount under `end_condition`), so they are kept as
/// untyped optional strings here and interpreted by the per-type processors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawEvent {
    /// The type discriminator (e.g., "Diaper", "Feed").
    pub event_type: String,
    /// When the entry started, in the logger's local wall-clock time.
    pub start: NaiveDateTime,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<NaiveDateTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_condition: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_condition: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl RawEvent {
    /// Creates an event with only the required columns set.
    pub fn new(event_type: impl Into<String>, start: NaiveDateTime) -> Self {
        Self {
            event_type: event_type.into(),
            start,
            end: None,
            duration: None,
            start_condition: None,
            start_location: None,
            end_condition: None,
            notes: None,
        }
    }

    /// Returns the text stored in the given column, if any.
    pub fn field(&self, field: EventField) -> Option<&str> {
        let value = match field {
            EventField::Duration => &self.duration,
            EventField::StartCondition => &self.start_condition,
            EventField::StartLocation => &self.start_location,
            EventField::EndCondition => &self.end_condition,
            EventField::Notes => &self.notes,
        };
        value.as_deref()
    }

    /// Returns the hour-of-day bucket of the start timestamp.
    pub fn hour(&self) -> HourBucket {
        HourBucket::of(&self.start)
    }
}

/// The free-text columns of a [`RawEvent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventField {
    Duration,
    StartCondition,
    StartLocation,
    EndCondition,
    Notes,
}

impl EventField {
    /// Column header used by the CSV export.
    pub const fn header(self) -> &'static str {
        match self {
            Self::Duration => "Duration",
            Self::StartCondition => "Start Condition",
            Self::StartLocation => "Start Location",
            Self::EndCondition => "End Condition",
            Self::Notes => "Notes",
        }
    }
}

impl fmt::Display for EventField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.header())
    }
}

/// Number of hour buckets in a day.
pub const HOURS_PER_DAY: usize = 24;

/// An hour-of-day in \[0, 23\].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct HourBucket(u8);

impl HourBucket {
    /// Creates a bucket, returning `None` outside \[0, 23\].
    pub fn new(hour: u32) -> Option<Self> {
        u8::try_from(hour)
            .ok()
            .filter(|h| usize::from(*h) < HOURS_PER_DAY)
            .map(Self)
    }

    /// Returns the bucket a timestamp falls into.
    #[expect(
        clippy::cast_possible_truncation,
        reason = "Timelike::hour is always below 24"
    )]
    pub fn of(timestamp: &NaiveDateTime) -> Self {
        Self(timestamp.hour() as u8)
    }

    /// Iterates all 24 buckets in order.
    pub fn all() -> impl Iterator<Item = Self> {
        (0u8..24).map(Self)
    }

    pub const fn index(self) -> usize {
        self.0 as usize
    }

    pub const fn value(self) -> u8 {
        self.0
    }
}

impl fmt::Display for HourBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use chrono::NaiveDate;

    fn at(hour: u32, minute: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 4, 16)
            .unwrap()
            .and_hms_opt(hour, minute, 0)
            .unwrap()
    }

    #[test]
    fn hour_bucket_from_start() {
        let event = RawEvent::new("Diaper", at(10, 37));
        assert_eq!(event.hour().value(), 10);

        let midnight = RawEvent::new("Diaper", at(0, 0));
        assert_eq!(midnight.hour().index(), 0);

        let late = RawEvent::new("Diaper", at(23, 59));
        assert_eq!(late.hour().index(), 23);
    }

    #[test]
    fn hour_bucket_rejects_out_of_range() {
        assert!(HourBucket::new(23).is_some());
        assert!(HourBucket::new(24).is_none());
        assert!(HourBucket::new(300).is_none());
    }

    #[test]
    fn all_buckets_cover_the_day() {
        let hours: Vec<u8> = HourBucket::all().map(HourBucket::value).collect();
        assert_eq!(hours.len(), HOURS_PER_DAY);
        assert_eq!(hours.first(), Some(&0));
        assert_eq!(hours.last(), Some(&23));
    }

    #[test]
    fn field_accessor_maps_columns() {
        let mut event = RawEvent::new("Diaper", at(3, 33));
        event.duration = Some("red".to_string());
        event.start_location = Some("Diaper rash".to_string());

        assert_eq!(event.field(EventField::Duration), Some("red"));
        assert_eq!(event.field(EventField::StartLocation), Some("Diaper rash"));
        assert_eq!(event.field(EventField::Notes), None);
    }

    #[test]
    fn event_field_uses_snake_case_names() {
        let json = serde_json::to_string(&EventField::EndCondition).unwrap();
        assert_eq!(json, r#""end_condition""#);
        let parsed: EventField = serde_json::from_str(r#""start_location""#).unwrap();
        assert_eq!(parsed, EventField::StartLocation);
    }
}
