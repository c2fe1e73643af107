//! In-memory event tables partitioned by type discriminator.

use std::collections::BTreeMap;

use crate::event::RawEvent;
use crate::processor::ProcessError;

/// An ordered collection of raw events.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventTable {
    events: Vec<RawEvent>,
}

impl EventTable {
    pub const fn new(events: Vec<RawEvent>) -> Self {
        Self { events }
    }

    pub fn events(&self) -> &[RawEvent] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Splits the table into one sub-table per type discriminator.
    ///
    /// Each sub-table preserves the relative order of the input.
    pub fn partition(self) -> TypedEventTables {
        let mut tables: BTreeMap<String, Vec<RawEvent>> = BTreeMap::new();
        for event in self.events {
            tables
                .entry(event.event_type.clone())
                .or_default()
                .push(event);
        }

        TypedEventTables {
            tables: tables
                .into_iter()
                .map(|(name, events)| (name, Self::new(events)))
                .collect(),
        }
    }
}

impl FromIterator<RawEvent> for EventTable {
    fn from_iter<I: IntoIterator<Item = RawEvent>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

/// Event tables keyed by type discriminator, ordered by type name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TypedEventTables {
    tables: BTreeMap<String, EventTable>,
}

impl TypedEventTables {
    pub fn get(&self, type_name: &str) -> Option<&EventTable> {
        self.tables.get(type_name)
    }

    /// Returns the table for a type that a processor cannot run without.
    pub fn require(&self, type_name: &str) -> Result<&EventTable, ProcessError> {
        self.get(type_name).ok_or_else(|| ProcessError::MissingType {
            type_name: type_name.to_string(),
        })
    }

    /// Iterates `(type name, table)` pairs in type-name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &EventTable)> {
        self.tables.iter().map(|(name, table)| (name.as_str(), table))
    }

    pub fn type_names(&self) -> impl Iterator<Item = &str> {
        self.tables.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use chrono::{NaiveDate, NaiveDateTime};

    fn at(hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 4, 16)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap()
    }

    #[test]
    fn partition_groups_by_type_preserving_order() {
        let table: EventTable = [
            RawEvent::new("Feed", at(1)),
            RawEvent::new("Diaper", at(2)),
            RawEvent::new("Feed", at(3)),
            RawEvent::new("Sleep", at(4)),
        ]
        .into_iter()
        .collect();

        let typed = table.partition();

        assert_eq!(
            typed.type_names().collect::<Vec<_>>(),
            vec!["Diaper", "Feed", "Sleep"]
        );
        let feeds = typed.get("Feed").unwrap();
        assert_eq!(feeds.len(), 2);
        assert_eq!(feeds.events()[0].start, at(1));
        assert_eq!(feeds.events()[1].start, at(3));
    }

    #[test]
    fn partition_is_case_sensitive() {
        let table: EventTable = [RawEvent::new("diaper", at(1))].into_iter().collect();
        let typed = table.partition();

        assert!(typed.get("Diaper").is_none());
        assert!(typed.get("diaper").is_some());
    }

    #[test]
    fn require_missing_type_names_it() {
        let typed = EventTable::default().partition();
        assert!(typed.is_empty());

        let err = typed.require("Diaper").unwrap_err();
        assert!(matches!(err, ProcessError::MissingType { ref type_name } if type_name == "Diaper"));
        assert!(err.to_string().contains("Diaper"));
    }
}
