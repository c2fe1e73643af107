//! Fallback pattern extraction from free-text columns.
//!
//! The same fact has lived in different columns across revisions of the
//! export format, e.g. a pee amount appears as `pee:<amount>` in the end
//! condition of newer entries but only inside the notes of older ones. An
//! extractor therefore holds an ordered list of `(column, pattern)` rules
//! and returns the capture of the first rule that matches.

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

use crate::event::{EventField, RawEvent};
use crate::processor::ProcessError;

/// One candidate location for a value: a column and a pattern whose first
/// capture group holds the value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionRule {
    pub field: EventField,
    pub pattern: String,
}

impl ExtractionRule {
    pub fn new(field: EventField, pattern: impl Into<String>) -> Self {
        Self {
            field,
            pattern: pattern.into(),
        }
    }
}

#[derive(Debug, Clone)]
struct CompiledRule {
    field: EventField,
    regex: Regex,
}

/// Compiles a pattern case-insensitively.
fn compile(pattern: &str) -> Result<Regex, ProcessError> {
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .build()
        .map_err(|source| ProcessError::InvalidPattern {
            pattern: pattern.to_string(),
            source,
        })
}

/// Pulls a normalized token out of an event by trying rules in priority order.
#[derive(Debug, Clone)]
pub struct PatternExtractor {
    rules: Vec<CompiledRule>,
}

impl PatternExtractor {
    /// Compiles the rules, keeping their order as the fallback order.
    ///
    /// Every pattern must contain at least one capture group.
    pub fn compile(rules: &[ExtractionRule]) -> Result<Self, ProcessError> {
        let rules = rules
            .iter()
            .map(|rule| {
                let regex = compile(&rule.pattern)?;
                // captures_len counts the implicit whole-match group
                if regex.captures_len() < 2 {
                    return Err(ProcessError::MissingCapture {
                        pattern: rule.pattern.clone(),
                    });
                }
                Ok(CompiledRule {
                    field: rule.field,
                    regex,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { rules })
    }

    /// Returns the lower-cased first capture of the first matching rule.
    ///
    /// Absent columns, non-matching text and empty captures all fall through
    /// to the next rule; `None` means no rule produced a token.
    pub fn extract(&self, event: &RawEvent) -> Option<String> {
        self.rules.iter().find_map(|rule| {
            let text = event.field(rule.field)?;
            let captures = rule.regex.captures(text)?;
            let token = captures.get(1)?.as_str().trim();
            (!token.is_empty()).then(|| token.to_lowercase())
        })
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

/// A whole-word phrase to look for in one column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlagRule {
    pub field: EventField,
    pub phrase: String,
}

impl FlagRule {
    pub fn new(field: EventField, phrase: impl Into<String>) -> Self {
        Self {
            field,
            phrase: phrase.into(),
        }
    }
}

/// Case-insensitive whole-word phrase detection.
#[derive(Debug, Clone)]
pub struct FlagDetector {
    field: EventField,
    regex: Regex,
}

impl FlagDetector {
    pub fn compile(rule: &FlagRule) -> Result<Self, ProcessError> {
        let pattern = format!(r"\b{}\b", regex::escape(rule.phrase.trim()));
        Ok(Self {
            field: rule.field,
            regex: compile(&pattern)?,
        })
    }

    /// True iff the phrase occurs as a whole word; absent text is `false`.
    pub fn detect(&self, event: &RawEvent) -> bool {
        event
            .field(self.field)
            .is_some_and(|text| self.regex.is_match(text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use chrono::NaiveDate;

    fn event() -> RawEvent {
        let start = NaiveDate::from_ymd_opt(2025, 4, 16)
            .unwrap()
            .and_hms_opt(7, 31, 0)
            .unwrap();
        RawEvent::new("Diaper", start)
    }

    fn pee_extractor() -> PatternExtractor {
        PatternExtractor::compile(&[
            ExtractionRule::new(EventField::EndCondition, r"\bpee:\s*(\w+)"),
            ExtractionRule::new(EventField::Notes, r"\bpee:\s*(\w+)"),
        ])
        .unwrap()
    }

    #[test]
    fn structured_column_wins_over_notes() {
        let mut e = event();
        e.end_condition = Some("pee:large".to_string());
        e.notes = Some("Pee:small".to_string());
        assert_eq!(pee_extractor().extract(&e).as_deref(), Some("large"));
    }

    #[test]
    fn falls_back_to_notes() {
        let mut e = event();
        e.end_condition = Some("Poo:medium".to_string());
        e.notes = Some("Pee:small".to_string());
        assert_eq!(pee_extractor().extract(&e).as_deref(), Some("small"));
    }

    #[test]
    fn matching_is_case_insensitive_and_lowercases() {
        let mut e = event();
        e.end_condition = Some("PEE:Medium".to_string());
        assert_eq!(pee_extractor().extract(&e).as_deref(), Some("medium"));
    }

    #[test]
    fn absence_is_not_an_error() {
        let e = event();
        assert_eq!(pee_extractor().extract(&e), None);

        let mut e = event();
        e.notes = Some("Wet, changed at daycare".to_string());
        assert_eq!(pee_extractor().extract(&e), None);
    }

    #[test]
    fn combined_entry_extracts_each_kind_independently() {
        let poo = PatternExtractor::compile(&[ExtractionRule::new(
            EventField::EndCondition,
            r"\bpoo:\s*(\w+)",
        )])
        .unwrap();

        let mut e = event();
        e.end_condition = Some("Both, pee:medium poo:small".to_string());

        assert_eq!(pee_extractor().extract(&e).as_deref(), Some("medium"));
        assert_eq!(poo.extract(&e).as_deref(), Some("small"));
    }

    #[test]
    fn empty_capture_falls_through() {
        let extractor = PatternExtractor::compile(&[
            ExtractionRule::new(EventField::EndCondition, r"pee:(\w*)"),
            ExtractionRule::new(EventField::Notes, r"pee:(\w*)"),
        ])
        .unwrap();

        let mut e = event();
        e.end_condition = Some("pee:".to_string());
        e.notes = Some("pee:large".to_string());
        assert_eq!(extractor.extract(&e).as_deref(), Some("large"));
    }

    #[test]
    fn pattern_without_capture_is_rejected() {
        let err = PatternExtractor::compile(&[ExtractionRule::new(EventField::Notes, "pee")])
            .unwrap_err();
        assert!(matches!(err, ProcessError::MissingCapture { .. }));
    }

    #[test]
    fn invalid_regex_is_rejected() {
        let err = PatternExtractor::compile(&[ExtractionRule::new(EventField::Notes, "pee:(")])
            .unwrap_err();
        assert!(matches!(err, ProcessError::InvalidPattern { .. }));
        assert!(err.to_string().contains("pee:("));
    }

    #[test]
    fn flag_matches_whole_words_only() {
        let fart = FlagDetector::compile(&FlagRule::new(EventField::Notes, "fart")).unwrap();

        let mut e = event();
        e.notes = Some("Big FART during change".to_string());
        assert!(fart.detect(&e));

        e.notes = Some("farting around".to_string());
        assert!(!fart.detect(&e));

        e.notes = None;
        assert!(!fart.detect(&e));
    }

    #[test]
    fn flag_phrase_with_spaces() {
        let rash =
            FlagDetector::compile(&FlagRule::new(EventField::StartLocation, "diaper rash")).unwrap();

        let mut e = event();
        e.start_location = Some("Diaper rash".to_string());
        assert!(rash.detect(&e));

        e.start_location = Some("diaperrash".to_string());
        assert!(!rash.detect(&e));
    }
}
