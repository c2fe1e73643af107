//! Ordinal amount scale for diaper contents.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// The fixed ordered amount domain: `none < small < medium < large`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum AmountLevel {
    None,
    Small,
    Medium,
    Large,
}

impl AmountLevel {
    /// Every level, in ordinal order.
    pub const ALL: [Self; 4] = [Self::None, Self::Small, Self::Medium, Self::Large];

    /// The levels that describe an actual amount, excluding `none`.
    pub const PRESENT: [Self; 3] = [Self::Small, Self::Medium, Self::Large];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Small => "small",
            Self::Medium => "medium",
            Self::Large => "large",
        }
    }

    /// Ordinal value in \[0, 3\].
    pub const fn ordinal(self) -> u8 {
        match self {
            Self::None => 0,
            Self::Small => 1,
            Self::Medium => 2,
            Self::Large => 3,
        }
    }
}

impl fmt::Display for AmountLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for AmountLevel {
    type Err = UnknownAmount;

    /// Exact match only; callers normalize case before mapping.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "none" => Ok(Self::None),
            "small" => Ok(Self::Small),
            "medium" => Ok(Self::Medium),
            "large" => Ok(Self::Large),
            _ => Err(UnknownAmount(s.to_string())),
        }
    }
}

/// Error type for labels outside the amount domain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownAmount(String);

impl fmt::Display for UnknownAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown amount: {}", self.0)
    }
}

impl std::error::Error for UnknownAmount {}

/// An extracted amount label.
///
/// `Known(AmountLevel::None)` is a real observation ("explicitly nothing"),
/// while `Unrecognized` could not be classified and carries no ordinal.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AmountLabel {
    Known(AmountLevel),
    Unrecognized(String),
}

impl AmountLabel {
    /// Maps a normalized token onto the amount domain.
    pub fn classify(token: &str) -> Self {
        token
            .parse()
            .map_or_else(|_| Self::Unrecognized(token.to_string()), Self::Known)
    }

    /// The label text as extracted.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Known(level) => level.as_str(),
            Self::Unrecognized(token) => token,
        }
    }

    pub const fn level(&self) -> Option<AmountLevel> {
        match self {
            Self::Known(level) => Some(*level),
            Self::Unrecognized(_) => None,
        }
    }

    /// The ordinal value, defined only for labels in the domain.
    pub const fn value(&self) -> Option<u8> {
        match self {
            Self::Known(level) => Some(level.ordinal()),
            Self::Unrecognized(_) => None,
        }
    }
}

impl fmt::Display for AmountLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
