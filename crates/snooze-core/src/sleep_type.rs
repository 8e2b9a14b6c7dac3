//! Sleep type enum as the single source of truth for sleep type strings.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::types::ValidationError;

/// Category of a recorded sleep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SleepType {
    #[default]
    Night,
    ShortNap,
    LongNap,
}

impl SleepType {
    /// String representation for database storage and the wire format.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Night => "night",
            Self::ShortNap => "short_nap",
            Self::LongNap => "long_nap",
        }
    }

    /// How long this kind of sleep is expected to last, in minutes.
    ///
    /// This is the only source of the expected duration; it is never stored
    /// independently of the sleep type.
    #[must_use]
    pub const fn expected_duration_minutes(&self) -> i64 {
        match self {
            Self::Night => 420,
            Self::ShortNap => 30,
            Self::LongNap => 60,
        }
    }

    /// Whether this sleep gets a duration-based alarm.
    #[must_use]
    pub const fn is_nap(&self) -> bool {
        matches!(self, Self::ShortNap | Self::LongNap)
    }
}

impl fmt::Display for SleepType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for SleepType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "night" => Ok(Self::Night),
            "short_nap" => Ok(Self::ShortNap),
            "long_nap" => Ok(Self::LongNap),
            _ => Err(ValidationError::UnknownSleepType {
                value: s.to_string(),
            }),
        }
    }
}

impl Serialize for SleepType {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for SleepType {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
