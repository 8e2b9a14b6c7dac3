//! Core type definitions with validation.

use std::fmt;
use std::str::FromStr;

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Expected length of a `YYYYMMDD` date string.
const DATE_LEN: usize = 8;

/// Expected length of an `HH:MM` time string.
const TIME_LEN: usize = 5;

/// Hours an alarm time may span past its date's midnight (two calendar days).
const MAX_ALARM_HOURS: u32 = 48;

/// Validation errors for client-supplied values.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// The date string is not 8 characters long.
    #[error("date must be {DATE_LEN} characters (YYYYMMDD), got {value:?}")]
    DateShape { value: String },

    /// The time string is not 5 characters long.
    #[error("time must be {TIME_LEN} characters (HH:MM), got {value:?}")]
    TimeShape { value: String },

    /// The date has the right shape but is not a calendar date.
    #[error("invalid date: {value}")]
    InvalidDate { value: String },

    /// The time has the right shape but is not a clock time.
    #[error("invalid time: {value}")]
    InvalidTime { value: String },

    /// Unrecognized sleep type string.
    #[error("unknown sleep type: {value}")]
    UnknownSleepType { value: String },
}

/// Checks the shape of a date/time pair sent by a client.
///
/// Only lengths are checked here; [`AlarmDate`] and [`AlarmTime`] parsing do
/// the rest.
pub fn validate_alarm_input(date: &str, time: &str) -> Result<(), ValidationError> {
    if date.chars().count() != DATE_LEN {
        return Err(ValidationError::DateShape {
            value: date.to_string(),
        });
    }
    if time.chars().count() != TIME_LEN {
        return Err(ValidationError::TimeShape {
            value: time.to_string(),
        });
    }
    Ok(())
}

/// A calendar date in `YYYYMMDD` form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AlarmDate(NaiveDate);

impl AlarmDate {
    /// Parses a `YYYYMMDD` string.
    pub fn parse(value: &str) -> Result<Self, ValidationError> {
        if value.chars().count() != DATE_LEN {
            return Err(ValidationError::DateShape {
                value: value.to_string(),
            });
        }
        if !value.bytes().all(|b| b.is_ascii_digit()) {
            return Err(ValidationError::InvalidDate {
                value: value.to_string(),
            });
        }
        NaiveDate::parse_from_str(value, "%Y%m%d")
            .map(Self)
            .map_err(|_| ValidationError::InvalidDate {
                value: value.to_string(),
            })
    }

    pub const fn from_naive(date: NaiveDate) -> Self {
        Self(date)
    }

    pub const fn naive(&self) -> NaiveDate {
        self.0
    }

    /// The following calendar day.
    #[must_use]
    pub fn succ(&self) -> Self {
        Self(self.0 + Duration::days(1))
    }
}

impl fmt::Display for AlarmDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y%m%d"))
    }
}

impl FromStr for AlarmDate {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for AlarmDate {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<AlarmDate> for String {
    fn from(date: AlarmDate) -> Self {
        date.to_string()
    }
}

/// A wall-clock alarm time in `HH:MM` form, relative to an alarm date.
///
/// The hour may exceed 23: an hour of 30 on date D means 06:00 on D + 1.
/// Such values only come out of the night rule for sleep starting at 23:xx
/// and are kept as-is so that stored alarms render back identically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AlarmTime {
    hour: u32,
    minute: u32,
}

impl AlarmTime {
    /// Builds a time, rejecting minutes ≥ 60 and hours beyond two days.
    pub fn new(hour: u32, minute: u32) -> Option<Self> {
        (hour < MAX_ALARM_HOURS && minute < 60).then_some(Self { hour, minute })
    }

    pub(crate) const fn from_parts(hour: u32, minute: u32) -> Self {
        Self { hour, minute }
    }

    /// Parses an `HH:MM` string.
    pub fn parse(value: &str) -> Result<Self, ValidationError> {
        if value.chars().count() != TIME_LEN {
            return Err(ValidationError::TimeShape {
                value: value.to_string(),
            });
        }
        let invalid = || ValidationError::InvalidTime {
            value: value.to_string(),
        };
        let (hour, minute) = value.split_once(':').ok_or_else(invalid)?;
        if hour.len() != 2 || !hour.bytes().chain(minute.bytes()).all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        let hour = hour.parse().map_err(|_| invalid())?;
        let minute = minute.parse().map_err(|_| invalid())?;
        Self::new(hour, minute).ok_or_else(invalid)
    }

    /// Time of day of a local wall-clock value.
    pub fn of(local: NaiveDateTime) -> Self {
        Self {
            hour: local.hour(),
            minute: local.minute(),
        }
    }

    pub const fn hour(&self) -> u32 {
        self.hour
    }

    pub const fn minute(&self) -> u32 {
        self.minute
    }

    /// The local wall-clock value this time denotes on `date`.
    pub fn on(&self, date: AlarmDate) -> NaiveDateTime {
        let day = date.naive() + Duration::days(i64::from(self.hour / 24));
        let time =
            NaiveTime::from_hms_opt(self.hour % 24, self.minute, 0).unwrap_or(NaiveTime::MIN);
        day.and_time(time)
    }

    /// Inverse of [`AlarmTime::on`]: the time on `date` that lands on `local`.
    ///
    /// Returns `None` when `local` is before `date` or too far past it.
    pub fn since(date: AlarmDate, local: NaiveDateTime) -> Option<Self> {
        let days = (local.date() - date.naive()).num_days();
        let days = u32::try_from(days).ok()?;
        Self::new(days.checked_mul(24)?.checked_add(local.hour())?, local.minute())
    }
}

impl fmt::Display for AlarmTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

impl FromStr for AlarmTime {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for AlarmTime {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<AlarmTime> for String {
    fn from(time: AlarmTime) -> Self {
        time.to_string()
    }
}
