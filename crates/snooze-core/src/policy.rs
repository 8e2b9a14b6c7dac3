//! Alarm policy: maps a sleep to the time an alarm should ring.
//!
//! Everything here is pure. Callers fetch the latest sleep and any existing
//! alarm from storage, then hand the values to these functions.
//!
//! # Rules
//!
//! | Sleep                         | Alarm date  | Alarm time            |
//! |-------------------------------|-------------|-----------------------|
//! | nap                           | end of nap  | end of nap            |
//! | night, 00:00-08:59            | same day    | sleep + 7h            |
//! | night, 09:00-22:59            | next day    | 06:30                 |
//! | night, 23:00-23:59            | next day    | sleep hour + 7 (`30:MM`) |

use std::fmt;

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveDateTime, Timelike, Utc};
use serde::{Serialize, Serializer};
use tracing::debug;

use crate::clock::Clock;
use crate::sleep_type::SleepType;
use crate::types::{AlarmDate, AlarmTime};

/// Fallback alarm time when no rule applies.
pub const DEFAULT_ALARM_TIME: AlarmTime = AlarmTime::from_parts(9, 0);

/// Alarm for anyone who went to bed in the evening.
pub const EARLIEST_ALARM_TIME: AlarmTime = AlarmTime::from_parts(6, 30);

/// Hours of sleep granted after a post-midnight bedtime.
pub const NECESSARY_SLEEP_HOURS: u32 = 7;

/// Sleeps starting before this hour wake up the same calendar day.
const MORNING_CUTOFF_HOUR: u32 = 9;

/// Sleeps starting at this hour fall into the "add 7 hours" branch.
const LATE_NIGHT_HOUR: u32 = 23;

/// How far in the past a stored alarm can be and still count as current.
pub const EXISTING_ALARM_GRACE: Duration = Duration::minutes(15);

/// Why an alarm time was chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reason {
    ExistingAlarm,
    NoSleepTime,
    InvalidDate,
    SleptEarly,
    SleptAfterMidnight,
    Unrecognized,
    NapDuration,
}

impl Reason {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::ExistingAlarm => "existing alarm",
            Self::NoSleepTime => "no sleep time found",
            Self::InvalidDate => "invalid date",
            Self::SleptEarly => "slept early enough, default to earliest time",
            Self::SleptAfterMidnight => "slept after midnight, calculated 7 hours",
            Self::Unrecognized => "could not recognize the case, using default.",
            Self::NapDuration => "nap, alarm after expected duration",
        }
    }
}

impl fmt::Display for Reason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Reason {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Result of the night rule. `time` is `None` when the caller should fall
/// back to its default.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuleOutcome {
    pub time: Option<AlarmTime>,
    pub reason: Reason,
}

impl RuleOutcome {
    /// The computed time, or `default` with the same reason.
    pub fn or_default(self, default: AlarmTime) -> (AlarmTime, Reason) {
        (self.time.unwrap_or(default), self.reason)
    }
}

/// Alarm derived right after a sleep was recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlarmDecision {
    pub date: AlarmDate,
    pub time: AlarmTime,
    pub reason: Reason,
    /// Exact instant to ring at, when the rule measures from the sleep itself.
    pub instant: Option<DateTime<Utc>>,
}

/// Answer to "when should the alarm ring on this date?".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlarmResolution {
    pub time: AlarmTime,
    pub reason: Reason,
    /// Local time of the sleep the night rule ran against, if it ran.
    pub slept_at: Option<NaiveDateTime>,
}

impl AlarmResolution {
    const fn fallback(default: AlarmTime, reason: Reason) -> Self {
        Self {
            time: default,
            reason,
            slept_at: None,
        }
    }
}

/// The night rule.
///
/// Evening sleep always gets [`EARLIEST_ALARM_TIME`]. Sleep at 23:xx, or
/// after midnight on `requested` itself, gets the sleep time plus
/// [`NECESSARY_SLEEP_HOURS`]. The hour is not wrapped, so 23:40 yields
/// `30:40`, which stands for 06:40 on the day after `requested`.
pub fn calculate_alarm_time(slept: NaiveDateTime, requested: AlarmDate) -> RuleOutcome {
    let hour = slept.hour();
    let minute = slept.minute();

    if (MORNING_CUTOFF_HOUR..LATE_NIGHT_HOUR).contains(&hour) {
        return RuleOutcome {
            time: Some(EARLIEST_ALARM_TIME),
            reason: Reason::SleptEarly,
        };
    }

    let after_midnight = hour < MORNING_CUTOFF_HOUR && slept.date() == requested.naive();
    if hour == LATE_NIGHT_HOUR || after_midnight {
        return RuleOutcome {
            time: Some(AlarmTime::from_parts(hour + NECESSARY_SLEEP_HOURS, minute)),
            reason: Reason::SleptAfterMidnight,
        };
    }

    RuleOutcome {
        time: None,
        reason: Reason::Unrecognized,
    }
}

/// Whether `requested` is too far from the sleep day to reason about.
///
/// Only the sleep day itself and the day after it are valid.
pub fn is_invalid_date(slept: NaiveDate, requested: NaiveDate) -> bool {
    let slept = slept.num_days_from_ce();
    let requested = requested.num_days_from_ce();
    slept > requested || slept < requested - 1
}

/// Derives the alarm to set right after a sleep starting at `slept_at`.
pub fn determine_alarm_time(
    clock: &dyn Clock,
    slept_at: DateTime<Utc>,
    sleep_type: SleepType,
    default: AlarmTime,
) -> AlarmDecision {
    if sleep_type.is_nap() {
        let instant = slept_at + Duration::minutes(sleep_type.expected_duration_minutes());
        let wake = clock.to_local(instant);
        debug!(%sleep_type, %wake, "nap alarm");
        return AlarmDecision {
            date: AlarmDate::from_naive(wake.date()),
            time: AlarmTime::of(wake),
            reason: Reason::NapDuration,
            instant: Some(instant),
        };
    }

    let slept = clock.to_local(slept_at);
    let same_day = AlarmDate::from_naive(slept.date());
    let date = if slept.hour() < MORNING_CUTOFF_HOUR {
        same_day
    } else {
        same_day.succ()
    };
    let (time, reason) = calculate_alarm_time(slept, date).or_default(default);
    debug!(%slept, %date, %time, %reason, "night alarm");
    AlarmDecision {
        date,
        time,
        reason,
        instant: None,
    }
}

/// Resolves the alarm for `requested` from what storage knows.
///
/// `existing` is a stored alarm that is still current (see
/// [`existing_alarm_threshold`]); `latest_sleep` is the local time of the
/// most recent sleep.
pub fn resolve_alarm(
    existing: Option<AlarmTime>,
    latest_sleep: Option<NaiveDateTime>,
    requested: AlarmDate,
    default: AlarmTime,
) -> AlarmResolution {
    if let Some(time) = existing {
        return AlarmResolution::fallback(time, Reason::ExistingAlarm);
    }
    let Some(slept) = latest_sleep else {
        return AlarmResolution::fallback(default, Reason::NoSleepTime);
    };
    if is_invalid_date(slept.date(), requested.naive()) {
        return AlarmResolution::fallback(default, Reason::InvalidDate);
    }
    let (time, reason) = calculate_alarm_time(slept, requested).or_default(default);
    AlarmResolution {
        time,
        reason,
        slept_at: Some(slept),
    }
}

/// Oldest alarm instant that still counts as the current alarm.
pub fn existing_alarm_threshold(now: DateTime<Utc>) -> DateTime<Utc> {
    now - EXISTING_ALARM_GRACE
}
