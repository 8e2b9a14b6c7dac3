//! Core domain logic for sleep tracking.
//!
//! This crate contains the fundamental types and logic for:
//! - Sleep types and their expected durations
//! - `YYYYMMDD` dates and `HH:MM` alarm times, with shape validation
//! - The alarm policy deciding when an alarm should ring
//! - An injectable clock for local-time conversions

pub mod clock;
pub mod policy;
pub mod sleep_type;
pub mod types;

pub use clock::{Clock, FixedClock, SystemClock};
pub use policy::{
    AlarmDecision, AlarmResolution, DEFAULT_ALARM_TIME, Reason, RuleOutcome, calculate_alarm_time,
    determine_alarm_time, existing_alarm_threshold, is_invalid_date, resolve_alarm,
};
pub use sleep_type::SleepType;
pub use types::{AlarmDate, AlarmTime, ValidationError, validate_alarm_input};
