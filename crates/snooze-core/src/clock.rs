//! Time source and local-time conversions.
//!
//! Every wall-clock decision goes through a [`Clock`] so the binary can use
//! the system time zone while tests pin both the instant and the offset.

use chrono::{DateTime, FixedOffset, Local, LocalResult, NaiveDateTime, Offset, TimeZone, Utc};

use crate::types::{AlarmDate, AlarmTime};

/// Source of the current instant and of the local time zone.
pub trait Clock: Send + Sync {
    /// The current instant.
    fn now(&self) -> DateTime<Utc>;

    /// Wall-clock time of `instant` in the local time zone.
    fn to_local(&self, instant: DateTime<Utc>) -> NaiveDateTime;

    /// Instant of a local wall-clock time.
    ///
    /// Ambiguous times (DST fall-back) resolve to the earlier instant; times
    /// inside a DST gap have no instant.
    fn from_local(&self, local: NaiveDateTime) -> Option<DateTime<Utc>>;

    /// Local wall-clock time of an epoch timestamp in seconds.
    fn local_from_epoch(&self, epoch: i64) -> Option<NaiveDateTime> {
        DateTime::from_timestamp(epoch, 0).map(|instant| self.to_local(instant))
    }

    /// Epoch seconds of `time` on `date`.
    fn alarm_epoch(&self, date: AlarmDate, time: AlarmTime) -> Option<i64> {
        self.from_local(time.on(date)).map(|instant| instant.timestamp())
    }

    /// `HH:MM` of a stored alarm epoch, relative to its date.
    fn alarm_time_of(&self, date: AlarmDate, epoch: i64) -> Option<AlarmTime> {
        AlarmTime::since(date, self.local_from_epoch(epoch)?)
    }
}

fn earliest<Tz: TimeZone>(result: LocalResult<DateTime<Tz>>) -> Option<DateTime<Utc>> {
    match result {
        LocalResult::Single(dt) => Some(dt.with_timezone(&Utc)),
        // Zone databases do not agree on which instant comes first.
        LocalResult::Ambiguous(a, b) => Some(a.with_timezone(&Utc).min(b.with_timezone(&Utc))),
        LocalResult::None => None,
    }
}

/// The system clock in the machine's local time zone.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn to_local(&self, instant: DateTime<Utc>) -> NaiveDateTime {
        instant.with_timezone(&Local).naive_local()
    }

    fn from_local(&self, local: NaiveDateTime) -> Option<DateTime<Utc>> {
        earliest(Local.from_local_datetime(&local))
    }
}

/// A clock frozen at one instant with a fixed UTC offset.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock {
    now: DateTime<Utc>,
    offset: FixedOffset,
}

impl FixedClock {
    pub const fn new(now: DateTime<Utc>, offset: FixedOffset) -> Self {
        Self { now, offset }
    }

    /// A UTC clock at `now`.
    pub fn utc(now: DateTime<Utc>) -> Self {
        Self::new(now, Utc.fix())
    }

    /// A clock whose local wall-clock time is `local` in `offset`.
    pub fn at_local(local: NaiveDateTime, offset: FixedOffset) -> Self {
        let now = earliest(offset.from_local_datetime(&local))
            .unwrap_or_else(|| local.and_utc());
        Self::new(now, offset)
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.now
    }

    fn to_local(&self, instant: DateTime<Utc>) -> NaiveDateTime {
        instant.with_timezone(&self.offset).naive_local()
    }

    fn from_local(&self, local: NaiveDateTime) -> Option<DateTime<Utc>> {
        earliest(self.offset.from_local_datetime(&local))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn local(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, 0)
            .unwrap()
    }

    #[test]
    fn fixed_clock_applies_offset() {
        let offset = FixedOffset::east_opt(2 * 3600).unwrap();
        let clock = FixedClock::at_local(local(2025, 3, 1, 2, 15), offset);

        assert_eq!(clock.now().to_rfc3339(), "2025-03-01T00:15:00+00:00");
        assert_eq!(clock.to_local(clock.now()), local(2025, 3, 1, 2, 15));
    }

    #[test]
    fn alarm_epoch_roundtrips_without_drift() {
        let offset = FixedOffset::west_opt(5 * 3600).unwrap();
        let clock = FixedClock::at_local(local(2025, 3, 1, 12, 0), offset);
        let date = AlarmDate::parse("20250301").unwrap();

        for time in ["00:00", "06:30", "09:15", "23:59", "30:45"] {
            let time = AlarmTime::parse(time).unwrap();
            let epoch = clock.alarm_epoch(date, time).unwrap();
            assert_eq!(clock.alarm_time_of(date, epoch), Some(time));
        }
    }

    #[test]
    fn alarm_epoch_matches_wall_clock() {
        let clock = FixedClock::utc(local(2025, 3, 1, 0, 0).and_utc());
        let date = AlarmDate::parse("20250301").unwrap();
        let epoch = clock
            .alarm_epoch(date, AlarmTime::parse("09:15").unwrap())
            .unwrap();

        assert_eq!(epoch, local(2025, 3, 1, 9, 15).and_utc().timestamp());
    }

    /// New York on the 2025-11-02 fall-back night, listing the later
    /// instant of an ambiguous wall time first.
    struct FallBackClock;

    impl FallBackClock {
        fn offset(instant: DateTime<Utc>) -> FixedOffset {
            let transition = local(2025, 11, 2, 6, 0).and_utc();
            let hours = if instant < transition { 4 } else { 5 };
            FixedOffset::west_opt(hours * 3600).unwrap()
        }
    }

    impl Clock for FallBackClock {
        fn now(&self) -> DateTime<Utc> {
            local(2025, 11, 2, 5, 0).and_utc()
        }

        fn to_local(&self, instant: DateTime<Utc>) -> NaiveDateTime {
            instant.with_timezone(&Self::offset(instant)).naive_local()
        }

        fn from_local(&self, local: NaiveDateTime) -> Option<DateTime<Utc>> {
            let [later, earlier] = [5, 4].map(|hours| {
                FixedOffset::west_opt(hours * 3600)
                    .unwrap()
                    .from_local_datetime(&local)
                    .unwrap()
            });
            earliest(LocalResult::Ambiguous(later, earlier))
        }
    }

    #[test]
    fn ambiguous_local_time_resolves_to_earlier_instant() {
        let clock = FallBackClock;
        let date = AlarmDate::parse("20251102").unwrap();
        let epoch = clock
            .alarm_epoch(date, AlarmTime::parse("01:30").unwrap())
            .unwrap();

        assert_eq!(epoch, local(2025, 11, 2, 5, 30).and_utc().timestamp());
        assert_eq!(epoch, (clock.now() + chrono::Duration::minutes(30)).timestamp());
        assert_eq!(clock.alarm_time_of(date, epoch), AlarmTime::parse("01:30").ok());
    }

    #[test]
    fn alarm_time_of_rejects_epochs_before_the_date() {
        let clock = FixedClock::utc(local(2025, 3, 1, 0, 0).and_utc());
        let date = AlarmDate::parse("20250301").unwrap();
        let epoch = local(2025, 2, 28, 23, 0).and_utc().timestamp();

        assert_eq!(clock.alarm_time_of(date, epoch), None);
    }
}
