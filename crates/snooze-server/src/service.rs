//! Request-level operations combining storage and the alarm policy.
//!
//! Each function locks the database once and holds it until done, so
//! recording a sleep and storing its derived alarm cannot interleave with
//! another request.

use chrono::NaiveDateTime;
use snooze_core::{
    AlarmDate, AlarmDecision, AlarmResolution, AlarmTime, Clock, SleepType, determine_alarm_time,
    existing_alarm_threshold, resolve_alarm,
};
use snooze_db::{AlarmRecord, Database, DbError, SleepEvent};
use tracing::{debug, info};

use crate::error::ApiError;
use crate::state::AppState;

/// A recorded sleep and the alarm derived from it.
#[derive(Debug, Clone)]
pub struct ScheduledSleep {
    pub sleep: SleepEvent,
    /// Local wall-clock time the sleep started.
    pub slept_local: NaiveDateTime,
    pub alarm: AlarmDecision,
}

/// Records a sleep starting now and stores the alarm derived from it.
///
/// Nothing is stored when the alarm has no instant. An identical alarm
/// already being stored is not an error.
pub fn record_sleep(state: &AppState, sleep_type: SleepType) -> Result<ScheduledSleep, ApiError> {
    let clock = state.clock();
    let now = clock.now();

    let alarm = determine_alarm_time(clock, now, sleep_type, state.default_alarm_time());
    let epoch = match alarm.instant {
        Some(instant) => instant.timestamp(),
        None => alarm_epoch(state, alarm.date, alarm.time)?,
    };

    let db = state.db()?;
    let sleep = db.record_sleep(sleep_type, now)?;
    match db.set_alarm(alarm.date, epoch) {
        Ok(record) => debug!(id = record.id, "derived alarm stored"),
        Err(DbError::DuplicateAlarm { .. }) => debug!("derived alarm already stored"),
        Err(err) => return Err(err.into()),
    }

    info!(
        sleep_id = sleep.id,
        %sleep_type,
        alarm_date = %alarm.date,
        alarm_time = %alarm.time,
        reason = %alarm.reason,
        "sleep recorded"
    );
    Ok(ScheduledSleep {
        sleep,
        slept_local: clock.to_local(now),
        alarm,
    })
}

/// The most recent sleep with its local start time.
pub fn latest_sleep(state: &AppState) -> Result<Option<(SleepEvent, NaiveDateTime)>, ApiError> {
    let latest = state.db()?.latest_sleep()?;
    Ok(latest.and_then(|sleep| {
        let local = state.clock().local_from_epoch(sleep.slept_at)?;
        Some((sleep, local))
    }))
}

/// Stores an alarm set explicitly by the client.
pub fn set_alarm(
    state: &AppState,
    date: AlarmDate,
    time: AlarmTime,
) -> Result<AlarmRecord, ApiError> {
    let epoch = alarm_epoch(state, date, time)?;
    let record = state.db()?.set_alarm(date, epoch)?;
    info!(%date, %time, "alarm set");
    Ok(record)
}

/// Removes an alarm. Returns whether one was stored.
pub fn delete_alarm(state: &AppState, date: AlarmDate, time: AlarmTime) -> Result<bool, ApiError> {
    let epoch = alarm_epoch(state, date, time)?;
    let removed = state.db()?.delete_alarm(date, epoch)?;
    info!(%date, %time, removed, "alarm delete requested");
    Ok(removed)
}

/// Alarm times stored for `date`, earliest first.
pub fn list_alarms(state: &AppState, date: AlarmDate) -> Result<Vec<AlarmTime>, ApiError> {
    let alarms = state.db()?.list_alarms(date)?;
    Ok(alarms
        .into_iter()
        .filter_map(|alarm| state.clock().alarm_time_of(date, alarm.alarm_time))
        .collect())
}

/// Decides when the alarm should ring on `date`.
///
/// A stored alarm no more than 15 minutes in the past wins; otherwise the
/// night rule runs against the latest sleep.
pub fn resolve_alarm_for_date(
    state: &AppState,
    date: AlarmDate,
) -> Result<AlarmResolution, ApiError> {
    let clock = state.clock();
    let threshold = existing_alarm_threshold(clock.now()).timestamp();

    let db = state.db()?;
    let existing = current_alarm(&db, clock, date, threshold)?;
    let latest = if existing.is_some() {
        None
    } else {
        db.latest_sleep()?
            .and_then(|sleep| sleep.slept_at_utc())
            .map(|slept_at| clock.to_local(slept_at))
    };
    drop(db);

    let resolution = resolve_alarm(existing, latest, date, state.default_alarm_time());
    debug!(%date, time = %resolution.time, reason = %resolution.reason, "alarm resolved");
    Ok(resolution)
}

/// Largest alarm on `date` at or after `threshold` that renders relative to it.
fn current_alarm(
    db: &Database,
    clock: &dyn Clock,
    date: AlarmDate,
    threshold: i64,
) -> Result<Option<AlarmTime>, DbError> {
    let Some(latest) = db.find_alarm_on_or_after(date, threshold)? else {
        return Ok(None);
    };
    if let Some(time) = clock.alarm_time_of(date, latest) {
        return Ok(Some(time));
    }
    // Stored under another time zone, or written directly to the table.
    Ok(db
        .list_alarms(date)?
        .into_iter()
        .rev()
        .filter(|alarm| alarm.alarm_time >= threshold)
        .find_map(|alarm| clock.alarm_time_of(date, alarm.alarm_time)))
}

fn alarm_epoch(state: &AppState, date: AlarmDate, time: AlarmTime) -> Result<i64, ApiError> {
    state
        .clock()
        .alarm_epoch(date, time)
        .ok_or(ApiError::NonexistentLocalTime { date, time })
}
