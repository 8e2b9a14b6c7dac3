//! Storage layer for sleep tracking.
//!
//! Provides persistence for sleep events and alarms using `rusqlite`.
//!
//! # Thread Safety
//!
//! The [`Database`] type wraps a `rusqlite::Connection`, which is `Send` but not `Sync`.
//! The HTTP server shares a single instance behind a `Mutex<Database>`.
//!
//! # Schema
//!
//! ## Timestamp Format
//!
//! Timestamps are stored as INTEGER epoch seconds. Alarm dates are stored as
//! TEXT in `YYYYMMDD` form, which keeps lexicographic and chronological
//! ordering identical.
//!
//! ## Durability
//!
//! Every operation is a single auto-committed statement, so a successful
//! return means the row is on disk.

use std::path::Path;

use chrono::{DateTime, Utc};
use rusqlite::{Connection, ErrorCode, OptionalExtension, params};
use serde::Serialize;
use snooze_core::{AlarmDate, SleepType};
use thiserror::Error;
use tracing::debug;

/// Database errors.
#[derive(Debug, Error)]
pub enum DbError {
    /// An error from the underlying database.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    /// The (date, alarm time) pair is already stored.
    #[error("alarm already set for {date} at {alarm_time}")]
    DuplicateAlarm { date: AlarmDate, alarm_time: i64 },
    /// A stored row could not be decoded.
    #[error("invalid {table} row {id}: {message}")]
    InvalidRow {
        table: &'static str,
        id: i64,
        message: String,
    },
}

/// Database connection wrapper.
///
/// See the [module documentation](self) for thread safety considerations.
pub struct Database {
    conn: Connection,
}

/// A recorded sleep.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SleepEvent {
    pub id: i64,
    /// Epoch seconds at which the sleep started.
    pub slept_at: i64,
    pub sleep_type: SleepType,
}

impl SleepEvent {
    /// Expected duration, derived from the sleep type.
    pub const fn expected_duration_minutes(&self) -> i64 {
        self.sleep_type.expected_duration_minutes()
    }

    pub fn slept_at_utc(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.slept_at, 0)
    }
}

/// A stored alarm.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AlarmRecord {
    pub id: i64,
    pub date: AlarmDate,
    /// Epoch seconds of the wall-clock alarm.
    pub alarm_time: i64,
}

impl Database {
    /// Opens a database at the given path, creating it if necessary.
    ///
    /// The database schema is automatically initialized on first open.
    pub fn open(path: &Path) -> Result<Self, DbError> {
        let conn = Connection::open(path)?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    /// Opens an in-memory database.
    ///
    /// Useful for testing. The database is destroyed when the connection closes.
    pub fn open_in_memory() -> Result<Self, DbError> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    /// Initializes the database schema.
    ///
    /// This is idempotent - safe to call on an already-initialized database.
    fn init(&self) -> Result<(), DbError> {
        self.conn.execute_batch(
            "
            -- sleeps: one row per reported sleep, never updated or deleted
            -- expected_duration_minutes: written from sleep_type, kept for inspection
            CREATE TABLE IF NOT EXISTS sleeps (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                slept_at INTEGER NOT NULL,
                sleep_type TEXT NOT NULL DEFAULT 'night',
                expected_duration_minutes INTEGER NOT NULL
            );

            -- alarms: date is YYYYMMDD, alarm_time is epoch seconds
            CREATE TABLE IF NOT EXISTS alarms (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                date TEXT NOT NULL,
                alarm_time INTEGER NOT NULL
            );

            CREATE UNIQUE INDEX IF NOT EXISTS idx_alarms_date_time ON alarms(date, alarm_time);
            ",
        )?;
        Ok(())
    }

    /// Appends a sleep starting at `slept_at`.
    pub fn record_sleep(
        &self,
        sleep_type: SleepType,
        slept_at: DateTime<Utc>,
    ) -> Result<SleepEvent, DbError> {
        let slept_at = slept_at.timestamp();
        self.conn.execute(
            "INSERT INTO sleeps (slept_at, sleep_type, expected_duration_minutes) VALUES (?, ?, ?)",
            params![
                slept_at,
                sleep_type.as_str(),
                sleep_type.expected_duration_minutes()
            ],
        )?;
        let id = self.conn.last_insert_rowid();
        debug!(id, slept_at, %sleep_type, "sleep recorded");
        Ok(SleepEvent {
            id,
            slept_at,
            sleep_type,
        })
    }

    /// Returns the most recently inserted sleep.
    pub fn latest_sleep(&self) -> Result<Option<SleepEvent>, DbError> {
        let row = self
            .conn
            .query_row(
                "SELECT id, slept_at, sleep_type FROM sleeps ORDER BY id DESC LIMIT 1",
                [],
                |row| {
                    Ok((
                        row.get::<_, i64>(0)?,
                        row.get::<_, i64>(1)?,
                        row.get::<_, String>(2)?,
                    ))
                },
            )
            .optional()?;
        let Some((id, slept_at, sleep_type)) = row else {
            return Ok(None);
        };
        let sleep_type = sleep_type.parse().map_err(|e: snooze_core::ValidationError| {
            DbError::InvalidRow {
                table: "sleeps",
                id,
                message: e.to_string(),
            }
        })?;
        Ok(Some(SleepEvent {
            id,
            slept_at,
            sleep_type,
        }))
    }

    /// Counts recorded sleeps.
    pub fn sleep_count(&self) -> Result<i64, DbError> {
        Ok(self
            .conn
            .query_row("SELECT COUNT(*) FROM sleeps", [], |row| row.get(0))?)
    }

    /// Stores an alarm, rejecting an already stored (date, time) pair.
    pub fn set_alarm(&self, date: AlarmDate, alarm_time: i64) -> Result<AlarmRecord, DbError> {
        let inserted = self.conn.execute(
            "INSERT INTO alarms (date, alarm_time) VALUES (?, ?)",
            params![date.to_string(), alarm_time],
        );
        match inserted {
            Ok(_) => {}
            Err(rusqlite::Error::SqliteFailure(err, _))
                if err.code == ErrorCode::ConstraintViolation =>
            {
                return Err(DbError::DuplicateAlarm { date, alarm_time });
            }
            Err(err) => return Err(err.into()),
        }
        let id = self.conn.last_insert_rowid();
        debug!(id, %date, alarm_time, "alarm stored");
        Ok(AlarmRecord {
            id,
            date,
            alarm_time,
        })
    }

    /// Deletes the alarm matching exactly (date, time). Returns whether a row went away.
    pub fn delete_alarm(&self, date: AlarmDate, alarm_time: i64) -> Result<bool, DbError> {
        let removed = self.conn.execute(
            "DELETE FROM alarms WHERE date = ? AND alarm_time = ?",
            params![date.to_string(), alarm_time],
        )?;
        Ok(removed > 0)
    }

    /// Returns the latest alarm on `date` at or after `threshold` (epoch seconds).
    pub fn find_alarm_on_or_after(
        &self,
        date: AlarmDate,
        threshold: i64,
    ) -> Result<Option<i64>, DbError> {
        Ok(self.conn.query_row(
            "SELECT MAX(alarm_time) FROM alarms WHERE date = ? AND alarm_time >= ?",
            params![date.to_string(), threshold],
            |row| row.get(0),
        )?)
    }

    /// Lists alarms on `date` ordered by time.
    pub fn list_alarms(&self, date: AlarmDate) -> Result<Vec<AlarmRecord>, DbError> {
        let mut stmt = self.conn.prepare(
            "
            SELECT id, alarm_time
            FROM alarms
            WHERE date = ?
            ORDER BY alarm_time ASC, id ASC
            ",
        )?;
        let rows = stmt.query_map([date.to_string()], |row| {
            Ok(AlarmRecord {
                id: row.get(0)?,
                date,
                alarm_time: row.get(1)?,
            })
        })?;
        let mut alarms = Vec::new();
        for row in rows {
            alarms.push(row?);
        }
        Ok(alarms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    use chrono::TimeZone;

    fn date(s: &str) -> AlarmDate {
        AlarmDate::parse(s).unwrap()
    }

    fn table_columns(conn: &Connection, table: &str) -> Vec<String> {
        let mut stmt = conn
            .prepare(&format!("PRAGMA table_info({table})"))
            .expect("prepare table_info");
        let rows = stmt
            .query_map([], |row| row.get::<_, String>(1))
            .expect("query table_info");
        rows.map(|row| row.expect("table_info row")).collect()
    }

    fn index_names(conn: &Connection, table: &str) -> HashSet<String> {
        let mut stmt = conn
            .prepare(&format!("PRAGMA index_list({table})"))
            .expect("prepare index_list");
        let rows = stmt
            .query_map([], |row| row.get::<_, String>(1))
            .expect("query index_list");
        rows.map(|row| row.expect("index_list row")).collect()
    }

    #[test]
    fn open_in_memory_database() {
        let db = Database::open_in_memory();
        assert!(db.is_ok());
    }

    #[test]
    fn schema_matches_data_model() {
        let db = Database::open_in_memory().expect("open in-memory db");

        assert_eq!(
            table_columns(&db.conn, "sleeps"),
            vec!["id", "slept_at", "sleep_type", "expected_duration_minutes"]
        );
        assert_eq!(
            table_columns(&db.conn, "alarms"),
            vec!["id", "date", "alarm_time"]
        );
        assert!(index_names(&db.conn, "alarms").contains("idx_alarms_date_time"));
    }

    #[test]
    fn latest_sleep_is_none_when_empty() {
        let db = Database::open_in_memory().unwrap();
        assert_eq!(db.latest_sleep().unwrap(), None);
        assert_eq!(db.sleep_count().unwrap(), 0);
    }

    #[test]
    fn latest_sleep_returns_highest_id() {
        let db = Database::open_in_memory().unwrap();
        let later = Utc.with_ymd_and_hms(2025, 3, 1, 23, 0, 0).unwrap();
        let earlier = Utc.with_ymd_and_hms(2025, 3, 1, 13, 0, 0).unwrap();

        let first = db.record_sleep(SleepType::Night, later).unwrap();
        let second = db.record_sleep(SleepType::ShortNap, earlier).unwrap();
        assert!(second.id > first.id);

        // Insertion order wins over the timestamp.
        let latest = db.latest_sleep().unwrap().unwrap();
        assert_eq!(latest, second);
        assert_eq!(latest.expected_duration_minutes(), 30);
        assert_eq!(latest.slept_at_utc(), Some(earlier));
        assert_eq!(db.sleep_count().unwrap(), 2);
    }

    #[test]
    fn expected_duration_column_follows_sleep_type() {
        let db = Database::open_in_memory().unwrap();
        db.record_sleep(SleepType::LongNap, Utc::now()).unwrap();

        let stored: i64 = db
            .conn
            .query_row("SELECT expected_duration_minutes FROM sleeps", [], |row| row.get(0))
            .unwrap();
        assert_eq!(stored, 60);
    }

    #[test]
    fn duplicate_alarm_is_rejected() {
        let db = Database::open_in_memory().unwrap();
        db.set_alarm(date("20250301"), 1_740_800_000).unwrap();

        let err = db.set_alarm(date("20250301"), 1_740_800_000).unwrap_err();
        assert!(matches!(err, DbError::DuplicateAlarm { alarm_time: 1_740_800_000, .. }));

        // Same time on another date is a different alarm.
        assert!(db.set_alarm(date("20250302"), 1_740_800_000).is_ok());
    }

    #[test]
    fn delete_alarm_reports_whether_a_row_went_away() {
        let db = Database::open_in_memory().unwrap();
        db.set_alarm(date("20250301"), 100).unwrap();
        db.set_alarm(date("20250301"), 200).unwrap();

        assert!(!db.delete_alarm(date("20250301"), 300).unwrap());
        assert!(!db.delete_alarm(date("20250302"), 100).unwrap());
        assert!(db.delete_alarm(date("20250301"), 100).unwrap());
        assert!(!db.delete_alarm(date("20250301"), 100).unwrap());

        let remaining = db.list_alarms(date("20250301")).unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].alarm_time, 200);
    }

    #[test]
    fn find_alarm_on_or_after_picks_largest_match() {
        let db = Database::open_in_memory().unwrap();
        db.set_alarm(date("20250301"), 100).unwrap();
        db.set_alarm(date("20250301"), 300).unwrap();
        db.set_alarm(date("20250301"), 200).unwrap();
        db.set_alarm(date("20250302"), 900).unwrap();

        assert_eq!(db.find_alarm_on_or_after(date("20250301"), 150).unwrap(), Some(300));
        assert_eq!(db.find_alarm_on_or_after(date("20250301"), 300).unwrap(), Some(300));
        assert_eq!(db.find_alarm_on_or_after(date("20250301"), 301).unwrap(), None);
        assert_eq!(db.find_alarm_on_or_after(date("20250303"), 0).unwrap(), None);
    }

    #[test]
    fn list_alarms_orders_by_time() {
        let db = Database::open_in_memory().unwrap();
        db.set_alarm(date("20250301"), 300).unwrap();
        db.set_alarm(date("20250301"), 100).unwrap();

        let times: Vec<i64> = db
            .list_alarms(date("20250301"))
            .unwrap()
            .into_iter()
            .map(|alarm| alarm.alarm_time)
            .collect();
        assert_eq!(times, vec![100, 300]);
    }

    #[test]
    fn data_survives_reopen() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("snooze.db");
        let slept_at = Utc.with_ymd_and_hms(2025, 3, 1, 2, 15, 0).unwrap();

        {
            let db = Database::open(&path).unwrap();
            db.record_sleep(SleepType::Night, slept_at).unwrap();
            db.set_alarm(date("20250301"), 42).unwrap();
        }

        let db = Database::open(&path).unwrap();
        let latest = db.latest_sleep().unwrap().unwrap();
        assert_eq!(latest.slept_at, slept_at.timestamp());
        assert_eq!(latest.sleep_type, SleepType::Night);
        assert_eq!(db.find_alarm_on_or_after(date("20250301"), 0).unwrap(), Some(42));
    }

    #[test]
    fn unknown_stored_sleep_type_is_reported() {
        let db = Database::open_in_memory().unwrap();
        db.conn
            .execute(
                "INSERT INTO sleeps (slept_at, sleep_type, expected_duration_minutes)
                 VALUES (0, 'coma', 0)",
                [],
            )
            .unwrap();

        let err = db.latest_sleep().unwrap_err();
        assert!(matches!(err, DbError::InvalidRow { table: "sleeps", .. }));
    }
}
