//! Shared application state.

use std::sync::{Mutex, MutexGuard};

use snooze_core::{AlarmTime, Clock};
use snooze_db::Database;

use crate::error::ApiError;

/// State shared by every handler through `Arc<AppState>`.
///
/// Holds the single storage handle and the clock all local-time decisions
/// go through.
pub struct AppState {
    db: Mutex<Database>,
    clock: Box<dyn Clock>,
    default_alarm_time: AlarmTime,
}

impl AppState {
    pub fn new(db: Database, clock: impl Clock + 'static, default_alarm_time: AlarmTime) -> Self {
        Self {
            db: Mutex::new(db),
            clock: Box::new(clock),
            default_alarm_time,
        }
    }

    /// Locks the database for the duration of one operation.
    pub fn db(&self) -> Result<MutexGuard<'_, Database>, ApiError> {
        self.db.lock().map_err(|_| ApiError::LockPoisoned)
    }

    pub fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    pub const fn default_alarm_time(&self) -> AlarmTime {
        self.default_alarm_time
    }
}
