//! HTTP endpoint handlers.
//!
//! # Endpoints
//!
//! | Method   | Path                  | Description                              |
//! |----------|-----------------------|------------------------------------------|
//! | `GET`    | `/`                   | Greeting                                 |
//! | `GET`    | `/hello/{name}`       | Personal greeting                        |
//! | `POST`   | `/sleep`              | Record a sleep and schedule its alarm    |
//! | `GET`    | `/sleep/latest`       | Most recent sleep                        |
//! | `POST`   | `/alarm`              | Set an alarm                             |
//! | `DELETE` | `/alarm`              | Remove an alarm                          |
//! | `GET`    | `/alarm/{date}`       | Alarms stored for a date                 |
//! | `GET`    | `/alarm/time/{date}`  | Alarm time to use on a date              |

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use snooze_core::{AlarmDate, AlarmTime, Reason, SleepType, validate_alarm_input};

use crate::error::ApiError;
use crate::service;
use crate::state::AppState;

/// Query parameters for `POST /sleep`.
#[derive(Debug, Deserialize)]
pub struct SleepQuery {
    pub sleep_type: Option<String>,
}

/// Body of `POST /alarm` and `DELETE /alarm`.
#[derive(Debug, Deserialize)]
pub struct AlarmBody {
    pub date: String,
    pub time: String,
}

impl AlarmBody {
    fn parse(&self) -> Result<(AlarmDate, AlarmTime), ApiError> {
        validate_alarm_input(&self.date, &self.time)?;
        Ok((AlarmDate::parse(&self.date)?, AlarmTime::parse(&self.time)?))
    }
}

#[derive(Debug, Serialize)]
pub struct Greeting {
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct SleepRecorded {
    pub message: &'static str,
    pub slept_at: i64,
    pub slept_clock_time: String,
    pub expected_duration: i64,
    pub alarm_date: AlarmDate,
    pub alarm_time_to_set: AlarmTime,
    pub sleep_type: SleepType,
    pub reason: Reason,
}

#[derive(Debug, Serialize)]
pub struct LatestSleep {
    pub latest_sleep: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slept_clock_time: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AlarmSet {
    pub message: &'static str,
    pub date: AlarmDate,
    pub time: AlarmTime,
}

#[derive(Debug, Serialize)]
pub struct AlarmDeleted {
    pub message: &'static str,
    pub success: bool,
}

#[derive(Debug, Serialize)]
pub struct AlarmList {
    pub date: AlarmDate,
    pub alarms: Vec<AlarmTime>,
}

#[derive(Debug, Serialize)]
pub struct AlarmForDate {
    pub alarm_time: AlarmTime,
    pub reason: Reason,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slept_clock_time: Option<String>,
    pub requested_date: AlarmDate,
}

fn clock_time(local: NaiveDateTime) -> String {
    local.format("%H:%M:%S").to_string()
}

pub async fn root() -> Json<Greeting> {
    Json(Greeting {
        message: "Hello World".to_string(),
    })
}

pub async fn say_hello(Path(name): Path<String>) -> Json<Greeting> {
    Json(Greeting {
        message: format!("Hello {name}"),
    })
}

/// `POST /sleep` -- record a sleep starting now.
pub async fn record_sleep(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SleepQuery>,
) -> Result<Json<SleepRecorded>, ApiError> {
    let sleep_type = match query.sleep_type.as_deref() {
        Some(value) => value.parse::<SleepType>()?,
        None => SleepType::default(),
    };
    let scheduled = service::record_sleep(&state, sleep_type)?;

    Ok(Json(SleepRecorded {
        message: "Good night!",
        slept_at: scheduled.sleep.slept_at,
        slept_clock_time: clock_time(scheduled.slept_local),
        expected_duration: scheduled.sleep.expected_duration_minutes(),
        alarm_date: scheduled.alarm.date,
        alarm_time_to_set: scheduled.alarm.time,
        sleep_type,
        reason: scheduled.alarm.reason,
    }))
}

/// `GET /sleep/latest`
pub async fn latest_sleep(
    State(state): State<Arc<AppState>>,
) -> Result<Json<LatestSleep>, ApiError> {
    let latest = service::latest_sleep(&state)?;
    Ok(Json(LatestSleep {
        latest_sleep: latest.as_ref().map(|(sleep, _)| sleep.slept_at),
        slept_clock_time: latest.map(|(_, local)| clock_time(local)),
    }))
}

/// `POST /alarm`
pub async fn set_alarm(
    State(state): State<Arc<AppState>>,
    Json(body): Json<AlarmBody>,
) -> Result<Json<AlarmSet>, ApiError> {
    let (date, time) = body.parse()?;
    service::set_alarm(&state, date, time)?;
    Ok(Json(AlarmSet {
        message: "Alarm set",
        date,
        time,
    }))
}

/// `DELETE /alarm`
pub async fn delete_alarm(
    State(state): State<Arc<AppState>>,
    Json(body): Json<AlarmBody>,
) -> Result<Json<AlarmDeleted>, ApiError> {
    let (date, time) = body.parse()?;
    let success = service::delete_alarm(&state, date, time)?;
    Ok(Json(AlarmDeleted {
        message: if success {
            "Alarm deleted"
        } else {
            "No matching alarm"
        },
        success,
    }))
}

/// `GET /alarm/{date}`
pub async fn list_alarms(
    State(state): State<Arc<AppState>>,
    Path(date): Path<String>,
) -> Result<Json<AlarmList>, ApiError> {
    let date = AlarmDate::parse(&date)?;
    let alarms = service::list_alarms(&state, date)?;
    Ok(Json(AlarmList { date, alarms }))
}

/// `GET /alarm/time/{date}`
pub async fn alarm_time_for_date(
    State(state): State<Arc<AppState>>,
    Path(date): Path<String>,
) -> Result<Json<AlarmForDate>, ApiError> {
    let date = AlarmDate::parse(&date)?;
    let resolution = service::resolve_alarm_for_date(&state, date)?;
    Ok(Json(AlarmForDate {
        alarm_time: resolution.time,
        reason: resolution.reason,
        slept_clock_time: resolution.slept_at.map(clock_time),
        requested_date: date,
    }))
}
