//! Axum router construction.

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;

/// Build the complete router. See [`handlers`] for the endpoint table.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(handlers::root))
        .route("/hello/{name}", get(handlers::say_hello))
        .route("/sleep", post(handlers::record_sleep))
        .route("/sleep/latest", get(handlers::latest_sleep))
        .route(
            "/alarm",
            post(handlers::set_alarm).delete(handlers::delete_alarm),
        )
        .route("/alarm/{date}", get(handlers::list_alarms))
        .route("/alarm/time/{date}", get(handlers::alarm_time_for_date))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
