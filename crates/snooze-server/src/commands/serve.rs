//! Serve command: runs the HTTP service until Ctrl-C.

use std::sync::Arc;

use anyhow::{Context, Result};
use snooze_core::SystemClock;
use snooze_db::Database;
use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::Config;
use crate::router::build_router;
use crate::state::AppState;

/// Binds to the configured address and serves requests.
pub async fn run(db: Database, config: &Config) -> Result<()> {
    let state = Arc::new(AppState::new(db, SystemClock, config.default_alarm_time));
    let router = build_router(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    let timezone = iana_time_zone::get_timezone().unwrap_or_else(|_| "UTC".to_string());
    info!(
        %addr,
        %timezone,
        database = %config.database_path.display(),
        default_alarm_time = %config.default_alarm_time,
        "snooze listening"
    );

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("snooze stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(%err, "failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
}
