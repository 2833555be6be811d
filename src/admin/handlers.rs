use axum::{extract::State, Json};
use serde::Serialize;

use crate::http::server::AppState;

#[derive(Serialize)]
pub struct SystemStatus {
    pub version: &'static str,
    pub status: &'static str,
    pub uptime_secs: u64,
    pub transform_enabled: bool,
}

#[derive(Serialize)]
pub struct SessionSummary {
    pub active: usize,
    pub ttl_secs: u64,
}

pub async fn get_status(State(state): State<AppState>) -> Json<SystemStatus> {
    Json(SystemStatus {
        version: env!("CARGO_PKG_VERSION"),
        status: "operational",
        uptime_secs: state.started_at.elapsed().as_secs(),
        transform_enabled: state.config.load().transform.enabled,
    })
}

/// Bindings that have not expired yet.
pub async fn get_sessions(State(state): State<AppState>) -> Json<SessionSummary> {
    Json(SessionSummary {
        active: state.sessions.len_active(),
        ttl_secs: state.config.load().session.ttl_secs,
    })
}
