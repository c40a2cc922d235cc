use axum::extract::State;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::state::SharedState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub backend_reachable: bool,
    pub refresh_running: bool,
    pub last_refresh_at: Option<DateTime<Utc>>,
    pub active_calls: usize,
    pub tracked_pollers: usize,
}

/// Overall daemon status from sync-loop state. Pure function, extracted
/// for testability.
pub fn determine_overall_status(backend_reachable: bool, refresh_running: bool) -> &'static str {
    if !refresh_running {
        "idle"
    } else if backend_reachable {
        "ok"
    } else {
        "degraded"
    }
}

/// GET /health — liveness of the dashboard daemon itself plus what it
/// knows about the backend.
pub async fn health(State(state): State<SharedState>) -> Json<HealthResponse> {
    let sync = state.sync.read().await.clone();
    let active_calls = state.active_calls.read().await.len();
    let tracked_pollers = {
        // Poller count equals live polling tasks; exposed for leak checks.
        let mut count = 0;
        let calls = state.active_calls.read().await;
        for sid in calls.keys() {
            if state.poller_exists(sid).await {
                count += 1;
            }
        }
        count
    };

    Json(HealthResponse {
        status: determine_overall_status(sync.backend_reachable, sync.refresh_running).to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        backend_reachable: sync.backend_reachable,
        refresh_running: sync.refresh_running,
        last_refresh_at: sync.last_refresh_at,
        active_calls,
        tracked_pollers,
    })
}
