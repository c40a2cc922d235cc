use axum::extract::{Path, State};
use axum::Json;
use serde::Serialize;

use crate::error::DashboardError;
use crate::models::{
    ActiveCall, CallLog, CallSummary, CampaignStats, SystemHealth, TestAgent, TestClient,
};
use crate::state::SharedState;
use crate::stats::TestStats;
use crate::{controller, models};

/// Everything the presentation layer needs in one read.
#[derive(Serialize)]
pub struct DashboardSnapshot {
    pub clients: Vec<TestClient>,
    pub agents: Vec<TestAgent>,
    pub call_logs: Vec<CallLog>,
    pub active_calls: Vec<ActiveCall>,
    pub health: Option<SystemHealth>,
    pub stats: Option<CampaignStats>,
    pub test_stats: TestStats,
}

/// GET /dashboard/state
pub async fn snapshot(State(state): State<SharedState>) -> Json<DashboardSnapshot> {
    let mut active_calls: Vec<ActiveCall> =
        state.active_calls.read().await.values().cloned().collect();
    active_calls.sort_by(|a, b| a.started_at.cmp(&b.started_at));

    Json(DashboardSnapshot {
        clients: state.clients.read().await.clone(),
        agents: state.agents.read().await.clone(),
        call_logs: state.call_logs.read().await.clone(),
        active_calls,
        health: state.health.read().await.clone(),
        stats: state.stats.read().await.clone(),
        test_stats: state.test_stats.read().await.clone(),
    })
}

/// GET /dashboard/clients
pub async fn clients(State(state): State<SharedState>) -> Json<serde_json::Value> {
    let clients = state.clients.read().await.clone();
    Json(serde_json::json!({ "clients": clients }))
}

/// GET /dashboard/agents
pub async fn agents(State(state): State<SharedState>) -> Json<serde_json::Value> {
    let agents = state.agents.read().await.clone();
    Json(serde_json::json!({ "agents": agents }))
}

/// GET /dashboard/call-logs
pub async fn call_logs(State(state): State<SharedState>) -> Json<serde_json::Value> {
    let logs = state.call_logs.read().await.clone();
    let test_stats = state.test_stats.read().await.clone();
    Json(serde_json::json!({ "logs": logs, "test_stats": test_stats }))
}

/// GET /dashboard/active-calls
pub async fn active_calls(State(state): State<SharedState>) -> Json<serde_json::Value> {
    let mut calls: Vec<ActiveCall> = state.active_calls.read().await.values().cloned().collect();
    calls.sort_by(|a, b| a.started_at.cmp(&b.started_at));
    Json(serde_json::json!({ "calls": calls }))
}

/// GET /dashboard/system-health
pub async fn system_health(
    State(state): State<SharedState>,
) -> Result<Json<SystemHealth>, DashboardError> {
    match state.health.read().await.clone() {
        Some(health) => Ok(Json(health)),
        None => Err(DashboardError::NotFound(
            "no health snapshot fetched yet".to_string(),
        )),
    }
}

/// GET /dashboard/stats
pub async fn stats(
    State(state): State<SharedState>,
) -> Result<Json<CampaignStats>, DashboardError> {
    match state.stats.read().await.clone() {
        Some(stats) => Ok(Json(stats)),
        None => Err(DashboardError::NotFound(
            "no campaign stats fetched yet".to_string(),
        )),
    }
}

/// GET /dashboard/call-logs/{id}/details — fetch and merge the structured
/// summary for one call.
pub async fn call_details(
    State(state): State<SharedState>,
    Path(call_id): Path<String>,
) -> Result<Json<CallSummary>, DashboardError> {
    let summary = controller::fetch_call_details(&state, &call_id).await?;
    Ok(Json(summary))
}

/// GET /dashboard/terminal-statuses — the fixed terminal set, exposed so
/// the presentation layer does not hard-code it.
pub async fn terminal_statuses() -> Json<Vec<&'static str>> {
    Json(models::TERMINAL_CALL_STATUSES.to_vec())
}
