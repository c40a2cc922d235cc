use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;

use crate::controller::{self, StartCallOutcome};
use crate::error::DashboardError;
use crate::models::{AgentForm, ClientForm};
use crate::state::SharedState;

/// POST /dashboard/refresh — load every resource; independent failures
/// are reported, not fatal.
pub async fn refresh(State(state): State<SharedState>) -> Json<serde_json::Value> {
    let failed = controller::load_all(&state).await;
    let failed: Vec<&str> = failed.iter().map(|k| k.as_str()).collect();
    Json(serde_json::json!({
        "refreshed": true,
        "failed": failed,
    }))
}

/// POST /dashboard/clients
pub async fn create_client(
    State(state): State<SharedState>,
    Json(form): Json<ClientForm>,
) -> Result<impl IntoResponse, DashboardError> {
    let client_id = controller::create_client(&state, form).await?;
    Ok(Json(serde_json::json!({
        "success": true,
        "client_id": client_id,
    })))
}

/// DELETE /dashboard/clients/{id}
pub async fn delete_client(
    State(state): State<SharedState>,
    Path(client_id): Path<String>,
) -> Result<impl IntoResponse, DashboardError> {
    controller::delete_client(&state, &client_id).await?;
    Ok(Json(serde_json::json!({
        "success": true,
        "client_id": client_id,
    })))
}

/// POST /dashboard/agents
pub async fn create_agent(
    State(state): State<SharedState>,
    Json(form): Json<AgentForm>,
) -> Result<impl IntoResponse, DashboardError> {
    let agent_id = controller::create_agent(&state, form).await?;
    Ok(Json(serde_json::json!({
        "success": true,
        "agent_id": agent_id,
    })))
}

#[derive(Deserialize)]
pub struct StartCallBody {
    #[serde(default)]
    pub client_id: String,
    #[serde(default)]
    pub agent_id: String,
}

/// POST /dashboard/test-call
pub async fn start_test_call(
    State(state): State<SharedState>,
    Json(body): Json<StartCallBody>,
) -> Result<impl IntoResponse, DashboardError> {
    match controller::start_test_call(&state, &body.client_id, &body.agent_id).await? {
        StartCallOutcome::Started { call_sid } => Ok(Json(serde_json::json!({
            "status": "started",
            "call_sid": call_sid,
        }))),
        StartCallOutcome::Skipped => Ok(Json(serde_json::json!({
            "status": "skipped",
            "message": "Select both a client and an agent first",
        }))),
    }
}

/// POST /dashboard/test-call/{sid}/stop — explicit stop-monitoring.
pub async fn stop_monitoring(
    State(state): State<SharedState>,
    Path(call_sid): Path<String>,
) -> Result<impl IntoResponse, DashboardError> {
    if !state.stop_poller(&call_sid).await {
        return Err(DashboardError::NotFound(format!(
            "no active monitoring for call {}",
            call_sid
        )));
    }
    Ok(Json(serde_json::json!({
        "status": "stop_requested",
        "call_sid": call_sid,
    })))
}
