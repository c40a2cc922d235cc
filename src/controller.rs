use tracing::{info, warn};

use crate::error::DashboardError;
use crate::models::{ActiveCall, AgentForm, CallSummary, ClientForm};
use crate::notice::{NoticeSource, Severity};
use crate::poller;
use crate::state::SharedState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    Clients,
    Agents,
    CallLogs,
    ActiveCalls,
    Health,
    Stats,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 6] = [
        ResourceKind::Clients,
        ResourceKind::Agents,
        ResourceKind::CallLogs,
        ResourceKind::ActiveCalls,
        ResourceKind::Health,
        ResourceKind::Stats,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::Clients => "clients",
            ResourceKind::Agents => "agents",
            ResourceKind::CallLogs => "call-logs",
            ResourceKind::ActiveCalls => "active-calls",
            ResourceKind::Health => "system-health",
            ResourceKind::Stats => "stats",
        }
    }

    pub fn notice_source(&self) -> NoticeSource {
        match self {
            ResourceKind::Clients => NoticeSource::Clients,
            ResourceKind::Agents => NoticeSource::Agents,
            ResourceKind::Health => NoticeSource::Health,
            _ => NoticeSource::Refresh,
        }
    }
}

/// Fetch one resource and store it on success. On failure the previously
/// known-good state is left untouched; no notice is emitted here so the
/// background loop can apply its own escalation rules.
pub async fn fetch_and_store(
    state: &SharedState,
    kind: ResourceKind,
) -> Result<(), DashboardError> {
    match kind {
        ResourceKind::Clients => {
            let clients = state.backend.list_clients().await?;
            *state.clients.write().await = clients;
        }
        ResourceKind::Agents => {
            let agents = state.backend.list_agents().await?;
            *state.agents.write().await = agents;
        }
        ResourceKind::CallLogs => {
            let logs = state.backend.list_call_logs().await?;
            state.set_call_logs(logs).await;
        }
        ResourceKind::ActiveCalls => {
            let calls = state.backend.list_active_calls().await?;
            state.merge_active_calls(calls).await;
        }
        ResourceKind::Health => {
            let health = state.backend.system_health().await?;
            *state.health.write().await = Some(health);
        }
        ResourceKind::Stats => {
            let stats = state.backend.campaign_stats().await?;
            *state.stats.write().await = Some(stats);
        }
    }
    Ok(())
}

/// User-triggered load of one resource: failure is logged and surfaced as
/// a notice, and the error is returned for the HTTP surface.
pub async fn load(state: &SharedState, kind: ResourceKind) -> Result<(), DashboardError> {
    match fetch_and_store(state, kind).await {
        Ok(()) => Ok(()),
        Err(err) => {
            warn!(resource = kind.as_str(), error = %err, "Resource load failed");
            state
                .notices
                .emit(
                    kind.notice_source(),
                    Severity::Error,
                    format!("Failed to load {}: {}", kind.as_str(), err.user_message()),
                )
                .await;
            Err(err)
        }
    }
}

/// Load every resource. Fetches are issued together and resolved
/// independently; a failure in one kind never aborts or blanks another.
/// Returns the kinds that failed.
pub async fn load_all(state: &SharedState) -> Vec<ResourceKind> {
    let (clients, agents, logs, active, health, stats) = tokio::join!(
        load(state, ResourceKind::Clients),
        load(state, ResourceKind::Agents),
        load(state, ResourceKind::CallLogs),
        load(state, ResourceKind::ActiveCalls),
        load(state, ResourceKind::Health),
        load(state, ResourceKind::Stats),
    );

    let results = [clients, agents, logs, active, health, stats];
    ResourceKind::ALL
        .iter()
        .zip(results)
        .filter_map(|(kind, result)| result.err().map(|_| *kind))
        .collect()
}

/// Create a test client. Validates the required fields, guards against a
/// concurrent double submit, and on success re-fetches the client
/// collection and resets the draft form.
pub async fn create_client(
    state: &SharedState,
    input: ClientForm,
) -> Result<String, DashboardError> {
    if !input.is_submittable() {
        return Err(DashboardError::Validation(
            "First name and phone are required".to_string(),
        ));
    }

    {
        let mut forms = state.forms.write().await;
        if forms.client_submit_in_flight {
            return Err(DashboardError::SubmissionInFlight);
        }
        forms.client_submit_in_flight = true;
        forms.client_draft = input.clone();
    }

    let result = submit_client(state, &input).await;

    {
        let mut forms = state.forms.write().await;
        forms.client_submit_in_flight = false;
        if result.is_ok() {
            forms.client_draft = ClientForm::default();
        }
    }

    result
}

async fn submit_client(state: &SharedState, input: &ClientForm) -> Result<String, DashboardError> {
    match state.backend.create_client(input).await {
        Ok(reply) => {
            let client_id = reply.client_id.clone().unwrap_or_default();
            info!(client_id = %client_id, "Test client created");
            state
                .notices
                .emit(
                    NoticeSource::Clients,
                    Severity::Success,
                    reply
                        .message
                        .clone()
                        .unwrap_or_else(|| "Test client created".to_string()),
                )
                .await;
            // Merge by re-fetching the collection rather than patching it
            let _ = load(state, ResourceKind::Clients).await;
            Ok(client_id)
        }
        Err(err) => {
            warn!(error = %err, "Create client failed");
            state
                .notices
                .emit(NoticeSource::Clients, Severity::Error, err.user_message())
                .await;
            Err(err)
        }
    }
}

/// Symmetric contract to [`create_client`].
pub async fn create_agent(state: &SharedState, input: AgentForm) -> Result<String, DashboardError> {
    if !input.is_submittable() {
        return Err(DashboardError::Validation(
            "Name and email are required".to_string(),
        ));
    }

    {
        let mut forms = state.forms.write().await;
        if forms.agent_submit_in_flight {
            return Err(DashboardError::SubmissionInFlight);
        }
        forms.agent_submit_in_flight = true;
        forms.agent_draft = input.clone();
    }

    let result = match state.backend.create_agent(&input).await {
        Ok(reply) => {
            let agent_id = reply.agent_id.clone().unwrap_or_default();
            info!(agent_id = %agent_id, "Test agent created");
            state
                .notices
                .emit(
                    NoticeSource::Agents,
                    Severity::Success,
                    reply
                        .message
                        .clone()
                        .unwrap_or_else(|| "Test agent created".to_string()),
                )
                .await;
            let _ = load(state, ResourceKind::Agents).await;
            Ok(agent_id)
        }
        Err(err) => {
            warn!(error = %err, "Create agent failed");
            state
                .notices
                .emit(NoticeSource::Agents, Severity::Error, err.user_message())
                .await;
            Err(err)
        }
    };

    {
        let mut forms = state.forms.write().await;
        forms.agent_submit_in_flight = false;
        if result.is_ok() {
            forms.agent_draft = AgentForm::default();
        }
    }

    result
}

/// Delete a test client; local removal happens by re-fetching the
/// collection, never by positional surgery.
pub async fn delete_client(state: &SharedState, client_id: &str) -> Result<(), DashboardError> {
    match state.backend.delete_client(client_id).await {
        Ok(reply) => {
            info!(client_id, "Test client deleted");
            state
                .notices
                .emit(
                    NoticeSource::Clients,
                    Severity::Info,
                    reply
                        .message
                        .clone()
                        .unwrap_or_else(|| "Test client deleted".to_string()),
                )
                .await;
            let _ = load(state, ResourceKind::Clients).await;
            Ok(())
        }
        Err(err) => {
            warn!(client_id, error = %err, "Delete client failed");
            state
                .notices
                .emit(NoticeSource::Clients, Severity::Error, err.user_message())
                .await;
            Err(err)
        }
    }
}

/// Outcome of a start request; `Skipped` means neither a request was sent
/// nor any state changed.
#[derive(Debug, Clone, PartialEq)]
pub enum StartCallOutcome {
    Started { call_sid: String },
    Skipped,
}

/// Initiate a test call. Requires both selectors; on success inserts an
/// optimistic ActiveCall and spawns the status poller for its SID.
pub async fn start_test_call(
    state: &SharedState,
    client_id: &str,
    agent_id: &str,
) -> Result<StartCallOutcome, DashboardError> {
    if client_id.trim().is_empty() || agent_id.trim().is_empty() {
        return Ok(StartCallOutcome::Skipped);
    }

    let reply = match state.backend.start_test_call(client_id, agent_id).await {
        Ok(reply) => reply,
        Err(err) => {
            warn!(client_id, agent_id, error = %err, "Test call initiation failed");
            state
                .notices
                .emit(NoticeSource::TestCall, Severity::Error, err.user_message())
                .await;
            return Err(err);
        }
    };

    let call_id = reply.call_id.clone().unwrap_or_default();
    let call_sid = match reply.call_sid.clone().or_else(|| reply.call_id.clone()) {
        Some(sid) if !sid.is_empty() => sid,
        _ => {
            let err = DashboardError::Decode("call initiation reply carried no SID".to_string());
            state
                .notices
                .emit(NoticeSource::TestCall, Severity::Error, err.user_message())
                .await;
            return Err(err);
        }
    };

    let (client_name, client_phone) = {
        let clients = state.clients.read().await;
        clients
            .iter()
            .find(|c| c.id == client_id)
            .map(|c| (c.name.clone(), c.phone.clone()))
            .unwrap_or_default()
    };
    let agent_name = {
        let agents = state.agents.read().await;
        agents
            .iter()
            .find(|a| a.id == agent_id)
            .map(|a| a.name.clone())
            .unwrap_or_default()
    };

    let dialed = reply.phone.clone().unwrap_or_else(|| client_phone.clone());
    let now = chrono::Utc::now();
    state
        .insert_active_call(ActiveCall {
            call_id,
            call_sid: call_sid.clone(),
            client_name,
            client_phone,
            agent_name,
            status: "initiated".to_string(),
            stage: None,
            started_at: now,
            conversation_turns: 0,
            last_activity: now,
        })
        .await;

    info!(call_sid = %call_sid, "Test call initiated");
    state
        .notices
        .emit(
            NoticeSource::TestCall,
            Severity::Info,
            format!("Test call started to {} (SID {})", dialed, call_sid),
        )
        .await;

    let _ = poller::spawn_call_poller(state.clone(), call_sid.clone()).await;

    Ok(StartCallOutcome::Started { call_sid })
}

/// Fetch the structured summary for a completed call and merge it into
/// the matching call log entry.
pub async fn fetch_call_details(
    state: &SharedState,
    call_id: &str,
) -> Result<CallSummary, DashboardError> {
    let summary = match state.backend.call_details(call_id).await {
        Ok(summary) => summary,
        Err(err) => {
            warn!(call_id, error = %err, "Call details fetch failed");
            state
                .notices
                .emit(NoticeSource::TestCall, Severity::Error, err.user_message())
                .await;
            return Err(err);
        }
    };

    let mut logs = state.call_logs.write().await;
    if let Some(log) = logs.iter_mut().find(|l| l.id == call_id) {
        log.summary = Some(summary.clone());
    }
    Ok(summary)
}
