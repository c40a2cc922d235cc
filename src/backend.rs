use serde::de::DeserializeOwned;
use tracing::debug;

use crate::config::DashboardConfig;
use crate::error::DashboardError;
use crate::models::{
    ActiveCallsPayload, AgentForm, AgentsPayload, CallLog, CallLogsPayload, CallStartReply,
    CallStatusUpdate, CallSummary, CampaignStats, ClientForm, ClientsPayload, MutationReply,
    SystemHealth, TestAgent, TestCallRequest, TestClient,
};

/// Typed client for the campaign backend's dashboard API. Every response
/// passes through [`decode_payload`] exactly once; nothing downstream sees
/// raw JSON.
pub struct BackendClient {
    http: reqwest::Client,
    config: DashboardConfig,
}

impl BackendClient {
    pub fn new(config: DashboardConfig) -> Self {
        let http = reqwest::Client::builder()
            .timeout(config.http_timeout)
            .pool_max_idle_per_host(4)
            .build()
            .expect("Failed to create HTTP client");
        Self { http, config }
    }

    fn url(&self, path: &str) -> String {
        self.config.backend_endpoint(path)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, DashboardError> {
        let url = self.url(path);
        debug!(%url, "GET");
        let resp = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| DashboardError::Transport(e.to_string()))?;
        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| DashboardError::Transport(e.to_string()))?;
        decode_payload(status.is_success(), status.as_u16(), &body)
    }

    async fn post_json<B: serde::Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, DashboardError> {
        let url = self.url(path);
        debug!(%url, "POST");
        let resp = self
            .http
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| DashboardError::Transport(e.to_string()))?;
        let status = resp.status();
        let text = resp
            .text()
            .await
            .map_err(|e| DashboardError::Transport(e.to_string()))?;
        decode_payload(status.is_success(), status.as_u16(), &text)
    }

    // --- Resource listings ---

    pub async fn list_clients(&self) -> Result<Vec<TestClient>, DashboardError> {
        let payload: ClientsPayload = self.get_json("/api/dashboard/test-clients").await?;
        Ok(payload.clients)
    }

    pub async fn list_agents(&self) -> Result<Vec<TestAgent>, DashboardError> {
        let payload: AgentsPayload = self.get_json("/api/dashboard/test-agents").await?;
        Ok(payload.agents)
    }

    pub async fn list_call_logs(&self) -> Result<Vec<CallLog>, DashboardError> {
        let path = format!("/api/dashboard/call-logs?limit={}", self.config.call_log_limit);
        let payload: CallLogsPayload = self.get_json(&path).await?;
        Ok(payload.logs)
    }

    pub async fn list_active_calls(&self) -> Result<Vec<crate::models::ActiveCall>, DashboardError> {
        let payload: ActiveCallsPayload = self.get_json("/api/dashboard/active-calls").await?;
        Ok(payload.calls)
    }

    pub async fn system_health(&self) -> Result<SystemHealth, DashboardError> {
        self.get_json("/api/dashboard/system-health").await
    }

    pub async fn campaign_stats(&self) -> Result<CampaignStats, DashboardError> {
        self.get_json("/api/dashboard/stats").await
    }

    // --- Mutations ---

    pub async fn create_client(&self, form: &ClientForm) -> Result<MutationReply, DashboardError> {
        let reply: MutationReply = self.post_json("/api/dashboard/test-clients", form).await?;
        if !reply.success {
            return Err(DashboardError::Backend(reply.failure_text()));
        }
        Ok(reply)
    }

    pub async fn delete_client(&self, client_id: &str) -> Result<MutationReply, DashboardError> {
        let url = self.url(&format!("/api/dashboard/test-clients/{}", client_id));
        debug!(%url, "DELETE");
        let resp = self
            .http
            .delete(&url)
            .send()
            .await
            .map_err(|e| DashboardError::Transport(e.to_string()))?;
        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| DashboardError::Transport(e.to_string()))?;
        let reply: MutationReply = decode_payload(status.is_success(), status.as_u16(), &body)?;
        if !reply.success {
            return Err(DashboardError::Backend(reply.failure_text()));
        }
        Ok(reply)
    }

    pub async fn create_agent(&self, form: &AgentForm) -> Result<MutationReply, DashboardError> {
        let reply: MutationReply = self.post_json("/api/dashboard/test-agents", form).await?;
        if !reply.success {
            return Err(DashboardError::Backend(reply.failure_text()));
        }
        Ok(reply)
    }

    pub async fn start_test_call(
        &self,
        client_id: &str,
        agent_id: &str,
    ) -> Result<CallStartReply, DashboardError> {
        let body = TestCallRequest {
            client_id: client_id.to_string(),
            agent_id: agent_id.to_string(),
            call_type: "test".to_string(),
        };
        let reply: CallStartReply = self.post_json("/api/dashboard/test-call", &body).await?;
        if !reply.success {
            return Err(DashboardError::Backend(reply.failure_text()));
        }
        Ok(reply)
    }

    // --- Polling / details ---

    pub async fn call_status(&self, call_sid: &str) -> Result<CallStatusUpdate, DashboardError> {
        let path = format!("/api/dashboard/call-status/{}", call_sid);
        self.get_json(&path).await
    }

    pub async fn call_details(&self, call_id: &str) -> Result<CallSummary, DashboardError> {
        let path = format!("/api/dashboard/call-details/{}", call_id);
        self.get_json(&path).await
    }

    /// Top-level liveness probe. True only on a 2xx answer.
    pub async fn liveness(&self) -> bool {
        match self.http.get(self.url("/health")).send().await {
            Ok(resp) => resp.status().is_success(),
            Err(_) => false,
        }
    }
}

/// The single parse/validate boundary for backend responses. Non-2xx
/// answers with a structured `detail`/`message` body become application
/// errors; anything else non-2xx is a transport error; 2xx bodies that do
/// not match the expected shape become decode errors.
pub fn decode_payload<T: DeserializeOwned>(
    is_success: bool,
    status: u16,
    body: &str,
) -> Result<T, DashboardError> {
    if !is_success {
        if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
            let text = value
                .get("detail")
                .or_else(|| value.get("message"))
                .and_then(|m| m.as_str());
            if let Some(text) = text {
                return Err(DashboardError::Backend(text.to_string()));
            }
        }
        return Err(DashboardError::Transport(format!("HTTP {}", status)));
    }

    serde_json::from_str::<T>(body).map_err(|e| DashboardError::Decode(e.to_string()))
}
