use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// --- Backend records ---
//
// Shapes mirror the campaign backend's dashboard API. The controller never
// mutates these beyond collection membership; ActiveCall is the one record
// it updates in place during polling.

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestClient {
    pub id: String,
    pub name: String,
    pub phone: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub total_attempts: u32,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub last_call_outcome: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestAgent {
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(default = "default_timezone")]
    pub timezone: String,
    #[serde(default)]
    pub google_calendar_id: Option<String>,
    #[serde(default)]
    pub specialties: Vec<String>,
}

fn default_timezone() -> String {
    "America/New_York".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallLog {
    pub id: String,
    pub call_sid: String,
    pub client_name: String,
    #[serde(default)]
    pub client_phone: String,
    #[serde(default)]
    pub agent_name: String,
    pub status: String,
    #[serde(default)]
    pub outcome: Option<String>,
    #[serde(default)]
    pub duration: String,
    pub started_at: DateTime<Utc>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub summary: Option<CallSummary>,
    #[serde(default)]
    pub is_test_call: bool,
    #[serde(default)]
    pub conversation_turns: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallSummary {
    #[serde(default)]
    pub final_outcome: Option<String>,
    #[serde(default)]
    pub key_points: Vec<String>,
    #[serde(default)]
    pub next_action: Option<String>,
}

/// Transient record of a call currently believed to be in progress.
/// Exactly one entry per in-flight call SID; removed the moment a
/// terminal status is observed or the polling ceiling is reached.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActiveCall {
    pub call_id: String,
    pub call_sid: String,
    pub client_name: String,
    #[serde(default)]
    pub client_phone: String,
    #[serde(default)]
    pub agent_name: String,
    pub status: String,
    #[serde(default)]
    pub stage: Option<String>,
    pub started_at: DateTime<Utc>,
    #[serde(default)]
    pub conversation_turns: u32,
    pub last_activity: DateTime<Utc>,
}

/// Statuses that end call-status polling.
pub const TERMINAL_CALL_STATUSES: &[&str] = &["completed", "failed", "busy", "no_answer"];

pub fn is_terminal_status(status: &str) -> bool {
    TERMINAL_CALL_STATUSES.contains(&status)
}

// --- System health ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComponentStatus {
    Up,
    Degraded,
    Down,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentHealth {
    pub database: ComponentStatus,
    pub cache: ComponentStatus,
    pub voice_processor: ComponentStatus,
    pub tts: ComponentStatus,
    pub speech_to_text: ComponentStatus,
    pub telephony: ComponentStatus,
    pub conversation_ai: ComponentStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthAlert {
    pub severity: String,
    pub source: String,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CampaignSummary {
    #[serde(default)]
    pub active_calls: u32,
    #[serde(default)]
    pub queue_length: u32,
    #[serde(default)]
    pub daily_throughput: u32,
}

/// Snapshot of backend component status. Replaced wholesale on each fetch,
/// never merged incrementally.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemHealth {
    pub components: ComponentHealth,
    #[serde(default)]
    pub alerts: Vec<HealthAlert>,
    #[serde(default)]
    pub campaign: Option<CampaignSummary>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CampaignStats {
    pub total_clients: u32,
    pub completed_calls: u32,
    pub interested_clients: u32,
    pub not_interested_clients: u32,
    pub scheduled_meetings: u32,
    pub pending_clients: u32,
    pub completion_rate: f64,
    pub interest_rate: f64,
}

// --- Request bodies ---

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClientForm {
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl ClientForm {
    /// Minimal submit gate: first name and phone are required.
    pub fn is_submittable(&self) -> bool {
        !self.first_name.trim().is_empty() && !self.phone.trim().is_empty()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AgentForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub timezone: String,
    #[serde(default)]
    pub google_calendar_id: Option<String>,
    #[serde(default)]
    pub specialties: Vec<String>,
}

impl AgentForm {
    pub fn is_submittable(&self) -> bool {
        !self.name.trim().is_empty() && !self.email.trim().is_empty()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestCallRequest {
    pub client_id: String,
    pub agent_id: String,
    pub call_type: String,
}

// --- Response envelopes ---
//
// List endpoints wrap a named array; mutations return a success envelope.
// Decoding happens exactly once, at the point the response is received, so
// a malformed payload becomes a typed error instead of a silent default.

#[derive(Debug, Deserialize)]
pub struct ClientsPayload {
    pub clients: Vec<TestClient>,
}

#[derive(Debug, Deserialize)]
pub struct AgentsPayload {
    pub agents: Vec<TestAgent>,
}

#[derive(Debug, Deserialize)]
pub struct CallLogsPayload {
    pub logs: Vec<CallLog>,
}

#[derive(Debug, Deserialize)]
pub struct ActiveCallsPayload {
    pub calls: Vec<ActiveCall>,
}

#[derive(Debug, Deserialize)]
pub struct MutationReply {
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub detail: Option<String>,
    #[serde(default)]
    pub client_id: Option<String>,
    #[serde(default)]
    pub agent_id: Option<String>,
}

impl MutationReply {
    /// Backend-provided failure text, `detail` preferred over `message`.
    pub fn failure_text(&self) -> String {
        self.detail
            .clone()
            .or_else(|| self.message.clone())
            .unwrap_or_else(|| "Request failed".to_string())
    }
}

#[derive(Debug, Deserialize)]
pub struct CallStartReply {
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub detail: Option<String>,
    #[serde(default)]
    pub call_id: Option<String>,
    #[serde(default)]
    pub call_sid: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
}

impl CallStartReply {
    pub fn failure_text(&self) -> String {
        self.detail
            .clone()
            .or_else(|| self.message.clone())
            .unwrap_or_else(|| "Failed to initiate test call".to_string())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CallStatusUpdate {
    pub status: String,
    #[serde(default)]
    pub stage: Option<String>,
    #[serde(default)]
    pub conversation_turns: Option<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_terminal_statuses() {
        for s in ["completed", "failed", "busy", "no_answer"] {
            assert!(is_terminal_status(s), "{s} should be terminal");
        }
        for s in ["initiated", "ringing", "in_progress", ""] {
            assert!(!is_terminal_status(s), "{s} should not be terminal");
        }
    }

    #[test]
    fn test_client_form_submittable_requires_name_and_phone() {
        let mut form = ClientForm::default();
        assert!(!form.is_submittable());
        form.first_name = "Jane".to_string();
        assert!(!form.is_submittable());
        form.phone = "+15551234567".to_string();
        assert!(form.is_submittable());
    }

    #[test]
    fn test_client_form_whitespace_only_is_not_submittable() {
        let form = ClientForm {
            first_name: "  ".to_string(),
            phone: "+15551234567".to_string(),
            ..Default::default()
        };
        assert!(!form.is_submittable());
    }

    #[test]
    fn test_agent_form_submittable() {
        let form = AgentForm {
            name: "Sam Agent".to_string(),
            email: "sam@example.com".to_string(),
            ..Default::default()
        };
        assert!(form.is_submittable());
    }

    #[test]
    fn test_clients_payload_decodes_optional_fields() {
        let payload: ClientsPayload = serde_json::from_value(json!({
            "clients": [{
                "id": "c1",
                "name": "Jane Doe",
                "phone": "+15551234567",
                "created_at": "2026-01-15T10:00:00Z"
            }]
        }))
        .unwrap();
        assert_eq!(payload.clients.len(), 1);
        assert_eq!(payload.clients[0].total_attempts, 0);
        assert!(payload.clients[0].email.is_none());
    }

    #[test]
    fn test_clients_payload_rejects_missing_array() {
        let result: Result<ClientsPayload, _> = serde_json::from_value(json!({"items": []}));
        assert!(result.is_err());
    }

    #[test]
    fn test_mutation_reply_prefers_detail_over_message() {
        let reply = MutationReply {
            success: false,
            message: Some("generic".to_string()),
            detail: Some("agent busy".to_string()),
            client_id: None,
            agent_id: None,
        };
        assert_eq!(reply.failure_text(), "agent busy");
    }

    #[test]
    fn test_mutation_reply_falls_back_to_message_then_generic() {
        let reply = MutationReply {
            success: false,
            message: Some("backend said no".to_string()),
            detail: None,
            client_id: None,
            agent_id: None,
        };
        assert_eq!(reply.failure_text(), "backend said no");

        let bare = MutationReply {
            success: false,
            message: None,
            detail: None,
            client_id: None,
            agent_id: None,
        };
        assert_eq!(bare.failure_text(), "Request failed");
    }

    #[test]
    fn test_call_status_update_decodes_minimal_shape() {
        let update: CallStatusUpdate =
            serde_json::from_value(json!({"status": "ringing"})).unwrap();
        assert_eq!(update.status, "ringing");
        assert!(update.stage.is_none());
    }

    #[test]
    fn test_system_health_decodes() {
        let health: SystemHealth = serde_json::from_value(json!({
            "components": {
                "database": "up",
                "cache": "up",
                "voice_processor": "degraded",
                "tts": "up",
                "speech_to_text": "up",
                "telephony": "up",
                "conversation_ai": "down"
            },
            "alerts": [{"severity": "warning", "source": "tts", "message": "slow"}]
        }))
        .unwrap();
        assert_eq!(health.components.voice_processor, ComponentStatus::Degraded);
        assert_eq!(health.alerts.len(), 1);
        assert!(health.campaign.is_none());
    }
}
