// Shared test harness: an in-process mock of the campaign backend bound
// to an ephemeral port, plus a DashboardState wired to it with intervals
// shrunk to milliseconds.
//
// Each integration test binary compiles this module independently and
// uses a different slice of it.
#![allow(dead_code)]

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::{sleep, Instant};
use url::Url;

use calldash::config::DashboardConfig;
use calldash::state::{DashboardState, SharedState};

#[derive(Debug, Default)]
pub struct Counters {
    pub client_lists: u32,
    pub agent_lists: u32,
    pub call_log_lists: u32,
    pub active_call_lists: u32,
    pub health_fetches: u32,
    pub stats_fetches: u32,
    pub status_fetches: u32,
    pub test_call_posts: u32,
    pub client_creates: u32,
    pub agent_creates: u32,
    pub client_deletes: u32,
}

pub struct MockCore {
    pub clients: Vec<Value>,
    pub agents: Vec<Value>,
    pub logs: Vec<Value>,
    pub active_calls: Vec<Value>,
    pub fail_clients: bool,
    pub fail_call_logs: bool,
    pub test_call_reply: Value,
    pub create_client_reply: Value,
    pub create_agent_reply: Value,
    pub create_delay: Duration,
    /// Successive call-status responses; the last one repeats.
    pub call_statuses: VecDeque<Value>,
    pub status_failures_before_success: u32,
    /// Delay applied to every call-status response.
    pub status_delay: Duration,
    pub counters: Counters,
}

impl Default for MockCore {
    fn default() -> Self {
        Self {
            clients: vec![client_record("a", "Jane Doe", "+15551234567")],
            agents: vec![agent_record("b", "Sam Agent")],
            logs: Vec::new(),
            active_calls: Vec::new(),
            fail_clients: false,
            fail_call_logs: false,
            test_call_reply: json!({
                "success": true,
                "call_id": "test_call_1",
                "call_sid": "CA123",
                "phone": "+15551234567",
                "message": "Test call initiated successfully"
            }),
            create_client_reply: json!({
                "success": true,
                "client_id": "c_new",
                "message": "Test client created successfully"
            }),
            create_agent_reply: json!({
                "success": true,
                "agent_id": "ag_new",
                "message": "Test agent created successfully"
            }),
            create_delay: Duration::ZERO,
            call_statuses: VecDeque::from([json!({"status": "in_progress"})]),
            status_failures_before_success: 0,
            status_delay: Duration::ZERO,
            counters: Counters::default(),
        }
    }
}

pub fn client_record(id: &str, name: &str, phone: &str) -> Value {
    json!({
        "id": id,
        "name": name,
        "phone": phone,
        "status": "pending",
        "total_attempts": 0,
        "created_at": "2026-01-15T10:00:00Z"
    })
}

pub fn agent_record(id: &str, name: &str) -> Value {
    json!({
        "id": id,
        "name": name,
        "email": "agent@example.com",
        "timezone": "America/New_York",
        "specialties": ["solar"]
    })
}

pub fn log_record(id: &str, status: &str, is_test: bool) -> Value {
    json!({
        "id": id,
        "call_sid": format!("CA{}", id),
        "client_name": "Jane Doe",
        "client_phone": "+15551234567",
        "agent_name": "Sam Agent",
        "status": status,
        "duration": "0:42",
        "started_at": "2026-01-15T10:05:00Z",
        "is_test_call": is_test,
        "conversation_turns": 4
    })
}

pub struct MockBackend {
    pub addr: SocketAddr,
    pub core: Arc<Mutex<MockCore>>,
}

impl MockBackend {
    pub fn base_url(&self) -> Url {
        Url::parse(&format!("http://{}/", self.addr)).unwrap()
    }

    pub fn with_core<R>(&self, f: impl FnOnce(&mut MockCore) -> R) -> R {
        f(&mut self.core.lock().unwrap())
    }
}

type Shared = Arc<Mutex<MockCore>>;

pub async fn spawn_mock_backend() -> MockBackend {
    let core: Shared = Arc::new(Mutex::new(MockCore::default()));

    let router = Router::new()
        .route("/health", get(|| async { Json(json!({"status": "ok"})) }))
        .route(
            "/api/dashboard/test-clients",
            get(list_clients).post(create_client),
        )
        .route("/api/dashboard/test-clients/{id}", delete(delete_client))
        .route(
            "/api/dashboard/test-agents",
            get(list_agents).post(create_agent),
        )
        .route("/api/dashboard/call-logs", get(list_call_logs))
        .route("/api/dashboard/active-calls", get(list_active_calls))
        .route("/api/dashboard/system-health", get(system_health))
        .route("/api/dashboard/stats", get(campaign_stats))
        .route("/api/dashboard/test-call", post(start_test_call))
        .route("/api/dashboard/call-status/{sid}", get(call_status))
        .route("/api/dashboard/call-details/{id}", get(call_details))
        .with_state(core.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    MockBackend { addr, core }
}

async fn list_clients(State(core): State<Shared>) -> impl IntoResponse {
    let mut core = core.lock().unwrap();
    core.counters.client_lists += 1;
    if core.fail_clients {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"detail": "database down"})),
        );
    }
    (StatusCode::OK, Json(json!({"clients": core.clients})))
}

async fn create_client(State(core): State<Shared>, Json(body): Json<Value>) -> impl IntoResponse {
    let (reply, delay) = {
        let mut core = core.lock().unwrap();
        core.counters.client_creates += 1;
        let reply = core.create_client_reply.clone();
        if reply["success"] == json!(true) {
            let first = body["first_name"].as_str().unwrap_or_default();
            let last = body["last_name"].as_str().unwrap_or_default();
            let phone = body["phone"].as_str().unwrap_or_default();
            let id = reply["client_id"].as_str().unwrap_or("c_new").to_string();
            let record = client_record(&id, &format!("{} {}", first, last), phone);
            core.clients.push(record);
        }
        (reply, core.create_delay)
    };
    if delay > Duration::ZERO {
        sleep(delay).await;
    }
    Json(reply)
}

async fn delete_client(State(core): State<Shared>, Path(id): Path<String>) -> impl IntoResponse {
    let mut core = core.lock().unwrap();
    core.counters.client_deletes += 1;
    let before = core.clients.len();
    core.clients.retain(|c| c["id"] != json!(id));
    if core.clients.len() == before {
        return (
            StatusCode::NOT_FOUND,
            Json(json!({"detail": "Test client not found"})),
        );
    }
    (
        StatusCode::OK,
        Json(json!({"success": true, "message": "Test client deleted successfully"})),
    )
}

async fn list_agents(State(core): State<Shared>) -> impl IntoResponse {
    let mut core = core.lock().unwrap();
    core.counters.agent_lists += 1;
    Json(json!({"agents": core.agents}))
}

async fn create_agent(State(core): State<Shared>, Json(body): Json<Value>) -> impl IntoResponse {
    let mut core = core.lock().unwrap();
    core.counters.agent_creates += 1;
    let reply = core.create_agent_reply.clone();
    if reply["success"] == json!(true) {
        let name = body["name"].as_str().unwrap_or_default();
        let id = reply["agent_id"].as_str().unwrap_or("ag_new").to_string();
        let record = agent_record(&id, name);
        core.agents.push(record);
    }
    Json(reply)
}

async fn list_call_logs(State(core): State<Shared>) -> impl IntoResponse {
    let mut core = core.lock().unwrap();
    core.counters.call_log_lists += 1;
    if core.fail_call_logs {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"detail": "database down"})),
        );
    }
    (StatusCode::OK, Json(json!({"logs": core.logs})))
}

async fn list_active_calls(State(core): State<Shared>) -> impl IntoResponse {
    let mut core = core.lock().unwrap();
    core.counters.active_call_lists += 1;
    Json(json!({"calls": core.active_calls}))
}

async fn system_health(State(core): State<Shared>) -> impl IntoResponse {
    let mut core = core.lock().unwrap();
    core.counters.health_fetches += 1;
    Json(json!({
        "components": {
            "database": "up",
            "cache": "up",
            "voice_processor": "up",
            "tts": "up",
            "speech_to_text": "up",
            "telephony": "up",
            "conversation_ai": "up"
        },
        "alerts": []
    }))
}

async fn campaign_stats(State(core): State<Shared>) -> impl IntoResponse {
    let mut core = core.lock().unwrap();
    core.counters.stats_fetches += 1;
    Json(json!({
        "total_clients": 10,
        "completed_calls": 6,
        "interested_clients": 3,
        "not_interested_clients": 3,
        "scheduled_meetings": 2,
        "pending_clients": 4,
        "completion_rate": 60.0,
        "interest_rate": 50.0
    }))
}

async fn start_test_call(State(core): State<Shared>) -> impl IntoResponse {
    let mut core = core.lock().unwrap();
    core.counters.test_call_posts += 1;
    // Application-level failures ride a 2xx envelope with success:false.
    Json(core.test_call_reply.clone())
}

async fn call_status(State(core): State<Shared>, Path(_sid): Path<String>) -> impl IntoResponse {
    let (status, reply, delay) = {
        let mut core = core.lock().unwrap();
        core.counters.status_fetches += 1;
        let delay = core.status_delay;
        if core.status_failures_before_success > 0 {
            core.status_failures_before_success -= 1;
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({"detail": "status store unavailable"}),
                delay,
            )
        } else {
            let reply = if core.call_statuses.len() > 1 {
                core.call_statuses.pop_front().unwrap()
            } else {
                core.call_statuses
                    .front()
                    .cloned()
                    .unwrap_or_else(|| json!({"status": "in_progress"}))
            };
            (StatusCode::OK, reply, delay)
        }
    };
    if delay > Duration::ZERO {
        sleep(delay).await;
    }
    (status, Json(reply))
}

async fn call_details(Path(_id): Path<String>) -> impl IntoResponse {
    Json(json!({
        "final_outcome": "interested",
        "key_points": ["asked about pricing"],
        "next_action": "schedule follow-up"
    }))
}

// --- Dashboard-side helpers ---

pub fn test_config(backend_url: Url) -> DashboardConfig {
    DashboardConfig {
        backend_url,
        port: 0,
        call_log_limit: 50,
        auto_refresh: false,
        call_poll_interval: Duration::from_millis(30),
        call_poll_ceiling: Duration::from_millis(400),
        refresh_interval_idle: Duration::from_millis(60),
        refresh_interval_active: Duration::from_millis(30),
        http_timeout: Duration::from_secs(2),
    }
}

pub fn make_state(backend: &MockBackend) -> SharedState {
    Arc::new(DashboardState::new(test_config(backend.base_url())))
}

/// Poll an async condition until it holds or the timeout elapses.
pub async fn wait_for<F, Fut>(timeout: Duration, mut condition: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    let deadline = Instant::now() + timeout;
    loop {
        if condition().await {
            return true;
        }
        if Instant::now() >= deadline {
            return false;
        }
        sleep(Duration::from_millis(10)).await;
    }
}
