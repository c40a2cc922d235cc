use chrono::{DateTime, Utc};
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{broadcast, watch, RwLock};

use crate::backend::BackendClient;
use crate::config::DashboardConfig;
use crate::models::{
    ActiveCall, AgentForm, CallLog, CallStatusUpdate, CampaignStats, ClientForm, SystemHealth,
    TestAgent, TestClient,
};
use crate::notice::NoticeState;
use crate::stats::{compute_test_stats, TestStats};

pub type SharedState = Arc<DashboardState>;

/// All view state lives here, one `RwLock` per resource so that a failed
/// or slow fetch of one collection never blocks or blanks another. Every
/// mutation replaces a collection wholesale, except active calls, which
/// merge by SID.
pub struct DashboardState {
    pub config: DashboardConfig,
    pub backend: BackendClient,
    pub clients: RwLock<Vec<TestClient>>,
    pub agents: RwLock<Vec<TestAgent>>,
    pub call_logs: RwLock<Vec<CallLog>>,
    pub active_calls: RwLock<HashMap<String, ActiveCall>>,
    pub health: RwLock<Option<SystemHealth>>,
    pub stats: RwLock<Option<CampaignStats>>,
    pub test_stats: RwLock<TestStats>,
    pub forms: RwLock<FormState>,
    pub sync: RwLock<SyncStatus>,
    pollers: RwLock<HashMap<String, watch::Sender<bool>>>,
    pub notices: NoticeState,
    pub shutdown_tx: broadcast::Sender<()>,
}

/// Draft inputs for the create forms plus in-flight guards. A submission
/// in flight blocks a second concurrent submit of the same form.
#[derive(Debug, Default)]
pub struct FormState {
    pub client_draft: ClientForm,
    pub agent_draft: AgentForm,
    pub client_submit_in_flight: bool,
    pub agent_submit_in_flight: bool,
}

#[derive(Debug, Default, Clone)]
pub struct SyncStatus {
    pub backend_reachable: bool,
    pub last_refresh_at: Option<DateTime<Utc>>,
    pub refresh_running: bool,
    pub consecutive_refresh_failures: u32,
    pub unreachable_reported: bool,
}

impl DashboardState {
    pub fn new(config: DashboardConfig) -> Self {
        let backend = BackendClient::new(config.clone());
        let (shutdown_tx, _) = broadcast::channel(1);
        Self {
            config,
            backend,
            clients: RwLock::new(Vec::new()),
            agents: RwLock::new(Vec::new()),
            call_logs: RwLock::new(Vec::new()),
            active_calls: RwLock::new(HashMap::new()),
            health: RwLock::new(None),
            stats: RwLock::new(None),
            test_stats: RwLock::new(TestStats::default()),
            forms: RwLock::new(FormState::default()),
            sync: RwLock::new(SyncStatus::default()),
            pollers: RwLock::new(HashMap::new()),
            notices: NoticeState::new(),
            shutdown_tx,
        }
    }

    /// Replace the call-log collection and recompute test stats from it.
    pub async fn set_call_logs(&self, logs: Vec<CallLog>) {
        let derived = compute_test_stats(&logs);
        *self.call_logs.write().await = logs;
        *self.test_stats.write().await = derived;
    }

    pub async fn insert_active_call(&self, call: ActiveCall) {
        self.active_calls
            .write()
            .await
            .insert(call.call_sid.clone(), call);
    }

    /// In-place status update for one SID during polling. Returns false if
    /// the call is no longer tracked.
    pub async fn update_active_call(&self, call_sid: &str, update: &CallStatusUpdate) -> bool {
        let mut calls = self.active_calls.write().await;
        match calls.get_mut(call_sid) {
            Some(call) => {
                call.status = update.status.clone();
                if update.stage.is_some() {
                    call.stage = update.stage.clone();
                }
                if let Some(turns) = update.conversation_turns {
                    call.conversation_turns = turns;
                }
                call.last_activity = Utc::now();
                true
            }
            None => false,
        }
    }

    pub async fn remove_active_call(&self, call_sid: &str) -> Option<ActiveCall> {
        self.active_calls.write().await.remove(call_sid)
    }

    pub async fn has_active_calls(&self) -> bool {
        !self.active_calls.read().await.is_empty()
    }

    /// Merge a fetched active-call collection by SID. A fetched entry only
    /// overwrites a local one when it is at least as fresh, so a whole-
    /// collection refresh that resolved late cannot clobber an in-place
    /// poller update. Entries owned by a live poller survive the merge
    /// even when absent from the fetched set; everything else not present
    /// in the fetch is dropped.
    pub async fn merge_active_calls(&self, fetched: Vec<ActiveCall>) {
        let tracked: Vec<String> = self.pollers.read().await.keys().cloned().collect();
        let mut calls = self.active_calls.write().await;

        let fetched_sids: Vec<String> = fetched.iter().map(|c| c.call_sid.clone()).collect();
        for incoming in fetched {
            match calls.get(&incoming.call_sid) {
                Some(existing) if existing.last_activity > incoming.last_activity => {}
                _ => {
                    calls.insert(incoming.call_sid.clone(), incoming);
                }
            }
        }

        calls.retain(|sid, _| fetched_sids.contains(sid) || tracked.contains(sid));
    }

    // --- Poller registry ---
    //
    // Every polling task registers a stop handle here; every exit path of
    // the task unregisters it. No timer outlives its entry.

    /// Register a stop handle for a SID. Returns false when a poller is
    /// already tracking that SID; the caller must not spawn a second one,
    /// since replacing the entry would cross-cancel both tasks.
    pub async fn register_poller(&self, call_sid: &str, stop_tx: watch::Sender<bool>) -> bool {
        match self.pollers.write().await.entry(call_sid.to_string()) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(stop_tx);
                true
            }
        }
    }

    pub async fn unregister_poller(&self, call_sid: &str) {
        self.pollers.write().await.remove(call_sid);
    }

    pub async fn poller_exists(&self, call_sid: &str) -> bool {
        self.pollers.read().await.contains_key(call_sid)
    }

    /// Signal one poller to stop. Returns false if no poller is tracking
    /// that SID.
    pub async fn stop_poller(&self, call_sid: &str) -> bool {
        match self.pollers.read().await.get(call_sid) {
            Some(tx) => {
                let _ = tx.send(true);
                true
            }
            None => false,
        }
    }

    pub async fn stop_all_pollers(&self) {
        for tx in self.pollers.read().await.values() {
            let _ = tx.send(true);
        }
    }

    /// Tear down all background work: refresh loop and pollers.
    pub async fn shutdown(&self) {
        let _ = self.shutdown_tx.send(());
        self.stop_all_pollers().await;
    }
}
