use chrono::Utc;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::config::REFRESH_FAILURE_THRESHOLD;
use crate::controller::{self, ResourceKind};
use crate::notice::{NoticeSource, Severity};
use crate::state::SharedState;

/// Spawn the background refresh loop. Call logs refresh on every pass;
/// active calls and system health only while a call is live, and the
/// cadence tightens while one is. The loop exits on the shared shutdown
/// channel, so no timer survives teardown.
pub fn spawn_refresh_loop(state: SharedState) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        info!("Background refresh loop started");
        state.sync.write().await.refresh_running = true;

        let mut shutdown_rx = state.shutdown_tx.subscribe();
        loop {
            let interval = if state.has_active_calls().await {
                state.config.refresh_interval_active
            } else {
                state.config.refresh_interval_idle
            };

            tokio::select! {
                _ = shutdown_rx.recv() => break,
                _ = sleep(interval) => {}
            }

            refresh_pass(&state).await;
        }

        state.sync.write().await.refresh_running = false;
        info!("Background refresh loop stopped");
    })
}

/// One refresh pass. Persistent failure escalates a single notice at the
/// threshold instead of toasting every pass; recovery clears it.
pub async fn refresh_pass(state: &SharedState) {
    let live = state.has_active_calls().await;

    let logs_result = controller::fetch_and_store(state, ResourceKind::CallLogs).await;
    if live {
        let _ = tokio::join!(
            controller::fetch_and_store(state, ResourceKind::ActiveCalls),
            controller::fetch_and_store(state, ResourceKind::Health),
        );
    }

    match logs_result {
        Ok(()) => {
            let mut sync = state.sync.write().await;
            sync.last_refresh_at = Some(Utc::now());
            sync.consecutive_refresh_failures = 0;
            sync.backend_reachable = true;
            let was_reported = sync.unreachable_reported;
            sync.unreachable_reported = false;
            drop(sync);

            if was_reported {
                info!("Backend connection restored");
                state
                    .notices
                    .emit(
                        NoticeSource::Refresh,
                        Severity::Success,
                        "Backend connection restored",
                    )
                    .await;
            }
        }
        Err(err) => {
            let reachable = state.backend.liveness().await;
            let mut sync = state.sync.write().await;
            sync.consecutive_refresh_failures += 1;
            sync.backend_reachable = reachable;
            let failures = sync.consecutive_refresh_failures;
            let should_report =
                failures >= REFRESH_FAILURE_THRESHOLD && !sync.unreachable_reported;
            if should_report {
                sync.unreachable_reported = true;
            }
            drop(sync);

            debug!(error = %err, failures, "Background refresh failed");
            if should_report {
                warn!(failures, "Backend refresh failing persistently");
                state
                    .notices
                    .emit(
                        NoticeSource::Refresh,
                        Severity::Warning,
                        "Backend unreachable: dashboard data may be stale",
                    )
                    .await;
            }
        }
    }
}
