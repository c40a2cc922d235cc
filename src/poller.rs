use std::time::Duration;
use tokio::sync::watch;
use tokio::time::{sleep, timeout, Instant};
use tracing::{debug, info, warn};

use crate::config::CALL_POLL_FAILURE_THRESHOLD;
use crate::controller::{self, ResourceKind};
use crate::models::is_terminal_status;
use crate::notice::{NoticeSource, Severity};
use crate::state::SharedState;

#[derive(Debug, PartialEq)]
enum PollExit {
    /// Backend reported a terminal status.
    Terminal(String),
    /// The wall-clock ceiling elapsed without a terminal status.
    Ceiling,
    /// Explicit stop (stop-monitoring request or shutdown).
    Stopped,
}

/// Spawn the status poller for one call SID. The stop handle is
/// registered before the task starts so an explicit stop can never race
/// the spawn, and every exit path unregisters it. At most one poller per
/// SID: a duplicate request leaves the existing poller untouched and
/// returns None.
pub async fn spawn_call_poller(
    state: SharedState,
    call_sid: String,
) -> Option<tokio::task::JoinHandle<()>> {
    let (stop_tx, stop_rx) = watch::channel(false);
    if !state.register_poller(&call_sid, stop_tx).await {
        debug!(call_sid, "Poller already tracking this call");
        return None;
    }

    Some(tokio::spawn(async move {
        let exit = poll_call(&state, &call_sid, stop_rx).await;
        state.unregister_poller(&call_sid).await;
        finish(&state, &call_sid, exit).await;
    }))
}

/// One sequential polling loop: each tick's request completes before the
/// next tick is waited on, so requests for a SID never overlap.
async fn poll_call(state: &SharedState, call_sid: &str, mut stop_rx: watch::Receiver<bool>) -> PollExit {
    let interval = state.config.call_poll_interval;
    let deadline = Instant::now() + state.config.call_poll_ceiling;
    let mut consecutive_failures: u32 = 0;
    let mut failure_escalated = false;

    loop {
        tokio::select! {
            changed = stop_rx.changed() => {
                if changed.is_err() || *stop_rx.borrow() {
                    return PollExit::Stopped;
                }
                continue;
            }
            _ = sleep(remaining(interval, deadline)) => {}
        }

        if Instant::now() >= deadline {
            return PollExit::Ceiling;
        }

        // A tick's request is bounded by the time left before the deadline,
        // not just the client timeout, so a hung backend cannot hold the
        // loop past the ceiling. A timed-out tick trips the deadline check
        // on the next pass.
        let left = deadline.saturating_duration_since(Instant::now());
        let tick = timeout(
            left.max(Duration::from_millis(1)),
            state.backend.call_status(call_sid),
        )
        .await;
        let result = match tick {
            Ok(result) => result,
            Err(_) => continue,
        };

        match result {
            Ok(update) => {
                consecutive_failures = 0;
                if is_terminal_status(&update.status) {
                    return PollExit::Terminal(update.status);
                }
                if !state.update_active_call(call_sid, &update).await {
                    // Entry disappeared under us (e.g. backend no longer
                    // lists it and nothing fresh was merged); not fatal,
                    // keep polling until a terminal status or the ceiling.
                    debug!(call_sid, "Status update for untracked active call");
                }
            }
            Err(err) => {
                // Transient failures never abort the loop and never toast
                // per tick; a single escalation after the threshold.
                consecutive_failures += 1;
                debug!(call_sid, attempt = consecutive_failures, error = %err, "Call status poll failed");
                if consecutive_failures >= CALL_POLL_FAILURE_THRESHOLD && !failure_escalated {
                    failure_escalated = true;
                    warn!(call_sid, "Call status polling failing persistently");
                    state
                        .notices
                        .emit(
                            NoticeSource::CallPoller,
                            Severity::Warning,
                            format!(
                                "Unable to reach backend for call {} status, still retrying",
                                call_sid
                            ),
                        )
                        .await;
                }
            }
        }
    }
}

/// Sleep no longer than the time left before the deadline, so the loop
/// terminates within ceiling + one interval even with a slow backend.
fn remaining(interval: Duration, deadline: Instant) -> Duration {
    let left = deadline.saturating_duration_since(Instant::now());
    interval.min(left.max(Duration::from_millis(1)))
}

async fn finish(state: &SharedState, call_sid: &str, exit: PollExit) {
    match exit {
        PollExit::Terminal(status) => {
            state.remove_active_call(call_sid).await;
            info!(call_sid, status = %status, "Call reached terminal status");
            state
                .notices
                .emit(
                    NoticeSource::CallPoller,
                    Severity::Info,
                    format!("Call {} ended: {}", call_sid, status),
                )
                .await;
            // Completed-call side effects (new log entry, client attempt
            // counters) become visible through a dependent refresh.
            let _ = tokio::join!(
                controller::load(state, ResourceKind::CallLogs),
                controller::load(state, ResourceKind::Clients),
            );
        }
        PollExit::Ceiling => {
            state.remove_active_call(call_sid).await;
            warn!(call_sid, "Polling ceiling reached without terminal status");
            state
                .notices
                .emit(
                    NoticeSource::CallPoller,
                    Severity::Warning,
                    format!(
                        "Stopped monitoring call {}: no terminal status before timeout, outcome unknown",
                        call_sid
                    ),
                )
                .await;
        }
        PollExit::Stopped => {
            state.remove_active_call(call_sid).await;
            info!(call_sid, "Call monitoring stopped");
            state
                .notices
                .emit(
                    NoticeSource::CallPoller,
                    Severity::Info,
                    format!("Stopped monitoring call {}", call_sid),
                )
                .await;
        }
    }
}
