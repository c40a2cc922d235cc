use serde::Serialize;

use crate::models::CallLog;

/// Aggregates derived client-side from test-flagged call logs. Never
/// fetched; recomputed whenever the call-log collection changes.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TestStats {
    pub total_test_calls: u32,
    pub successful_calls: u32,
    pub failed_calls: u32,
    pub success_rate: f64,
    pub average_turns: f64,
}

/// Every test call counts as either successful (completed) or failed, so
/// `successful + failed == total` always holds.
pub fn compute_test_stats(logs: &[CallLog]) -> TestStats {
    let test_logs: Vec<&CallLog> = logs.iter().filter(|l| l.is_test_call).collect();
    let total = test_logs.len() as u32;
    let successful = test_logs.iter().filter(|l| l.status == "completed").count() as u32;
    let failed = total - successful;

    let success_rate = if total > 0 {
        f64::from(successful) / f64::from(total)
    } else {
        0.0
    };

    let average_turns = if total > 0 {
        let turn_sum: u32 = test_logs.iter().map(|l| l.conversation_turns).sum();
        f64::from(turn_sum) / f64::from(total)
    } else {
        0.0
    };

    TestStats {
        total_test_calls: total,
        successful_calls: successful,
        failed_calls: failed,
        success_rate,
        average_turns,
    }
}
