use serde::{Deserialize, Serialize};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Retry / recursion / deadline bounds (§3, §5)
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoundsConfig {
    /// Per-worker and plan/response feedback retry budget.
    #[serde(default = "d_2")]
    pub max_feedback_retries: u32,
    /// Join barrier poll budget before proceeding with partial results.
    #[serde(default = "d_20")]
    pub max_join_polls: u32,
    /// Join poll interval in milliseconds.
    #[serde(default = "d_500")]
    pub join_poll_interval_ms: u64,
    /// Scheduler transition budget (node invocations) per request.
    #[serde(default = "d_50")]
    pub recursion_budget: u32,
    /// Request-level deadline, seconds.
    #[serde(default = "d_120")]
    pub request_deadline_secs: u64,
    /// Per-tool-call deadline, seconds.
    #[serde(default = "d_60")]
    pub tool_call_deadline_secs: u64,
    /// Connect-only timeout for tool calls, seconds.
    #[serde(default = "d_10")]
    pub tool_connect_timeout_secs: u64,
    /// Tool client retry attempts on connection-class errors.
    #[serde(default = "d_3")]
    pub tool_retry_attempts: u32,
    /// Backoff unit in milliseconds; attempt N waits `backoff_ms * N`.
    #[serde(default = "d_500")]
    pub tool_retry_backoff_ms: u64,
}

impl Default for BoundsConfig {
    fn default() -> Self {
        Self {
            max_feedback_retries: 2,
            max_join_polls: 20,
            join_poll_interval_ms: 500,
            recursion_budget: 50,
            request_deadline_secs: 120,
            tool_call_deadline_secs: 60,
            tool_connect_timeout_secs: 10,
            tool_retry_attempts: 3,
            tool_retry_backoff_ms: 500,
        }
    }
}

fn d_2() -> u32 {
    2
}
fn d_20() -> u32 {
    20
}
fn d_500() -> u64 {
    500
}
fn d_50() -> u32 {
    50
}
fn d_120() -> u64 {
    120
}
fn d_60() -> u64 {
    60
}
fn d_10() -> u64 {
    10
}
fn d_3() -> u32 {
    3
}
