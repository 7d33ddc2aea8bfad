//! `AgentState` — the record threaded through every node invocation, and
//! the reducer that merges concurrent worker writes (§3 DATA MODEL).

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One step of a planner-produced execution plan.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Step {
    pub number: u32,
    pub agents: Vec<String>,
    pub description: String,
}

/// Gate result of the PII/Safety/RFI pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RfiStatus {
    Complete,
    MissingInfo,
    Unsafe,
    OutOfScope,
    Error,
}

/// What the scheduler should do after a node's delta is applied.
///
/// `None` means the scheduler should stop (terminal sentinel); a single
/// invocation runs one node; a fan-out runs every named node concurrently
/// and merges their deltas through the reducer before continuing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    None,
    Single(String),
    Many(Vec<String>),
}

impl Route {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Route::None)
    }
}

pub const TERMINAL: &str = "__terminal__";

/// The shared state container. Every field a worker can write is
/// independently mergeable — two workers in the same parallel step write
/// disjoint slots and never contend.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AgentState {
    pub user_message: String,
    pub user_email: String,
    pub session_id: String,

    #[serde(skip)]
    pub route: Option<Route>,

    pub execution_plan: Vec<Step>,
    pub current_step: usize,
    pub pending_nodes: Vec<String>,
    pub finished_steps: Vec<u32>,

    pub flight_result: Option<Value>,
    pub hotel_result: Option<Value>,
    pub visa_result: Option<Value>,
    pub tripadvisor_result: Option<Value>,
    pub utilities_result: Option<Value>,

    pub collected_info: HashMap<String, Value>,
    pub relevant_memories: Vec<String>,

    pub rfi_status: Option<RfiStatus>,
    pub rfi_context: Option<String>,

    pub last_response: Option<String>,

    /// `needs_<worker>` flags derived from the plan; tells the join which
    /// slots to wait for.
    pub needs: HashMap<String, bool>,

    pub feedback_retry_count: u32,
    pub plan_executor_retry_count: u32,
    pub worker_feedback_retry_count: HashMap<String, u32>,
    pub conversational_feedback_retry_count: u32,
    pub join_retry_count: u32,

    /// `true` while a parallel step's workers are in flight.
    pub parallel_mode: bool,

    /// Set by the plan executor when `current_step >= len(execution_plan)`
    /// — tells the join node there is no next step to dispatch, so once
    /// outstanding work (if any) completes it should route to the
    /// responder rather than back to the planner.
    pub ready_for_response: bool,
}

impl AgentState {
    pub fn new(user_email: impl Into<String>, session_id: impl Into<String>, user_message: impl Into<String>) -> Self {
        Self {
            user_email: user_email.into(),
            session_id: session_id.into(),
            user_message: user_message.into(),
            ..Default::default()
        }
    }

    /// Canonical result-slot accessor by worker name (`flight`, `hotel`, ...).
    pub fn result_slot(&self, worker: &str) -> Option<&Value> {
        match worker {
            "flight" => self.flight_result.as_ref(),
            "hotel" => self.hotel_result.as_ref(),
            "visa" => self.visa_result.as_ref(),
            "tripadvisor" => self.tripadvisor_result.as_ref(),
            "utilities" => self.utilities_result.as_ref(),
            _ => None,
        }
    }

    pub fn set_result_slot(&mut self, worker: &str, value: Value) {
        match worker {
            "flight" => self.flight_result = Some(value),
            "hotel" => self.hotel_result = Some(value),
            "visa" => self.visa_result = Some(value),
            "tripadvisor" => self.tripadvisor_result = Some(value),
            "utilities" => self.utilities_result = Some(value),
            _ => {}
        }
    }

    /// A worker's result slot is "complete" if it holds anything non-null
    /// — including an error envelope, which still counts as a produced
    /// result for join purposes.
    pub fn worker_complete(&self, worker: &str) -> bool {
        self.result_slot(worker).is_some()
    }
}

/// Merge two concurrent deltas on the same field following §3's rule:
/// "prefer non-null right over null left; otherwise the latest write wins."
/// Used when two workers in the same parallel step both touch
/// `collected_info` or another shared container — their own result slots
/// never collide, so this only matters for state every worker may touch.
pub fn merge_optional<T: Clone>(left: &Option<T>, right: &Option<T>) -> Option<T> {
    match (left, right) {
        (_, Some(r)) => Some(r.clone()),
        (Some(l), None) => Some(l.clone()),
        (None, None) => None,
    }
}
