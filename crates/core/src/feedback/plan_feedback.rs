//! Plan Feedback (C7) — the gate between the Planner Node (C9) and the
//! Plan Executor. Rejects a malformed plan (empty, or naming an unknown
//! worker) and sends the planner back to try again, bounded by
//! `max_feedback_retries`.

use std::sync::Arc;

use async_trait::async_trait;

use ao_domain::error::Result;
use ao_domain::telemetry::NodeTelemetry;
use ao_graph::{AgentState, Node, Route, PLANNER_NODE, PLAN_EXECUTOR};

pub const NAME: &str = "plan_feedback";

const VALID_WORKERS: &[&str] = &["flight", "hotel", "visa", "tripadvisor", "utilities"];

pub struct PlanFeedbackNode {
    max_retries: u32,
    telemetry: Arc<dyn NodeTelemetry>,
}

impl PlanFeedbackNode {
    pub fn new(max_retries: u32, telemetry: Arc<dyn NodeTelemetry>) -> Self {
        Self { max_retries, telemetry }
    }

    /// An empty plan is a legitimate output (everything needed is already
    /// known), so it passes straight through. A non-empty plan is only
    /// invalid if a step names no agents or an agent we don't recognize.
    fn plan_is_valid(state: &AgentState) -> bool {
        state
            .execution_plan
            .iter()
            .all(|step| !step.agents.is_empty() && step.agents.iter().all(|a| VALID_WORKERS.contains(&a.as_str())))
    }
}

#[async_trait]
impl Node for PlanFeedbackNode {
    fn name(&self) -> &str {
        NAME
    }

    async fn run(&self, mut state: AgentState) -> Result<AgentState> {
        if Self::plan_is_valid(&state) {
            state.route = Some(Route::Single(PLAN_EXECUTOR.to_string()));
            return Ok(state);
        }

        if state.plan_executor_retry_count < self.max_retries {
            self.telemetry.feedback_failure(&state.session_id, Some(&state.user_email), NAME, "invalid plan, regenerating");
            state.plan_executor_retry_count += 1;
            state.route = Some(Route::Single(PLANNER_NODE.to_string()));
            return Ok(state);
        }

        // Exhausted retries: proceed with an empty plan so the turn still
        // reaches the responder rather than looping forever.
        self.telemetry.feedback_failure(&state.session_id, Some(&state.user_email), NAME, "retries exhausted, proceeding with empty plan");
        state.execution_plan.clear();
        state.current_step = 0;
        state.route = Some(Route::Single(PLAN_EXECUTOR.to_string()));
        Ok(state)
    }
}
