//! Worker Feedback (C7) — runs once a parallel step's Join completes.
//! Any worker whose slot holds an error envelope gets one more chance
//! (bounded by `max_feedback_retries`) before the turn moves on with a
//! partial result.

use std::sync::Arc;

use async_trait::async_trait;

use ao_domain::error::Result;
use ao_domain::telemetry::NodeTelemetry;
use ao_graph::{AgentState, Node, Route, PLANNER_NODE, PLANNER_WORKER_NODE, WORKER_FEEDBACK_NODE};

use crate::worker::tool_worker::is_error_envelope;

pub struct WorkerFeedbackNode {
    max_retries: u32,
    telemetry: Arc<dyn NodeTelemetry>,
}

impl WorkerFeedbackNode {
    pub fn new(max_retries: u32, telemetry: Arc<dyn NodeTelemetry>) -> Self {
        Self { max_retries, telemetry }
    }

    fn step_workers(state: &AgentState) -> Vec<String> {
        if state.current_step > 0 {
            if let Some(step) = state.execution_plan.get(state.current_step - 1) {
                return step.agents.clone();
            }
        }
        Vec::new()
    }

    fn clear_slot(state: &mut AgentState, worker: &str) {
        match worker {
            "flight" => state.flight_result = None,
            "hotel" => state.hotel_result = None,
            "visa" => state.visa_result = None,
            "tripadvisor" => state.tripadvisor_result = None,
            "utilities" => state.utilities_result = None,
            _ => {}
        }
    }
}

#[async_trait]
impl Node for WorkerFeedbackNode {
    fn name(&self) -> &str {
        WORKER_FEEDBACK_NODE
    }

    async fn run(&self, mut state: AgentState) -> Result<AgentState> {
        let workers = Self::step_workers(&state);

        let mut retry_targets = Vec::new();
        for worker in &workers {
            let Some(result) = state.result_slot(worker) else { continue };
            if !is_error_envelope(result) {
                continue;
            }
            let count = state.worker_feedback_retry_count.entry(worker.clone()).or_insert(0);
            if *count < self.max_retries {
                *count += 1;
                self.telemetry.feedback_failure(
                    &state.session_id,
                    Some(&state.user_email),
                    &format!("{WORKER_FEEDBACK_NODE}:{worker}"),
                    "worker returned an error, retrying",
                );
                retry_targets.push(worker.clone());
            } else {
                self.telemetry.feedback_failure(
                    &state.session_id,
                    Some(&state.user_email),
                    &format!("{WORKER_FEEDBACK_NODE}:{worker}"),
                    "retries exhausted, passing through with error",
                );
            }
        }

        if retry_targets.is_empty() {
            state.route = Some(Route::Single(if state.ready_for_response {
                PLANNER_WORKER_NODE.to_string()
            } else {
                PLANNER_NODE.to_string()
            }));
            return Ok(state);
        }

        for worker in &retry_targets {
            Self::clear_slot(&mut state, worker);
        }
        state.pending_nodes = retry_targets.clone();
        state.parallel_mode = true;
        state.route = Some(Route::Many(retry_targets));
        Ok(state)
    }
}
