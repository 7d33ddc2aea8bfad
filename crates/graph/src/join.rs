//! Join Node (C10) — waits for a parallel step's workers to finish,
//! advances `finished_steps`, and routes back to the planner (or the
//! responder, when the plan executor signalled there's no next step).
//!
//! Also implements the legacy join fallback (§11): when invoked with no
//! structured plan (`pending_nodes` empty and no current step), it falls
//! back to checking `needs_<worker>` flags directly against result slots
//! — the path a single ad-hoc worker dispatch takes when it bypasses the
//! planner entirely.

use std::time::Duration;

use async_trait::async_trait;

use ao_domain::config::BoundsConfig;
use ao_domain::envelope::ErrorEnvelope;
use ao_domain::error::Result;

use crate::node::Node;
use crate::plan::JOIN_NODE;
use crate::state::{AgentState, Route};

pub const PLANNER_NODE: &str = "planner";
/// The trip-plan CRUD worker (C6), not the plan-producing Planner Node
/// (C9) — runs once the plan is exhausted, ahead of the conversational
/// response, per the "… Planner (plan CRUD if intent) → Conversational
/// Response …" tail of the turn flow.
pub const PLANNER_WORKER_NODE: &str = "planner_worker";
/// Per-worker Feedback (C7) — every finished step passes through here
/// before the scheduler decides whether to loop back to the planner or
/// proceed to the responder, per "… Join) → per-worker Feedback → … repeat
/// until plan exhausted …".
pub const WORKER_FEEDBACK_NODE: &str = "worker_feedback";

pub struct JoinNode {
    max_join_polls: u32,
    poll_interval: Duration,
}

impl JoinNode {
    pub fn new(bounds: &BoundsConfig) -> Self {
        Self {
            max_join_polls: bounds.max_join_polls,
            poll_interval: Duration::from_millis(bounds.join_poll_interval_ms),
        }
    }

    /// The set of workers this join is waiting on: prefer `pending_nodes`,
    /// else the just-finished step's agents, else (legacy fallback) every
    /// worker whose `needs_<worker>` flag is set.
    fn waiting_set(&self, state: &AgentState) -> Vec<String> {
        if !state.pending_nodes.is_empty() {
            return state.pending_nodes.clone();
        }
        if state.current_step > 0 {
            if let Some(step) = state.execution_plan.get(state.current_step - 1) {
                return step.agents.clone();
            }
        }
        state.needs.iter().filter(|(_, needed)| **needed).map(|(worker, _)| worker.clone()).collect()
    }

    fn finish_step(&self, state: &mut AgentState) {
        if state.current_step > 0 {
            if let Some(step) = state.execution_plan.get(state.current_step - 1) {
                if !state.finished_steps.contains(&step.number) {
                    state.finished_steps.push(step.number);
                }
            }
        }
        state.pending_nodes.clear();
        state.parallel_mode = false;
        state.join_retry_count = 0;
        state.route = Some(Route::Single(WORKER_FEEDBACK_NODE.to_string()));
    }
}

#[async_trait]
impl Node for JoinNode {
    fn name(&self) -> &str {
        JOIN_NODE
    }

    async fn run(&self, mut state: AgentState) -> Result<AgentState> {
        let waiting = self.waiting_set(&state);
        let all_complete = waiting.iter().all(|w| state.worker_complete(w));

        if all_complete {
            self.finish_step(&mut state);
            return Ok(state);
        }

        if state.join_retry_count >= self.max_join_polls {
            for worker in &waiting {
                if !state.worker_complete(worker) {
                    let envelope = serde_json::to_value(ErrorEnvelope::did_not_complete(worker))
                        .expect("ErrorEnvelope always serializes");
                    state.set_result_slot(worker, envelope);
                }
            }
            state.collected_info = crate::reducer::build_collected_info(&state);
            self.finish_step(&mut state);
            return Ok(state);
        }

        state.join_retry_count += 1;
        tokio::time::sleep(self.poll_interval).await;
        state.route = Some(Route::Single(JOIN_NODE.to_string()));
        Ok(state)
    }
}
