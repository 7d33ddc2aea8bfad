//! Plan Executor + Parallel Dispatcher (C10) — walks `execution_plan` one
//! step at a time, dispatching each step's agents as a parallel fan-out.
//!
//! The dispatcher has no separate identity here: "write `route`, increment
//! `current_step`, hand off to the dispatcher" and "record `pending_nodes`,
//! set `parallel_mode`, emit edges into every worker" are one state
//! transition, so `PlanExecutor` does both in a single node.

use async_trait::async_trait;

use ao_domain::error::Result;

use crate::node::Node;
use crate::state::{AgentState, Route};

pub const PLAN_EXECUTOR: &str = "plan_executor";
pub const JOIN_NODE: &str = "join";

pub struct PlanExecutor;

#[async_trait]
impl Node for PlanExecutor {
    fn name(&self) -> &str {
        PLAN_EXECUTOR
    }

    async fn run(&self, mut state: AgentState) -> Result<AgentState> {
        if state.current_step >= state.execution_plan.len() {
            state.ready_for_response = true;
            state.route = Some(Route::Single(JOIN_NODE.to_string()));
            return Ok(state);
        }

        let step = state.execution_plan[state.current_step].clone();
        state.current_step += 1;
        state.pending_nodes = step.agents.clone();
        state.parallel_mode = true;
        state.route = Some(Route::Many(step.agents));
        Ok(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::Step;

    fn step(number: u32, agents: &[&str]) -> Step {
        Step { number, agents: agents.iter().map(|s| s.to_string()).collect(), description: String::new() }
    }

    #[tokio::test]
    async fn empty_plan_routes_straight_to_join_ready_for_response() {
        let state = AgentState::new("a@example.com", "s1", "hi");
        let result = PlanExecutor.run(state).await.unwrap();
        assert!(result.ready_for_response);
        assert_eq!(result.route, Some(Route::Single(JOIN_NODE.to_string())));
    }

    #[tokio::test]
    async fn dispatches_current_step_and_advances_cursor() {
        let mut state = AgentState::new("a@example.com", "s1", "hi");
        state.execution_plan = vec![step(1, &["flight", "hotel"]), step(2, &["utilities"])];

        let result = PlanExecutor.run(state).await.unwrap();
        assert_eq!(result.current_step, 1);
        assert_eq!(result.pending_nodes, vec!["flight".to_string(), "hotel".to_string()]);
        assert!(result.parallel_mode);
        assert_eq!(result.route, Some(Route::Many(vec!["flight".to_string(), "hotel".to_string()])));
    }

    #[tokio::test]
    async fn second_call_dispatches_next_step() {
        let mut state = AgentState::new("a@example.com", "s1", "hi");
        state.execution_plan = vec![step(1, &["flight"]), step(2, &["utilities"])];
        state.current_step = 1;

        let result = PlanExecutor.run(state).await.unwrap();
        assert_eq!(result.current_step, 2);
        assert_eq!(result.route, Some(Route::Many(vec!["utilities".to_string()])));
    }
}
