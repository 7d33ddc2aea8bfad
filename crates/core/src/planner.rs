//! Planner Node (C9) — a single LLM call that turns the user's message,
//! memories, and STM context into an ordered `execution_plan`. Downstream
//! `PlanFeedbackNode` validates the shape before it reaches the dispatcher.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;

use ao_domain::error::Result;
use ao_domain::tool::Message;
use ao_graph::{AgentState, Node, Route, Step};
use ao_providers::{ChatRequest, LlmProvider};

use crate::feedback::plan_feedback::NAME as PLAN_FEEDBACK_NODE;

pub const NAME: &str = "planner";

const ATTRACTION_KEYWORDS: &[&str] = &["restaurant", "attraction", "museum", "tour", "sightseeing", "things to do", "recommend"];

const SYSTEM_PROMPT: &str = "Plan the next step of a travel-booking turn. Agents available: flight, \
hotel, visa, tripadvisor, utilities. Group independent agents into the same step; put hard \
dependencies (e.g. checking holidays before booking when the user wants to avoid them, or currency \
conversion after prices are known) in separate, ordered steps. If everything needed is already \
known from context, return an empty plan. Respond with JSON only: {\"steps\": \
[{\"step_number\": int, \"agents\": [string], \"description\": string}]}.";

#[derive(Debug, Deserialize)]
struct PlanResponse {
    #[serde(default)]
    steps: Vec<PlannedStep>,
}

#[derive(Debug, Deserialize)]
struct PlannedStep {
    step_number: u32,
    agents: Vec<String>,
    #[serde(default)]
    description: String,
}

pub struct PlannerNode {
    provider: Arc<dyn LlmProvider>,
}

impl PlannerNode {
    pub fn new(provider: Arc<dyn LlmProvider>) -> Self {
        Self { provider }
    }

    fn mentions_attraction(message: &str) -> bool {
        let lower = message.to_lowercase();
        ATTRACTION_KEYWORDS.iter().any(|kw| lower.contains(kw))
    }
}

#[async_trait]
impl Node for PlannerNode {
    fn name(&self) -> &str {
        NAME
    }

    async fn run(&self, mut state: AgentState) -> Result<AgentState> {
        let mut context = String::new();
        if !state.relevant_memories.is_empty() {
            context.push_str("Known traveler facts:\n");
            for memory in &state.relevant_memories {
                context.push_str("- ");
                context.push_str(memory);
                context.push('\n');
            }
        }
        context.push_str("\nTraveler message: ");
        context.push_str(&state.user_message);

        let req = ChatRequest {
            messages: vec![Message::system(SYSTEM_PROMPT), Message::user(context)],
            json_mode: true,
            ..Default::default()
        };

        let plan_response = match self.provider.chat(&req).await {
            Ok(resp) => serde_json::from_str::<PlanResponse>(&resp.content).unwrap_or(PlanResponse { steps: vec![] }),
            Err(e) => {
                tracing::warn!(session_id = %state.session_id, error = %e, "planner call failed, proceeding with empty plan");
                PlanResponse { steps: vec![] }
            }
        };

        let allow_tripadvisor = Self::mentions_attraction(&state.user_message);
        let steps = plan_response
            .steps
            .into_iter()
            .filter_map(|s| {
                let agents: Vec<String> = s
                    .agents
                    .into_iter()
                    .filter(|a| a != "tripadvisor" || allow_tripadvisor)
                    .collect();
                if agents.is_empty() {
                    None
                } else {
                    Some(Step { number: s.step_number, agents, description: s.description })
                }
            })
            .collect::<Vec<_>>();

        state.execution_plan = steps;
        state.current_step = 0;
        state.route = Some(Route::Single(PLAN_FEEDBACK_NODE.to_string()));
        Ok(state)
    }
}
