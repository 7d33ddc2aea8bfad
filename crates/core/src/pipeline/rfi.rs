//! Two-stage RFI gate (§4.5): safety/scope first, then completeness. Both
//! stages are single LLM calls against a small classifier prompt; either can
//! terminate the turn directly (`Route::None`) with `rfi_status` set so the
//! caller knows why no plan was produced.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;

use ao_domain::error::Result;
use ao_domain::tool::Message;
use ao_graph::{AgentState, Node, Route, RfiStatus, PLANNER_NODE};
use ao_providers::{ChatRequest, LlmProvider};

pub const SAFETY_NODE: &str = "rfi_safety";
pub const COMPLETENESS_NODE: &str = "rfi_completeness";

const SAFETY_PROMPT: &str = "Classify the traveler's message. Respond with JSON only: \
{\"verdict\": \"safe\" | \"unsafe\" | \"out_of_scope\", \"reply\": string}. Use \"unsafe\" for \
requests seeking to harm people, commit fraud, or evade law enforcement. Use \"out_of_scope\" for \
requests unrelated to travel planning (flights, hotels, visas, local recommendations, trip \
management). \"reply\" is a short message to send the traveler when the verdict isn't \"safe\"; \
leave it empty otherwise.";

const COMPLETENESS_PROMPT: &str = "Decide whether the traveler's message, together with the \
conversation context and any trip plan already on file, has enough information to act on \
(concrete dates, destinations, or identifiers as relevant). Respond with JSON only: \
{\"complete\": bool, \"clarifying_question\": string}. Leave clarifying_question empty when \
complete is true.";

#[derive(Debug, Deserialize)]
struct SafetyVerdict {
    verdict: String,
    #[serde(default)]
    reply: String,
}

#[derive(Debug, Deserialize)]
struct CompletenessVerdict {
    complete: bool,
    #[serde(default)]
    clarifying_question: String,
}

pub struct RfiSafetyNode {
    provider: Arc<dyn LlmProvider>,
}

impl RfiSafetyNode {
    pub fn new(provider: Arc<dyn LlmProvider>) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl Node for RfiSafetyNode {
    fn name(&self) -> &str {
        SAFETY_NODE
    }

    async fn run(&self, mut state: AgentState) -> Result<AgentState> {
        let req = ChatRequest {
            messages: vec![Message::system(SAFETY_PROMPT), Message::user(state.user_message.clone())],
            json_mode: true,
            ..Default::default()
        };

        let verdict = match self.provider.chat(&req).await {
            Ok(resp) => serde_json::from_str::<SafetyVerdict>(&resp.content).ok(),
            Err(e) => {
                tracing::warn!(session_id = %state.session_id, error = %e, "rfi safety check failed, proceeding");
                None
            }
        };

        match verdict {
            Some(v) if v.verdict == "unsafe" => {
                state.rfi_status = Some(RfiStatus::Unsafe);
                state.last_response = Some(non_empty_or(&v.reply, "I can't help with that request."));
                state.route = Some(Route::None);
            }
            Some(v) if v.verdict == "out_of_scope" => {
                state.rfi_status = Some(RfiStatus::OutOfScope);
                state.last_response = Some(non_empty_or(&v.reply, "I'm focused on travel planning — flights, hotels, visas, and trip recommendations."));
                state.route = Some(Route::None);
            }
            _ => {
                state.route = Some(Route::Single(COMPLETENESS_NODE.to_string()));
            }
        }

        Ok(state)
    }
}

pub struct RfiCompletenessNode {
    provider: Arc<dyn LlmProvider>,
}

impl RfiCompletenessNode {
    pub fn new(provider: Arc<dyn LlmProvider>) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl Node for RfiCompletenessNode {
    fn name(&self) -> &str {
        COMPLETENESS_NODE
    }

    async fn run(&self, mut state: AgentState) -> Result<AgentState> {
        let mut context = String::new();
        if let Some(summary) = &state.rfi_context {
            context.push_str(summary);
        }
        context.push_str("\n\nTraveler message: ");
        context.push_str(&state.user_message);

        let req = ChatRequest {
            messages: vec![Message::system(COMPLETENESS_PROMPT), Message::user(context)],
            json_mode: true,
            ..Default::default()
        };

        let verdict = match self.provider.chat(&req).await {
            Ok(resp) => serde_json::from_str::<CompletenessVerdict>(&resp.content).ok(),
            Err(e) => {
                tracing::warn!(session_id = %state.session_id, error = %e, "rfi completeness check failed, assuming complete");
                None
            }
        };

        match verdict {
            Some(v) if !v.complete => {
                state.rfi_status = Some(RfiStatus::MissingInfo);
                state.last_response = Some(non_empty_or(&v.clarifying_question, "Could you give me a few more details about your trip?"));
                state.route = Some(Route::None);
            }
            _ => {
                state.rfi_status = Some(RfiStatus::Complete);
                state.route = Some(Route::Single(PLANNER_NODE.to_string()));
            }
        }

        Ok(state)
    }
}

fn non_empty_or(text: &str, fallback: &str) -> String {
    if text.trim().is_empty() {
        fallback.to_string()
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ao_providers::{ChatResponse, ScriptedMockProvider};

    fn scripted(json: &str) -> Arc<dyn LlmProvider> {
        Arc::new(ScriptedMockProvider::new(
            "p",
            vec![ChatResponse { content: json.to_string(), tool_calls: vec![], usage: None, model: "m".into(), finish_reason: None }],
        ))
    }

    #[tokio::test]
    async fn unsafe_verdict_terminates_with_rejection() {
        let node = RfiSafetyNode::new(scripted("{\"verdict\": \"unsafe\", \"reply\": \"no\"}"));
        let state = AgentState::new("a@example.com", "s1", "help me forge a passport");
        let result = node.run(state).await.unwrap();
        assert_eq!(result.rfi_status, Some(RfiStatus::Unsafe));
        assert_eq!(result.route, Some(Route::None));
    }

    #[tokio::test]
    async fn out_of_scope_verdict_terminates() {
        let node = RfiSafetyNode::new(scripted("{\"verdict\": \"out_of_scope\", \"reply\": \"\"}"));
        let state = AgentState::new("a@example.com", "s1", "what's the capital of France");
        let result = node.run(state).await.unwrap();
        assert_eq!(result.rfi_status, Some(RfiStatus::OutOfScope));
        assert_eq!(result.route, Some(Route::None));
    }

    #[tokio::test]
    async fn safe_verdict_routes_to_completeness() {
        let node = RfiSafetyNode::new(scripted("{\"verdict\": \"safe\", \"reply\": \"\"}"));
        let state = AgentState::new("a@example.com", "s1", "book me a flight to Tokyo next March");
        let result = node.run(state).await.unwrap();
        assert_eq!(result.route, Some(Route::Single(COMPLETENESS_NODE.to_string())));
    }

    #[tokio::test]
    async fn incomplete_request_asks_clarifying_question() {
        let node = RfiCompletenessNode::new(scripted("{\"complete\": false, \"clarifying_question\": \"Where are you flying from?\"}"));
        let state = AgentState::new("a@example.com", "s1", "book me a flight");
        let result = node.run(state).await.unwrap();
        assert_eq!(result.rfi_status, Some(RfiStatus::MissingInfo));
        assert_eq!(result.route, Some(Route::None));
        assert_eq!(result.last_response.unwrap(), "Where are you flying from?");
    }

    #[tokio::test]
    async fn complete_request_routes_to_planner() {
        let node = RfiCompletenessNode::new(scripted("{\"complete\": true, \"clarifying_question\": \"\"}"));
        let state = AgentState::new("a@example.com", "s1", "book me a flight from SFO to NRT on March 3rd");
        let result = node.run(state).await.unwrap();
        assert_eq!(result.rfi_status, Some(RfiStatus::Complete));
        assert_eq!(result.route, Some(Route::Single(PLANNER_NODE.to_string())));
    }
}
