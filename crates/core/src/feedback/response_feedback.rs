//! Final Response Feedback (C7) — the last gate before a turn's response
//! is persisted and returned. Catches a blank draft or a draft that still
//! carries an unreplaced placeholder token or raw JSON, and sends it back
//! to the conversational worker for one more pass, bounded by
//! `max_feedback_retries`.

use std::sync::Arc;

use async_trait::async_trait;

use ao_domain::error::Result;
use ao_domain::telemetry::NodeTelemetry;
use ao_graph::{AgentState, Node, Route};

use crate::worker::conversational::NAME as CONVERSATIONAL_NODE;

pub const NAME: &str = "response_feedback";

pub struct ResponseFeedbackNode {
    max_retries: u32,
    telemetry: Arc<dyn NodeTelemetry>,
}

impl ResponseFeedbackNode {
    pub fn new(max_retries: u32, telemetry: Arc<dyn NodeTelemetry>) -> Self {
        Self { max_retries, telemetry }
    }

    fn needs_regenerate(response: &str) -> bool {
        let trimmed = response.trim();
        trimmed.is_empty()
            || trimmed.contains("HOTEL_BOOKING_LINK")
            || trimmed.contains("F1")
            || (trimmed.starts_with('{') && trimmed.ends_with('}'))
    }
}

#[async_trait]
impl Node for ResponseFeedbackNode {
    fn name(&self) -> &str {
        NAME
    }

    async fn run(&self, mut state: AgentState) -> Result<AgentState> {
        let response = state.last_response.clone().unwrap_or_default();

        if !Self::needs_regenerate(&response) {
            state.route = Some(Route::None);
            return Ok(state);
        }

        if state.conversational_feedback_retry_count < self.max_retries {
            self.telemetry.feedback_failure(&state.session_id, Some(&state.user_email), NAME, "draft needs regeneration, retrying");
            state.conversational_feedback_retry_count += 1;
            state.route = Some(Route::Single(CONVERSATIONAL_NODE.to_string()));
            return Ok(state);
        }

        self.telemetry.feedback_failure(&state.session_id, Some(&state.user_email), NAME, "retries exhausted, returning draft as-is");
        if response.trim().is_empty() {
            state.last_response = Some("I wasn't able to put together a full response, but here's what I found so far.".to_string());
        }
        state.route = Some(Route::None);
        Ok(state)
    }
}
