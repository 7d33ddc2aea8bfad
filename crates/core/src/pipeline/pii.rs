//! PII Redactor — first stage of the pipeline. Rewrites the raw user
//! message through the `pii`-role model before anything downstream (LTM,
//! the planner, any worker) ever sees it. Fails open: a timeout or error
//! here proceeds with the original, unredacted message rather than
//! blocking the turn.

use std::sync::Arc;

use async_trait::async_trait;

use ao_domain::error::Result;
use ao_domain::tool::Message;
use ao_graph::{AgentState, Node, Route};
use ao_providers::{ChatRequest, LlmProvider};

use crate::pipeline::memory::NAME as MEMORY_NODE;

pub const NAME: &str = "pii";

const SYSTEM_PROMPT: &str = "Rewrite the traveler's message, replacing personally identifiable \
information (passport numbers, payment card numbers, government IDs, home addresses, phone \
numbers) with a short bracketed placeholder like [PASSPORT]. Preserve everything else verbatim, \
including travel details, dates, and names used only as traveler identification. Respond with the \
rewritten message only.";

pub struct PiiRedactorNode {
    provider: Arc<dyn LlmProvider>,
}

impl PiiRedactorNode {
    pub fn new(provider: Arc<dyn LlmProvider>) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl Node for PiiRedactorNode {
    fn name(&self) -> &str {
        NAME
    }

    async fn run(&self, mut state: AgentState) -> Result<AgentState> {
        let req = ChatRequest {
            messages: vec![Message::system(SYSTEM_PROMPT), Message::user(state.user_message.clone())],
            ..Default::default()
        };

        match self.provider.chat(&req).await {
            Ok(resp) if !resp.content.trim().is_empty() => state.user_message = resp.content,
            Ok(_) => tracing::warn!(session_id = %state.session_id, "pii redactor returned an empty rewrite, keeping original message"),
            Err(e) => tracing::warn!(session_id = %state.session_id, error = %e, "pii redaction failed, proceeding unredacted"),
        }

        state.route = Some(Route::Single(MEMORY_NODE.to_string()));
        Ok(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ao_domain::error::Error as AoError;
    use ao_domain::stream::{BoxStream, StreamEvent};
    use ao_providers::{ChatResponse, EmbeddingsRequest, EmbeddingsResponse, ScriptedMockProvider};

    #[tokio::test]
    async fn successful_rewrite_replaces_user_message() {
        let provider = Arc::new(ScriptedMockProvider::always_text("p", "my passport is [PASSPORT]"));
        let node = PiiRedactorNode::new(provider);

        let state = AgentState::new("a@example.com", "s1", "my passport is AB1234567");
        let result = node.run(state).await.unwrap();
        assert_eq!(result.user_message, "my passport is [PASSPORT]");
        assert_eq!(result.route, Some(Route::Single(MEMORY_NODE.to_string())));
    }

    struct AlwaysFails;

    #[async_trait]
    impl LlmProvider for AlwaysFails {
        async fn chat(&self, _req: &ChatRequest) -> Result<ChatResponse> {
            Err(AoError::Timeout("pii provider unreachable".into()))
        }
        async fn chat_stream(&self, _req: &ChatRequest) -> Result<BoxStream<'static, Result<StreamEvent>>> {
            Err(AoError::Timeout("pii provider unreachable".into()))
        }
        async fn embeddings(&self, _req: EmbeddingsRequest) -> Result<EmbeddingsResponse> {
            Err(AoError::Timeout("pii provider unreachable".into()))
        }
        fn provider_id(&self) -> &str {
            "always-fails"
        }
    }

    #[tokio::test]
    async fn provider_failure_keeps_original_message() {
        let node = PiiRedactorNode::new(Arc::new(AlwaysFails));

        let state = AgentState::new("a@example.com", "s1", "book me a flight");
        let result = node.run(state).await.unwrap();
        assert_eq!(result.user_message, "book me a flight");
    }
}
