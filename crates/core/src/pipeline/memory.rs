//! Memory pipeline stage (C2 retrieval + opportunistic write) — fetches
//! `relevant_memories` for the planner and every worker to filter down by
//! domain, then makes a single small-model call to decide whether this
//! turn's message is worth remembering for next time.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;

use ao_domain::error::Result;
use ao_domain::tool::Message;
use ao_graph::{AgentState, Node, Route};
use ao_memory::LtmStore;
use ao_providers::{ChatRequest, EmbeddingsRequest, LlmProvider};

use crate::pipeline::rfi::SAFETY_NODE;

pub const NAME: &str = "memory";

const ANALYZE_PROMPT: &str = "Decide whether the traveler's message contains a durable fact worth \
remembering for future trips (a preference, a constraint, a recurring detail), an update to a fact \
already remembered (\"actually I prefer window seats, not aisle\"), a request to forget something \
(\"forget that I mentioned my passport number\"), or none of those. Respond with JSON only: \
{\"should_write\": bool, \"memory_to_write\": string, \"importance\": integer 1-5, \
\"is_update\": bool, \"is_deletion\": bool, \"old_memory_text\": string}. \
`old_memory_text` names the existing memory being replaced or deleted, in the traveler's own words \
— leave it empty when `is_update` and `is_deletion` are both false. Use an empty \
`memory_to_write`/`old_memory_text` and should_write=false, is_update=false, is_deletion=false when \
nothing is worth acting on.";

/// Near-duplicate threshold for resolving `old_memory_text` to an existing
/// point, matching the threshold `LtmStore::store` itself dedups new writes
/// against.
const REFERENCE_MATCH_THRESHOLD: f32 = 0.8;

#[derive(Debug, Deserialize)]
struct AnalyzeDecision {
    #[serde(default)]
    should_write: bool,
    #[serde(default)]
    memory_to_write: String,
    #[serde(default = "default_importance")]
    importance: u8,
    #[serde(default)]
    is_update: bool,
    #[serde(default)]
    is_deletion: bool,
    #[serde(default)]
    old_memory_text: String,
}

fn default_importance() -> u8 {
    2
}

pub struct MemoryNode {
    provider: Arc<dyn LlmProvider>,
    ltm: Arc<LtmStore>,
    top_k: usize,
}

impl MemoryNode {
    pub fn new(provider: Arc<dyn LlmProvider>, ltm: Arc<LtmStore>, top_k: usize) -> Self {
        Self { provider, ltm, top_k }
    }

    async fn embed(&self, text: &str) -> Option<Vec<f32>> {
        match self.provider.embeddings(EmbeddingsRequest { input: vec![text.to_string()], model: None }).await {
            Ok(resp) => resp.embeddings.into_iter().next(),
            Err(e) => {
                tracing::warn!(error = %e, "embedding call failed, skipping memory retrieval");
                None
            }
        }
    }

    async fn maybe_store(&self, state: &AgentState) {
        let req = ChatRequest {
            messages: vec![Message::system(ANALYZE_PROMPT), Message::user(state.user_message.clone())],
            json_mode: true,
            ..Default::default()
        };
        let response = match self.provider.chat(&req).await {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!(error = %e, "memory analyze call failed, skipping write");
                return;
            }
        };
        let decision: AnalyzeDecision = match serde_json::from_str(&response.content) {
            Ok(d) => d,
            Err(_) => return,
        };

        if decision.is_deletion {
            if !decision.old_memory_text.trim().is_empty() {
                self.delete_by_reference(&state.user_email, &decision.old_memory_text).await;
            }
            return;
        }

        if !decision.should_write || decision.memory_to_write.trim().is_empty() {
            return;
        }

        let Some(embedding) = self.embed(&decision.memory_to_write).await else { return };
        let importance = decision.importance.clamp(1, 5);

        if decision.is_update && !decision.old_memory_text.trim().is_empty() {
            if let Some(id) = self.find_reference_id(&state.user_email, &decision.old_memory_text).await {
                if let Err(e) = self.ltm.update_point(&state.user_email, &id, &decision.memory_to_write, importance, embedding) {
                    tracing::warn!(error = %e, "failed to update long-term memory");
                }
                return;
            }
        }

        // `LtmStore::store` already dedups against near-duplicates and
        // updates in place, so a plain insert covers the "new fact that
        // happens to overlap an old one" case without an explicit old_memory_text.
        if let Err(e) = self.ltm.store(&state.user_email, &decision.memory_to_write, importance, embedding) {
            tracing::warn!(error = %e, "failed to persist long-term memory");
        }
    }

    async fn find_reference_id(&self, user_email: &str, old_memory_text: &str) -> Option<String> {
        let embedding = self.embed(old_memory_text).await?;
        self.ltm.find_similar(user_email, &embedding, REFERENCE_MATCH_THRESHOLD).into_iter().next().map(|m| m.point.id)
    }

    async fn delete_by_reference(&self, user_email: &str, old_memory_text: &str) {
        let Some(id) = self.find_reference_id(user_email, old_memory_text).await else {
            tracing::warn!(user_email, "no matching memory found to delete");
            return;
        };
        if let Err(e) = self.ltm.delete(user_email, &id) {
            tracing::warn!(error = %e, "failed to delete long-term memory");
        }
    }
}

#[async_trait]
impl Node for MemoryNode {
    fn name(&self) -> &str {
        NAME
    }

    async fn run(&self, mut state: AgentState) -> Result<AgentState> {
        if let Some(embedding) = self.embed(&state.user_message).await {
            state.relevant_memories = self.ltm.get_relevant(&state.user_email, &embedding, self.top_k);
        }

        self.maybe_store(&state).await;

        state.route = Some(Route::Single(SAFETY_NODE.to_string()));
        Ok(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ao_domain::config::LtmConfig;
    use ao_providers::ChatResponse;

    fn ltm() -> Arc<LtmStore> {
        Arc::new(LtmStore::new(LtmConfig::default()).unwrap())
    }

    #[tokio::test]
    async fn retrieves_relevant_memories_from_ltm() {
        let store = ltm();
        // High importance so the fixture is admitted on the importance-floor
        // bypass regardless of how the mock embedding happens to score.
        store
            .store("a@example.com", "prefers aisle seats", 5, vec![0.5; 384])
            .unwrap();

        let provider = Arc::new(ao_providers::ScriptedMockProvider::new(
            "p",
            vec![ChatResponse {
                content: "{\"should_write\": false, \"memory_to_write\": \"\", \"importance\": 1, \
                \"is_update\": false, \"is_deletion\": false, \"old_memory_text\": \"\"}"
                    .into(),
                tool_calls: vec![],
                usage: None,
                model: "m".into(),
                finish_reason: None,
            }],
        ));
        let node = MemoryNode::new(provider, store, 5);

        let state = AgentState::new("a@example.com", "s1", "what flights are there");
        let result = node.run(state).await.unwrap();
        assert_eq!(result.route, Some(Route::Single(SAFETY_NODE.to_string())));
        assert!(result.relevant_memories.iter().any(|m| m.contains("aisle seats")));
    }

    #[tokio::test]
    async fn store_worthy_fact_is_written_to_ltm() {
        let store = ltm();
        let provider = Arc::new(ao_providers::ScriptedMockProvider::new(
            "p",
            vec![ChatResponse {
                content: "{\"should_write\": true, \"memory_to_write\": \"allergic to shellfish\", \
                \"importance\": 5, \"is_update\": false, \"is_deletion\": false, \"old_memory_text\": \"\"}"
                    .into(),
                tool_calls: vec![],
                usage: None,
                model: "m".into(),
                finish_reason: None,
            }],
        ));
        let node = MemoryNode::new(provider, store.clone(), 5);

        let state = AgentState::new("a@example.com", "s1", "just so you know I'm allergic to shellfish");
        node.run(state).await.unwrap();

        // importance=5 clears the importance_floor (4), so the fact is
        // admitted regardless of query/stored embedding similarity.
        let results = store.get_relevant("a@example.com", &[0.0; 384], 5);
        assert!(results.iter().any(|r| r.contains("shellfish")));
    }

    #[tokio::test]
    async fn update_decision_replaces_the_referenced_memory_in_place() {
        let store = ltm();
        // Planted with the deterministic mock embedding for "prefers aisle seats"
        // so `find_reference_id` resolves to it via cosine similarity.
        let provider_for_embedding = ao_providers::MockProvider::new("seed");
        let embedding = provider_for_embedding
            .embeddings(ao_providers::EmbeddingsRequest { input: vec!["prefers aisle seats".into()], model: None })
            .await
            .unwrap()
            .embeddings
            .remove(0);
        let id = store.store("a@example.com", "prefers aisle seats", 3, embedding).unwrap();

        let provider = Arc::new(ao_providers::ScriptedMockProvider::new(
            "p",
            vec![ChatResponse {
                content: "{\"should_write\": true, \"memory_to_write\": \"prefers window seats\", \
                \"importance\": 3, \"is_update\": true, \"is_deletion\": false, \
                \"old_memory_text\": \"prefers aisle seats\"}"
                    .into(),
                tool_calls: vec![],
                usage: None,
                model: "m".into(),
                finish_reason: None,
            }],
        ));
        let node = MemoryNode::new(provider, store.clone(), 5);

        let state = AgentState::new("a@example.com", "s1", "actually I prefer window seats, not aisle");
        node.run(state).await.unwrap();

        let results = store.get_relevant("a@example.com", &[0.0; 384], 5);
        assert!(results.iter().any(|r| r.contains("window seats")));
        assert!(!results.iter().any(|r| r.contains("aisle")));
        assert_eq!(store.find_similar("a@example.com", &[0.0; 384], -1.0).len(), 1);
        let _ = id;
    }

    #[tokio::test]
    async fn deletion_decision_removes_the_referenced_memory() {
        let store = ltm();
        store.store("a@example.com", "passport number 12345", 5, vec![0.5; 384]).unwrap();

        let provider = Arc::new(ao_providers::ScriptedMockProvider::new(
            "p",
            vec![ChatResponse {
                content: "{\"should_write\": false, \"memory_to_write\": \"\", \"importance\": 1, \
                \"is_update\": false, \"is_deletion\": true, \"old_memory_text\": \"passport number 12345\"}"
                    .into(),
                tool_calls: vec![],
                usage: None,
                model: "m".into(),
                finish_reason: None,
            }],
        ));
        let node = MemoryNode::new(provider, store.clone(), 5);

        let state = AgentState::new("a@example.com", "s1", "forget that I mentioned my passport number");
        node.run(state).await.unwrap();

        assert!(store.find_similar("a@example.com", &[0.0; 384], -1.0).is_empty());
    }
}
