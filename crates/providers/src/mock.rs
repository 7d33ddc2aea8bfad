//! Deterministic mock providers for tests. No network access.

use crate::traits::{ChatRequest, ChatResponse, EmbeddingsRequest, EmbeddingsResponse, LlmProvider};
use ao_domain::error::Result;
use ao_domain::stream::{BoxStream, StreamEvent};
use ao_domain::tool::Role;
use std::sync::Mutex;

/// Echoes the last user message back as the assistant response.
#[derive(Default)]
pub struct MockProvider {
    id: String,
}

impl MockProvider {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

#[async_trait::async_trait]
impl LlmProvider for MockProvider {
    async fn chat(&self, req: &ChatRequest) -> Result<ChatResponse> {
        let reply = req
            .messages
            .iter()
            .rev()
            .find(|m| m.role == Role::User)
            .and_then(|m| m.content.text().map(str::to_string))
            .unwrap_or_else(|| "[no input]".to_string());

        Ok(ChatResponse {
            content: format!("MOCK: {reply}"),
            tool_calls: Vec::new(),
            usage: None,
            model: "mock-model".into(),
            finish_reason: Some("stop".into()),
        })
    }

    async fn chat_stream(&self, req: &ChatRequest) -> Result<BoxStream<'static, Result<StreamEvent>>> {
        let resp = self.chat(req).await?;
        let events = vec![
            Ok(StreamEvent::Token { text: resp.content }),
            Ok(StreamEvent::Done { usage: None, finish_reason: Some("stop".into()) }),
        ];
        Ok(Box::pin(futures_util::stream::iter(events)))
    }

    async fn embeddings(&self, req: EmbeddingsRequest) -> Result<EmbeddingsResponse> {
        // Deterministic pseudo-embedding: hash each input's bytes into a
        // fixed-size vector so cosine-similarity tests are reproducible.
        let embeddings = req
            .input
            .iter()
            .map(|text| deterministic_embedding(text, 384))
            .collect();
        Ok(EmbeddingsResponse { embeddings })
    }

    fn provider_id(&self) -> &str {
        &self.id
    }
}

fn deterministic_embedding(text: &str, dim: usize) -> Vec<f32> {
    let mut seed: u64 = 1469598103934665603;
    for b in text.bytes() {
        seed ^= b as u64;
        seed = seed.wrapping_mul(1099511628211);
    }
    (0..dim)
        .map(|i| {
            seed = seed.wrapping_mul(6364136223846793005).wrapping_add(i as u64 + 1);
            ((seed >> 40) as i32 % 1000) as f32 / 1000.0
        })
        .collect()
}

/// Pre-scripted provider: each call to `chat` pops the next response off
/// the front of the queue. Lets tests specify exact reply sequences
/// (including tool calls) without network access.
pub struct ScriptedMockProvider {
    id: String,
    scripts: Mutex<Vec<ChatResponse>>,
    pub last_request: Mutex<Option<ChatRequest>>,
}

impl ScriptedMockProvider {
    pub fn new(id: impl Into<String>, scripts: Vec<ChatResponse>) -> Self {
        Self {
            id: id.into(),
            scripts: Mutex::new(scripts),
            last_request: Mutex::new(None),
        }
    }

    pub fn always_text(id: impl Into<String>, reply: impl Into<String>) -> Self {
        Self::new(
            id,
            vec![ChatResponse {
                content: reply.into(),
                tool_calls: Vec::new(),
                usage: None,
                model: "scripted-mock".into(),
                finish_reason: Some("stop".into()),
            }],
        )
    }
}

#[async_trait::async_trait]
impl LlmProvider for ScriptedMockProvider {
    async fn chat(&self, req: &ChatRequest) -> Result<ChatResponse> {
        *self.last_request.lock().unwrap() = Some(req.clone());
        let mut scripts = self.scripts.lock().unwrap();
        if scripts.is_empty() {
            Ok(ChatResponse {
                content: "[no more scripts]".into(),
                tool_calls: Vec::new(),
                usage: None,
                model: "scripted-mock".into(),
                finish_reason: Some("stop".into()),
            })
        } else {
            Ok(scripts.remove(0))
        }
    }

    async fn chat_stream(&self, req: &ChatRequest) -> Result<BoxStream<'static, Result<StreamEvent>>> {
        let resp = self.chat(req).await?;
        let events = vec![
            Ok(StreamEvent::Token { text: resp.content }),
            Ok(StreamEvent::Done { usage: None, finish_reason: Some("stop".into()) }),
        ];
        Ok(Box::pin(futures_util::stream::iter(events)))
    }

    async fn embeddings(&self, req: EmbeddingsRequest) -> Result<EmbeddingsResponse> {
        let embeddings = req.input.iter().map(|t| deterministic_embedding(t, 384)).collect();
        Ok(EmbeddingsResponse { embeddings })
    }

    fn provider_id(&self) -> &str {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ao_domain::tool::Message;

    fn req(text: &str) -> ChatRequest {
        ChatRequest { messages: vec![Message::user(text)], ..Default::default() }
    }

    #[tokio::test]
    async fn mock_echoes_last_user_message() {
        let p = MockProvider::new("mock");
        let resp = p.chat(&req("hi")).await.unwrap();
        assert_eq!(resp.content, "MOCK: hi");
    }

    #[tokio::test]
    async fn mock_embeddings_are_deterministic() {
        let p = MockProvider::new("mock");
        let a = p.embeddings(EmbeddingsRequest { input: vec!["same text".into()], model: None }).await.unwrap();
        let b = p.embeddings(EmbeddingsRequest { input: vec!["same text".into()], model: None }).await.unwrap();
        assert_eq!(a.embeddings, b.embeddings);
        assert_eq!(a.embeddings[0].len(), 384);
    }

    #[tokio::test]
    async fn scripted_provider_pops_in_order() {
        let p = ScriptedMockProvider::new(
            "scripted",
            vec![
                ChatResponse { content: "first".into(), tool_calls: vec![], usage: None, model: "m".into(), finish_reason: None },
                ChatResponse { content: "second".into(), tool_calls: vec![], usage: None, model: "m".into(), finish_reason: None },
            ],
        );
        assert_eq!(p.chat(&req("x")).await.unwrap().content, "first");
        assert_eq!(p.chat(&req("x")).await.unwrap().content, "second");
        assert_eq!(p.chat(&req("x")).await.unwrap().content, "[no more scripts]");
    }

    #[tokio::test]
    async fn scripted_provider_records_last_request() {
        let p = ScriptedMockProvider::always_text("scripted", "ok");
        p.chat(&req("remember me")).await.unwrap();
        let last = p.last_request.lock().unwrap();
        assert_eq!(last.as_ref().unwrap().messages[0].content.text(), Some("remember me"));
    }
}
