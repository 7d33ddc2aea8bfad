//! Generic worker-node template (§4.3): every tool-backed worker (flight,
//! hotel, visa, tripadvisor, utilities) follows the same five steps, so
//! one generic `ToolWorkerNode` is configured per domain via [`WorkerSpec`]
//! rather than duplicating the template five times.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use ao_context::{ContextBuilder, WorkerDomain};
use ao_domain::envelope::{ErrorCode, ErrorEnvelope};
use ao_domain::error::{Error as AoError, Result};
use ao_domain::tool::Message;
use ao_graph::{AgentState, Node};
use ao_providers::{ChatRequest, LlmProvider, ToolChoice};
use ao_tool_client::ToolClient;

/// Static per-domain configuration for a tool-backed worker.
pub struct WorkerSpec {
    pub name: &'static str,
    pub domain: WorkerDomain,
    pub system_prompt: &'static str,
    /// Utilities worker may invoke several tools in one pass
    /// (`multiple_results=true`); every other worker invokes at most one.
    pub multi_call: bool,
}

pub struct ToolWorkerNode {
    spec: WorkerSpec,
    provider: Arc<dyn LlmProvider>,
    tool_client: Arc<ToolClient>,
    context: ContextBuilder,
}

impl ToolWorkerNode {
    pub fn new(spec: WorkerSpec, provider: Arc<dyn LlmProvider>, tool_client: Arc<ToolClient>, context: ContextBuilder) -> Self {
        Self { spec, provider, tool_client, context }
    }
}

#[async_trait]
impl Node for ToolWorkerNode {
    fn name(&self) -> &str {
        self.spec.name
    }

    async fn run(&self, mut state: AgentState) -> Result<AgentState> {
        // Deduplication (§4.3 point 4): a non-errored result already in
        // the slot satisfies this turn, so skip the model/tool round trip.
        if let Some(existing) = state.result_slot(self.spec.name) {
            if !is_error_envelope(existing) {
                return Ok(state);
            }
        }

        let tools = match self.tool_client.list_tools().await {
            Ok(t) => t,
            Err(e) => {
                state.set_result_slot(self.spec.name, envelope_value(&e));
                return Ok(state);
            }
        };
        let collected_info = serde_json::to_value(&state.collected_info).unwrap_or(Value::Null);
        let (context_text, _report) = self.context.build(
            self.spec.domain,
            &state.relevant_memories,
            None,
            &[],
            None,
            Some(&collected_info),
        );

        let system = format!("{}\n\n{}", self.spec.system_prompt, context_text);
        let req = ChatRequest {
            messages: vec![Message::system(system), Message::user(state.user_message.clone())],
            tool_choice: if tools.is_empty() { ToolChoice::Auto } else { ToolChoice::Required },
            tools,
            ..Default::default()
        };

        let response = match self.provider.chat(&req).await {
            Ok(r) => r,
            Err(e) => {
                state.set_result_slot(self.spec.name, envelope_value(&e));
                return Ok(state);
            }
        };

        if response.tool_calls.is_empty() {
            let envelope = ErrorEnvelope::new(ErrorCode::ValidationError, "model did not select a tool for this request")
                .with_suggestion("ask the user for the missing parameters and retry");
            state.set_result_slot(self.spec.name, serde_json::to_value(envelope).expect("envelope serializes"));
            return Ok(state);
        }

        if self.spec.multi_call && response.tool_calls.len() > 1 {
            let mut results = Vec::with_capacity(response.tool_calls.len());
            for call in &response.tool_calls {
                match self.tool_client.invoke(&call.tool_name, call.arguments.clone()).await {
                    Ok(v) => results.push(v),
                    Err(e) => results.push(envelope_value(&e)),
                }
            }
            state.set_result_slot(self.spec.name, Value::Array(results));
            return Ok(state);
        }

        let call = &response.tool_calls[0];
        match self.tool_client.invoke(&call.tool_name, call.arguments.clone()).await {
            Ok(result) => state.set_result_slot(self.spec.name, result),
            Err(e) => state.set_result_slot(self.spec.name, envelope_value(&e)),
        }
        Ok(state)
    }
}

pub fn is_error_envelope(value: &Value) -> bool {
    value.get("error").and_then(Value::as_bool).unwrap_or(false)
}

pub fn envelope_value(e: &AoError) -> Value {
    let code = match e {
        AoError::ToolPermission { .. } => ErrorCode::PermissionDenied,
        AoError::ToolInvocation { .. } => ErrorCode::UpstreamError,
        AoError::Timeout(_) => ErrorCode::Timeout,
        AoError::Provider { .. } => ErrorCode::UpstreamError,
        _ => ErrorCode::Other,
    };
    serde_json::to_value(ErrorEnvelope::new(code, e.to_string())).expect("envelope serializes")
}

#[cfg(test)]
mod tests {
    use super::*;
    use ao_domain::config::{BoundsConfig, ToolRegistryConfig, WorkerToolPolicy};
    use ao_providers::{ChatResponse, ScriptedMockProvider};
    use std::collections::HashMap;

    fn registry() -> ToolRegistryConfig {
        let mut worker_policies = HashMap::new();
        worker_policies.insert("flight".to_string(), WorkerToolPolicy { allowed_tools: vec!["search_flights_oneway".into()] });
        ToolRegistryConfig { base_url: "http://localhost:9400".into(), worker_policies }
    }

    fn spec() -> WorkerSpec {
        WorkerSpec { name: "flight", domain: WorkerDomain::Flight, system_prompt: "You search flights.", multi_call: false }
    }

    fn tool_call_response(name: &str, args: Value) -> ChatResponse {
        ChatResponse {
            content: String::new(),
            tool_calls: vec![ao_domain::tool::ToolCall { call_id: "c1".into(), tool_name: name.into(), arguments: args }],
            usage: None,
            model: "mock".into(),
            finish_reason: Some("tool_calls".into()),
        }
    }

    #[tokio::test]
    async fn existing_non_error_result_is_kept_without_a_model_call() {
        let provider = Arc::new(ScriptedMockProvider::always_text("p", "should not be used"));
        let tool_client = Arc::new(ToolClient::new("flight", &registry(), &BoundsConfig::default()));
        let node = ToolWorkerNode::new(spec(), provider, tool_client, ContextBuilder::new(2000, 8000));

        let mut state = AgentState::new("a@example.com", "s1", "find me a flight");
        state.set_result_slot("flight", serde_json::json!({"outbound": [{"airline": "JL"}]}));

        let result = node.run(state).await.unwrap();
        assert_eq!(result.flight_result.unwrap()["outbound"][0]["airline"], "JL");
    }

    #[tokio::test]
    async fn no_tool_call_writes_validation_error_envelope() {
        let provider = Arc::new(ScriptedMockProvider::always_text("p", "I am not sure what you need"));
        let tool_client = Arc::new(ToolClient::new("flight", &registry(), &BoundsConfig::default()));
        let node = ToolWorkerNode::new(spec(), provider, tool_client, ContextBuilder::new(2000, 8000));

        let state = AgentState::new("a@example.com", "s1", "find me a flight");
        let result = node.run(state).await.unwrap();
        let envelope = result.flight_result.unwrap();
        assert_eq!(envelope["error"], serde_json::json!(true));
        assert_eq!(envelope["error_code"], serde_json::json!("VALIDATION_ERROR"));
    }

    #[tokio::test]
    async fn disallowed_tool_choice_from_model_surfaces_permission_error() {
        let provider = Arc::new(ScriptedMockProvider::new("p", vec![tool_call_response("book_hotel", serde_json::json!({}))]));
        let tool_client = Arc::new(ToolClient::new("flight", &registry(), &BoundsConfig::default()));
        let node = ToolWorkerNode::new(spec(), provider, tool_client, ContextBuilder::new(2000, 8000));

        let state = AgentState::new("a@example.com", "s1", "find me a flight");
        let result = node.run(state).await.unwrap();
        let envelope = result.flight_result.unwrap();
        assert_eq!(envelope["error_code"], serde_json::json!("PERMISSION_DENIED"));
    }
}
