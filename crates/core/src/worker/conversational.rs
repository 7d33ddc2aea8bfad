//! Conversational worker — the last model call of a turn. Drafts the
//! reply from collected results, relevant memories, and the rolling
//! session history, then rewrites raw-data placeholders into the
//! markdown links travelers actually click.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use ao_context::{ContextBuilder, WorkerDomain};
use ao_domain::error::Result;
use ao_domain::tool::Message;
use ao_graph::{AgentState, Node, Route};
use ao_providers::{ChatRequest, LlmProvider};
use ao_stm::{StmRole, StmStore};

use super::tool_worker::is_error_envelope;

pub const NAME: &str = "conversational";
pub const RESPONSE_FEEDBACK_NODE: &str = "response_feedback";

const SYSTEM_PROMPT: &str = "You are the conversational voice of the travel assistant. Write the \
final reply to the traveler in plain prose, never raw JSON. Reference concrete results already \
collected this turn rather than inventing details. When a flight or hotel option needs a booking \
link, use the literal tokens F1, F2, ... for flight offers in the order they appear in the flight \
results, and HOTEL_BOOKING_LINK for the hotel being booked — those tokens are rewritten into real \
links after you respond.";

pub struct ConversationalWorkerNode {
    provider: Arc<dyn LlmProvider>,
    stm: Arc<StmStore>,
    context: ContextBuilder,
}

impl ConversationalWorkerNode {
    pub fn new(provider: Arc<dyn LlmProvider>, stm: Arc<StmStore>, context: ContextBuilder) -> Self {
        Self { provider, stm, context }
    }
}

#[async_trait]
impl Node for ConversationalWorkerNode {
    fn name(&self) -> &str {
        NAME
    }

    async fn run(&self, mut state: AgentState) -> Result<AgentState> {
        let record = self.stm.get(&state.session_id);
        let summary = record.as_ref().map(|r| r.summary.clone()).unwrap_or_default();
        let recent: Vec<String> = record
            .as_ref()
            .map(|r| r.last_messages.iter().map(|m| format!("{:?}: {}", m.role, m.text)).collect())
            .unwrap_or_default();
        let trip_plan_summary = record.as_ref().and_then(|r| r.trip_plan_summary.clone());

        // An empty-plan turn (everything needed is already known) never
        // populates a fresh worker result slot this turn, so a follow-up
        // like "get me the cheapest one" needs last turn's cached results
        // spliced back in rather than just the rolling STM summary.
        let mut collected = state.collected_info.clone();
        if let Some(last_results) = self.stm.get_last_results(&state.session_id) {
            collected.entry("previous_results".to_string()).or_insert(last_results);
        }
        let collected_info = serde_json::to_value(&collected).unwrap_or(Value::Null);

        let (context_text, _report) = self.context.build(
            WorkerDomain::Conversational,
            &state.relevant_memories,
            Some(&summary),
            &recent,
            trip_plan_summary.as_ref(),
            Some(&collected_info),
        );

        let system = format!("{SYSTEM_PROMPT}\n\n{context_text}");
        let req = ChatRequest { messages: vec![Message::system(system), Message::user(state.user_message.clone())], ..Default::default() };

        let draft = match self.provider.chat(&req).await {
            Ok(resp) => resp.content,
            Err(_) => "I ran into a problem putting that together — could you try again?".to_string(),
        };

        let final_text = rewrite_placeholders(&draft, &state);
        state.last_response = Some(final_text);

        if self.stm.set_last_results(&state.session_id, serde_json::to_value(&state.collected_info).unwrap_or(Value::Null)).is_err() {
            tracing::warn!(session_id = %state.session_id, "failed to persist last_results to STM");
        }

        state.route = Some(Route::Single(RESPONSE_FEEDBACK_NODE.to_string()));
        Ok(state)
    }
}

/// Turn `F1`, `F2`, ... and `HOTEL_BOOKING_LINK` tokens in the draft into
/// markdown links sourced from this turn's flight/hotel results.
///
/// Flight offers are numbered in the order they appear in
/// `flight_result.outbound` followed by `flight_result.return` (round
/// trips produce two independent, possibly-overlapping numberings —
/// §12's round-trip duplication is modeled the same way here).
fn rewrite_placeholders(draft: &str, state: &AgentState) -> String {
    let mut text = draft.to_string();

    for (i, offer) in flight_offers(state).iter().enumerate() {
        let token = format!("F{}", i + 1);
        let replacement = match offer.get("booking_url").and_then(Value::as_str) {
            Some(url) => format!("[Book this flight]({url})"),
            None => summarize_offer(offer),
        };
        text = text.replace(&token, &replacement);
    }

    if let Some(url) = hotel_booking_url(state) {
        text = text.replace("HOTEL_BOOKING_LINK", &format!("[Complete your hotel booking]({url})"));
    }

    text
}

fn flight_offers(state: &AgentState) -> Vec<Value> {
    let Some(result) = state.flight_result.as_ref() else { return Vec::new() };
    if is_error_envelope(result) {
        return Vec::new();
    }
    let mut offers = Vec::new();
    for key in ["outbound", "return"] {
        if let Some(arr) = result.get(key).and_then(Value::as_array) {
            offers.extend(arr.iter().cloned());
        }
    }
    offers
}

fn summarize_offer(offer: &Value) -> String {
    let airline = offer.get("airline").and_then(Value::as_str).unwrap_or("an airline");
    let price = offer.get("price").map(|p| p.to_string()).unwrap_or_else(|| "an unlisted price".to_string());
    format!("a {airline} flight at {price}")
}

fn hotel_booking_url(state: &AgentState) -> Option<String> {
    let result = state.hotel_result.as_ref()?;
    if is_error_envelope(result) {
        return None;
    }
    result.get("secure_booking_url").and_then(Value::as_str).map(str::to_string)
}

#[allow(dead_code)]
fn role_label(role: StmRole) -> &'static str {
    match role {
        StmRole::User => "traveler",
        StmRole::Agent => "assistant",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ao_domain::config::StmConfig;
    use ao_providers::ScriptedMockProvider;
    use serde_json::json;

    fn context() -> ContextBuilder {
        ContextBuilder::new(2000, 8000)
    }

    fn stm() -> Arc<StmStore> {
        Arc::new(StmStore::new(&StmConfig { max_messages: 10, store_path: None }).unwrap())
    }

    #[tokio::test]
    async fn flight_placeholder_tokens_become_booking_links() {
        let provider = Arc::new(ScriptedMockProvider::always_text("p", "Here you go: F1 looks great."));
        let node = ConversationalWorkerNode::new(provider, stm(), context());

        let mut state = AgentState::new("a@example.com", "s1", "book the first flight");
        state.flight_result = Some(json!({"outbound": [{"airline": "JL", "price": 900, "booking_url": "https://book.example/f1"}]}));

        let result = node.run(state).await.unwrap();
        let text = result.last_response.unwrap();
        assert!(text.contains("https://book.example/f1"));
        assert!(!text.contains("F1"));
    }

    #[tokio::test]
    async fn missing_booking_url_falls_back_to_plain_summary() {
        let provider = Arc::new(ScriptedMockProvider::always_text("p", "F1 is solid."));
        let node = ConversationalWorkerNode::new(provider, stm(), context());

        let mut state = AgentState::new("a@example.com", "s1", "tell me about it");
        state.flight_result = Some(json!({"outbound": [{"airline": "ANA", "price": 750}]}));

        let result = node.run(state).await.unwrap();
        let text = result.last_response.unwrap();
        assert!(text.contains("ANA"));
    }

    #[tokio::test]
    async fn error_envelope_results_contribute_no_placeholders() {
        let provider = Arc::new(ScriptedMockProvider::always_text("p", "F1 unavailable."));
        let node = ConversationalWorkerNode::new(provider, stm(), context());

        let mut state = AgentState::new("a@example.com", "s1", "hi");
        state.flight_result = Some(json!({"error": true, "error_code": "TIMEOUT", "error_message": "did not complete"}));

        let result = node.run(state).await.unwrap();
        assert!(result.last_response.unwrap().contains("F1"));
    }

    #[tokio::test]
    async fn cached_last_results_are_spliced_in_when_no_fresh_results_this_turn() {
        let store = stm();
        store.add_message("s1", "a@example.com", StmRole::User, "hi", |_| String::new()).unwrap();
        store.set_last_results("s1", json!({"flight_result": {"price": 420}})).unwrap();

        let provider = Arc::new(ScriptedMockProvider::always_text("p", "The cheapest one is $420."));
        let node = ConversationalWorkerNode::new(provider.clone(), store, context());

        let state = AgentState::new("a@example.com", "s1", "get me the cheapest one");
        node.run(state).await.unwrap();

        let sent = provider.last_request.lock().unwrap().clone().unwrap();
        let ao_domain::tool::MessageContent::Text(system_text) = &sent.messages[0].content else {
            panic!("expected a text system message");
        };
        assert!(system_text.contains("420"));
    }

    #[tokio::test]
    async fn routes_to_response_feedback() {
        let provider = Arc::new(ScriptedMockProvider::always_text("p", "All set."));
        let node = ConversationalWorkerNode::new(provider, stm(), context());
        let state = AgentState::new("a@example.com", "s1", "hi");
        let result = node.run(state).await.unwrap();
        assert_eq!(result.route, Some(Route::Single(RESPONSE_FEEDBACK_NODE.to_string())));
    }
}
