//! Planner worker (C6) — trip-plan CRUD. Runs once the plan executor has
//! signalled there's no next step, ahead of the conversational response.
//! Writes this turn's non-errored worker results into the trip-plan store
//! when the traveler's message expresses a selection/booking intent, and
//! honors a cancellation intent expressed in plain language before handing
//! off. A pure search turn never creates trip-plan rows on its own.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use ao_domain::error::Result;
use ao_graph::{AgentState, Node, Route};
use ao_tripstore::{TripItemStatus, TripStore};

use super::conversational::NAME as CONVERSATIONAL_NODE;
use super::tool_worker::is_error_envelope;

pub const NAME: &str = "planner_worker";

const CANCEL_KEYWORDS: &[&str] = &["cancel", "remove", "delete", "scrap"];

/// Phrases that indicate the traveler is selecting or committing to an
/// option, as opposed to just browsing search results. A pure search turn
/// ("find me flights and hotels to Paris") must not silently create
/// trip-plan rows for every populated result slot.
const SELECTION_KEYWORDS: &[&str] =
    &["add", "book", "select", "confirm", "reserve", "option", "instead of", "the cheapest", "the first", "that one", "this one"];

pub struct PlannerWorkerNode {
    trip_store: Arc<TripStore>,
}

impl PlannerWorkerNode {
    pub fn new(trip_store: Arc<TripStore>) -> Self {
        Self { trip_store }
    }

    fn handle_cancellation(&self, state: &AgentState) -> bool {
        let lower = state.user_message.to_lowercase();
        if !CANCEL_KEYWORDS.iter().any(|kw| lower.contains(kw)) {
            return false;
        }
        let items = self.trip_store.list(&state.user_email, &state.session_id);
        let mut cancelled = false;
        for item in items {
            if item.status == TripItemStatus::Cancelled {
                continue;
            }
            if lower.contains(&item.title.to_lowercase()) {
                let _ = self.trip_store.set_status(&state.user_email, &state.session_id, &item.id, TripItemStatus::Cancelled);
                cancelled = true;
            }
        }
        cancelled
    }

    fn has_selection_intent(state: &AgentState) -> bool {
        let lower = state.user_message.to_lowercase();
        SELECTION_KEYWORDS.iter().any(|kw| lower.contains(kw))
    }

    fn upsert_turn_results(&self, state: &AgentState) {
        if !Self::has_selection_intent(state) {
            return;
        }
        for (worker, result) in [
            ("flight", &state.flight_result),
            ("hotel", &state.hotel_result),
            ("visa", &state.visa_result),
            ("tripadvisor", &state.tripadvisor_result),
            ("utilities", &state.utilities_result),
        ] {
            let Some(value) = result else { continue };
            if is_error_envelope(value) {
                continue;
            }
            let title = title_for(worker, value);
            if let Err(e) = self.trip_store.upsert(&state.user_email, &state.session_id, worker, &title, value.clone()) {
                tracing::warn!(worker, error = %e, "failed to upsert trip-plan item");
            }
        }
    }
}

fn title_for(worker: &str, value: &Value) -> String {
    match worker {
        "flight" => value
            .get("outbound")
            .and_then(Value::as_array)
            .and_then(|a| a.first())
            .and_then(|o| o.get("airline"))
            .and_then(Value::as_str)
            .map(|a| format!("Flight ({a})"))
            .unwrap_or_else(|| "Flight".to_string()),
        "hotel" => value.get("name").and_then(Value::as_str).map(str::to_string).unwrap_or_else(|| "Hotel".to_string()),
        other => other.to_string(),
    }
}

#[async_trait]
impl Node for PlannerWorkerNode {
    fn name(&self) -> &str {
        NAME
    }

    async fn run(&self, mut state: AgentState) -> Result<AgentState> {
        self.handle_cancellation(&state);
        self.upsert_turn_results(&state);

        state.route = Some(Route::Single(CONVERSATIONAL_NODE.to_string()));
        Ok(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ao_domain::config::TripStoreConfig;
    use serde_json::json;

    fn store() -> Arc<TripStore> {
        Arc::new(TripStore::new(&TripStoreConfig { store_path: None }).unwrap())
    }

    #[tokio::test]
    async fn non_error_results_are_upserted_into_trip_store() {
        let store = store();
        let node = PlannerWorkerNode::new(store.clone());

        let mut state = AgentState::new("a@example.com", "s1", "book it");
        state.hotel_result = Some(json!({"name": "Tokyo Hotel", "rate": 200}));

        let result = node.run(state).await.unwrap();
        assert_eq!(store.list("a@example.com", "s1").len(), 1);
        assert_eq!(result.route, Some(Route::Single(CONVERSATIONAL_NODE.to_string())));
    }

    #[tokio::test]
    async fn error_envelope_results_are_not_persisted() {
        let store = store();
        let node = PlannerWorkerNode::new(store.clone());

        let mut state = AgentState::new("a@example.com", "s1", "book it");
        state.hotel_result = Some(json!({"error": true, "error_code": "TIMEOUT", "error_message": "nope"}));

        node.run(state).await.unwrap();
        assert!(store.list("a@example.com", "s1").is_empty());
    }

    #[tokio::test]
    async fn pure_search_turn_does_not_write_to_trip_store() {
        let store = store();
        let node = PlannerWorkerNode::new(store.clone());

        let mut state = AgentState::new("a@example.com", "s1", "Find me flights and hotels to Paris");
        state.flight_result = Some(json!({"outbound": [{"airline": "JL", "price": 900}]}));
        state.hotel_result = Some(json!({"name": "Tokyo Hotel", "rate": 200}));

        node.run(state).await.unwrap();
        assert!(store.list("a@example.com", "s1").is_empty());
    }

    #[tokio::test]
    async fn selection_intent_upserts_the_chosen_option() {
        let store = store();
        let node = PlannerWorkerNode::new(store.clone());

        let mut state = AgentState::new("a@example.com", "s1", "add the second one to my plan");
        state.hotel_result = Some(json!({"name": "Tokyo Hotel", "rate": 200}));

        node.run(state).await.unwrap();
        assert_eq!(store.list("a@example.com", "s1").len(), 1);
    }

    #[tokio::test]
    async fn cancellation_keyword_marks_matching_item_cancelled() {
        let store = store();
        store.upsert("a@example.com", "s1", "hotel", "Tokyo Hotel", json!({"rate": 200})).unwrap();
        let node = PlannerWorkerNode::new(store.clone());

        let state = AgentState::new("a@example.com", "s1", "please cancel the tokyo hotel");
        node.run(state).await.unwrap();

        assert_eq!(store.list("a@example.com", "s1")[0].status, TripItemStatus::Cancelled);
    }
}
