//! Reducer-merge for a parallel step: every worker in a step observes the
//! same pre-step snapshot and writes only its own result slot. Merging
//! their outputs back together is "prefer non-null right over null left;
//! otherwise the latest write wins" applied per slot (§3).

use serde_json::Value;

use crate::state::AgentState;

const WORKER_SLOTS: &[&str] = &["flight", "hotel", "visa", "tripadvisor", "utilities"];

/// Merge the outputs of N concurrently-run worker nodes (each given the
/// same `pre` snapshot) back into one state.
pub fn merge_parallel_results(pre: &AgentState, results: &[AgentState]) -> AgentState {
    let mut merged = pre.clone();

    for result in results {
        for slot in WORKER_SLOTS {
            if let (Some(pre_val), Some(result_val)) = (pre.result_slot(slot), result.result_slot(slot)) {
                if pre_val == result_val {
                    continue;
                }
            }
            if let Some(value) = result.result_slot(slot) {
                if pre.result_slot(slot) != Some(value) {
                    merged.set_result_slot(slot, value.clone());
                }
            }
        }
    }

    merged.collected_info = build_collected_info(&merged);
    merged
}

/// `collected_info` always mirrors the result slots — recomputed, not
/// merged, so it can never drift out of sync with what workers actually
/// wrote.
pub fn build_collected_info(state: &AgentState) -> std::collections::HashMap<String, Value> {
    let mut info = std::collections::HashMap::new();
    for slot in WORKER_SLOTS {
        if let Some(value) = state.result_slot(slot) {
            info.insert(format!("{slot}_result"), value.clone());
        }
    }
    info
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn base() -> AgentState {
        AgentState::new("a@example.com", "sess1", "find me a flight and hotel")
    }

    #[test]
    fn disjoint_writes_from_two_workers_both_survive() {
        let pre = base();
        let mut flight_out = pre.clone();
        flight_out.set_result_slot("flight", json!({"outbound": []}));
        let mut hotel_out = pre.clone();
        hotel_out.set_result_slot("hotel", json!({"listings": []}));

        let merged = merge_parallel_results(&pre, &[flight_out, hotel_out]);
        assert!(merged.flight_result.is_some());
        assert!(merged.hotel_result.is_some());
    }

    #[test]
    fn unchanged_slots_stay_none() {
        let pre = base();
        let mut flight_out = pre.clone();
        flight_out.set_result_slot("flight", json!({"outbound": []}));

        let merged = merge_parallel_results(&pre, &[flight_out]);
        assert!(merged.visa_result.is_none());
    }

    #[test]
    fn collected_info_mirrors_merged_slots() {
        let pre = base();
        let mut flight_out = pre.clone();
        flight_out.set_result_slot("flight", json!({"outbound": []}));

        let merged = merge_parallel_results(&pre, &[flight_out]);
        assert!(merged.collected_info.contains_key("flight_result"));
        assert_eq!(merged.collected_info.len(), 1);
    }
}
