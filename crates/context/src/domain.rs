/// The worker whose prompt a context pack is being assembled for.
///
/// Drives which keyword bucket is used to filter `relevant_memories` down
/// to the ones worth spending prompt budget on (§4.3: "filter
/// relevant_memories to its own domain").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerDomain {
    Flight,
    Hotel,
    Visa,
    TripAdvisor,
    Utilities,
    Conversational,
    Planner,
}

impl WorkerDomain {
    fn keywords(self) -> &'static [&'static str] {
        match self {
            WorkerDomain::Flight => &["flight", "airline", "airport", "seat", "layover", "baggage"],
            WorkerDomain::Hotel => &["hotel", "room", "check-in", "check-out", "stay", "booking"],
            WorkerDomain::Visa => &["visa", "passport", "nationality", "entry requirement", "immigration"],
            WorkerDomain::TripAdvisor => &["restaurant", "attraction", "museum", "tour", "sightseeing", "dining"],
            WorkerDomain::Utilities => &["holiday", "weather", "currency", "esim", "timezone", "exchange rate"],
            // Conversational and planner see everything — no filter applied.
            WorkerDomain::Conversational | WorkerDomain::Planner => &[],
        }
    }
}

/// Keep only the memories whose text mentions one of the domain's keywords.
///
/// Domains with an empty keyword bucket (conversational, planner) pass
/// every memory through unfiltered.
pub fn filter_memories_for_domain(memories: &[String], domain: WorkerDomain) -> Vec<String> {
    let keywords = domain.keywords();
    if keywords.is_empty() {
        return memories.to_vec();
    }
    memories
        .iter()
        .filter(|m| {
            let lower = m.to_lowercase();
            keywords.iter().any(|k| lower.contains(k))
        })
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flight_domain_keeps_flight_memories_only() {
        let memories = vec![
            "prefers aisle seats on flights".to_string(),
            "allergic to shellfish".to_string(),
            "likes boutique hotels".to_string(),
        ];
        let filtered = filter_memories_for_domain(&memories, WorkerDomain::Flight);
        assert_eq!(filtered, vec!["prefers aisle seats on flights"]);
    }

    #[test]
    fn conversational_domain_passes_everything_through() {
        let memories = vec!["likes boutique hotels".to_string(), "vegetarian".to_string()];
        let filtered = filter_memories_for_domain(&memories, WorkerDomain::Conversational);
        assert_eq!(filtered, memories);
    }

    #[test]
    fn hotel_domain_matches_case_insensitively() {
        let memories = vec!["Prefers a Hotel with a pool".to_string()];
        let filtered = filter_memories_for_domain(&memories, WorkerDomain::Hotel);
        assert_eq!(filtered.len(), 1);
    }
}
