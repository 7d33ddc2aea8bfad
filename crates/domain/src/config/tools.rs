use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Tool registry (C4) — allow-list enforced RPC facade config
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolRegistryConfig {
    #[serde(default = "d_base_url")]
    pub base_url: String,
    /// Per-worker allow-lists. Key is the worker/node name.
    #[serde(default)]
    pub worker_policies: HashMap<String, WorkerToolPolicy>,
}

impl Default for ToolRegistryConfig {
    fn default() -> Self {
        Self {
            base_url: d_base_url(),
            worker_policies: default_policies(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct WorkerToolPolicy {
    pub allowed_tools: Vec<String>,
}

fn d_base_url() -> String {
    "http://localhost:9400".to_string()
}

fn default_policies() -> HashMap<String, WorkerToolPolicy> {
    let mut m = HashMap::new();
    m.insert(
        "flight".to_string(),
        WorkerToolPolicy {
            allowed_tools: vec![
                "search_flights_oneway".into(),
                "search_flights_roundtrip".into(),
                "search_flights_flexible".into(),
            ],
        },
    );
    m.insert(
        "hotel".to_string(),
        WorkerToolPolicy {
            allowed_tools: vec![
                "list_hotels".into(),
                "get_hotel_rates".into(),
                "get_hotel_details".into(),
                "book_hotel".into(),
            ],
        },
    );
    m.insert(
        "visa".to_string(),
        WorkerToolPolicy {
            allowed_tools: vec!["check_visa_requirement".into()],
        },
    );
    m.insert(
        "tripadvisor".to_string(),
        WorkerToolPolicy {
            allowed_tools: (1..=15).map(|i| format!("tripadvisor_tool_{i}")).collect(),
        },
    );
    m.insert(
        "utilities".to_string(),
        WorkerToolPolicy {
            allowed_tools: vec![
                "get_holidays".into(),
                "get_weather".into(),
                "convert_currency".into(),
                "get_datetime".into(),
                "list_esim_bundles".into(),
            ],
        },
    );
    m
}
