use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// LLM provider registry + role mapping
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct LlmConfig {
    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,
    /// Maps a logical role (planner/worker/feedback/pii/summarizer) to a
    /// `provider/model` spec. Falls back to `"default"` when a role is
    /// unmapped.
    #[serde(default)]
    pub roles: RoleMapping,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub base_url: String,
    #[serde(default)]
    pub api_key_env: Option<String>,
    #[serde(default = "d_model")]
    pub default_model: String,
}

fn d_model() -> String {
    "gpt-4.1-mini".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct RoleMapping {
    pub planner: Option<String>,
    pub worker: Option<String>,
    pub feedback: Option<String>,
    pub pii: Option<String>,
    pub summarizer: Option<String>,
}

impl RoleMapping {
    pub fn resolve(&self, role: &str, default_spec: &str) -> String {
        let pick = match role {
            "planner" => self.planner.as_deref(),
            "worker" => self.worker.as_deref(),
            "feedback" => self.feedback.as_deref(),
            "pii" => self.pii.as_deref(),
            "summarizer" => self.summarizer.as_deref(),
            _ => None,
        };
        pick.unwrap_or(default_spec).to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unmapped_role_falls_back_to_default() {
        let roles = RoleMapping::default();
        assert_eq!(roles.resolve("planner", "openai/gpt-4.1-mini"), "openai/gpt-4.1-mini");
    }

    #[test]
    fn mapped_role_overrides_default() {
        let roles = RoleMapping {
            planner: Some("anthropic/claude-3-haiku".into()),
            ..Default::default()
        };
        assert_eq!(roles.resolve("planner", "openai/gpt-4.1-mini"), "anthropic/claude-3-haiku");
    }
}
