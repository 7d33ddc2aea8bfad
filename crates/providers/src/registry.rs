//! Provider registry.
//!
//! Constructs one [`OpenAiCompatProvider`] per configured entry in
//! [`LlmConfig::providers`] and resolves the `planner`/`worker`/`feedback`/
//! `pii`/`summarizer` role mapping down to a concrete provider + model.

use crate::openai_compat::OpenAiCompatProvider;
use crate::traits::LlmProvider;
use ao_domain::config::LlmConfig;
use ao_domain::error::{Error, Result};
use std::collections::HashMap;
use std::sync::Arc;

pub struct ProviderRegistry {
    providers: HashMap<String, Arc<dyn LlmProvider>>,
    roles: ao_domain::config::RoleMapping,
    init_errors: Vec<ProviderInitError>,
}

#[derive(Debug, Clone)]
pub struct ProviderInitError {
    pub provider_id: String,
    pub error: String,
}

impl ProviderRegistry {
    /// Build the registry from [`LlmConfig`]. Providers that fail to
    /// initialize (e.g. a missing API key env var) are logged and skipped
    /// rather than aborting startup — the role resolution surfaces a
    /// `Provider` error lazily, on first use, instead.
    pub fn from_config(config: &LlmConfig) -> Self {
        let mut providers: HashMap<String, Arc<dyn LlmProvider>> = HashMap::new();
        let mut init_errors = Vec::new();

        for (id, pc) in &config.providers {
            match OpenAiCompatProvider::from_config(id, pc) {
                Ok(p) => {
                    tracing::info!(provider_id = %id, "registered LLM provider");
                    providers.insert(id.clone(), Arc::new(p));
                }
                Err(e) => {
                    tracing::warn!(provider_id = %id, error = %e, "failed to initialize LLM provider, skipping");
                    init_errors.push(ProviderInitError { provider_id: id.clone(), error: e.to_string() });
                }
            }
        }

        Self { providers, roles: config.roles.clone(), init_errors }
    }

    /// Look up a provider by its config id.
    pub fn get(&self, provider_id: &str) -> Option<Arc<dyn LlmProvider>> {
        self.providers.get(provider_id).cloned()
    }

    /// Resolve the provider assigned to a role, falling back to
    /// `default_spec` (`"provider_id"`) when the role is unmapped.
    pub fn for_role(&self, role: &str, default_spec: &str) -> Result<Arc<dyn LlmProvider>> {
        let spec = self.roles.resolve(role, default_spec);
        let provider_id = spec.split('/').next().unwrap_or(&spec);
        self.providers.get(provider_id).cloned().ok_or_else(|| {
            Error::Config(format!("no provider registered for role '{role}' (resolved to '{provider_id}')"))
        })
    }

    pub fn init_errors(&self) -> &[ProviderInitError] {
        &self.init_errors
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ao_domain::config::ProviderConfig;

    fn cfg_with_one_provider() -> LlmConfig {
        let mut providers = HashMap::new();
        providers.insert(
            "default".to_string(),
            ProviderConfig { base_url: "http://localhost:11434/v1".into(), api_key_env: None, default_model: "test-model".into() },
        );
        LlmConfig { providers, roles: Default::default() }
    }

    #[test]
    fn registers_provider_without_api_key_env() {
        let reg = ProviderRegistry::from_config(&cfg_with_one_provider());
        assert_eq!(reg.len(), 1);
        assert!(reg.init_errors().is_empty());
    }

    #[test]
    fn missing_api_key_env_var_is_recorded_not_fatal() {
        let mut cfg = cfg_with_one_provider();
        cfg.providers.get_mut("default").unwrap().api_key_env = Some("AO_TEST_MISSING_KEY_XYZ".into());
        let reg = ProviderRegistry::from_config(&cfg);
        assert_eq!(reg.len(), 0);
        assert_eq!(reg.init_errors().len(), 1);
    }

    #[test]
    fn for_role_falls_back_to_default_spec() {
        let reg = ProviderRegistry::from_config(&cfg_with_one_provider());
        let provider = reg.for_role("planner", "default").unwrap();
        assert_eq!(provider.provider_id(), "default");
    }
}
