//! Configuration, loaded from an optional `config.toml` overlay on top
//! of hardcoded defaults. Every section is `#[serde(default)]` so a
//! partial or missing file never panics at startup.

mod bounds;
mod llm;
mod memory;
mod tools;

pub use bounds::BoundsConfig;
pub use llm::{LlmConfig, ProviderConfig, RoleMapping};
pub use memory::{LtmConfig, PruningConfig, StmConfig, TripStoreConfig};
pub use tools::{ToolRegistryConfig, WorkerToolPolicy};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub tools: ToolRegistryConfig,
    #[serde(default)]
    pub stm: StmConfig,
    #[serde(default)]
    pub ltm: LtmConfig,
    #[serde(default)]
    pub tripstore: TripStoreConfig,
    #[serde(default)]
    pub pruning: PruningConfig,
    #[serde(default)]
    pub bounds: BoundsConfig,
}

impl Config {
    /// Load `path` as a TOML overlay on top of defaults. Missing file
    /// falls back silently to all-defaults (mirrors the teacher's
    /// `cli::load_config`, which never hard-fails on a dev machine with
    /// no config file present).
    pub fn load_from_path(path: &std::path::Path) -> crate::error::Result<Self> {
        if !path.exists() {
            tracing::info!(path = %path.display(), "no config file found, using defaults");
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(path)?;
        toml::from_str(&raw).map_err(|e| crate::error::Error::Config(e.to_string()))
    }
}
