use serde::{Deserialize, Serialize};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Short-term memory (C1)
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StmConfig {
    /// Max messages retained verbatim before older ones are summarized.
    #[serde(default = "d_10")]
    pub max_messages: usize,
    #[serde(default)]
    pub store_path: Option<std::path::PathBuf>,
}

impl Default for StmConfig {
    fn default() -> Self {
        Self {
            max_messages: 10,
            store_path: None,
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Long-term memory (C2)
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LtmConfig {
    #[serde(default = "d_384")]
    pub vector_dim: usize,
    /// Weight on cosine similarity in the final ranking score.
    #[serde(default = "d_0_7")]
    pub similarity_weight: f64,
    /// Weight on normalized importance in the final ranking score.
    #[serde(default = "d_0_3")]
    pub importance_weight: f64,
    /// Minimum final_score to be admitted, unless importance >= importance_floor.
    #[serde(default = "d_0_2")]
    pub score_cutoff: f64,
    /// Importance level that bypasses the score cutoff.
    #[serde(default = "d_4")]
    pub importance_floor: u8,
    /// Near-duplicate threshold used by the memory-write dedup pass.
    #[serde(default = "d_0_8")]
    pub dedup_cosine_threshold: f64,
    /// Max points scrolled per retrieval scan.
    #[serde(default = "d_1000")]
    pub scroll_limit: usize,
    #[serde(default)]
    pub store_path: Option<std::path::PathBuf>,
}

impl Default for LtmConfig {
    fn default() -> Self {
        Self {
            vector_dim: 384,
            similarity_weight: 0.7,
            importance_weight: 0.3,
            score_cutoff: 0.2,
            importance_floor: 4,
            dedup_cosine_threshold: 0.8,
            scroll_limit: 1000,
            store_path: None,
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Trip-plan store (C3)
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TripStoreConfig {
    #[serde(default)]
    pub store_path: Option<std::path::PathBuf>,
}

impl Default for TripStoreConfig {
    fn default() -> Self {
        Self { store_path: None }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Context-pack pruning caps
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PruningConfig {
    #[serde(default = "d_per_worker_chars")]
    pub per_worker_memory_chars: usize,
    #[serde(default = "d_total_chars")]
    pub total_context_chars: usize,
}

impl Default for PruningConfig {
    fn default() -> Self {
        Self {
            per_worker_memory_chars: 2_000,
            total_context_chars: 8_000,
        }
    }
}

fn d_10() -> usize {
    10
}
fn d_384() -> usize {
    384
}
fn d_0_7() -> f64 {
    0.7
}
fn d_0_3() -> f64 {
    0.3
}
fn d_0_2() -> f64 {
    0.2
}
fn d_4() -> u8 {
    4
}
fn d_0_8() -> f64 {
    0.8
}
fn d_1000() -> usize {
    1000
}
fn d_per_worker_chars() -> usize {
    2_000
}
fn d_total_chars() -> usize {
    8_000
}
