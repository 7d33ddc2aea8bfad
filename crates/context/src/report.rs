use serde::{Deserialize, Serialize};

/// Per-section report within a context pack build.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SectionReport {
    pub name: String,
    pub raw_chars: usize,
    pub injected_chars: usize,
    pub truncated_per_file: bool,
    pub truncated_total_cap: bool,
    pub included: bool,
    /// True if the section was expected but had nothing to inject.
    pub missing: bool,
}

/// Full report of a context pack build.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextReport {
    pub sections: Vec<SectionReport>,
    pub total_injected_chars: usize,
}
