//! `ao-context` — per-worker prompt context assembly: domain-filtered
//! memories, STM summary, trip-plan state, and collected-info digests,
//! with per-section and total character truncation.

pub mod builder;
pub mod domain;
pub mod injection;
pub mod report;
pub mod summarizer;
pub mod truncation;

pub use builder::ContextBuilder;
pub use domain::{filter_memories_for_domain, WorkerDomain};
pub use report::{ContextReport, SectionReport};
pub use summarizer::summarize_for_prompt;
