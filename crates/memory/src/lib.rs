//! `ao-memory` — the Long-Term Memory Store (C2): a local vector store
//! scored by cosine similarity and caller-assigned importance.

pub mod cosine;
pub mod store;

pub use cosine::cosine_similarity;
pub use store::{LtmStore, MemoryPoint, ScoredMemory};
