//! `ao-stm` — Short-Term Memory (C1): per-session ring buffer, rolling
//! summary, `last_results` cache, and trip-plan summary snapshot.

pub mod store;

pub use store::{StmMessage, StmRecord, StmRole, StmStore};
