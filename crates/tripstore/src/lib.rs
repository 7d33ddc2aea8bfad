//! `ao-tripstore` — Trip-Plan Store (C3): idempotent upsert keyed by a
//! canonicalized-content hash, scoped to `(email, session_id)`.

pub mod key;
pub mod store;

pub use key::normalized_key;
pub use store::{TripItemStatus, TripPlanItem, TripStore};
