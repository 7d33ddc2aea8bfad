//! Trip-Plan Store (C3) — idempotent upsert keyed by `(email, session_id,
//! normalized_key)`. Re-running the same add with the same details is a
//! no-op update rather than a duplicate insert, which is what lets the
//! planner worker freely re-derive plan items from a conversation without
//! having to track which ones it already wrote.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use ao_domain::config::TripStoreConfig;
use ao_domain::error::{Error, Result};

use crate::key::normalized_key;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TripItemStatus {
    NotBooked,
    Booked,
    Cancelled,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TripPlanItem {
    pub id: String,
    pub email: String,
    pub session_id: String,
    pub normalized_key: String,
    pub item_type: String,
    pub title: String,
    pub details: Value,
    #[serde(default = "default_status")]
    pub status: TripItemStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn default_status() -> TripItemStatus {
    TripItemStatus::NotBooked
}

pub struct TripStore {
    path: Option<PathBuf>,
    /// Keyed by `"{email}:{session_id}"`.
    items: RwLock<HashMap<String, Vec<TripPlanItem>>>,
}

fn scope_key(email: &str, session_id: &str) -> String {
    format!("{email}:{session_id}")
}

impl TripStore {
    /// Load (or create) the store, backfilling `normalized_key` on any
    /// legacy row that predates the canonicalized-key scheme.
    pub fn new(config: &TripStoreConfig) -> Result<Self> {
        let mut items = match &config.store_path {
            Some(path) => load_items(path)?,
            None => HashMap::new(),
        };
        backfill_missing_keys(&mut items);
        Ok(Self { path: config.store_path.clone(), items: RwLock::new(items) })
    }

    /// Add or update a trip-plan item. Idempotent: a second call with the
    /// same `(email, session_id, item_type, details)` updates the existing
    /// row's title/details/timestamp in place instead of inserting a
    /// duplicate.
    pub fn upsert(&self, email: &str, session_id: &str, item_type: &str, title: &str, details: Value) -> Result<TripPlanItem> {
        let key = normalized_key(item_type, title, &details);
        let scope = scope_key(email, session_id);
        let now = Utc::now();

        let item = {
            let mut items = self.items.write();
            let bucket = items.entry(scope).or_default();

            match bucket.iter_mut().find(|i| i.normalized_key == key) {
                Some(existing) => {
                    existing.title = title.to_string();
                    existing.details = details;
                    existing.updated_at = now;
                    existing.clone()
                }
                None => {
                    let item = TripPlanItem {
                        id: format!("trip-{}-{}-{}", email, session_id, bucket.len()),
                        email: email.to_string(),
                        session_id: session_id.to_string(),
                        normalized_key: key,
                        item_type: item_type.to_string(),
                        title: title.to_string(),
                        details,
                        status: TripItemStatus::NotBooked,
                        created_at: now,
                        updated_at: now,
                    };
                    bucket.push(item.clone());
                    item
                }
            }
        };
        self.flush()?;
        Ok(item)
    }

    pub fn list(&self, email: &str, session_id: &str) -> Vec<TripPlanItem> {
        self.items.read().get(&scope_key(email, session_id)).cloned().unwrap_or_default()
    }

    pub fn set_status(&self, email: &str, session_id: &str, id: &str, status: TripItemStatus) -> Result<bool> {
        let updated = {
            let mut items = self.items.write();
            match items.get_mut(&scope_key(email, session_id)) {
                Some(bucket) => match bucket.iter_mut().find(|i| i.id == id) {
                    Some(item) => {
                        item.status = status;
                        item.updated_at = Utc::now();
                        true
                    }
                    None => false,
                },
                None => false,
            }
        };
        if updated {
            self.flush()?;
        }
        Ok(updated)
    }

    pub fn delete(&self, email: &str, session_id: &str, id: &str) -> Result<bool> {
        let removed = {
            let mut items = self.items.write();
            match items.get_mut(&scope_key(email, session_id)) {
                Some(bucket) => {
                    let before = bucket.len();
                    bucket.retain(|i| i.id != id);
                    before != bucket.len()
                }
                None => false,
            }
        };
        if removed {
            self.flush()?;
        }
        Ok(removed)
    }

    fn flush(&self) -> Result<()> {
        let Some(path) = &self.path else { return Ok(()) };
        let items = self.items.read();
        let json = serde_json::to_string_pretty(&*items).map_err(Error::Json)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(Error::Io)?;
        }
        std::fs::write(path, json).map_err(Error::Io)
    }
}

fn load_items(path: &Path) -> Result<HashMap<String, Vec<TripPlanItem>>> {
    if !path.exists() {
        return Ok(HashMap::new());
    }
    let raw = std::fs::read_to_string(path).map_err(Error::Io)?;
    Ok(serde_json::from_str(&raw).unwrap_or_default())
}

/// One-time backfill for legacy rows whose `normalized_key` is empty
/// (rows written before the canonicalized-key scheme existed).
fn backfill_missing_keys(items: &mut HashMap<String, Vec<TripPlanItem>>) {
    for bucket in items.values_mut() {
        for item in bucket.iter_mut() {
            if item.normalized_key.is_empty() {
                item.normalized_key = normalized_key(&item.item_type, &item.title, &item.details);
            }
        }
    }
}
