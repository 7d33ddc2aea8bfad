//! Long-Term Memory Store (C2) — a local, file-persisted vector store.
//!
//! Unlike the gateway's REST-backed SerialMemory client, this store keeps
//! every point in-process and computes cosine similarity directly: no
//! external vector database round-trip sits on the per-turn critical path.
//! Embeddings are supplied by the caller (via an `LlmProvider::embeddings`
//! call) — this crate only scores and ranks them.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use ao_domain::config::LtmConfig;
use ao_domain::error::{Error, Result};

use crate::cosine::cosine_similarity;

/// A single stored memory point.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryPoint {
    pub id: String,
    pub user_email: String,
    pub fact_text: String,
    /// 1-5, caller-assigned.
    pub importance: u8,
    pub embedding: Vec<f32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// A point scored against a query for retrieval.
#[derive(Debug, Clone)]
pub struct ScoredMemory {
    pub point: MemoryPoint,
    pub similarity: f32,
    pub final_score: f32,
}

pub struct LtmStore {
    config: LtmConfig,
    store_path: Option<PathBuf>,
    /// Keyed by user_email.
    points: RwLock<HashMap<String, Vec<MemoryPoint>>>,
    next_id: AtomicU64,
}

impl LtmStore {
    /// Load (or create) the store. When `config.store_path` is set, points
    /// are persisted to a JSON file there and reloaded on construction;
    /// otherwise the store is in-memory only (used in tests).
    pub fn new(config: LtmConfig) -> Result<Self> {
        let store_path = config.store_path.clone();
        let points = match &store_path {
            Some(path) => load_points(path)?,
            None => HashMap::new(),
        };
        let next_id = points.values().flatten().count() as u64;

        Ok(Self {
            config,
            store_path,
            points: RwLock::new(points),
            next_id: AtomicU64::new(next_id),
        })
    }

    fn alloc_id(&self, user_email: &str) -> String {
        let n = self.next_id.fetch_add(1, Ordering::SeqCst);
        format!("mem-{user_email}-{n}")
    }

    /// Store a new memory, deduplicating against existing near-duplicates
    /// (cosine >= `dedup_cosine_threshold`) by updating in place instead of
    /// inserting a second point.
    pub fn store(
        &self,
        user_email: &str,
        fact_text: &str,
        importance: u8,
        embedding: Vec<f32>,
    ) -> Result<String> {
        let dup = self.find_similar(user_email, &embedding, self.config.dedup_cosine_threshold);
        if let Some(existing) = dup.into_iter().next() {
            let id = existing.point.id.clone();
            self.update_point(user_email, &id, fact_text, importance, embedding)?;
            return Ok(id);
        }

        let id = self.alloc_id(user_email);
        let point = MemoryPoint {
            id: id.clone(),
            user_email: user_email.to_string(),
            fact_text: fact_text.to_string(),
            importance,
            embedding,
            created_at: Utc::now(),
            updated_at: None,
        };

        {
            let mut points = self.points.write();
            points.entry(user_email.to_string()).or_default().push(point);
        }
        self.flush()?;
        Ok(id)
    }

    /// Scroll this user's points (bounded by `config.scroll_limit`) and
    /// return those with cosine similarity >= `threshold`, sorted descending.
    pub fn find_similar(&self, user_email: &str, embedding: &[f32], threshold: f32) -> Vec<ScoredMemory> {
        let points = self.points.read();
        let mut scored: Vec<ScoredMemory> = points
            .get(user_email)
            .into_iter()
            .flatten()
            .take(self.config.scroll_limit)
            .map(|p| {
                let similarity = cosine_similarity(embedding, &p.embedding);
                ScoredMemory { point: p.clone(), similarity, final_score: similarity }
            })
            .filter(|s| s.similarity >= threshold)
            .collect();
        scored.sort_by(|a, b| b.similarity.partial_cmp(&a.similarity).unwrap_or(std::cmp::Ordering::Equal));
        scored
    }

    /// Retrieve the top-k relevant fact texts for a query embedding.
    ///
    /// `final_score = 0.7 * cosine + 0.3 * (importance - 1) / 4`. A memory
    /// is admitted if `final_score > score_cutoff` or `importance >=
    /// importance_floor`, even when the cosine term alone is weak.
    pub fn get_relevant(&self, user_email: &str, query_embedding: &[f32], top_k: usize) -> Vec<String> {
        let points = self.points.read();
        let mut scored: Vec<ScoredMemory> = points
            .get(user_email)
            .into_iter()
            .flatten()
            .take(self.config.scroll_limit)
            .map(|p| {
                let similarity = cosine_similarity(query_embedding, &p.embedding);
                let normalized_importance = (p.importance.max(1) as f32 - 1.0) / 4.0;
                let final_score = self.config.similarity_weight as f32 * similarity
                    + self.config.importance_weight as f32 * normalized_importance;
                ScoredMemory { point: p.clone(), similarity, final_score }
            })
            .collect();

        scored.sort_by(|a, b| b.final_score.partial_cmp(&a.final_score).unwrap_or(std::cmp::Ordering::Equal));

        scored
            .into_iter()
            .filter(|s| s.final_score > self.config.score_cutoff as f32 || s.point.importance >= self.config.importance_floor)
            .take(top_k)
            .map(|s| s.point.fact_text)
            .collect()
    }

    /// Update a point's text/importance/embedding in place.
    pub fn update_point(
        &self,
        user_email: &str,
        id: &str,
        new_fact_text: &str,
        new_importance: u8,
        new_embedding: Vec<f32>,
    ) -> Result<bool> {
        let updated = {
            let mut points = self.points.write();
            let Some(user_points) = points.get_mut(user_email) else { return Ok(false) };
            match user_points.iter_mut().find(|p| p.id == id) {
                Some(p) => {
                    p.fact_text = new_fact_text.to_string();
                    p.importance = new_importance;
                    p.embedding = new_embedding;
                    p.updated_at = Some(Utc::now());
                    true
                }
                None => false,
            }
        };
        if updated {
            self.flush()?;
        }
        Ok(updated)
    }

    /// Delete a point by id, verifying it belongs to `user_email`.
    pub fn delete(&self, user_email: &str, id: &str) -> Result<bool> {
        let removed = {
            let mut points = self.points.write();
            match points.get_mut(user_email) {
                Some(user_points) => {
                    let before = user_points.len();
                    user_points.retain(|p| p.id != id);
                    before != user_points.len()
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
        let Some(path) = &self.store_path else { return Ok(()) };
        let points = self.points.read();
        let json = serde_json::to_string_pretty(&*points).map_err(Error::Json)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(Error::Io)?;
        }
        std::fs::write(path, json).map_err(Error::Io)
    }
}

fn load_points(path: &Path) -> Result<HashMap<String, Vec<MemoryPoint>>> {
    if !path.exists() {
        return Ok(HashMap::new());
    }
    let raw = std::fs::read_to_string(path).map_err(Error::Io)?;
    Ok(serde_json::from_str(&raw).unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> LtmStore {
        LtmStore::new(LtmConfig::default()).unwrap()
    }

    fn vec_for(seed: f32) -> Vec<f32> {
        vec![seed, 1.0 - seed, seed * 0.5]
    }

    #[test]
    fn store_and_retrieve_relevant_memory() {
        let s = store();
        s.store("a@example.com", "likes window seats", 3, vec_for(0.9)).unwrap();
        let results = s.get_relevant("a@example.com", &vec_for(0.9), 5);
        assert_eq!(results, vec!["likes window seats"]);
    }

    #[test]
    fn high_importance_bypasses_low_similarity_cutoff() {
        let s = store();
        s.store("a@example.com", "has a severe peanut allergy", 5, vec_for(0.1)).unwrap();
        // query embedding is nearly orthogonal to the stored one
        let results = s.get_relevant("a@example.com", &vec_for(0.95), 5);
        assert_eq!(results, vec!["has a severe peanut allergy"]);
    }

    #[test]
    fn low_importance_and_low_similarity_is_excluded() {
        let s = store();
        s.store("a@example.com", "mentioned the weather once", 1, vec_for(0.1)).unwrap();
        let results = s.get_relevant("a@example.com", &vec_for(0.95), 5);
        assert!(results.is_empty());
    }

    #[test]
    fn near_duplicate_store_updates_instead_of_inserting() {
        let s = store();
        let id1 = s.store("a@example.com", "prefers aisle seats", 3, vec_for(0.9)).unwrap();
        let id2 = s.store("a@example.com", "prefers aisle seating", 3, vec_for(0.9)).unwrap();
        assert_eq!(id1, id2);
        let all = s.find_similar("a@example.com", &vec_for(0.9), 0.0);
        assert_eq!(all.len(), 1);
    }

    #[test]
    fn delete_removes_point_for_user() {
        let s = store();
        let id = s.store("a@example.com", "fact", 2, vec_for(0.3)).unwrap();
        assert!(s.delete("a@example.com", &id).unwrap());
        assert!(s.find_similar("a@example.com", &vec_for(0.3), 0.0).is_empty());
    }

    #[test]
    fn delete_unknown_id_returns_false() {
        let s = store();
        assert!(!s.delete("a@example.com", "nonexistent").unwrap());
    }

    #[test]
    fn persists_across_reload_when_store_path_set() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ltm.json");
        let cfg = LtmConfig { store_path: Some(path.clone()), ..Default::default() };
        {
            let s = LtmStore::new(cfg.clone()).unwrap();
            s.store("a@example.com", "remembered across restarts", 4, vec_for(0.7)).unwrap();
        }
        let reloaded = LtmStore::new(cfg).unwrap();
        let results = reloaded.get_relevant("a@example.com", &vec_for(0.7), 5);
        assert_eq!(results, vec!["remembered across restarts"]);
    }
}
