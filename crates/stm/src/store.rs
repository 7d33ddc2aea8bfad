//! Short-Term Memory (C1) — per-session ring buffer of recent turns plus a
//! rolling summary of everything older, a `last_results` cache (the most
//! recent worker outputs, used when a follow-up references "that one" or
//! "the same hotel"), and a `trip_plan_summary` snapshot.
//!
//! Persisted as one JSON file per store (not per session — sessions are
//! usually few enough that a single file round-trips cheaply), keyed by
//! `STM:<session_id>` the way the original Redis-backed implementation
//! keyed its entries.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use ao_domain::config::StmConfig;
use ao_domain::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StmRole {
    User,
    Agent,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StmMessage {
    pub role: StmRole,
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StmRecord {
    pub session_id: String,
    pub user_email: String,
    #[serde(default)]
    pub last_messages: Vec<StmMessage>,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub last_results: Option<Value>,
    #[serde(default)]
    pub trip_plan_summary: Option<Value>,
    pub updated_at: DateTime<Utc>,
}

impl StmRecord {
    fn new(session_id: &str, user_email: &str) -> Self {
        Self {
            session_id: session_id.to_string(),
            user_email: user_email.to_string(),
            last_messages: Vec::new(),
            summary: String::new(),
            last_results: None,
            trip_plan_summary: None,
            updated_at: Utc::now(),
        }
    }

    fn key(session_id: &str) -> String {
        format!("STM:{session_id}")
    }
}

pub struct StmStore {
    path: Option<PathBuf>,
    max_messages: usize,
    records: RwLock<HashMap<String, StmRecord>>,
}

impl StmStore {
    pub fn new(config: &StmConfig) -> Result<Self> {
        let records = match &config.store_path {
            Some(path) => load_records(path)?,
            None => HashMap::new(),
        };
        Ok(Self { path: config.store_path.clone(), max_messages: config.max_messages, records: RwLock::new(records) })
    }

    pub fn get(&self, session_id: &str) -> Option<StmRecord> {
        self.records.read().get(&StmRecord::key(session_id)).cloned()
    }

    pub fn clear(&self, session_id: &str) -> Result<()> {
        self.records.write().remove(&StmRecord::key(session_id));
        self.flush()
    }

    /// Append a message, trimming to the most recent `max_messages` and
    /// regenerating `summary` from everything pushed out of the window.
    ///
    /// `summarize` receives the messages that fell off the back of the
    /// ring buffer and returns the replacement summary text. The store
    /// stays LLM-agnostic — callers thread an `LlmProvider`-backed closure
    /// through.
    pub fn add_message(
        &self,
        session_id: &str,
        user_email: &str,
        role: StmRole,
        text: &str,
        summarize: impl FnOnce(&[StmMessage]) -> String,
    ) -> Result<()> {
        let key = StmRecord::key(session_id);
        {
            let mut records = self.records.write();
            let record = records.entry(key).or_insert_with(|| StmRecord::new(session_id, user_email));
            record.user_email = user_email.to_string();
            record.last_messages.push(StmMessage { role, text: text.to_string(), timestamp: Utc::now() });
            record.last_messages.sort_by_key(|m| m.timestamp);

            if record.last_messages.len() > self.max_messages {
                let cutoff = record.last_messages.len() - self.max_messages;
                let to_summarize: Vec<StmMessage> = record.last_messages.drain(0..cutoff).collect();
                record.summary = summarize(&to_summarize);
            } else {
                record.summary.clear();
            }
            record.updated_at = Utc::now();
        }
        self.flush()
    }

    pub fn set_last_results(&self, session_id: &str, results: Value) -> Result<bool> {
        let key = StmRecord::key(session_id);
        let set = {
            let mut records = self.records.write();
            match records.get_mut(&key) {
                Some(r) => {
                    r.last_results = Some(results);
                    r.updated_at = Utc::now();
                    true
                }
                None => false,
            }
        };
        if set {
            self.flush()?;
        }
        Ok(set)
    }

    pub fn get_last_results(&self, session_id: &str) -> Option<Value> {
        self.get(session_id).and_then(|r| r.last_results)
    }

    pub fn set_trip_plan_summary(&self, session_id: &str, summary: Value) -> Result<bool> {
        let key = StmRecord::key(session_id);
        let set = {
            let mut records = self.records.write();
            match records.get_mut(&key) {
                Some(r) => {
                    r.trip_plan_summary = Some(summary);
                    r.updated_at = Utc::now();
                    true
                }
                None => false,
            }
        };
        if set {
            self.flush()?;
        }
        Ok(set)
    }

    pub fn get_trip_plan_summary(&self, session_id: &str) -> Option<Value> {
        self.get(session_id).and_then(|r| r.trip_plan_summary)
    }

    fn flush(&self) -> Result<()> {
        let Some(path) = &self.path else { return Ok(()) };
        let records = self.records.read();
        let json = serde_json::to_string_pretty(&*records).map_err(Error::Json)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(Error::Io)?;
        }
        std::fs::write(path, json).map_err(Error::Io)
    }
}

fn load_records(path: &Path) -> Result<HashMap<String, StmRecord>> {
    if !path.exists() {
        return Ok(HashMap::new());
    }
    let raw = std::fs::read_to_string(path).map_err(Error::Io)?;
    Ok(serde_json::from_str(&raw).unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg(max: usize) -> StmConfig {
        StmConfig { max_messages: max, store_path: None }
    }

    #[test]
    fn no_summary_needed_under_the_limit() {
        let s = StmStore::new(&cfg(10)).unwrap();
        for i in 0..5 {
            s.add_message("sess1", "a@example.com", StmRole::User, &format!("msg {i}"), |_| "unused".into()).unwrap();
        }
        let record = s.get("sess1").unwrap();
        assert_eq!(record.last_messages.len(), 5);
        assert_eq!(record.summary, "");
    }

    #[test]
    fn ring_buffer_trims_to_max_and_summarizes_overflow() {
        let s = StmStore::new(&cfg(3)).unwrap();
        for i in 0..5 {
            s.add_message("sess1", "a@example.com", StmRole::User, &format!("msg {i}"), |old| {
                format!("summary of {} messages", old.len())
            })
            .unwrap();
        }
        let record = s.get("sess1").unwrap();
        assert_eq!(record.last_messages.len(), 3);
        assert_eq!(record.last_messages[0].text, "msg 2");
        assert_eq!(record.summary, "summary of 2 messages");
    }

    #[test]
    fn last_results_round_trips() {
        let s = StmStore::new(&cfg(10)).unwrap();
        s.add_message("sess1", "a@example.com", StmRole::User, "hi", |_| String::new()).unwrap();
        s.set_last_results("sess1", serde_json::json!({"flight_result": {"outbound": []}})).unwrap();
        let results = s.get_last_results("sess1").unwrap();
        assert_eq!(results["flight_result"]["outbound"], serde_json::json!([]));
    }

    #[test]
    fn set_last_results_before_session_exists_is_noop() {
        let s = StmStore::new(&cfg(10)).unwrap();
        assert!(!s.set_last_results("no-such-session", serde_json::json!({})).unwrap());
    }

    #[test]
    fn trip_plan_summary_round_trips() {
        let s = StmStore::new(&cfg(10)).unwrap();
        s.add_message("sess1", "a@example.com", StmRole::User, "hi", |_| String::new()).unwrap();
        s.set_trip_plan_summary("sess1", serde_json::json!({"segments": ["flight", "hotel"]})).unwrap();
        let summary = s.get_trip_plan_summary("sess1").unwrap();
        assert_eq!(summary["segments"][0], "flight");
    }

    #[test]
    fn persists_across_reload_when_store_path_set() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stm.json");
        let cfg = StmConfig { max_messages: 10, store_path: Some(path) };
        {
            let s = StmStore::new(&cfg).unwrap();
            s.add_message("sess1", "a@example.com", StmRole::User, "persisted", |_| String::new()).unwrap();
        }
        let reloaded = StmStore::new(&cfg).unwrap();
        let record = reloaded.get("sess1").unwrap();
        assert_eq!(record.last_messages[0].text, "persisted");
    }
}
