//! Node/interaction telemetry (§6 persisted-state logging). The original
//! system shipped these as blob-storage uploads; the remote sink is opaque
//! and out of scope here, but `LocalFileSink` preserves the entry shapes
//! and the fallback-to-disk path, one JSON file per event under a
//! `<kind>/<date>/` layout mirroring the original blob paths.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::Serialize;

pub use ao_domain::telemetry::{NodeTelemetry, NullSink};

#[derive(Debug, Serialize)]
struct NodeEnterEntry<'a> {
    r#type: &'static str,
    session_id: &'a str,
    user_email: Option<&'a str>,
    node_name: &'a str,
    timestamp: String,
}

#[derive(Debug, Serialize)]
struct NodeExitEntry<'a> {
    r#type: &'static str,
    session_id: &'a str,
    user_email: Option<&'a str>,
    node_name: &'a str,
    latency_ms: u128,
    timestamp: String,
}

#[derive(Debug, Serialize)]
struct InteractionEntry<'a> {
    r#type: &'static str,
    session_id: &'a str,
    user_email: Option<&'a str>,
    user_message: &'a str,
    agent_response: &'a str,
    latency_ms: u128,
    timestamp: String,
}

#[derive(Debug, Serialize)]
struct FeedbackFailureEntry<'a> {
    r#type: &'static str,
    session_id: &'a str,
    user_email: Option<&'a str>,
    feedback_node: &'a str,
    reason: &'a str,
    timestamp: String,
}

/// Writes every event as its own JSON file under `root/<kind>/<date>/`.
/// Never returns an error to the caller — a telemetry write failure logs a
/// warning and is otherwise swallowed, since losing a log entry must never
/// fail a user-facing turn.
pub struct LocalFileSink {
    root: PathBuf,
}

impl LocalFileSink {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn write(&self, kind: &str, file_prefix: &str, value: &impl Serialize) {
        let date = Utc::now().format("%Y-%m-%d").to_string();
        let dir = self.root.join(kind).join(&date);
        if let Err(e) = fs::create_dir_all(&dir) {
            tracing::warn!(error = %e, kind, "failed to create telemetry directory");
            return;
        }
        let file_name = format!("{file_prefix}_{}.json", Utc::now().format("%Y%m%d_%H%M%S_%f"));
        let path: &Path = &dir.join(file_name);
        let json = match serde_json::to_vec_pretty(value) {
            Ok(j) => j,
            Err(e) => {
                tracing::warn!(error = %e, kind, "failed to serialize telemetry entry");
                return;
            }
        };
        if let Err(e) = fs::write(path, json) {
            tracing::warn!(error = %e, kind, path = %path.display(), "failed to write telemetry entry");
        }
    }
}

impl NodeTelemetry for LocalFileSink {
    fn node_enter(&self, session_id: &str, user_email: Option<&str>, node_name: &str) {
        self.write(
            &format!("nodes/{node_name}"),
            "enter",
            &NodeEnterEntry { r#type: "node_enter", session_id, user_email, node_name, timestamp: Utc::now().to_rfc3339() },
        );
    }

    fn node_exit(&self, session_id: &str, user_email: Option<&str>, node_name: &str, latency_ms: u128) {
        self.write(
            &format!("nodes/{node_name}"),
            "exit",
            &NodeExitEntry { r#type: "node_exit", session_id, user_email, node_name, latency_ms, timestamp: Utc::now().to_rfc3339() },
        );
    }

    fn interaction(&self, session_id: &str, user_email: Option<&str>, user_message: &str, agent_response: &str, latency_ms: u128) {
        self.write(
            &format!("interactions/session_{session_id}"),
            "log",
            &InteractionEntry {
                r#type: "interaction",
                session_id,
                user_email,
                user_message,
                agent_response,
                latency_ms,
                timestamp: Utc::now().to_rfc3339(),
            },
        );
    }

    fn feedback_failure(&self, session_id: &str, user_email: Option<&str>, feedback_node: &str, reason: &str) {
        self.write(
            "feedback_failures",
            "log",
            &FeedbackFailureEntry {
                r#type: "feedback_failure",
                session_id,
                user_email,
                feedback_node,
                reason,
                timestamp: Utc::now().to_rfc3339(),
            },
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn writes_one_file_per_event() {
        let dir = tempdir().unwrap();
        let sink = LocalFileSink::new(dir.path());

        sink.node_enter("s1", Some("a@example.com"), "planner");
        sink.interaction("s1", Some("a@example.com"), "hi", "hello!", 42);

        let enter_count = walk_count(&dir.path().join("nodes/planner"));
        let interaction_count = walk_count(&dir.path().join("interactions/session_s1"));
        assert_eq!(enter_count, 1);
        assert_eq!(interaction_count, 1);
    }

    fn walk_count(dir: &Path) -> usize {
        let mut count = 0;
        if let Ok(dates) = fs::read_dir(dir) {
            for date_entry in dates.flatten() {
                if let Ok(files) = fs::read_dir(date_entry.path()) {
                    count += files.count();
                }
            }
        }
        count
    }
}
