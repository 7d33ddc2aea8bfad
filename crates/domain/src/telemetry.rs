//! Node/interaction telemetry hook, shared by `ao-graph` (which drives node
//! dispatch and has no business owning a concrete sink) and `ao-core`
//! (which wires a real sink into the scheduler and feedback nodes).

pub trait NodeTelemetry: Send + Sync {
    fn node_enter(&self, session_id: &str, user_email: Option<&str>, node_name: &str);
    fn node_exit(&self, session_id: &str, user_email: Option<&str>, node_name: &str, latency_ms: u128);
    fn interaction(&self, session_id: &str, user_email: Option<&str>, user_message: &str, agent_response: &str, latency_ms: u128);
    fn feedback_failure(&self, session_id: &str, user_email: Option<&str>, feedback_node: &str, reason: &str);
}

/// A sink that drops every event. Used in tests and wherever telemetry is
/// configured off.
pub struct NullSink;

impl NodeTelemetry for NullSink {
    fn node_enter(&self, _session_id: &str, _user_email: Option<&str>, _node_name: &str) {}
    fn node_exit(&self, _session_id: &str, _user_email: Option<&str>, _node_name: &str, _latency_ms: u128) {}
    fn interaction(&self, _session_id: &str, _user_email: Option<&str>, _user_message: &str, _agent_response: &str, _latency_ms: u128) {}
    fn feedback_failure(&self, _session_id: &str, _user_email: Option<&str>, _feedback_node: &str, _reason: &str) {}
}
