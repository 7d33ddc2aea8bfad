use async_trait::async_trait;

use ao_domain::error::Result;

use crate::state::AgentState;

/// A single node in the graph. Receives the current state, does its work
/// (possibly suspending on I/O), and returns the state with its own
/// writes applied.
///
/// Workers (flight/hotel/visa/tripadvisor/utilities) only ever change
/// their own result slot and must not set `route` — the scheduler's
/// edges carry them to the join. Control nodes (planner, feedback
/// validators, PII/Safety/RFI, plan executor, join) may rewrite `route`
/// to direct traversal.
#[async_trait]
pub trait Node: Send + Sync {
    fn name(&self) -> &str;

    async fn run(&self, state: AgentState) -> Result<AgentState>;
}

pub type NodeTable = std::collections::HashMap<String, std::sync::Arc<dyn Node>>;
