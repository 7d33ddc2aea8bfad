use std::sync::Arc;

use ao_context::{ContextBuilder, WorkerDomain};
use ao_providers::LlmProvider;
use ao_tool_client::ToolClient;

use super::{ToolWorkerNode, WorkerSpec};

pub const NAME: &str = "flight";

const SYSTEM_PROMPT: &str = "You are the flight-search specialist. Use the available tools to find \
flights matching the traveler's request. Prefer one-way search unless a return date is given, in which \
case use the round-trip search. Never invent flight numbers, prices, or schedules.";

pub fn build(provider: Arc<dyn LlmProvider>, tool_client: Arc<ToolClient>, context: ContextBuilder) -> ToolWorkerNode {
    ToolWorkerNode::new(
        WorkerSpec { name: NAME, domain: WorkerDomain::Flight, system_prompt: SYSTEM_PROMPT, multi_call: false },
        provider,
        tool_client,
        context,
    )
}
