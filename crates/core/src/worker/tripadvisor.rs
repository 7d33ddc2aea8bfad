use std::sync::Arc;

use ao_context::{ContextBuilder, WorkerDomain};
use ao_providers::LlmProvider;
use ao_tool_client::ToolClient;

use super::{ToolWorkerNode, WorkerSpec};

pub const NAME: &str = "tripadvisor";

const SYSTEM_PROMPT: &str = "You are the attractions and dining specialist. Use the TripAdvisor \
tools to surface restaurants, attractions, and tours matching the traveler's destination and \
interests. Only run when the traveler has asked for things to do or somewhere to eat.";

pub fn build(provider: Arc<dyn LlmProvider>, tool_client: Arc<ToolClient>, context: ContextBuilder) -> ToolWorkerNode {
    ToolWorkerNode::new(
        WorkerSpec { name: NAME, domain: WorkerDomain::TripAdvisor, system_prompt: SYSTEM_PROMPT, multi_call: false },
        provider,
        tool_client,
        context,
    )
}
