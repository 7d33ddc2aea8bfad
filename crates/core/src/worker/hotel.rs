use std::sync::Arc;

use ao_context::{ContextBuilder, WorkerDomain};
use ao_providers::LlmProvider;
use ao_tool_client::ToolClient;

use super::{ToolWorkerNode, WorkerSpec};

pub const NAME: &str = "hotel";

const SYSTEM_PROMPT: &str = "You are the hotel-search specialist. List candidate hotels, fetch rates \
and details for the ones that best match stated preferences, and only call book_hotel when the \
traveler has explicitly confirmed a specific property and rate.";

pub fn build(provider: Arc<dyn LlmProvider>, tool_client: Arc<ToolClient>, context: ContextBuilder) -> ToolWorkerNode {
    ToolWorkerNode::new(
        WorkerSpec { name: NAME, domain: WorkerDomain::Hotel, system_prompt: SYSTEM_PROMPT, multi_call: false },
        provider,
        tool_client,
        context,
    )
}
