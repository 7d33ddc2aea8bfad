use std::sync::Arc;

use ao_context::{ContextBuilder, WorkerDomain};
use ao_providers::LlmProvider;
use ao_tool_client::ToolClient;

use super::{ToolWorkerNode, WorkerSpec};

pub const NAME: &str = "visa";

const SYSTEM_PROMPT: &str = "You are the visa and entry-requirements specialist. Check visa \
requirements for the traveler's nationality against the destination country. State requirements \
plainly; never guess at a country's policy when the tool result is incomplete.";

pub fn build(provider: Arc<dyn LlmProvider>, tool_client: Arc<ToolClient>, context: ContextBuilder) -> ToolWorkerNode {
    ToolWorkerNode::new(
        WorkerSpec { name: NAME, domain: WorkerDomain::Visa, system_prompt: SYSTEM_PROMPT, multi_call: false },
        provider,
        tool_client,
        context,
    )
}
