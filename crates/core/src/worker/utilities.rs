use std::sync::Arc;

use ao_context::{ContextBuilder, WorkerDomain};
use ao_providers::LlmProvider;
use ao_tool_client::ToolClient;

use super::{ToolWorkerNode, WorkerSpec};

pub const NAME: &str = "utilities";

const SYSTEM_PROMPT: &str = "You are the travel-utilities specialist: public holidays, weather \
outlook, currency conversion, local date/time, and eSIM bundles. A single request may need more \
than one of these — call every tool the request actually needs.";

/// The one worker allowed to return `multiple_results` — a single turn may
/// need holidays, weather, and currency all at once.
pub fn build(provider: Arc<dyn LlmProvider>, tool_client: Arc<ToolClient>, context: ContextBuilder) -> ToolWorkerNode {
    ToolWorkerNode::new(
        WorkerSpec { name: NAME, domain: WorkerDomain::Utilities, system_prompt: SYSTEM_PROMPT, multi_call: true },
        provider,
        tool_client,
        context,
    )
}
