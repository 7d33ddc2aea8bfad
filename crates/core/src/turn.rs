//! `handle_turn` (§6) — the one inbound entry point. Assembles the node
//! table from a [`TurnContext`], drives one turn through
//! [`ao_graph::GraphScheduler`], and persists STM state once the graph
//! settles.

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;

use ao_context::ContextBuilder;
use ao_domain::config::Config;
use ao_domain::error::Result;
use ao_domain::tool::Message;
use ao_graph::{node_table_from, AgentState, GraphScheduler, Route};
use ao_memory::LtmStore;
use ao_providers::{ChatRequest, LlmProvider, ProviderRegistry};
use ao_stm::{StmMessage, StmRole, StmStore};
use ao_tool_client::ToolClient;
use ao_tripstore::TripStore;

use crate::feedback::{PlanFeedbackNode, ResponseFeedbackNode, WorkerFeedbackNode};
use crate::pipeline::{MemoryNode, PiiRedactorNode, RfiCompletenessNode, RfiSafetyNode};
use crate::planner::PlannerNode;
use crate::telemetry::NodeTelemetry;
use crate::worker::conversational::ConversationalWorkerNode;
use crate::worker::planner_worker::PlannerWorkerNode;
use crate::worker::{flight, hotel, tripadvisor, utilities, visa};

const LTM_TOP_K: usize = 8;

const SUMMARY_SYSTEM_PROMPT: &str = "You are a summarization assistant. Provide concise, informative summaries.";

/// Everything `handle_turn` needs that outlives a single call: shared
/// stores, the provider registry, and a telemetry sink. Constructed once
/// at process startup.
pub struct TurnContext {
    pub config: Config,
    pub providers: ProviderRegistry,
    pub stm: Arc<StmStore>,
    pub ltm: Arc<LtmStore>,
    pub tripstore: Arc<TripStore>,
    pub telemetry: Arc<dyn NodeTelemetry>,
    summarizer: Arc<dyn LlmProvider>,
}

impl TurnContext {
    pub fn new(config: Config, telemetry: Arc<dyn NodeTelemetry>) -> Result<Self> {
        let providers = ProviderRegistry::from_config(&config.llm);
        let stm = Arc::new(StmStore::new(&config.stm)?);
        let ltm = Arc::new(LtmStore::new(config.ltm.clone())?);
        let tripstore = Arc::new(TripStore::new(&config.tripstore)?);
        let summarizer = providers.for_role("summarizer", "default/gpt-4.1-mini")?;
        Ok(Self { config, providers, stm, ltm, tripstore, telemetry, summarizer })
    }

    fn tool_client(&self, worker: &str) -> Arc<ToolClient> {
        Arc::new(ToolClient::new(worker, &self.config.tools, &self.config.bounds))
    }

    fn context_builder(&self) -> ContextBuilder {
        ContextBuilder::new(self.config.pruning.per_worker_memory_chars, self.config.pruning.total_context_chars)
    }

    fn build_scheduler(&self) -> Result<GraphScheduler> {
        let pii_provider = self.providers.for_role("pii", "default/gpt-4.1-mini")?;
        let memory_provider = self.providers.for_role("summarizer", "default/gpt-4.1-mini")?;
        let rfi_provider = self.providers.for_role("feedback", "default/gpt-4.1-mini")?;
        let planner_provider = self.providers.for_role("planner", "default/gpt-4.1-mini")?;
        let worker_provider = self.providers.for_role("worker", "default/gpt-4.1-mini")?;
        let conversational_provider = self.providers.for_role("worker", "default/gpt-4.1-mini")?;

        let ctx = self.context_builder();
        let bounds = &self.config.bounds;

        let nodes: Vec<Arc<dyn ao_graph::Node>> = vec![
            Arc::new(PiiRedactorNode::new(pii_provider)),
            Arc::new(MemoryNode::new(memory_provider, self.ltm.clone(), LTM_TOP_K)),
            Arc::new(RfiSafetyNode::new(rfi_provider.clone())),
            Arc::new(RfiCompletenessNode::new(rfi_provider)),
            Arc::new(PlannerNode::new(planner_provider)),
            Arc::new(PlanFeedbackNode::new(bounds.max_feedback_retries, self.telemetry.clone())),
            Arc::new(ao_graph::PlanExecutor),
            Arc::new(ao_graph::JoinNode::new(bounds)),
            Arc::new(WorkerFeedbackNode::new(bounds.max_feedback_retries, self.telemetry.clone())),
            Arc::new(flight::build(worker_provider.clone(), self.tool_client(flight::NAME), ctx.clone())),
            Arc::new(hotel::build(worker_provider.clone(), self.tool_client(hotel::NAME), ctx.clone())),
            Arc::new(visa::build(worker_provider.clone(), self.tool_client(visa::NAME), ctx.clone())),
            Arc::new(tripadvisor::build(worker_provider.clone(), self.tool_client(tripadvisor::NAME), ctx.clone())),
            Arc::new(utilities::build(worker_provider, self.tool_client(utilities::NAME), ctx.clone())),
            Arc::new(PlannerWorkerNode::new(self.tripstore.clone())),
            Arc::new(ConversationalWorkerNode::new(conversational_provider, self.stm.clone(), ctx)),
            Arc::new(ResponseFeedbackNode::new(bounds.max_feedback_retries, self.telemetry.clone())),
        ];

        Ok(GraphScheduler::new(node_table_from(nodes), bounds, self.telemetry.clone()))
    }
}

#[derive(Debug, Clone)]
pub struct TurnResult {
    pub response: String,
    pub agents_called: Vec<String>,
    pub session_id: String,
}

pub async fn handle_turn(ctx: &TurnContext, user_email: &str, session_id: &str, user_message: &str) -> Result<TurnResult> {
    let started = Instant::now();

    let stm_record = ctx.stm.get(session_id);
    let mut state = AgentState::new(user_email, session_id, user_message);
    state.rfi_context = stm_record.as_ref().map(|r| r.summary.clone()).filter(|s| !s.is_empty());
    if let Some(record) = &stm_record {
        if let Some(summary) = record.trip_plan_summary.clone() {
            state.collected_info.insert("trip_plan".to_string(), summary);
        }
    }

    let scheduler = ctx.build_scheduler()?;
    let final_state = scheduler.run(state, Route::Single("pii".to_string())).await;

    let response = final_state.last_response.clone().unwrap_or_else(|| "I wasn't able to process that request.".to_string());

    // Work out, before touching the store, which messages each push will
    // drop off the ring buffer, so the LLM rollup can be awaited here and
    // the (synchronous) `add_message` closures just return the already-
    // computed text.
    let existing = stm_record.map(|r| r.last_messages).unwrap_or_default();
    let user_msg = StmMessage { role: StmRole::User, text: user_message.to_string(), timestamp: Utc::now() };
    let (after_user, dropped_by_user) = simulate_push(&existing, user_msg, ctx.config.stm.max_messages);
    let user_overflow_summary = summarize_overflow(&ctx.summarizer, &dropped_by_user).await;

    let agent_msg = StmMessage { role: StmRole::Agent, text: response.clone(), timestamp: Utc::now() };
    let (_, dropped_by_agent) = simulate_push(&after_user, agent_msg, ctx.config.stm.max_messages);
    let agent_overflow_summary = summarize_overflow(&ctx.summarizer, &dropped_by_agent).await;

    let stm = ctx.stm.clone();
    let _ = stm.add_message(session_id, user_email, StmRole::User, user_message, move |dropped| {
        user_overflow_summary.unwrap_or_else(|| fold_dropped(dropped))
    });
    let _ = stm.add_message(session_id, user_email, StmRole::Agent, &response, move |dropped| {
        agent_overflow_summary.unwrap_or_else(|| fold_dropped(dropped))
    });

    let trip_summary = serde_json::to_value(ctx.tripstore.list(user_email, session_id)).unwrap_or(serde_json::Value::Null);
    let _ = stm.set_trip_plan_summary(session_id, trip_summary);

    ctx.telemetry.interaction(session_id, Some(user_email), user_message, &response, started.elapsed().as_millis());

    let agents_called = agents_called_from(&final_state);
    Ok(TurnResult { response, agents_called, session_id: session_id.to_string() })
}

/// Mirrors `StmStore::add_message`'s trim step: appends `new_message` to
/// `existing`, re-sorts by timestamp, and splits off whatever falls past
/// `max_messages` so the overflow can be summarized before the real push.
fn simulate_push(existing: &[StmMessage], new_message: StmMessage, max_messages: usize) -> (Vec<StmMessage>, Vec<StmMessage>) {
    let mut messages = existing.to_vec();
    messages.push(new_message);
    messages.sort_by_key(|m| m.timestamp);
    if messages.len() > max_messages {
        let cutoff = messages.len() - max_messages;
        let dropped: Vec<StmMessage> = messages.drain(0..cutoff).collect();
        (messages, dropped)
    } else {
        (messages, Vec::new())
    }
}

fn fold_dropped(dropped: &[StmMessage]) -> String {
    dropped.iter().map(|m| m.text.clone()).collect::<Vec<_>>().join(" ")
}

/// Summarize messages pushed out of the STM ring buffer in 3-4 lines.
/// Returns `None` when there's nothing to summarize; falls back to a plain
/// concatenation if the summarization call itself fails.
async fn summarize_overflow(provider: &Arc<dyn LlmProvider>, dropped: &[StmMessage]) -> Option<String> {
    if dropped.is_empty() {
        return None;
    }
    let transcript = dropped
        .iter()
        .map(|m| format!("{}: {}", format!("{:?}", m.role).to_uppercase(), m.text))
        .collect::<Vec<_>>()
        .join("\n");
    let prompt = format!(
        "Summarize the following conversation messages in 3-4 lines, keeping the important \
        context and key information:\n\n{transcript}\n\nProvide a concise summary that captures \
        the main topics, user preferences, and important details:"
    );
    let req = ChatRequest { messages: vec![Message::system(SUMMARY_SYSTEM_PROMPT), Message::user(prompt)], temperature: Some(0.3), ..Default::default() };
    match provider.chat(&req).await {
        Ok(resp) => Some(resp.content),
        Err(e) => {
            tracing::warn!(error = %e, "stm summarization call failed, falling back to concatenation");
            Some(fold_dropped(dropped))
        }
    }
}

fn agents_called_from(state: &AgentState) -> Vec<String> {
    let slots: [(&str, &Option<serde_json::Value>); 5] = [
        (flight::NAME, &state.flight_result),
        (hotel::NAME, &state.hotel_result),
        (visa::NAME, &state.visa_result),
        (tripadvisor::NAME, &state.tripadvisor_result),
        (utilities::NAME, &state.utilities_result),
    ];
    slots.into_iter().filter(|(_, v)| v.is_some()).map(|(name, _)| name.to_string()).collect()
}
