//! Graph Scheduler (C11) — reads `route`, invokes node(s), applies the
//! delta, and repeats until a terminal sentinel, the recursion budget, or
//! the request deadline is hit (§4.1).

use std::sync::Arc;
use std::time::{Duration, Instant};

use futures_util::future::join_all;

use ao_domain::config::BoundsConfig;
use ao_domain::telemetry::NodeTelemetry;

use crate::node::NodeTable;
use crate::reducer::merge_parallel_results;
use crate::state::{AgentState, Route};

pub struct GraphScheduler {
    nodes: NodeTable,
    recursion_budget: u32,
    request_deadline: Duration,
    telemetry: Arc<dyn NodeTelemetry>,
}

impl GraphScheduler {
    pub fn new(nodes: NodeTable, bounds: &BoundsConfig, telemetry: Arc<dyn NodeTelemetry>) -> Self {
        Self {
            nodes,
            recursion_budget: bounds.recursion_budget,
            request_deadline: Duration::from_secs(bounds.request_deadline_secs),
            telemetry,
        }
    }

    /// Run the graph to completion starting from `entry`, returning the
    /// final state. Never panics on an unknown node name or a node error
    /// — both terminate the traversal with whatever `last_response` was
    /// most recently set, per §7 (internal errors never cross the
    /// scheduler boundary as exceptions).
    pub async fn run(&self, mut state: AgentState, entry: Route) -> AgentState {
        state.route = Some(entry);
        let deadline = Instant::now() + self.request_deadline;
        let mut transitions: u32 = 0;

        loop {
            if Instant::now() >= deadline {
                tracing::warn!(session_id = %state.session_id, "request deadline exceeded");
                if state.last_response.is_none() {
                    state.last_response = Some("The request timed out before a response could be produced.".to_string());
                }
                break;
            }

            let route = state.route.take().unwrap_or(Route::None);
            match route {
                Route::None => break,
                Route::Single(name) => {
                    if transitions >= self.recursion_budget {
                        tracing::warn!(session_id = %state.session_id, recursion_budget = self.recursion_budget, "recursion budget exceeded");
                        if state.last_response.is_none() {
                            state.last_response = Some("The request could not be completed within its step budget.".to_string());
                        }
                        break;
                    }
                    transitions += 1;

                    let Some(node) = self.nodes.get(&name).cloned() else {
                        tracing::error!(node = %name, "unknown node name in route, stopping traversal");
                        break;
                    };

                    let span = tracing::info_span!("node", node = %name, step = transitions);
                    let _enter = span.enter();

                    let session_id = state.session_id.clone();
                    let user_email = state.user_email.clone();
                    self.telemetry.node_enter(&session_id, Some(&user_email), &name);
                    let entered = Instant::now();
                    let result = node.run(state).await;
                    self.telemetry.node_exit(&session_id, Some(&user_email), &name, entered.elapsed().as_millis());

                    match result {
                        Ok(new_state) => state = new_state,
                        Err(e) => {
                            tracing::error!(node = %name, error = %e, "node returned an error, stopping traversal");
                            break;
                        }
                    }
                }
                Route::Many(names) => {
                    if names.is_empty() {
                        continue;
                    }
                    transitions += 1;
                    let pre = state.clone();

                    let span = tracing::info_span!("parallel_step", workers = ?names, step = transitions);
                    let _enter = span.enter();

                    let session_id = pre.session_id.clone();
                    let user_email = pre.user_email.clone();
                    let futures: Vec<_> = names
                        .iter()
                        .map(|name| {
                            let node = self.nodes.get(name).cloned();
                            let snapshot = pre.clone();
                            let name = name.clone();
                            let session_id = session_id.clone();
                            let user_email = user_email.clone();
                            let telemetry = self.telemetry.clone();
                            async move {
                                match node {
                                    Some(n) => {
                                        telemetry.node_enter(&session_id, Some(&user_email), &name);
                                        let entered = Instant::now();
                                        let outcome = n.run(snapshot).await;
                                        telemetry.node_exit(&session_id, Some(&user_email), &name, entered.elapsed().as_millis());
                                        match outcome {
                                            Ok(s) => Some(s),
                                            Err(e) => {
                                                tracing::warn!(node = %name, error = %e, "worker node errored during parallel step");
                                                None
                                            }
                                        }
                                    }
                                    None => {
                                        tracing::error!(node = %name, "unknown worker node name in parallel route");
                                        None
                                    }
                                }
                            }
                        })
                        .collect();

                    let results: Vec<AgentState> = join_all(futures).await.into_iter().flatten().collect();
                    state = merge_parallel_results(&pre, &results);
                    // Workers never set `route` themselves (§4.2) — the
                    // dispatcher always hands a finished parallel step to
                    // the join node, which decides what comes next.
                    state.route = Some(Route::Single(crate::plan::JOIN_NODE.to_string()));
                }
            }
        }

        state
    }
}

pub fn node_table_from(nodes: Vec<Arc<dyn crate::node::Node>>) -> NodeTable {
    nodes.into_iter().map(|n| (n.name().to_string(), n)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use ao_domain::error::Result;
    use crate::node::Node;

    struct Echo {
        name: String,
        next: Option<Route>,
    }

    #[async_trait]
    impl Node for Echo {
        fn name(&self) -> &str {
            &self.name
        }

        async fn run(&self, mut state: AgentState) -> Result<AgentState> {
            state.last_response = Some(format!("visited {}", self.name));
            state.route = self.next.clone();
            Ok(state)
        }
    }

    fn bounds() -> BoundsConfig {
        BoundsConfig {
            max_feedback_retries: 2,
            max_join_polls: 20,
            join_poll_interval_ms: 1,
            recursion_budget: 5,
            request_deadline_secs: 5,
            tool_call_deadline_secs: 5,
            tool_connect_timeout_secs: 1,
            tool_retry_attempts: 1,
            tool_retry_backoff_ms: 1,
        }
    }

    #[tokio::test]
    async fn single_node_chain_runs_to_completion() {
        let a = Arc::new(Echo { name: "a".into(), next: Some(Route::Single("b".into())) });
        let b = Arc::new(Echo { name: "b".into(), next: None });
        let nodes = node_table_from(vec![a, b]);
        let scheduler = GraphScheduler::new(nodes, &bounds(), Arc::new(ao_domain::telemetry::NullSink));

        let state = AgentState::new("e@example.com", "s1", "hi");
        let result = scheduler.run(state, Route::Single("a".into())).await;
        assert_eq!(result.last_response.as_deref(), Some("visited b"));
    }

    #[tokio::test]
    async fn unknown_entry_node_stops_immediately() {
        let nodes = node_table_from(vec![]);
        let scheduler = GraphScheduler::new(nodes, &bounds(), Arc::new(ao_domain::telemetry::NullSink));
        let state = AgentState::new("e@example.com", "s1", "hi");
        let result = scheduler.run(state, Route::Single("ghost".into())).await;
        assert!(result.last_response.is_none());
    }

    #[tokio::test]
    async fn recursion_budget_stops_infinite_loop() {
        let looper = Arc::new(Echo { name: "loop".into(), next: Some(Route::Single("loop".into())) });
        let nodes = node_table_from(vec![looper]);
        let mut b = bounds();
        b.recursion_budget = 3;
        let scheduler = GraphScheduler::new(nodes, &b, Arc::new(ao_domain::telemetry::NullSink));
        let state = AgentState::new("e@example.com", "s1", "hi");
        let result = scheduler.run(state, Route::Single("loop".into())).await;
        assert!(result.last_response.unwrap().contains("step budget"));
    }

    #[tokio::test]
    async fn parallel_step_merges_worker_slots() {
        struct WriteSlot {
            slot: &'static str,
        }
        #[async_trait]
        impl Node for WriteSlot {
            fn name(&self) -> &str {
                self.slot
            }
            async fn run(&self, mut state: AgentState) -> Result<AgentState> {
                state.set_result_slot(self.slot, serde_json::json!({"ok": true}));
                Ok(state)
            }
        }
        let flight = Arc::new(WriteSlot { slot: "flight" });
        let hotel = Arc::new(WriteSlot { slot: "hotel" });
        let nodes = node_table_from(vec![flight, hotel]);
        let scheduler = GraphScheduler::new(nodes, &bounds(), Arc::new(ao_domain::telemetry::NullSink));
        let state = AgentState::new("e@example.com", "s1", "hi");
        let result = scheduler.run(state, Route::Many(vec!["flight".into(), "hotel".into()])).await;
        assert!(result.flight_result.is_some());
        assert!(result.hotel_result.is_some());
    }

    struct RecordingSink {
        entered: std::sync::Mutex<Vec<String>>,
        exited: std::sync::Mutex<Vec<String>>,
    }

    impl RecordingSink {
        fn new() -> Self {
            Self { entered: std::sync::Mutex::new(Vec::new()), exited: std::sync::Mutex::new(Vec::new()) }
        }
    }

    impl NodeTelemetry for RecordingSink {
        fn node_enter(&self, _session_id: &str, _user_email: Option<&str>, node_name: &str) {
            self.entered.lock().unwrap().push(node_name.to_string());
        }
        fn node_exit(&self, _session_id: &str, _user_email: Option<&str>, node_name: &str, _latency_ms: u128) {
            self.exited.lock().unwrap().push(node_name.to_string());
        }
        fn interaction(&self, _session_id: &str, _user_email: Option<&str>, _user_message: &str, _agent_response: &str, _latency_ms: u128) {}
        fn feedback_failure(&self, _session_id: &str, _user_email: Option<&str>, _feedback_node: &str, _reason: &str) {}
    }

    #[tokio::test]
    async fn node_dispatch_reports_enter_and_exit_to_telemetry() {
        let a = Arc::new(Echo { name: "a".into(), next: Some(Route::Single("b".into())) });
        let b = Arc::new(Echo { name: "b".into(), next: None });
        let nodes = node_table_from(vec![a, b]);
        let sink = Arc::new(RecordingSink::new());
        let scheduler = GraphScheduler::new(nodes, &bounds(), sink.clone());

        let state = AgentState::new("e@example.com", "s1", "hi");
        scheduler.run(state, Route::Single("a".into())).await;

        assert_eq!(*sink.entered.lock().unwrap(), vec!["a".to_string(), "b".to_string()]);
        assert_eq!(*sink.exited.lock().unwrap(), vec!["a".to_string(), "b".to_string()]);
    }

    #[tokio::test]
    async fn parallel_dispatch_reports_enter_and_exit_for_each_worker() {
        struct WriteSlot {
            slot: &'static str,
        }
        #[async_trait]
        impl Node for WriteSlot {
            fn name(&self) -> &str {
                self.slot
            }
            async fn run(&self, mut state: AgentState) -> Result<AgentState> {
                state.set_result_slot(self.slot, serde_json::json!({"ok": true}));
                Ok(state)
            }
        }
        let flight = Arc::new(WriteSlot { slot: "flight" });
        let hotel = Arc::new(WriteSlot { slot: "hotel" });
        let nodes = node_table_from(vec![flight, hotel]);
        let sink = Arc::new(RecordingSink::new());
        let scheduler = GraphScheduler::new(nodes, &bounds(), sink.clone());
        let state = AgentState::new("e@example.com", "s1", "hi");
        scheduler.run(state, Route::Many(vec!["flight".into(), "hotel".into()])).await;

        let mut entered = sink.entered.lock().unwrap().clone();
        entered.sort();
        assert_eq!(entered, vec!["flight".to_string(), "hotel".to_string()]);
    }
}
