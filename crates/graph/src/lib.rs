//! `ao-graph` — the node framework and scheduler (C9-C11): `AgentState`,
//! the parallel-step reducer, the plan executor, the join node, and the
//! scheduler loop that drives a turn from entry route to terminal.

pub mod join;
pub mod node;
pub mod plan;
pub mod reducer;
pub mod scheduler;
pub mod state;

pub use join::{JoinNode, PLANNER_NODE, PLANNER_WORKER_NODE, WORKER_FEEDBACK_NODE};
pub use node::{Node, NodeTable};
pub use plan::{PlanExecutor, JOIN_NODE, PLAN_EXECUTOR};
pub use reducer::{build_collected_info, merge_parallel_results};
pub use scheduler::{node_table_from, GraphScheduler};
pub use state::{merge_optional, AgentState, RfiStatus, Route, Step, TERMINAL};
