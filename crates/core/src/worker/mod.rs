//! Worker nodes (C6): the domain specialists that call out to tools, plus
//! the conversational and trip-plan-CRUD workers that close out a turn.

pub mod conversational;
pub mod flight;
pub mod hotel;
pub mod planner_worker;
pub mod tool_worker;
pub mod tripadvisor;
pub mod utilities;
pub mod visa;

pub use tool_worker::{ToolWorkerNode, WorkerSpec};
