//! Core graph assembly: every concrete node (pipeline, planner, workers,
//! feedback) plus the `handle_turn` entry point that wires them into a
//! [`ao_graph::GraphScheduler`] and drives one turn end to end.

pub mod feedback;
pub mod pipeline;
pub mod planner;
pub mod telemetry;
pub mod turn;
pub mod worker;

pub use turn::{handle_turn, TurnContext, TurnResult};
