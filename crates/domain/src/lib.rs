//! Shared wire types used across every agent-orchestration-core crate:
//! provider-agnostic chat types, the streaming event model, the error
//! envelope that crosses node boundaries, the crate-wide `Error`/`Result`,
//! and the TOML-overlay `Config`.

pub mod config;
pub mod envelope;
pub mod error;
pub mod stream;
pub mod telemetry;
pub mod tool;

pub use config::Config;
pub use envelope::{ErrorCode, ErrorEnvelope};
pub use error::{Error, Result};
pub use stream::{BoxStream, StreamEvent, Usage};
pub use telemetry::{NodeTelemetry, NullSink};
pub use tool::{ContentPart, Message, MessageContent, Role, ToolCall, ToolDefinition};
