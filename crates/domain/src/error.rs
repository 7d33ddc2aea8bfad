/// Shared error type used across all agent-orchestration-core crates.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("IO: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP: {0}")]
    Http(String),

    #[error("timeout: {0}")]
    Timeout(String),

    #[error("provider {provider}: {message}")]
    Provider { provider: String, message: String },

    #[error("tool {tool}: permission denied for node {node}")]
    ToolPermission { node: String, tool: String },

    #[error("tool {tool}: {message}")]
    ToolInvocation { tool: String, message: String },

    #[error("memory store: {0}")]
    Memory(String),

    #[error("config: {0}")]
    Config(String),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Classify whether a retry is ever worth attempting for this error,
    /// independent of any caller-side retry budget.
    pub fn is_retriable_class(&self) -> bool {
        matches!(self, Error::Http(_) | Error::Timeout(_))
    }
}
