//! The error envelope shared across worker/feedback/tool boundaries (§6, §7).
//!
//! Internal errors never cross a node boundary as exceptions — they are
//! caught at the node wrapper and converted into this typed envelope,
//! written into the owning result slot. Downstream nodes (feedback,
//! responder) read the envelope, never a raw error.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    ValidationError,
    NotFound,
    UpstreamError,
    ApiKeyMissing,
    PermissionDenied,
    Timeout,
    Incomplete,
    Other,
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ErrorCode::ValidationError => "VALIDATION_ERROR",
            ErrorCode::NotFound => "NOT_FOUND",
            ErrorCode::UpstreamError => "UPSTREAM_ERROR",
            ErrorCode::ApiKeyMissing => "API_KEY_MISSING",
            ErrorCode::PermissionDenied => "PERMISSION_DENIED",
            ErrorCode::Timeout => "TIMEOUT",
            ErrorCode::Incomplete => "INCOMPLETE",
            ErrorCode::Other => "OTHER",
        };
        f.write_str(s)
    }
}

/// The `{error:true, error_code, error_message, suggestion?}` shape from §6.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    pub error: bool,
    pub error_code: ErrorCode,
    pub error_message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_error_details: Option<serde_json::Value>,
}

impl ErrorEnvelope {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            error: true,
            error_code: code,
            error_message: message.into(),
            suggestion: None,
            api_error_details: None,
        }
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Whether a feedback validator should consider this worth one retry
    /// with corrected parameters (§7: "Validation (recoverable)").
    pub fn is_retriable(&self) -> bool {
        matches!(self.error_code, ErrorCode::ValidationError | ErrorCode::UpstreamError)
    }

    pub fn did_not_complete(worker: &str) -> Self {
        Self::new(
            ErrorCode::Incomplete,
            format!("{worker} did not complete"),
        )
    }
}
