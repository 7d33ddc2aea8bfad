//! Feedback nodes (C7): worker, plan, and response feedback all share the
//! same status contract from §4.4 — `pass`, `need_retry`, `need_fix`, or
//! `need_regenerate` — bounded by `max_feedback_retries`.

pub mod plan_feedback;
pub mod response_feedback;
pub mod worker_feedback;

/// Outcome of a feedback check, shared by every feedback node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedbackStatus {
    Pass,
    NeedRetry,
    NeedFix,
    NeedRegenerate,
}

pub use plan_feedback::PlanFeedbackNode;
pub use response_feedback::ResponseFeedbackNode;
pub use worker_feedback::WorkerFeedbackNode;
