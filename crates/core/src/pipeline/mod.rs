//! PII/Safety/RFI Pipeline (C8, §4.5) — the three gates every turn passes
//! through before a plan is ever produced: PII redaction, memory retrieval
//! (plus opportunistic write), and the two-stage RFI gate (safety/scope,
//! then completeness).

pub mod memory;
pub mod pii;
pub mod rfi;

pub use memory::MemoryNode;
pub use pii::PiiRedactorNode;
pub use rfi::{RfiCompletenessNode, RfiSafetyNode};
