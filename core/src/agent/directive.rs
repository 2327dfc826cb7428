//! Wire types for the model's structured output
//!
//! The model must answer with exactly one JSON object:
//!
//! ```json
//! {
//!   "status": "IN_PROGRESS" | "COMPLETE" | "WAIT_FOR_USER",
//!   "message": "<string>",
//!   "action": { "action": "CLICK" | ..., "element_id": 123, "text": "..." }
//! }
//! ```
//!
//! Status and action values are matched case-insensitively; everything
//! that can be absent has a defined default.

use serde::{Deserialize, Serialize};

/// Session-level progress claim from the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StepStatus {
    InProgress,
    Complete,
    WaitForUser,
}

impl StepStatus {
    /// Case-insensitive wire value parse; anything unrecognized (or
    /// absent) counts as still in progress.
    pub fn from_wire(value: Option<&str>) -> Self {
        match value {
            Some(v) if v.eq_ignore_ascii_case("COMPLETE") => Self::Complete,
            Some(v) if v.eq_ignore_ascii_case("WAIT_FOR_USER") => Self::WaitForUser,
            _ => Self::InProgress,
        }
    }
}

/// The action vocabulary the executor understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActionKind {
    Click,
    Type,
    Enter,
    Scroll,
    Home,
    None,
    /// A name outside the vocabulary. Dispatch logs it and no-ops.
    Unknown,
}

impl ActionKind {
    pub fn from_wire(value: &str) -> Self {
        match value.to_ascii_uppercase().as_str() {
            "CLICK" => Self::Click,
            "TYPE" => Self::Type,
            "ENTER" => Self::Enter,
            "SCROLL" => Self::Scroll,
            "HOME" => Self::Home,
            "NONE" => Self::None,
            other => {
                crate::debug_log!("unrecognized action name '{}'", other);
                Self::Unknown
            }
        }
    }
}

/// One validated action instruction. `element_id` is carried verbatim and
/// resolved (or found missing) only at dispatch time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionDirective {
    pub kind: ActionKind,
    pub element_id: Option<i64>,
    pub text: Option<String>,
}

impl ActionDirective {
    pub fn none() -> Self {
        Self {
            kind: ActionKind::None,
            element_id: None,
            text: None,
        }
    }
}

/// A fully validated model reply: status, spoken message, and directive.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelReply {
    pub status: StepStatus,
    pub message: String,
    pub directive: ActionDirective,
}
