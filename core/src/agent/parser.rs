//! Response parsing
//!
//! Models are told to emit nothing but the JSON object, and some ignore
//! that. The parser tolerates surrounding prose by slicing from the first
//! `{` to the last `}` before handing the span to serde. A reply that
//! still fails to parse is malformed — the caller waits briefly and moves
//! on, it is never a crash.

use serde::Deserialize;

use crate::agent::directive::{ActionDirective, ActionKind, ModelReply, StepStatus};

#[derive(Deserialize)]
struct RawReply {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    action: Option<RawAction>,
}

#[derive(Deserialize)]
struct RawAction {
    #[serde(default)]
    action: Option<String>,
    #[serde(default)]
    element_id: Option<i64>,
    #[serde(default)]
    text: Option<String>,
}

/// Extract and validate a [`ModelReply`] from raw model output.
/// `None` means the output was unusable this step.
pub fn parse(raw: &str) -> Option<ModelReply> {
    let span = extract_object(raw)?;

    let reply: RawReply = match serde_json::from_str(span) {
        Ok(r) => r,
        Err(e) => {
            crate::debug_log!("model reply is not valid JSON: {}", e);
            return None;
        }
    };

    let directive = match reply.action {
        Some(action) => ActionDirective {
            kind: action
                .action
                .as_deref()
                .map(ActionKind::from_wire)
                .unwrap_or(ActionKind::None),
            element_id: action.element_id,
            text: action.text,
        },
        None => ActionDirective::none(),
    };

    Some(ModelReply {
        status: StepStatus::from_wire(reply.status.as_deref()),
        message: reply.message.unwrap_or_default(),
        directive,
    })
}

/// Slice from the first `{` to the last `}`, if that span exists.
fn extract_object(raw: &str) -> Option<&str> {
    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    if end > start {
        Some(&raw[start..=end])
    } else {
        None
    }
}
