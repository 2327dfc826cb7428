//! Model access
//!
//! The agent loop talks to the generative model through the
//! [`InferenceService`] seam; [`gemini::GeminiClient`] is the concrete
//! client and [`retry::InferenceGateway`] wraps either with the backoff
//! policy.

pub mod gemini;
pub mod retry;

pub use gemini::GeminiClient;
pub use retry::{InferenceGateway, RetryPolicy};

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::Result;

/// Callback for surfacing progress lines ("Step 3...", retry waits) to
/// whatever shell hosts the agent — a status bubble, a terminal, a test.
pub type StatusCallback = Arc<dyn Fn(&str) + Send + Sync>;

/// One-shot text generation seam over the external model.
#[async_trait]
pub trait InferenceService: Send + Sync {
    /// Produce the raw model output for `prompt`. Errors carry their
    /// retry classification via [`crate::error::PilotError::is_retryable`].
    async fn generate(&self, prompt: &str) -> Result<String>;
}
