//! Structured error types for screenpilot
//!
//! Provides type-safe error handling with retry classification for the
//! agent loop: fatal errors end the session, retryable errors are waited
//! out, step-level errors are absorbed and the loop continues.

use std::time::Duration;
use thiserror::Error;

/// Primary error type for screenpilot operations
#[derive(Error, Debug)]
pub enum PilotError {
    // =========================================================================
    // Perception Errors
    // =========================================================================
    /// The platform accessor could not produce a UI tree (fatal)
    #[error("screen unreadable: {reason}")]
    ScreenUnreadable { reason: String },

    // =========================================================================
    // Provider / Inference Errors
    // =========================================================================
    /// Rate limit or quota exhaustion reported by the provider (429)
    #[error("rate limited: {message}")]
    RateLimited { message: String },

    /// Network-level failure reaching the provider
    #[error("connection failed: {message}")]
    ConnectionFailed { message: String },

    /// Provider returned a non-success status
    #[error("provider error ({status}): {message}")]
    Provider { status: u16, message: String },

    /// Provider returned a body with no usable candidate text
    #[error("no content in model response")]
    EmptyResponse,

    // =========================================================================
    // Session Errors
    // =========================================================================
    /// A session is already running; new goals are rejected, not queued
    #[error("agent is busy with another goal")]
    SessionBusy,

    /// The session was cancelled through its cancellation token
    #[error("session cancelled")]
    Cancelled,

    // =========================================================================
    // Configuration Errors
    // =========================================================================
    /// Invalid configuration
    #[error("invalid configuration: {message}")]
    InvalidConfig { message: String },

    /// Missing required config
    #[error("missing required configuration: {key}")]
    MissingConfig { key: String },

    // =========================================================================
    // External Error Wrappers
    // =========================================================================
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(String),

    #[error("HTTP error: {0}")]
    Http(String),
}

impl PilotError {
    /// Check if the error carries a rate-limit / quota / resource-exhaustion
    /// signature and should be waited out with backoff. Everything else,
    /// connectivity included, is fatal for the current attempt.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::RateLimited { .. } => true,
            Self::Provider { status, message } => {
                *status == 429 || has_quota_signature(message)
            }
            _ => false,
        }
    }

    /// Suggested wait before retrying, for errors that carry one
    pub fn retry_delay(&self) -> Option<Duration> {
        match self {
            Self::RateLimited { .. } => Some(Duration::from_secs(2)),
            Self::Provider { status: 429, .. } => Some(Duration::from_secs(2)),
            _ => None,
        }
    }

    /// Get a user-facing message suitable for the status bubble or speech
    pub fn user_message(&self) -> String {
        match self {
            Self::ScreenUnreadable { .. } => "I cannot read the screen.".to_string(),
            Self::RateLimited { .. } => "The model is rate limited. Retrying.".to_string(),
            Self::SessionBusy => "I am busy.".to_string(),
            Self::Cancelled => "Stopped.".to_string(),
            Self::MissingConfig { key } => format!("Configuration is missing '{}'.", key),
            _ => self.to_string(),
        }
    }
}

/// Message-content classification for providers that bury quota errors in
/// non-429 responses. Matches the signatures the device build keyed on.
pub fn has_quota_signature(message: &str) -> bool {
    let msg = message.to_lowercase();
    msg.contains("429") || msg.contains("quota") || msg.contains("resource")
}

impl From<reqwest::Error> for PilotError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_connect() || err.is_timeout() {
            Self::ConnectionFailed {
                message: err.to_string(),
            }
        } else {
            Self::Http(err.to_string())
        }
    }
}

impl From<serde_json::Error> for PilotError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err.to_string())
    }
}

/// Result type alias using PilotError
pub type Result<T> = std::result::Result<T, PilotError>;
