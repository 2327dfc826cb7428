//! Configuration management
//!
//! TOML-backed configuration with serde defaults. Every knob the agent
//! loop, retry policy, and model client consume lives here, so tests and
//! the CLI harness can shrink the pacing delays without touching code.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{PilotError, Result};

/// Environment variable consulted when `[llm] api_key` is not set.
pub const API_KEY_ENV: &str = "GEMINI_API_KEY";

/// Model endpoint settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmSettings {
    pub base_url: String,
    pub model: String,
    pub api_key: Option<String>,
    pub temperature: f32,
    /// Total request timeout in seconds
    pub request_timeout_secs: u64,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            base_url: "https://generativelanguage.googleapis.com".to_string(),
            model: "gemini-2.5-flash".to_string(),
            api_key: None,
            temperature: 0.15,
            request_timeout_secs: 120,
        }
    }
}

impl LlmSettings {
    /// Resolve the API key from the config file or the environment.
    pub fn resolve_api_key(&self) -> Result<String> {
        if let Some(key) = &self.api_key {
            if !key.trim().is_empty() {
                return Ok(key.trim().to_string());
            }
        }
        match std::env::var(API_KEY_ENV) {
            Ok(key) if !key.trim().is_empty() => Ok(key.trim().to_string()),
            _ => Err(PilotError::MissingConfig {
                key: "llm.api_key".to_string(),
            }),
        }
    }
}

/// Backoff policy for retryable inference failures
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrySettings {
    /// Guarded attempts before the final unguarded one
    pub max_retries: u32,
    /// First backoff wait; doubles on every further retryable failure
    pub base_delay_ms: u64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay_ms: 2000,
        }
    }
}

impl RetrySettings {
    pub fn base_delay(&self) -> Duration {
        Duration::from_millis(self.base_delay_ms)
    }
}

/// Pacing delays between loop steps
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingSettings {
    /// Wait after dispatching an action, so the UI can settle
    pub settle_delay_ms: u64,
    /// Wait after a malformed model response before the next step
    pub parse_retry_delay_ms: u64,
    /// Wait after a failed inference call before the next step
    pub step_failure_delay_ms: u64,
    /// Pause while the model asked to wait for the user
    pub wait_for_user_delay_ms: u64,
}

impl Default for TimingSettings {
    fn default() -> Self {
        Self {
            settle_delay_ms: 4000,
            parse_retry_delay_ms: 1000,
            step_failure_delay_ms: 2000,
            wait_for_user_delay_ms: 5000,
        }
    }
}

impl TimingSettings {
    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    pub fn parse_retry_delay(&self) -> Duration {
        Duration::from_millis(self.parse_retry_delay_ms)
    }

    pub fn step_failure_delay(&self) -> Duration {
        Duration::from_millis(self.step_failure_delay_ms)
    }

    pub fn wait_for_user_delay(&self) -> Duration {
        Duration::from_millis(self.wait_for_user_delay_ms)
    }
}

/// Loop bounds
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentSettings {
    /// Hard ceiling on loop iterations per session
    pub max_steps: u32,
    /// How many recent history entries the prompt carries
    pub history_window: usize,
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            max_steps: 15,
            history_window: 5,
        }
    }
}

/// Root configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub llm: LlmSettings,
    pub retry: RetrySettings,
    pub timing: TimingSettings,
    pub agent: AgentSettings,
}

impl Config {
    /// Load configuration from the standard locations, falling back to
    /// defaults when no file exists.
    pub fn load() -> Result<Self> {
        match find_config_file() {
            Some(path) => Self::load_from(&path),
            None => Ok(Self::default()),
        }
    }

    /// Load configuration from an explicit path.
    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        toml::from_str(&raw).map_err(|e| PilotError::InvalidConfig {
            message: format!("{}: {}", path.display(), e),
        })
    }
}

/// Find the configuration file in standard locations
pub fn find_config_file() -> Option<PathBuf> {
    if let Ok(cwd) = std::env::current_dir() {
        let path = cwd.join("screenpilot.toml");
        if path.exists() {
            return Some(path);
        }
    }

    if let Some(dir) = get_config_dir() {
        let path = dir.join("screenpilot.toml");
        if path.exists() {
            return Some(path);
        }
    }

    None
}

/// Get the configuration directory path
pub fn get_config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("screenpilot"))
}

/// Get the data directory path (log files live here)
pub fn get_data_dir() -> Option<PathBuf> {
    dirs::data_local_dir().map(|d| d.join("screenpilot"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_device_constants() {
        let config = Config::default();
        assert_eq!(config.agent.max_steps, 15);
        assert_eq!(config.agent.history_window, 5);
        assert_eq!(config.retry.max_retries, 3);
        assert_eq!(config.retry.base_delay(), Duration::from_secs(2));
        assert_eq!(config.timing.settle_delay(), Duration::from_secs(4));
        assert_eq!(config.llm.model, "gemini-2.5-flash");
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("screenpilot.toml");
        std::fs::write(
            &path,
            "[agent]\nmax_steps = 5\n\n[llm]\nmodel = \"gemini-2.0-flash\"\n",
        )
        .unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.agent.max_steps, 5);
        assert_eq!(config.llm.model, "gemini-2.0-flash");
        // untouched sections keep their defaults
        assert_eq!(config.agent.history_window, 5);
        assert_eq!(config.retry.max_retries, 3);
    }

    #[test]
    fn invalid_toml_is_a_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("screenpilot.toml");
        std::fs::write(&path, "[agent\nmax_steps = 5").unwrap();

        let err = Config::load_from(&path).unwrap_err();
        assert!(matches!(err, PilotError::InvalidConfig { .. }));
    }

    #[test]
    fn api_key_config_takes_precedence_over_blank() {
        let settings = LlmSettings {
            api_key: Some("abc123".to_string()),
            ..Default::default()
        };
        assert_eq!(settings.resolve_api_key().unwrap(), "abc123");
    }
}
