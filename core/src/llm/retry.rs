//! Backoff retry wrapper around an [`InferenceService`]
//!
//! Retryable failures (rate limit / quota signatures) are waited out with
//! strictly doubling delays; once the guarded attempts are spent, one
//! final unguarded attempt runs and whatever it produces is propagated.
//! Fatal errors (connectivity and everything else) propagate immediately
//! without waiting. Cancellation is observed during every wait.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;

use crate::config::RetrySettings;
use crate::error::{PilotError, Result};
use crate::llm::{InferenceService, StatusCallback};

/// Fixed backoff schedule: `base_delay * 2^attempt`.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
}

impl RetryPolicy {
    pub fn from_settings(settings: &RetrySettings) -> Self {
        Self {
            max_retries: settings.max_retries,
            base_delay: settings.base_delay(),
        }
    }

    /// Wait before the retry following guarded attempt `attempt` (0-based).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay * 2u32.saturating_pow(attempt)
    }
}

/// Retry-wrapped inference entry point used by the agent loop.
pub struct InferenceGateway {
    service: Arc<dyn InferenceService>,
    policy: RetryPolicy,
    status_callback: Mutex<Option<StatusCallback>>,
}

impl InferenceGateway {
    pub fn new(service: Arc<dyn InferenceService>, policy: RetryPolicy) -> Self {
        Self {
            service,
            policy,
            status_callback: Mutex::new(None),
        }
    }

    /// Set a status callback for reporting retry waits.
    pub fn set_status_callback(&self, callback: StatusCallback) {
        *self.status_callback.lock() = Some(callback);
    }

    fn report_status(&self, message: &str) {
        if let Some(callback) = self.status_callback.lock().as_ref() {
            callback(message);
        }
    }

    /// Invoke the model, absorbing up to `max_retries` retryable failures
    /// with backoff, then making one last unguarded attempt.
    pub async fn infer(&self, prompt: &str, cancel: &CancellationToken) -> Result<String> {
        for attempt in 0..self.policy.max_retries {
            if cancel.is_cancelled() {
                return Err(PilotError::Cancelled);
            }

            match self.service.generate(prompt).await {
                Ok(text) => return Ok(text),
                Err(e) if e.is_retryable() => {
                    let wait = self.policy.delay_for(attempt);
                    crate::info_log!(
                        "retryable inference failure (attempt {}/{}): {}; waiting {:?}",
                        attempt + 1,
                        self.policy.max_retries,
                        e,
                        wait
                    );
                    self.report_status(&format!(
                        "Quota limit. Retrying in {}s...",
                        wait.as_secs().max(1)
                    ));

                    tokio::select! {
                        _ = sleep(wait) => {}
                        _ = cancel.cancelled() => return Err(PilotError::Cancelled),
                    }
                }
                Err(e) => return Err(e),
            }
        }

        // Last attempt runs bare: its result, success or failure, is final.
        self.service.generate(prompt).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct FlakyService {
        calls: AtomicU32,
        failures_before_success: u32,
        error_kind: fn() -> PilotError,
    }

    impl FlakyService {
        fn rate_limited(failures_before_success: u32) -> Self {
            Self {
                calls: AtomicU32::new(0),
                failures_before_success,
                error_kind: || PilotError::RateLimited {
                    message: "quota".to_string(),
                },
            }
        }

        fn fatal() -> Self {
            Self {
                calls: AtomicU32::new(0),
                failures_before_success: u32::MAX,
                error_kind: || PilotError::ConnectionFailed {
                    message: "offline".to_string(),
                },
            }
        }

        fn calls(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait::async_trait]
    impl InferenceService for FlakyService {
        async fn generate(&self, _prompt: &str) -> Result<String> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            if n < self.failures_before_success {
                Err((self.error_kind)())
            } else {
                Ok("ok".to_string())
            }
        }
    }

    fn tiny_policy() -> RetryPolicy {
        RetryPolicy {
            max_retries: 3,
            base_delay: Duration::from_millis(1),
        }
    }

    #[test]
    fn delays_double_from_the_base() {
        let policy = RetryPolicy {
            max_retries: 3,
            base_delay: Duration::from_secs(2),
        };
        assert_eq!(policy.delay_for(0), Duration::from_secs(2));
        assert_eq!(policy.delay_for(1), Duration::from_secs(4));
        assert_eq!(policy.delay_for(2), Duration::from_secs(8));
    }

    #[tokio::test]
    async fn recovers_after_retryable_failures() {
        let service = Arc::new(FlakyService::rate_limited(2));
        let gateway = InferenceGateway::new(service.clone(), tiny_policy());
        let cancel = CancellationToken::new();

        let out = gateway.infer("p", &cancel).await.unwrap();
        assert_eq!(out, "ok");
        assert_eq!(service.calls(), 3);
    }

    #[tokio::test]
    async fn exhausted_retries_end_with_one_unguarded_attempt() {
        let service = Arc::new(FlakyService::rate_limited(u32::MAX));
        let gateway = InferenceGateway::new(service.clone(), tiny_policy());
        let cancel = CancellationToken::new();

        let err = gateway.infer("p", &cancel).await.unwrap_err();
        assert!(err.is_retryable());
        // 3 guarded attempts + the final bare one.
        assert_eq!(service.calls(), 4);
    }

    #[tokio::test]
    async fn fatal_errors_propagate_without_retrying() {
        let service = Arc::new(FlakyService::fatal());
        let gateway = InferenceGateway::new(service.clone(), tiny_policy());
        let cancel = CancellationToken::new();

        let err = gateway.infer("p", &cancel).await.unwrap_err();
        assert!(matches!(err, PilotError::ConnectionFailed { .. }));
        assert_eq!(service.calls(), 1);
    }

    #[tokio::test]
    async fn cancellation_short_circuits_the_wait() {
        let service = Arc::new(FlakyService::rate_limited(u32::MAX));
        let gateway = InferenceGateway::new(
            service.clone(),
            RetryPolicy {
                max_retries: 3,
                base_delay: Duration::from_secs(60),
            },
        );
        let cancel = CancellationToken::new();
        cancel.cancel();

        // A pre-cancelled token stops the gateway before it ever calls
        // the service or sleeps a minute.
        let err = gateway.infer("p", &cancel).await.unwrap_err();
        assert!(matches!(err, PilotError::Cancelled));
        assert_eq!(service.calls(), 0);
    }
}
