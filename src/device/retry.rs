//! Retry logic with exponential backoff for flaky device requests.
//!
//! The card's embedded HTTP server drops connections and answers with 5xx
//! under load. Every request goes through [`RetryPolicy::run`], which retries
//! [`FailureType::Transient`] failures with exponential backoff and returns
//! [`FailureType::Permanent`] failures immediately.
//!
//! # Example
//!
//! ```
//! use ezshare_sync::device::{DeviceError, FailureType, RetryDecision, RetryPolicy, classify_error};
//!
//! let policy = RetryPolicy::with_max_retries(3);
//! let error = DeviceError::server_error("http://192.168.4.1/dir?dir=A:", 503);
//!
//! match policy.should_retry(classify_error(&error), 1) {
//!     RetryDecision::Retry { delay, attempt } => {
//!         println!("Retrying in {:?} (attempt {})", delay, attempt);
//!     }
//!     RetryDecision::DoNotRetry { reason } => {
//!         println!("Not retrying: {}", reason);
//!     }
//! }
//! ```

use std::future::Future;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument, warn};

use super::DeviceError;

/// Default maximum retry count (attempts after the first one).
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Default base delay for exponential backoff (500ms).
pub const DEFAULT_BACKOFF_BASE: Duration = Duration::from_millis(500);

/// Classification of request failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureType {
    /// Temporary failure that may succeed on retry.
    ///
    /// Examples: request timeout, 5xx server errors.
    Transient,

    /// Failure that won't succeed regardless of retries.
    ///
    /// Examples: 404 Not Found, malformed listing, cancellation, local IO.
    Permanent,
}

/// Decision on whether to retry a failed request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryDecision {
    /// Retry after the specified delay.
    Retry {
        /// How long to wait before retrying.
        delay: Duration,
        /// Which attempt number this will be (1-indexed, so first retry is attempt 2).
        attempt: u32,
    },

    /// Do not retry.
    DoNotRetry {
        /// Human-readable reason why retry is not attempted.
        reason: String,
    },
}

/// Configuration for retry behavior with exponential backoff.
///
/// # Delay Calculation
///
/// ```text
/// delay before attempt n+1 = base_delay * 2^(n-1)
/// ```
///
/// With the default base, delays are 500ms, 1s, 2s.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum number of attempts (including the initial attempt).
    max_attempts: u32,

    /// Delay before the first retry.
    base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::with_max_retries(DEFAULT_MAX_RETRIES)
    }
}

impl RetryPolicy {
    /// Creates a new retry policy.
    ///
    /// # Arguments
    ///
    /// * `max_retries` - Retries after the initial attempt (0 means a single attempt)
    /// * `base_delay` - Delay before the first retry, doubled for each further one
    #[must_use]
    pub fn new(max_retries: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts: max_retries.saturating_add(1),
            base_delay,
        }
    }

    /// Creates a policy with a custom retry count and the default backoff base.
    #[must_use]
    pub fn with_max_retries(max_retries: u32) -> Self {
        Self::new(max_retries, DEFAULT_BACKOFF_BASE)
    }

    /// Returns the maximum number of attempts configured.
    #[must_use]
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Determines whether to retry a failed request.
    ///
    /// `attempt` is the attempt number that just failed (1-indexed).
    #[instrument(skip(self), fields(max_attempts = self.max_attempts))]
    pub fn should_retry(&self, failure_type: FailureType, attempt: u32) -> RetryDecision {
        if failure_type == FailureType::Permanent {
            return RetryDecision::DoNotRetry {
                reason: "permanent failure - retry would not help".to_string(),
            };
        }

        if attempt >= self.max_attempts {
            debug!(attempt, max = self.max_attempts, "max attempts reached");
            return RetryDecision::DoNotRetry {
                reason: format!("max attempts ({}) exhausted", self.max_attempts),
            };
        }

        let delay = self.calculate_delay(attempt);

        debug!(
            attempt,
            next_attempt = attempt + 1,
            delay_ms = delay.as_millis(),
            "will retry"
        );

        RetryDecision::Retry {
            delay,
            attempt: attempt + 1,
        }
    }

    /// Runs `operation` until it succeeds, fails permanently, or attempts run out.
    ///
    /// Each attempt and each backoff sleep race `cancel`; a fired token ends
    /// the loop with [`DeviceError::Cancelled`] without further attempts.
    ///
    /// # Errors
    ///
    /// - The operation's own error if it is permanent
    /// - [`DeviceError::RetriesExhausted`] wrapping the last transient error
    /// - [`DeviceError::Cancelled`] if the token fires
    pub async fn run<T, F, Fut>(
        &self,
        cancel: &CancellationToken,
        mut operation: F,
    ) -> Result<T, DeviceError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, DeviceError>>,
    {
        let mut attempt = 0u32;

        loop {
            attempt += 1;
            if cancel.is_cancelled() {
                return Err(DeviceError::Cancelled);
            }

            let result = tokio::select! {
                biased;
                () = cancel.cancelled() => Err(DeviceError::Cancelled),
                result = operation() => result,
            };

            let error = match result {
                Ok(value) => return Ok(value),
                Err(error) => error,
            };

            let failure_type = classify_error(&error);
            if failure_type == FailureType::Permanent {
                debug!(attempt, error = %error, "not retrying permanent failure");
                return Err(error);
            }

            match self.should_retry(failure_type, attempt) {
                RetryDecision::Retry {
                    delay,
                    attempt: next_attempt,
                } => {
                    warn!(
                        attempt = next_attempt,
                        max_attempts = self.max_attempts,
                        delay_ms = delay.as_millis(),
                        error = %error,
                        "retrying device request"
                    );
                    tokio::select! {
                        biased;
                        () = cancel.cancelled() => return Err(DeviceError::Cancelled),
                        () = tokio::time::sleep(delay) => {}
                    }
                }
                RetryDecision::DoNotRetry { reason } => {
                    debug!(%reason, "giving up");
                    return Err(DeviceError::retries_exhausted(attempt, error));
                }
            }
        }
    }

    /// Calculates the delay after failed attempt `attempt` (1-indexed).
    fn calculate_delay(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(31);
        self.base_delay.saturating_mul(1u32 << exponent)
    }
}

/// Classifies a device error into a failure type for retry decisions.
///
/// | Error | Type |
/// |-------|------|
/// | `ServerError` (5xx) | Transient |
/// | `Timeout` | Transient |
/// | `Cancelled` | Permanent |
/// | everything else (4xx, parse, range, IO, network) | Permanent |
#[must_use]
pub fn classify_error(error: &DeviceError) -> FailureType {
    match error {
        DeviceError::ServerError { .. } | DeviceError::Timeout { .. } => FailureType::Transient,
        _ => FailureType::Permanent,
    }
}
