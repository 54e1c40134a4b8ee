//! Retry controller
//!
//! Drives a [`Transport`] under an exponential backoff policy:
//! - authentication and invalid-request failures propagate immediately
//! - a 429 carrying a server retry-after waits exactly that long and leaves
//!   the backoff untouched
//! - every other failure waits the current backoff, then doubles it up to
//!   the cap
//!
//! Every retryable failure is followed by its wait, the final one included,
//! before the attempt count is checked.
//!
//! Rate-limiter admission happens once per call, before the first attempt.
//! Later attempts are paced by backoff alone.

use super::rate_limit::RateLimiter;
use super::transport::{QueryParams, Transport};
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Backoff and attempt bounds
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Retries after the first attempt
    pub max_retries: u32,
    /// First backoff delay
    #[serde(with = "crate::config::duration_secs")]
    pub initial_backoff: Duration,
    /// Upper bound for any backoff delay
    #[serde(with = "crate::config::duration_secs")]
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_backoff: Duration::from_secs(1),
            max_backoff: Duration::from_secs(60),
        }
    }
}

impl RetryPolicy {
    /// Create a new retry policy
    pub fn new(max_retries: u32, initial_backoff: Duration, max_backoff: Duration) -> Self {
        Self {
            max_retries,
            initial_backoff,
            max_backoff,
        }
    }

    /// Initial backoff may not exceed the cap
    pub fn validate(&self) -> Result<()> {
        if self.initial_backoff > self.max_backoff {
            return Err(Error::config(format!(
                "initial_backoff ({:?}) exceeds max_backoff ({:?})",
                self.initial_backoff, self.max_backoff
            )));
        }
        Ok(())
    }

    /// Fresh backoff state for one retry sequence
    pub fn backoff(&self) -> Backoff {
        Backoff {
            current: self.initial_backoff,
            max: self.max_backoff,
        }
    }
}

/// Deterministic exponential backoff: `min(current * 2, max)`, no jitter
#[derive(Debug, Clone)]
pub struct Backoff {
    current: Duration,
    max: Duration,
}

impl Backoff {
    /// Delay to use for the next wait
    pub fn current(&self) -> Duration {
        self.current
    }

    /// Return the current delay and double it for next time
    pub fn advance(&mut self) -> Duration {
        let delay = self.current;
        self.current = self.current.saturating_mul(2).min(self.max);
        delay
    }
}

impl Iterator for Backoff {
    type Item = Duration;

    fn next(&mut self) -> Option<Duration> {
        Some(self.advance())
    }
}

/// Repeats transport attempts under a [`RetryPolicy`]
pub struct RetryController {
    transport: Arc<dyn Transport>,
    rate_limiter: Arc<RateLimiter>,
    policy: RetryPolicy,
}

impl RetryController {
    /// Create a new retry controller
    pub fn new(
        transport: Arc<dyn Transport>,
        rate_limiter: Arc<RateLimiter>,
        policy: RetryPolicy,
    ) -> Self {
        Self {
            transport,
            rate_limiter,
            policy,
        }
    }

    /// The active policy
    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Run the request until it succeeds, fails fatally, or attempts run out
    pub async fn execute_with_retry(&self, endpoint: &str, params: &QueryParams) -> Result<Value> {
        let waited = self.rate_limiter.block_until_admitted().await;
        if !waited.is_zero() {
            debug!("Rate limited: waited {:?}", waited);
        }

        let mut backoff = self.policy.backoff();
        let mut last_error: Option<Error> = None;
        let mut retry_count = 0;

        while retry_count <= self.policy.max_retries {
            if retry_count > 0 {
                info!(
                    "Retry attempt {}/{}",
                    retry_count, self.policy.max_retries
                );
            }

            let err = match self.transport.execute(endpoint, params).await {
                Ok(payload) => return Ok(payload),
                Err(e) => e,
            };

            if !err.is_retryable() {
                error!("Not retrying: {err}");
                return Err(err);
            }

            let delay = match err.retry_after() {
                Some(server_delay) => {
                    warn!(
                        "Rate limited by API. Waiting {:?} as requested by the server",
                        server_delay
                    );
                    server_delay
                }
                None => {
                    let delay = backoff.advance();
                    warn!("{err}. Retrying in {:?}", delay);
                    delay
                }
            };

            tokio::time::sleep(delay).await;
            retry_count += 1;
            last_error = Some(err);
        }

        error!(
            "Request failed after {} retries",
            self.policy.max_retries
        );
        Err(last_error.unwrap_or_else(|| Error::api("Request failed after maximum retries")))
    }
}

impl std::fmt::Debug for RetryController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetryController")
            .field("policy", &self.policy)
            .field("rate_limiter", &self.rate_limiter)
            .finish_non_exhaustive()
    }
}
