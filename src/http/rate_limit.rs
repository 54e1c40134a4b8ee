//! Client-side rate limiting
//!
//! A token bucket that refills continuously: `max_requests` tokens per
//! `time_window`, starting full. Every state transition happens under one
//! mutex; the wait in [`RateLimiter::block_until_admitted`] happens outside it.
//!
//! Hand-rolled rather than `governor`: callers read the token count, reset
//! the bucket and get a fixed nominal wait, none of which GCRA exposes.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

/// Configuration for rate limiting
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RateLimiterConfig {
    /// Bucket capacity (requests allowed per window)
    pub max_requests: u32,
    /// Window over which the bucket refills completely
    #[serde(with = "crate::config::duration_secs")]
    pub time_window: Duration,
}

impl Default for RateLimiterConfig {
    fn default() -> Self {
        Self {
            max_requests: 100,
            time_window: Duration::from_secs(60),
        }
    }
}

impl RateLimiterConfig {
    /// Create a new rate limiter config
    pub fn new(max_requests: u32, time_window: Duration) -> Self {
        Self {
            max_requests,
            time_window,
        }
    }

    /// Both capacity and window must be positive
    pub fn validate(&self) -> Result<()> {
        if self.max_requests == 0 {
            return Err(Error::config("rate limit max_requests must be positive"));
        }
        if self.time_window.is_zero() {
            return Err(Error::config("rate limit time_window must be positive"));
        }
        Ok(())
    }
}

#[derive(Debug)]
struct Bucket {
    tokens: f64,
    last_refill: Instant,
}

/// Token bucket rate limiter
pub struct RateLimiter {
    capacity: f64,
    window: Duration,
    bucket: Mutex<Bucket>,
}

impl RateLimiter {
    /// Create a new rate limiter with a full bucket
    pub fn new(config: &RateLimiterConfig) -> Result<Self> {
        config.validate()?;
        debug!(
            "RateLimiter initialized: {} requests per {:?}",
            config.max_requests, config.time_window
        );
        Ok(Self {
            capacity: f64::from(config.max_requests),
            window: config.time_window,
            bucket: Mutex::new(Bucket {
                tokens: f64::from(config.max_requests),
                last_refill: Instant::now(),
            }),
        })
    }

    /// Bucket capacity
    pub fn capacity(&self) -> u32 {
        self.capacity as u32
    }

    /// Refill window
    pub fn window(&self) -> Duration {
        self.window
    }

    /// Lock the bucket and bring it up to date
    fn refilled(&self) -> MutexGuard<'_, Bucket> {
        // A panic while holding the lock cannot leave the bucket torn: every
        // write is a single field assignment.
        let mut bucket = self.bucket.lock().unwrap_or_else(PoisonError::into_inner);
        let now = Instant::now();
        let elapsed = now.saturating_duration_since(bucket.last_refill);
        let added = elapsed.as_secs_f64() * self.capacity / self.window.as_secs_f64();
        bucket.tokens = (bucket.tokens + added).min(self.capacity);
        bucket.last_refill = now;
        bucket
    }

    /// Try to take one token without waiting
    pub fn try_admit(&self) -> bool {
        let mut bucket = self.refilled();
        if bucket.tokens >= 1.0 {
            bucket.tokens -= 1.0;
            debug!("Token acquired, {:.2} left", bucket.tokens);
            true
        } else {
            debug!("No tokens available");
            false
        }
    }

    /// Whole tokens currently available
    pub fn available(&self) -> u32 {
        self.refilled().tokens.floor() as u32
    }

    /// Zero if a token is available now, otherwise the nominal per-token
    /// interval (`window / capacity`), not a precise ETA
    pub fn time_until_next(&self) -> Duration {
        if self.refilled().tokens >= 1.0 {
            Duration::ZERO
        } else {
            self.nominal_interval()
        }
    }

    fn nominal_interval(&self) -> Duration {
        self.window.div_f64(self.capacity)
    }

    /// Take a token, waiting one nominal interval first if none is available.
    ///
    /// Best-effort: after the single wait a token is consumed only if one has
    /// accrued; this call does not loop. Returns the time spent waiting.
    pub async fn block_until_admitted(&self) -> Duration {
        let start = Instant::now();
        let wait = {
            let mut bucket = self.refilled();
            if bucket.tokens >= 1.0 {
                bucket.tokens -= 1.0;
                return Duration::ZERO;
            }
            self.nominal_interval()
        };

        tokio::time::sleep(wait).await;

        {
            let mut bucket = self.refilled();
            if bucket.tokens >= 1.0 {
                bucket.tokens -= 1.0;
            }
        }

        let waited = start.elapsed();
        debug!("Waited {:?} for rate limit", waited);
        waited
    }

    /// Refill the bucket to capacity immediately
    pub fn reset(&self) {
        let mut bucket = self.bucket.lock().unwrap_or_else(PoisonError::into_inner);
        bucket.tokens = self.capacity;
        bucket.last_refill = Instant::now();
        debug!("RateLimiter reset");
    }
}

impl std::fmt::Debug for RateLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimiter")
            .field("capacity", &self.capacity)
            .field("window", &self.window)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod rate_limit_tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn limiter(max_requests: u32, window_secs: u64) -> RateLimiter {
        RateLimiter::new(&RateLimiterConfig::new(
            max_requests,
            Duration::from_secs(window_secs),
        ))
        .unwrap()
    }

    #[test]
    fn test_rate_limiter_config_default() {
        let config = RateLimiterConfig::default();
        assert_eq!(config.max_requests, 100);
        assert_eq!(config.time_window, Duration::from_secs(60));
    }

    #[test]
    fn test_rate_limiter_rejects_zero() {
        assert!(RateLimiter::new(&RateLimiterConfig::new(0, Duration::from_secs(60))).is_err());
        assert!(RateLimiter::new(&RateLimiterConfig::new(10, Duration::ZERO)).is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_capacity_two_refills_after_half_window() {
        let limiter = limiter(2, 60);

        assert!(limiter.try_admit());
        assert!(limiter.try_admit());
        assert!(!limiter.try_admit());

        tokio::time::advance(Duration::from_secs(29)).await;
        assert!(!limiter.try_admit());

        tokio::time::advance(Duration::from_secs(2)).await;
        assert!(limiter.try_admit());
        assert!(!limiter.try_admit());
    }

    #[tokio::test(start_paused = true)]
    async fn test_refill_is_capped() {
        let limiter = limiter(5, 10);
        assert!(limiter.try_admit());

        tokio::time::advance(Duration::from_secs(3600)).await;
        assert_eq!(limiter.available(), 5);
    }

    #[tokio::test(start_paused = true)]
    async fn test_available_and_time_until_next() {
        let limiter = limiter(4, 60);
        assert_eq!(limiter.available(), 4);
        assert_eq!(limiter.time_until_next(), Duration::ZERO);

        for _ in 0..4 {
            assert!(limiter.try_admit());
        }
        assert_eq!(limiter.available(), 0);
        // Fixed nominal interval, regardless of fractional progress
        assert_eq!(limiter.time_until_next(), Duration::from_secs(15));

        tokio::time::advance(Duration::from_secs(10)).await;
        assert_eq!(limiter.time_until_next(), Duration::from_secs(15));
    }

    #[tokio::test(start_paused = true)]
    async fn test_block_until_admitted_immediate() {
        let limiter = limiter(3, 60);
        assert_eq!(limiter.block_until_admitted().await, Duration::ZERO);
        assert_eq!(limiter.available(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_block_until_admitted_waits_nominal_interval() {
        let limiter = limiter(2, 60);
        assert!(limiter.try_admit());
        assert!(limiter.try_admit());

        let waited = limiter.block_until_admitted().await;
        assert!(waited >= Duration::from_secs(30));
        // The token accrued during the wait was consumed
        assert_eq!(limiter.available(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reset() {
        let limiter = limiter(3, 60);
        while limiter.try_admit() {}
        assert_eq!(limiter.available(), 0);

        limiter.reset();
        assert_eq!(limiter.available(), 3);
    }

    #[test]
    fn test_concurrent_admission_never_exceeds_capacity() {
        // A long window keeps refill negligible for the duration of the test
        let limiter = Arc::new(limiter(100, 3600));
        let admitted = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let limiter = Arc::clone(&limiter);
                let admitted = Arc::clone(&admitted);
                std::thread::spawn(move || {
                    for _ in 0..25 {
                        if limiter.try_admit() {
                            admitted.fetch_add(1, Ordering::SeqCst);
                        }
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(admitted.load(Ordering::SeqCst), 100);
    }
}
