//! HTTP request pipeline
//!
//! Provides the authenticated request path: admission control, a single
//! classified network attempt, and the retry loop tying the two together.
//!
//! # Features
//!
//! - **Rate Limiting**: Token bucket shared by every caller of a client
//! - **Transport**: One attempt, outcome classified by status code
//! - **Retries**: Exponential backoff honoring server retry-after hints

mod rate_limit;
mod retry;
mod transport;

pub use rate_limit::{RateLimiter, RateLimiterConfig};
pub use retry::{Backoff, RetryController, RetryPolicy};
pub use transport::{HttpTransport, QueryParams, Transport};

#[cfg(test)]
mod tests;
