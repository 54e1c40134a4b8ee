//! Client configuration
//!
//! [`ClientConfig`] collects everything a [`crate::SearchClient`] needs.
//! It can be built in code, read from `ZAI_*` environment variables, or
//! loaded from a YAML file (see [`crate::loader`]).

use crate::auth::CredentialPattern;
use crate::error::{Error, Result};
use crate::http::{RateLimiterConfig, RetryPolicy};
use crate::search::{SafeSearch, SearchRequestBuilder, SearchType, DEFAULT_NUM_RESULTS};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::path::Path;
use std::time::Duration;
use url::Url;

/// Default upstream API root
pub const DEFAULT_BASE_URL: &str = "https://api.z.ai/v1";

/// Prefix of every recognized environment variable
pub const ENV_PREFIX: &str = "ZAI_";

// ============================================================================
// Search Defaults
// ============================================================================

/// Defaults applied to requests created through the client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchDefaults {
    pub num_results: u32,
    pub search_type: SearchType,
    pub language: Option<String>,
    pub region: Option<String>,
    pub safe_search: SafeSearch,
}

impl Default for SearchDefaults {
    fn default() -> Self {
        Self {
            num_results: DEFAULT_NUM_RESULTS,
            search_type: SearchType::Web,
            language: None,
            region: None,
            safe_search: SafeSearch::Moderate,
        }
    }
}

impl SearchDefaults {
    /// A request builder seeded with these defaults
    pub fn builder(&self, query: impl Into<String>) -> SearchRequestBuilder {
        let mut builder = SearchRequestBuilder::new(query)
            .num_results(self.num_results)
            .search_type(self.search_type)
            .safe_search(self.safe_search);
        if let Some(language) = &self.language {
            builder = builder.language(language.clone());
        }
        if let Some(region) = &self.region {
            builder = builder.region(region.clone());
        }
        builder
    }
}

// ============================================================================
// Client Config
// ============================================================================

/// Configuration for the search client
#[derive(Clone, PartialEq)]
pub struct ClientConfig {
    /// API key; `None` falls back to `ZAI_API_KEY` at client construction
    pub api_key: Option<String>,
    /// API root, without the `/search` suffix
    pub base_url: String,
    /// Per-attempt request timeout
    pub timeout: Duration,
    /// Retry bounds and backoff
    pub retry: RetryPolicy,
    /// Client-side admission control
    pub rate_limit: RateLimiterConfig,
    /// Format the API key must match
    pub credential_pattern: CredentialPattern,
    /// Defaults for requests built by the client
    pub search_defaults: SearchDefaults,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(30),
            retry: RetryPolicy::default(),
            rate_limit: RateLimiterConfig::default(),
            credential_pattern: CredentialPattern::Flexible,
            search_defaults: SearchDefaults::default(),
        }
    }
}

impl ClientConfig {
    /// Create a new config builder
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder::default()
    }

    /// Maximum retries after the first attempt
    pub fn max_retries(&self) -> u32 {
        self.retry.max_retries
    }

    /// Full URL of the search endpoint
    pub fn search_endpoint(&self) -> String {
        format!("{}/search", self.base_url.trim_end_matches('/'))
    }

    /// Check every field that has a constraint
    pub fn validate(&self) -> Result<()> {
        if self.timeout.is_zero() {
            return Err(Error::config("timeout must be a positive number of seconds"));
        }
        let url = Url::parse(&self.base_url)
            .map_err(|e| Error::config(format!("invalid base_url '{}': {e}", self.base_url)))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(Error::config(format!(
                "base_url must use http or https, got '{}'",
                url.scheme()
            )));
        }
        self.retry.validate()?;
        self.rate_limit.validate()?;
        self.search_defaults.builder("defaults").build().map_err(|e| {
            Error::config(format!("invalid search_defaults: {}", e.message()))
        })?;
        Ok(())
    }

    /// Read `ZAI_API_KEY`, `ZAI_BASE_URL`, `ZAI_TIMEOUT` and
    /// `ZAI_MAX_RETRIES`.
    ///
    /// Keys supplied this way must use the strict `zai_` format.
    pub fn from_env() -> Result<Self> {
        let mut config = Self {
            credential_pattern: CredentialPattern::Prefixed,
            ..Self::default()
        };

        config.api_key = env_var("API_KEY").filter(|k| !k.is_empty());
        if let Some(base_url) = env_var("BASE_URL") {
            config.base_url = base_url;
        }
        if let Some(timeout) = env_var("TIMEOUT") {
            let secs: u64 = timeout
                .trim()
                .parse()
                .map_err(|_| Error::config(format!("{ENV_PREFIX}TIMEOUT must be an integer, got '{timeout}'")))?;
            config.timeout = Duration::from_secs(secs);
        }
        if let Some(retries) = env_var("MAX_RETRIES") {
            config.retry.max_retries = retries.trim().parse().map_err(|_| {
                Error::config(format!(
                    "{ENV_PREFIX}MAX_RETRIES must be a non-negative integer, got '{retries}'"
                ))
            })?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Load a `.env` file into the process environment, then [`Self::from_env`]
    pub fn from_env_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        dotenvy::from_path(path).map_err(|e| {
            Error::config(format!("failed to load env file '{}': {e}", path.display()))
        })?;
        Self::from_env()
    }

    /// JSON view of the config with the API key masked
    pub fn to_redacted_json(&self) -> Value {
        json!({
            "api_key": self.api_key.as_ref().map(|_| "***"),
            "base_url": self.base_url,
            "timeout": self.timeout.as_secs_f64(),
            "retry": self.retry,
            "rate_limit": self.rate_limit,
            "credential_pattern": self.credential_pattern,
            "search_defaults": self.search_defaults,
        })
    }
}

impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "***"))
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .field("retry", &self.retry)
            .field("rate_limit", &self.rate_limit)
            .field("credential_pattern", &self.credential_pattern)
            .field("search_defaults", &self.search_defaults)
            .finish()
    }
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(format!("{ENV_PREFIX}{name}")).ok()
}

/// Builder for client config
#[derive(Default)]
pub struct ClientConfigBuilder {
    config: ClientConfig,
}

impl ClientConfigBuilder {
    /// Set the API key
    pub fn api_key(mut self, api_key: impl Into<String>) -> Self {
        self.config.api_key = Some(api_key.into());
        self
    }

    /// Set the base URL
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.config.base_url = url.into();
        self
    }

    /// Set the request timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Set max retries
    pub fn max_retries(mut self, retries: u32) -> Self {
        self.config.retry.max_retries = retries;
        self
    }

    /// Set backoff bounds
    pub fn backoff(mut self, initial: Duration, max: Duration) -> Self {
        self.config.retry.initial_backoff = initial;
        self.config.retry.max_backoff = max;
        self
    }

    /// Set rate limiter
    pub fn rate_limit(mut self, config: RateLimiterConfig) -> Self {
        self.config.rate_limit = config;
        self
    }

    /// Set the accepted key format
    pub fn credential_pattern(mut self, pattern: CredentialPattern) -> Self {
        self.config.credential_pattern = pattern;
        self
    }

    /// Set request defaults
    pub fn search_defaults(mut self, defaults: SearchDefaults) -> Self {
        self.config.search_defaults = defaults;
        self
    }

    /// Build the config
    pub fn build(self) -> ClientConfig {
        self.config
    }
}

/// Serde adapter for durations expressed as (fractional) seconds
pub(crate) mod duration_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_f64(d.as_secs_f64())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(d)?;
        Duration::try_from_secs_f64(secs).map_err(serde::de::Error::custom)
    }
}
