//! Search client
//!
//! Ties the pipeline together: validated request, rate-limited retry loop,
//! then the response transformer. One client owns one rate limiter; share
//! the client (e.g. behind an `Arc`) to share the limit.

use super::transform::transform;
use super::types::{SearchOptions, SearchRequest, SearchRequestBuilder, SearchResponse};
use crate::auth::Authenticator;
use crate::config::ClientConfig;
use crate::error::{Error, Result};
use crate::http::{HttpTransport, RateLimiter, RetryController, Transport};
use std::sync::Arc;
use tracing::{info, warn};

/// Client for the web search API
pub struct SearchClient {
    config: ClientConfig,
    endpoint: String,
    rate_limiter: Arc<RateLimiter>,
    retry: RetryController,
}

impl SearchClient {
    /// Create a client from a config
    ///
    /// The key comes from `config.api_key`, else `ZAI_API_KEY`. A malformed
    /// key is an error here; a missing one is not, but every search will
    /// then fail with [`Error::MissingCredential`].
    pub fn new(config: ClientConfig) -> Result<Self> {
        Self::build(None, config)
    }

    /// Create a client with an explicit key, which wins over any configured one
    pub fn with_api_key(api_key: impl AsRef<str>, config: ClientConfig) -> Result<Self> {
        Self::build(Some(api_key.as_ref()), config)
    }

    fn build(explicit_key: Option<&str>, config: ClientConfig) -> Result<Self> {
        config.validate()?;

        let authenticator = match Authenticator::resolve(
            explicit_key,
            config.api_key.as_deref(),
            config.credential_pattern,
        ) {
            Ok(auth) => Some(auth),
            Err(Error::MissingCredential { message }) => {
                warn!("No API credential configured: {message}");
                None
            }
            Err(e) => return Err(e),
        };

        let transport = HttpTransport::new(authenticator, config.timeout)?;
        Self::with_transport(config, Arc::new(transport))
    }

    /// Create a client over a custom transport
    pub fn with_transport(config: ClientConfig, transport: Arc<dyn Transport>) -> Result<Self> {
        config.validate()?;

        let rate_limiter = Arc::new(RateLimiter::new(&config.rate_limit)?);
        let retry = RetryController::new(transport, Arc::clone(&rate_limiter), config.retry);
        let endpoint = config.search_endpoint();

        Ok(Self {
            config,
            endpoint,
            rate_limiter,
            retry,
        })
    }

    /// The active configuration
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Full URL of the search endpoint
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// The limiter shared by every call through this client
    pub fn rate_limiter(&self) -> &Arc<RateLimiter> {
        &self.rate_limiter
    }

    /// A request builder seeded with the configured search defaults
    pub fn request(&self, query: impl Into<String>) -> SearchRequestBuilder {
        self.config.search_defaults.builder(query)
    }

    /// Search for `query`; unset options use the configured defaults
    pub async fn search(
        &self,
        query: impl Into<String>,
        options: SearchOptions,
    ) -> Result<SearchResponse> {
        let request = self.request(query).options(options).build()?;
        self.search_with_request(&request).await
    }

    /// Run a prepared request
    pub async fn search_with_request(&self, request: &SearchRequest) -> Result<SearchResponse> {
        info!("Searching for: {}", request.query());
        let params = request.to_query_params();
        let payload = self.retry.execute_with_retry(&self.endpoint, &params).await?;

        let response = transform(&payload, request)?;
        info!("Search completed with {} results", response.results.len());
        Ok(response)
    }
}

impl std::fmt::Debug for SearchClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchClient")
            .field("endpoint", &self.endpoint)
            .field("config", &self.config)
            .field("rate_limiter", &self.rate_limiter)
            .finish_non_exhaustive()
    }
}
