//! Authenticator implementation
//!
//! Resolves the credential from the first source that supplies one and
//! applies the canonical headers to outgoing requests.

use super::credential::{Credential, CredentialPattern};
use crate::error::{Error, Result};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use reqwest::RequestBuilder;
use tracing::debug;

/// Environment variable consulted when no key is passed explicitly
pub const API_KEY_ENV: &str = "ZAI_API_KEY";

/// Authenticator handles applying authentication to HTTP requests
#[derive(Debug, Clone)]
pub struct Authenticator {
    credential: Credential,
}

impl Authenticator {
    /// Create an authenticator from an already-validated credential
    pub fn new(credential: Credential) -> Self {
        Self { credential }
    }

    /// Validate a key and build an authenticator from it
    pub fn from_api_key(api_key: &str, pattern: CredentialPattern) -> Result<Self> {
        Credential::new(api_key, pattern).map(Self::new)
    }

    /// Resolve the credential: explicit argument, then config value, then
    /// the `ZAI_API_KEY` environment variable.
    ///
    /// Empty strings count as absent.
    pub fn resolve(
        explicit: Option<&str>,
        configured: Option<&str>,
        pattern: CredentialPattern,
    ) -> Result<Self> {
        let from_env = std::env::var(API_KEY_ENV).ok();
        let secret = [explicit, configured, from_env.as_deref()]
            .into_iter()
            .flatten()
            .find(|s| !s.is_empty())
            .ok_or_else(|| {
                Error::missing_credential(format!(
                    "no API key supplied explicitly, in config, or via {API_KEY_ENV}"
                ))
            })?;

        let auth = Self::from_api_key(secret, pattern)?;
        debug!("Credential validated ({:?} pattern)", pattern);
        Ok(auth)
    }

    /// The validated credential
    pub fn credential(&self) -> &Credential {
        &self.credential
    }

    /// Canonical request headers
    pub fn headers(&self) -> Result<HeaderMap> {
        let mut bearer =
            HeaderValue::from_str(&format!("Bearer {}", self.credential.expose()))
                .map_err(|e| Error::invalid_credential(format!("not a valid header value: {e}")))?;
        bearer.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, bearer);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        Ok(headers)
    }

    /// Apply authentication to a request builder
    pub fn apply(&self, req: RequestBuilder) -> Result<RequestBuilder> {
        Ok(req.headers(self.headers()?))
    }
}
