//! YAML document types
//!
//! Every field is optional; anything left out keeps the
//! [`crate::ClientConfig`] default.

use crate::auth::CredentialPattern;
use crate::search::{SafeSearch, SearchType};
use serde::{Deserialize, Serialize};

/// Top-level YAML document (after profile merging)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfigDocument {
    pub api: ApiSection,
    pub retry: RetrySection,
    pub rate_limit: RateLimitSection,
    pub search_defaults: SearchDefaultsSection,
}

/// `api:` section
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiSection {
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    /// Seconds
    pub timeout: Option<u64>,
    pub max_retries: Option<u32>,
    pub credential_pattern: Option<CredentialPattern>,
}

/// `retry:` section
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrySection {
    /// Seconds
    pub initial_backoff: Option<f64>,
    /// Seconds
    pub max_backoff: Option<f64>,
}

/// `rate_limit:` section
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitSection {
    pub requests: Option<u32>,
    /// Seconds
    pub window: Option<u64>,
}

/// `search_defaults:` section
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchDefaultsSection {
    pub num_results: Option<u32>,
    pub search_type: Option<SearchType>,
    pub language: Option<String>,
    pub region: Option<String>,
    pub safe_search: Option<SafeSearch>,
}
