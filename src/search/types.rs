//! Search request and response models

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Largest page the upstream API serves
pub const MAX_RESULTS: u32 = 20;

/// Page size used when none is given
pub const DEFAULT_NUM_RESULTS: u32 = 10;

// ============================================================================
// Enums
// ============================================================================

/// Kind of search to run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchType {
    #[default]
    Web,
    News,
    Images,
}

impl SearchType {
    pub fn as_str(self) -> &'static str {
        match self {
            SearchType::Web => "web",
            SearchType::News => "news",
            SearchType::Images => "images",
        }
    }
}

impl fmt::Display for SearchType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SearchType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "web" => Ok(SearchType::Web),
            "news" => Ok(SearchType::News),
            "images" => Ok(SearchType::Images),
            other => Err(Error::invalid_request(format!(
                "search_type must be one of: web, news, images (got '{other}')"
            ))),
        }
    }
}

/// Safe search level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SafeSearch {
    #[default]
    Moderate,
    Strict,
    Off,
}

impl SafeSearch {
    pub fn as_str(self) -> &'static str {
        match self {
            SafeSearch::Moderate => "moderate",
            SafeSearch::Strict => "strict",
            SafeSearch::Off => "off",
        }
    }
}

impl fmt::Display for SafeSearch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SafeSearch {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "moderate" => Ok(SafeSearch::Moderate),
            "strict" => Ok(SafeSearch::Strict),
            "off" => Ok(SafeSearch::Off),
            other => Err(Error::invalid_request(format!(
                "safe_search must be one of: moderate, strict, off (got '{other}')"
            ))),
        }
    }
}

// ============================================================================
// Request
// ============================================================================

/// A validated search request
///
/// Only obtainable through [`SearchRequestBuilder::build`], so every value
/// that reaches the transport has passed validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchRequest {
    query: String,
    num_results: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    include_domains: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    exclude_domains: Option<Vec<String>>,
    search_type: SearchType,
    #[serde(skip_serializing_if = "Option::is_none")]
    language: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    region: Option<String>,
    safe_search: SafeSearch,
}

impl SearchRequest {
    /// Start building a request for `query`
    pub fn builder(query: impl Into<String>) -> SearchRequestBuilder {
        SearchRequestBuilder::new(query)
    }

    /// Build a request with default options
    pub fn new(query: impl Into<String>) -> Result<Self> {
        Self::builder(query).build()
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn num_results(&self) -> u32 {
        self.num_results
    }

    pub fn include_domains(&self) -> Option<&[String]> {
        self.include_domains.as_deref()
    }

    pub fn exclude_domains(&self) -> Option<&[String]> {
        self.exclude_domains.as_deref()
    }

    pub fn search_type(&self) -> SearchType {
        self.search_type
    }

    pub fn language(&self) -> Option<&str> {
        self.language.as_deref()
    }

    pub fn region(&self) -> Option<&str> {
        self.region.as_deref()
    }

    pub fn safe_search(&self) -> SafeSearch {
        self.safe_search
    }

    /// Query parameters for the upstream API
    ///
    /// Absent options are omitted; domain lists become repeated keys.
    pub fn to_query_params(&self) -> Vec<(String, String)> {
        let mut params = vec![
            ("query".to_string(), self.query.clone()),
            ("num_results".to_string(), self.num_results.to_string()),
        ];
        for domain in self.include_domains.iter().flatten() {
            params.push(("include_domains".to_string(), domain.clone()));
        }
        for domain in self.exclude_domains.iter().flatten() {
            params.push(("exclude_domains".to_string(), domain.clone()));
        }
        params.push(("search_type".to_string(), self.search_type.to_string()));
        if let Some(language) = &self.language {
            params.push(("language".to_string(), language.clone()));
        }
        if let Some(region) = &self.region {
            params.push(("region".to_string(), region.clone()));
        }
        params.push(("safe_search".to_string(), self.safe_search.to_string()));
        params
    }
}

/// Builder for [`SearchRequest`]
#[derive(Debug, Clone)]
pub struct SearchRequestBuilder {
    query: String,
    num_results: u32,
    include_domains: Option<Vec<String>>,
    exclude_domains: Option<Vec<String>>,
    search_type: SearchType,
    language: Option<String>,
    region: Option<String>,
    safe_search: SafeSearch,
}

impl SearchRequestBuilder {
    /// Create a builder with default options
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            num_results: DEFAULT_NUM_RESULTS,
            include_domains: None,
            exclude_domains: None,
            search_type: SearchType::default(),
            language: None,
            region: None,
            safe_search: SafeSearch::default(),
        }
    }

    #[must_use]
    pub fn num_results(mut self, num_results: u32) -> Self {
        self.num_results = num_results;
        self
    }

    #[must_use]
    pub fn include_domains<I, S>(mut self, domains: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.include_domains = Some(domains.into_iter().map(Into::into).collect());
        self
    }

    #[must_use]
    pub fn exclude_domains<I, S>(mut self, domains: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exclude_domains = Some(domains.into_iter().map(Into::into).collect());
        self
    }

    #[must_use]
    pub fn search_type(mut self, search_type: SearchType) -> Self {
        self.search_type = search_type;
        self
    }

    #[must_use]
    pub fn language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    #[must_use]
    pub fn region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    #[must_use]
    pub fn safe_search(mut self, safe_search: SafeSearch) -> Self {
        self.safe_search = safe_search;
        self
    }

    /// Apply any options that are set, leaving the rest untouched
    #[must_use]
    pub fn options(mut self, options: SearchOptions) -> Self {
        if let Some(n) = options.num_results {
            self.num_results = n;
        }
        if options.include_domains.is_some() {
            self.include_domains = options.include_domains;
        }
        if options.exclude_domains.is_some() {
            self.exclude_domains = options.exclude_domains;
        }
        if let Some(t) = options.search_type {
            self.search_type = t;
        }
        if options.language.is_some() {
            self.language = options.language;
        }
        if options.region.is_some() {
            self.region = options.region;
        }
        if let Some(s) = options.safe_search {
            self.safe_search = s;
        }
        self
    }

    /// Validate and build the request
    pub fn build(self) -> Result<SearchRequest> {
        if self.query.trim().is_empty() {
            return Err(Error::invalid_request("query must not be empty"));
        }
        if !(1..=MAX_RESULTS).contains(&self.num_results) {
            return Err(Error::invalid_request(format!(
                "num_results must be between 1 and {MAX_RESULTS} (got {})",
                self.num_results
            )));
        }
        if let Some(language) = &self.language {
            if language.chars().count() != 2 {
                return Err(Error::invalid_request(
                    "language must be an ISO 639-1 code (2 characters)",
                ));
            }
        }
        if let Some(region) = &self.region {
            if region.chars().count() != 2 {
                return Err(Error::invalid_request(
                    "region must be an ISO 3166-1 code (2 characters)",
                ));
            }
        }

        Ok(SearchRequest {
            query: self.query,
            num_results: self.num_results,
            include_domains: self.include_domains,
            exclude_domains: self.exclude_domains,
            search_type: self.search_type,
            language: self.language,
            region: self.region,
            safe_search: self.safe_search,
        })
    }
}

/// Optional per-call overrides for [`crate::SearchClient::search`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchOptions {
    pub num_results: Option<u32>,
    pub include_domains: Option<Vec<String>>,
    pub exclude_domains: Option<Vec<String>>,
    pub search_type: Option<SearchType>,
    pub language: Option<String>,
    pub region: Option<String>,
    pub safe_search: Option<SafeSearch>,
}

// ============================================================================
// Response
// ============================================================================

/// One ranked search hit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub title: String,
    pub url: String,
    pub snippet: String,
    /// 1-based rank
    pub position: u32,
    /// Authority component of `url`
    pub domain: String,
    pub published_date: Option<String>,
    pub thumbnail_url: Option<String>,
}

/// A complete, successful search
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResponse {
    pub query: String,
    pub search_type: SearchType,
    pub total_results: u64,
    /// In upstream relevance order
    pub results: Vec<SearchResult>,
    /// Upstream-reported search time in seconds
    pub search_time: f64,
    pub has_more: bool,
    pub next_page_token: Option<String>,
}
