// Allow common clippy pedantic lints that aren't critical for this codebase
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::unused_self)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::needless_pass_by_value)]

//! # Z.AI Search Client
//!
//! An async client for the Z.AI web search API.
//!
//! ## Features
//!
//! - **Credential handling**: API key from argument, config or `ZAI_API_KEY`,
//!   validated against a format pattern and never logged
//! - **Client-side rate limiting**: Token bucket shared by every call
//! - **Retries**: Exponential backoff, honoring server `retry_after` hints
//! - **Typed responses**: Raw payloads normalized into [`SearchResponse`]
//! - **YAML config**: Profiles and `${VAR}` placeholders
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use zai_search::{ClientConfig, SearchClient, SearchOptions, Result};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let client = SearchClient::new(ClientConfig::default())?;
//!
//!     let response = client.search("rust async runtimes", SearchOptions::default()).await?;
//!     for result in &response.results {
//!         println!("{}. {} ({})", result.position, result.title, result.domain);
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                        SearchClient                          │
//! │  search(query, options) → SearchResponse                     │
//! └──────────────────────────────────────────────────────────────┘
//!                               │
//! ┌────────────┬────────────────┴─────┬─────────────┬───────────┐
//! │  Request   │     Rate Limit       │    Retry    │ Transform │
//! ├────────────┼──────────────────────┼─────────────┼───────────┤
//! │ Validation │ Token bucket         │ Backoff     │ Domain    │
//! │ Defaults   │ Blocking admission   │ retry_after │ Defaults  │
//! └────────────┴──────────────────────┴──────┬──────┴───────────┘
//!                                            │
//!                               Transport (Bearer auth, reqwest)
//! ```

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]

// ============================================================================
// Module declarations
// ============================================================================

/// Error types for the client
pub mod error;

/// API key validation and request headers
pub mod auth;

/// Transport, retry and rate limiting
pub mod http;

/// Search models, transformer and client
pub mod search;

/// Client configuration
pub mod config;

/// YAML config loader
pub mod loader;

/// Environment placeholder interpolation
pub mod template;

/// Command-line interface
pub mod cli;

#[cfg(test)]
mod test_support;

// ============================================================================
// Re-exports
// ============================================================================

pub use config::ClientConfig;
pub use error::{Error, ErrorKind, Result};
pub use search::{
    BatchItem, BatchOutcome, BatchSummary, SafeSearch, SearchClient, SearchOptions,
    SearchRequest, SearchResponse, SearchResult, SearchType,
};

pub use loader::{load_config, load_config_from_str};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
