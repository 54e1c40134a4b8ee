//! Web search
//!
//! Request/response models, the response transformer, and the client that
//! runs searches through the HTTP pipeline.

mod batch;
mod client;
mod transform;
mod types;

pub use batch::{BatchItem, BatchOutcome, BatchSummary};
pub use client::SearchClient;
pub use transform::{extract_domain, transform};
pub use types::{
    SafeSearch, SearchOptions, SearchRequest, SearchRequestBuilder, SearchResponse, SearchResult,
    SearchType, DEFAULT_NUM_RESULTS, MAX_RESULTS,
};
