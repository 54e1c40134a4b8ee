//! Batch search
//!
//! Runs many requests through one client with bounded concurrency. All of
//! them draw from the client's single rate limiter, and one failure never
//! aborts the rest.

use super::client::SearchClient;
use super::types::{SearchRequest, SearchResponse};
use crate::error::Result;
use futures::stream::{self, StreamExt};
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

/// One request in a batch
#[derive(Debug, Clone)]
pub struct BatchItem {
    pub id: String,
    pub request: SearchRequest,
}

impl BatchItem {
    pub fn new(id: impl Into<String>, request: SearchRequest) -> Self {
        Self {
            id: id.into(),
            request,
        }
    }
}

/// Result of one batch item
#[derive(Debug, Clone)]
pub struct BatchOutcome {
    pub id: String,
    pub result: Result<SearchResponse>,
    /// Wall time including rate-limit waits and retries
    pub elapsed: Duration,
}

impl BatchOutcome {
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}

/// Aggregate counts over a finished batch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    /// Sum of returned results over successful items
    pub results: usize,
}

impl BatchSummary {
    pub fn from_outcomes(outcomes: &[BatchOutcome]) -> Self {
        outcomes.iter().fold(Self::default(), |mut summary, outcome| {
            summary.total += 1;
            match &outcome.result {
                Ok(response) => {
                    summary.succeeded += 1;
                    summary.results += response.results.len();
                }
                Err(_) => summary.failed += 1,
            }
            summary
        })
    }
}

impl SearchClient {
    /// Run `items` with at most `max_concurrency` in flight
    ///
    /// Outcomes come back in input order. A concurrency of 0 is treated as 1.
    pub async fn search_batch(
        &self,
        items: Vec<BatchItem>,
        max_concurrency: usize,
    ) -> Vec<BatchOutcome> {
        let limit = max_concurrency.max(1);
        debug!("Running batch of {} with concurrency {}", items.len(), limit);

        let mut outcomes: Vec<(usize, BatchOutcome)> = stream::iter(items.into_iter().enumerate())
            .map(|(index, item)| async move {
                let start = Instant::now();
                let result = self.search_with_request(&item.request).await;
                let outcome = BatchOutcome {
                    id: item.id,
                    result,
                    elapsed: start.elapsed(),
                };
                (index, outcome)
            })
            .buffer_unordered(limit)
            .collect()
            .await;

        outcomes.sort_by_key(|(index, _)| *index);
        outcomes.into_iter().map(|(_, outcome)| outcome).collect()
    }
}
