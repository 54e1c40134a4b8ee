//! Single-attempt transport
//!
//! Issues exactly one HTTP request and classifies the outcome:
//! - 200 parses to the raw JSON payload
//! - 401, 400, 429 and 5xx map to their dedicated error kinds
//! - anything else, timeouts and connection failures map to `Error::Api`
//!
//! No retry logic lives here.

use crate::auth::Authenticator;
use crate::error::{Error, Result};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, RETRY_AFTER};
use reqwest::{Client, StatusCode};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, error, warn};

/// Ordered query parameters; repeated keys are allowed
pub type QueryParams = Vec<(String, String)>;

/// One network attempt against the upstream API
#[async_trait]
pub trait Transport: Send + Sync {
    /// Perform a single request and return the parsed success body
    async fn execute(&self, endpoint: &str, params: &QueryParams) -> Result<Value>;
}

/// `reqwest`-backed transport
pub struct HttpTransport {
    client: Client,
    authenticator: Option<Authenticator>,
    timeout: Duration,
}

impl HttpTransport {
    /// Create a transport with the given per-request timeout
    pub fn new(authenticator: Option<Authenticator>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(format!("zai-search/{}", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            authenticator,
            timeout,
        })
    }

    /// Whether a validated credential is attached
    pub fn has_authenticator(&self) -> bool {
        self.authenticator.is_some()
    }

    fn classify_send_error(&self, e: &reqwest::Error) -> Error {
        if e.is_timeout() {
            error!("Request timed out after {:?}", self.timeout);
            Error::api(format!("Request timed out after {}s", self.timeout.as_secs_f64()))
        } else if e.is_connect() {
            error!("Failed to connect to the search API");
            Error::api("Failed to connect to the search API")
        } else {
            error!("Request failed: {e}");
            Error::api(format!("Request failed: {e}"))
        }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn execute(&self, endpoint: &str, params: &QueryParams) -> Result<Value> {
        let auth = self.authenticator.as_ref().ok_or_else(|| {
            Error::missing_credential("no authenticator available; provide a valid API key")
        })?;

        debug!("GET {} with {} params", endpoint, params.len());
        let req = auth.apply(self.client.get(endpoint).query(params))?;

        let response = req
            .send()
            .await
            .map_err(|e| self.classify_send_error(&e))?;

        let status = response.status();
        let headers = response.headers().clone();
        let body = response
            .bytes()
            .await
            .map_err(|e| self.classify_send_error(&e))?;

        if status == StatusCode::OK {
            let payload: Value = serde_json::from_slice(&body).map_err(|e| {
                error!("Failed to parse API response as JSON: {e}");
                Error::malformed(format!("Failed to parse API response as JSON: {e}"))
            })?;
            let count = payload
                .get("results")
                .and_then(Value::as_array)
                .map_or(0, Vec::len);
            debug!("Request successful with {} results", count);
            return Ok(payload);
        }

        Err(classify_status(status, &headers, &body))
    }
}

/// Map a non-200 response to its error kind
pub(crate) fn classify_status(status: StatusCode, headers: &HeaderMap, body: &[u8]) -> Error {
    let status_code = Some(status.as_u16());
    let response_data = parse_error_body(body);

    match status.as_u16() {
        401 => {
            error!("Authentication failed (401): {:?}", response_data);
            Error::Authentication {
                message: "Authentication failed. Please check your API key.".to_string(),
                status_code,
                response_data,
            }
        }
        429 => {
            warn!("Rate limit exceeded (429): {:?}", response_data);
            let retry_after = response_data
                .as_ref()
                .and_then(retry_after_from_body)
                .or_else(|| retry_after_from_headers(headers));
            Error::RateLimitExceeded {
                message: "Rate limit exceeded. Please try again later.".to_string(),
                status_code,
                response_data,
                retry_after,
            }
        }
        400 => {
            error!("Invalid request (400): {:?}", response_data);
            Error::InvalidRequest {
                message: "Invalid request. Please check your parameters.".to_string(),
                status_code,
                response_data,
            }
        }
        500..=599 => {
            error!("Server error ({}): {:?}", status.as_u16(), response_data);
            Error::Server {
                message: format!("Server error with status code {}", status.as_u16()),
                status_code,
                response_data,
            }
        }
        code => {
            error!("Unexpected status code ({code}): {:?}", response_data);
            Error::Api {
                message: format!("API request failed with status code {code}"),
                status_code,
                response_data,
            }
        }
    }
}

/// Error bodies are best-effort: empty or non-JSON bodies carry no data
fn parse_error_body(body: &[u8]) -> Option<Value> {
    if body.is_empty() {
        return None;
    }
    serde_json::from_slice(body).ok()
}

/// `retry_after` field of the error body, in seconds (number or numeric string)
fn retry_after_from_body(data: &Value) -> Option<Duration> {
    let value = data.get("retry_after")?;
    let secs = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    (secs.is_finite() && secs > 0.0).then(|| Duration::from_secs_f64(secs))
}

/// `Retry-After` header in delta-seconds form
fn retry_after_from_headers(headers: &HeaderMap) -> Option<Duration> {
    headers
        .get(RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.trim().parse::<u64>().ok())
        .filter(|secs| *secs > 0)
        .map(Duration::from_secs)
}
