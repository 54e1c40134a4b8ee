//! Tests for the HTTP pipeline

use super::transport::classify_status;
use super::*;
use crate::auth::{Authenticator, CredentialPattern};
use crate::error::{Error, ErrorKind, Result};
use async_trait::async_trait;
use pretty_assertions::assert_eq;
use reqwest::header::HeaderMap;
use reqwest::StatusCode;
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const API_KEY: &str = "test-api-key-0123456789";

// ============================================================================
// Scripted transport
// ============================================================================

/// Replays a script of outcomes; the last entry repeats forever
struct ScriptedTransport {
    script: Mutex<VecDeque<Result<Value>>>,
    calls: AtomicUsize,
}

impl ScriptedTransport {
    fn new(script: Vec<Result<Value>>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.into()),
            calls: AtomicUsize::new(0),
        })
    }

    fn always(outcome: Result<Value>) -> Arc<Self> {
        Self::new(vec![outcome])
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn execute(&self, _endpoint: &str, _params: &QueryParams) -> Result<Value> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut script = self.script.lock().unwrap();
        if script.len() > 1 {
            script.pop_front().unwrap()
        } else {
            script.front().cloned().unwrap()
        }
    }
}

fn server_error() -> Error {
    Error::Server {
        message: "Server error with status code 503".to_string(),
        status_code: Some(503),
        response_data: None,
    }
}

fn rate_limited(retry_after: Option<Duration>) -> Error {
    Error::RateLimitExceeded {
        message: "Rate limit exceeded".to_string(),
        status_code: Some(429),
        response_data: None,
        retry_after,
    }
}

fn controller(transport: Arc<ScriptedTransport>, max_retries: u32) -> RetryController {
    let limiter = Arc::new(RateLimiter::new(&RateLimiterConfig::default()).unwrap());
    RetryController::new(
        transport,
        limiter,
        RetryPolicy::new(max_retries, Duration::from_secs(1), Duration::from_secs(60)),
    )
}

/// Paused-clock timers resolve at millisecond granularity
fn assert_elapsed(start: Instant, secs: u64) {
    let elapsed = start.elapsed();
    let expected = Duration::from_secs(secs);
    assert!(
        elapsed >= expected && elapsed < expected + Duration::from_millis(50),
        "expected ~{expected:?}, got {elapsed:?}"
    );
}

// ============================================================================
// Backoff
// ============================================================================

#[test]
fn test_backoff_doubles_and_caps() {
    let policy = RetryPolicy::new(10, Duration::from_secs(1), Duration::from_secs(60));
    let delays: Vec<u64> = policy.backoff().take(9).map(|d| d.as_secs()).collect();
    assert_eq!(delays, vec![1, 2, 4, 8, 16, 32, 60, 60, 60]);
}

#[test]
fn test_backoff_never_decreases() {
    let policy = RetryPolicy::new(10, Duration::from_millis(300), Duration::from_secs(5));
    let delays: Vec<Duration> = policy.backoff().take(20).collect();
    for pair in delays.windows(2) {
        assert!(pair[0] <= pair[1]);
        assert!(pair[1] <= Duration::from_secs(5));
    }
}

#[test]
fn test_retry_policy_validate() {
    assert!(RetryPolicy::default().validate().is_ok());
    let bad = RetryPolicy::new(3, Duration::from_secs(10), Duration::from_secs(1));
    assert!(matches!(bad.validate(), Err(Error::Config { .. })));
}

// ============================================================================
// Retry controller
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_success_first_attempt() {
    let transport = ScriptedTransport::always(Ok(json!({"results": []})));
    let retry = controller(transport.clone(), 3);

    let payload = retry.execute_with_retry("/search", &vec![]).await.unwrap();
    assert_eq!(payload, json!({"results": []}));
    assert_eq!(transport.calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_authentication_failure_not_retried() {
    let err = Error::Authentication {
        message: "bad key".to_string(),
        status_code: Some(401),
        response_data: Some(json!({"error": "invalid_api_key"})),
    };
    let transport = ScriptedTransport::always(Err(err.clone()));
    let retry = controller(transport.clone(), 3);

    let result = retry.execute_with_retry("/search", &vec![]).await;
    assert_eq!(result.unwrap_err(), err);
    assert_eq!(transport.calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_invalid_request_not_retried() {
    let transport = ScriptedTransport::always(Err(Error::InvalidRequest {
        message: "bad params".to_string(),
        status_code: Some(400),
        response_data: None,
    }));
    let retry = controller(transport.clone(), 5);

    let err = retry.execute_with_retry("/search", &vec![]).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidRequest);
    assert_eq!(transport.calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_missing_credential_not_retried() {
    let transport = ScriptedTransport::always(Err(Error::missing_credential("none")));
    let retry = controller(transport.clone(), 3);

    let err = retry.execute_with_retry("/search", &vec![]).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MissingCredential);
    assert_eq!(transport.calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_server_failure_exhausts_retries() {
    let transport = ScriptedTransport::always(Err(server_error()));
    let retry = controller(transport.clone(), 3);

    let start = Instant::now();
    let err = retry.execute_with_retry("/search", &vec![]).await.unwrap_err();

    assert_eq!(transport.calls(), 4);
    assert_eq!(err, server_error());
    // 1 + 2 + 4 between the four attempts, then 8 after the last
    assert_elapsed(start, 15);
}

#[tokio::test(start_paused = true)]
async fn test_zero_retries_means_single_attempt() {
    let transport = ScriptedTransport::always(Err(Error::api("connection refused")));
    let retry = controller(transport.clone(), 0);

    let start = Instant::now();
    let err = retry.execute_with_retry("/search", &vec![]).await.unwrap_err();
    assert_eq!(transport.calls(), 1);
    assert_eq!(err, Error::api("connection refused"));
    // The single failure still waits out its backoff
    assert_elapsed(start, 1);
}

#[tokio::test(start_paused = true)]
async fn test_recovers_after_transient_failures() {
    let transport = ScriptedTransport::new(vec![
        Err(Error::api("Request timed out after 30s")),
        Err(server_error()),
        Ok(json!({"results": [], "total_results": 0})),
    ]);
    let retry = controller(transport.clone(), 3);

    let start = Instant::now();
    let payload = retry.execute_with_retry("/search", &vec![]).await.unwrap();

    assert_eq!(payload["total_results"], 0);
    assert_eq!(transport.calls(), 3);
    assert_elapsed(start, 3);
}

#[tokio::test(start_paused = true)]
async fn test_server_retry_after_bypasses_backoff() {
    let transport = ScriptedTransport::new(vec![
        Err(rate_limited(Some(Duration::from_secs(5)))),
        Err(server_error()),
        Err(server_error()),
        Ok(json!({"results": []})),
    ]);
    let retry = controller(transport.clone(), 3);

    let start = Instant::now();
    retry.execute_with_retry("/search", &vec![]).await.unwrap();

    // 5 (server hint, backoff untouched) + 1 + 2
    assert_elapsed(start, 8);
    assert_eq!(transport.calls(), 4);
}

#[tokio::test(start_paused = true)]
async fn test_rate_limit_without_hint_uses_backoff() {
    let transport = ScriptedTransport::always(Err(rate_limited(None)));
    let retry = controller(transport.clone(), 2);

    let start = Instant::now();
    let err = retry.execute_with_retry("/search", &vec![]).await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::RateLimitExceeded);
    assert_eq!(transport.calls(), 3);
    assert_elapsed(start, 7);
}

#[tokio::test(start_paused = true)]
async fn test_admission_checked_once_per_call() {
    let limiter = Arc::new(
        RateLimiter::new(&RateLimiterConfig::new(5, Duration::from_secs(3600))).unwrap(),
    );
    let transport = ScriptedTransport::always(Err(server_error()));
    let retry = RetryController::new(
        transport.clone(),
        limiter.clone(),
        RetryPolicy::new(3, Duration::from_millis(10), Duration::from_millis(10)),
    );

    let _ = retry.execute_with_retry("/search", &vec![]).await;
    assert_eq!(transport.calls(), 4);
    assert_eq!(limiter.available(), 4);
}

// ============================================================================
// Status classification
// ============================================================================

#[test]
fn test_classify_status_codes() {
    let headers = HeaderMap::new();
    let body = br#"{"error": "nope"}"#;

    let cases = [
        (401, ErrorKind::AuthenticationFailure),
        (400, ErrorKind::InvalidRequest),
        (429, ErrorKind::RateLimitExceeded),
        (500, ErrorKind::ServerFailure),
        (502, ErrorKind::ServerFailure),
        (599, ErrorKind::ServerFailure),
        (404, ErrorKind::ApiFailure),
        (403, ErrorKind::ApiFailure),
        (302, ErrorKind::ApiFailure),
        (201, ErrorKind::ApiFailure),
    ];

    for (code, kind) in cases {
        let err = classify_status(StatusCode::from_u16(code).unwrap(), &headers, body);
        assert_eq!(err.kind(), kind, "status {code}");
        assert_eq!(err.status_code(), Some(code));
        assert_eq!(err.response_data(), Some(&json!({"error": "nope"})));
    }
}

#[test]
fn test_classify_empty_or_non_json_body() {
    let headers = HeaderMap::new();
    let err = classify_status(StatusCode::INTERNAL_SERVER_ERROR, &headers, b"");
    assert_eq!(err.response_data(), None);

    let err = classify_status(StatusCode::BAD_GATEWAY, &headers, b"<html>bad gateway</html>");
    assert_eq!(err.kind(), ErrorKind::ServerFailure);
    assert_eq!(err.response_data(), None);
}

#[test]
fn test_classify_retry_after_sources() {
    let mut headers = HeaderMap::new();
    headers.insert("retry-after", "7".parse().unwrap());

    // Body wins over header
    let err = classify_status(
        StatusCode::TOO_MANY_REQUESTS,
        &headers,
        br#"{"retry_after": 2.5}"#,
    );
    assert_eq!(err.retry_after(), Some(Duration::from_millis(2500)));

    // Numeric strings are accepted
    let err = classify_status(
        StatusCode::TOO_MANY_REQUESTS,
        &HeaderMap::new(),
        br#"{"retry_after": "3"}"#,
    );
    assert_eq!(err.retry_after(), Some(Duration::from_secs(3)));

    // Header fallback
    let err = classify_status(StatusCode::TOO_MANY_REQUESTS, &headers, b"{}");
    assert_eq!(err.retry_after(), Some(Duration::from_secs(7)));

    // Zero means no hint
    let err = classify_status(
        StatusCode::TOO_MANY_REQUESTS,
        &HeaderMap::new(),
        br#"{"retry_after": 0}"#,
    );
    assert_eq!(err.retry_after(), None);
}

// ============================================================================
// HTTP transport
// ============================================================================

fn transport() -> HttpTransport {
    let auth = Authenticator::from_api_key(API_KEY, CredentialPattern::Flexible).unwrap();
    HttpTransport::new(Some(auth), Duration::from_secs(5)).unwrap()
}

#[tokio::test]
async fn test_transport_sends_auth_and_params() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/search"))
        .and(header("Authorization", format!("Bearer {API_KEY}").as_str()))
        .and(header("Accept", "application/json"))
        .and(query_param("query", "rust"))
        .and(query_param("num_results", "5"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": [{"title": "Rust", "url": "https://rust-lang.org/", "snippet": "", "position": 1}]
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let params = vec![
        ("query".to_string(), "rust".to_string()),
        ("num_results".to_string(), "5".to_string()),
    ];
    let payload = transport()
        .execute(&format!("{}/v1/search", mock_server.uri()), &params)
        .await
        .unwrap();

    assert_eq!(payload["results"][0]["title"], "Rust");
}

#[tokio::test]
async fn test_transport_invalid_json_is_malformed() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&mock_server)
        .await;

    let err = transport()
        .execute(&format!("{}/search", mock_server.uri()), &vec![])
        .await
        .unwrap_err();
    assert!(matches!(err, Error::MalformedResponse { .. }));
    assert_eq!(err.kind(), ErrorKind::ApiFailure);
}

#[tokio::test]
async fn test_transport_401_carries_body() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({"error": "invalid_api_key"})),
        )
        .mount(&mock_server)
        .await;

    let err = transport()
        .execute(&format!("{}/search", mock_server.uri()), &vec![])
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::AuthenticationFailure);
    assert_eq!(err.status_code(), Some(401));
    assert_eq!(err.response_data(), Some(&json!({"error": "invalid_api_key"})));
}

#[tokio::test]
async fn test_transport_timeout() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(2)))
        .mount(&mock_server)
        .await;

    let auth = Authenticator::from_api_key(API_KEY, CredentialPattern::Flexible).unwrap();
    let transport = HttpTransport::new(Some(auth), Duration::from_millis(100)).unwrap();
    let err = transport
        .execute(&format!("{}/slow", mock_server.uri()), &vec![])
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Api { .. }));
    assert!(err.message().contains("timed out"));
}

#[tokio::test]
async fn test_transport_connection_failure() {
    // Nothing listens on port 9 locally
    let err = transport()
        .execute("http://127.0.0.1:9/search", &vec![])
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ApiFailure);
    assert!(err.is_retryable());
}

#[tokio::test]
async fn test_transport_without_credential() {
    let transport = HttpTransport::new(None, Duration::from_secs(5)).unwrap();
    assert!(!transport.has_authenticator());

    let err = transport
        .execute("http://127.0.0.1:9/search", &vec![])
        .await
        .unwrap_err();
    assert!(matches!(err, Error::MissingCredential { .. }));
}
