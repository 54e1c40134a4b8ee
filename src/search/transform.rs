//! Raw payload to typed response mapping
//!
//! Pure and deterministic. Result order is kept exactly as received.

use super::types::{SearchRequest, SearchResponse, SearchResult};
use crate::error::{Error, Result};
use serde_json::{Map, Value};

/// Third `/`-delimited segment of `url`, or empty if there is none
///
/// `https://example.com/path?q=1` yields `example.com`. So does
/// `https://example.com`, whose split is `["https:", "", "example.com"]`.
/// Anything with fewer than three segments (`example.com/path`, `https:`)
/// yields the empty string.
pub fn extract_domain(url: &str) -> String {
    url.split('/').nth(2).unwrap_or_default().to_string()
}

/// Map an upstream success payload onto a [`SearchResponse`]
///
/// Only the shape is strict: the payload and every result entry must be
/// mappings. Scalar fields are coerced leniently (`"3"`, `3.0` and `3` are
/// all the number 3) and anything unusable falls back to its default. A
/// missing `position` falls back to the entry's 1-based index.
pub fn transform(payload: &Value, request: &SearchRequest) -> Result<SearchResponse> {
    let Some(payload) = payload.as_object() else {
        return Err(Error::malformed("response body is not a JSON object"));
    };

    let entries: &[Value] = match payload.get("results") {
        None | Some(Value::Null) => &[],
        Some(Value::Array(entries)) => entries,
        Some(_) => return Err(Error::malformed("`results` is not a JSON array")),
    };

    let results = entries
        .iter()
        .enumerate()
        .map(|(index, entry)| {
            let entry = entry.as_object().ok_or_else(|| {
                Error::malformed(format!("result entry {index} is not a JSON object"))
            })?;
            Ok(to_result(entry, index))
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(SearchResponse {
        query: request.query().to_string(),
        search_type: request.search_type(),
        total_results: payload
            .get("total_results")
            .and_then(as_count)
            .unwrap_or(results.len() as u64),
        results,
        search_time: payload.get("search_time").and_then(as_float).unwrap_or(0.0),
        has_more: payload.get("has_more").and_then(as_flag).unwrap_or(false),
        next_page_token: payload.get("next_page_token").and_then(as_text),
    })
}

fn to_result(entry: &Map<String, Value>, index: usize) -> SearchResult {
    let text = |key: &str| entry.get(key).and_then(as_text);
    let url = text("url").unwrap_or_default();

    SearchResult {
        title: text("title").unwrap_or_default(),
        domain: extract_domain(&url),
        url,
        snippet: text("snippet").unwrap_or_default(),
        position: entry
            .get("position")
            .and_then(as_count)
            .and_then(|p| u32::try_from(p).ok())
            .unwrap_or(index as u32 + 1),
        published_date: text("published_date"),
        thumbnail_url: text("thumbnail_url"),
    }
}

/// Strings as-is, numbers and booleans in their JSON spelling
fn as_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Non-negative whole numbers, also from integral floats and numeric strings
fn as_count(value: &Value) -> Option<u64> {
    let n = as_float(value)?;
    (n >= 0.0 && n.fract() == 0.0 && n <= u64::MAX as f64).then(|| n as u64)
}

fn as_float(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
        _ => None,
    }
}

fn as_flag(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" => Some(true),
            "false" | "0" | "no" => Some(false),
            _ => None,
        },
        Value::Number(n) => n.as_f64().map(|n| n != 0.0),
        _ => None,
    }
}
