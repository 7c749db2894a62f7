//! Index-level calls against the search collection, with failures classified
//! from the HTTP status rather than from error text.

use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::StatusCode;
use serde_json::Value;
use thiserror::Error;

pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ApiError {
    /// 401/403: the caller's principal is not allowed by the access policy.
    #[error("forbidden ({status}): {message}")]
    Forbidden { status: u16, message: String },

    #[error("unavailable: {0}")]
    Unavailable(String),

    #[error("rejected ({status}): {message}")]
    Rejected { status: u16, message: String },
}

/// Classify a non-success status. Only 401 and 403 mean "forbidden".
pub fn classify_status(status: u16, message: impl Into<String>) -> ApiError {
    let message = message.into();
    match status {
        401 | 403 => ApiError::Forbidden { status, message },
        429 | 500..=599 => ApiError::Unavailable(format!("{status}: {message}")),
        _ => ApiError::Rejected { status, message },
    }
}

pub trait IndicesApi: Send + Sync {
    /// Existence probe. `Ok(false)` is a normal answer, not an error.
    fn exists(&self, index: &str) -> std::result::Result<bool, ApiError>;
    /// Create the index with the given body; returns the service's response.
    fn create(&self, index: &str, body: &Value) -> std::result::Result<Value, ApiError>;
}

/// Blocking HTTPS client for a collection endpoint.
pub struct HttpIndicesApi {
    client: Client,
    base_url: String,
}

impl HttpIndicesApi {
    /// `endpoint` may be a bare host or an `http(s)://` URL; requests always
    /// go over HTTPS on port 443.
    pub fn new(endpoint: &str, auth_token: Option<&str>, timeout: Duration) -> Result<Self> {
        let host = normalize_host(endpoint);
        anyhow::ensure!(!host.is_empty(), "collection endpoint is empty");
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if let Some(token) = auth_token {
            let auth = format!("Bearer {}", token.trim());
            headers.insert(AUTHORIZATION, HeaderValue::from_str(&auth).context("invalid search auth token")?);
        }
        let client = Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()
            .context("failed to build search HTTP client")?;
        Ok(Self { client, base_url: format!("https://{host}:443") })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn index_url(&self, index: &str) -> String {
        format!("{}/{}", self.base_url, index)
    }
}

/// Strip any scheme and trailing slashes from a collection endpoint.
pub fn normalize_host(endpoint: &str) -> String {
    let trimmed = endpoint.trim();
    let host = trimmed
        .strip_prefix("https://")
        .or_else(|| trimmed.strip_prefix("http://"))
        .unwrap_or(trimmed);
    host.trim_end_matches('/').to_string()
}

fn transport_error(err: reqwest::Error) -> ApiError {
    ApiError::Unavailable(err.to_string())
}

impl IndicesApi for HttpIndicesApi {
    fn exists(&self, index: &str) -> std::result::Result<bool, ApiError> {
        let response = self.client.head(self.index_url(index)).send().map_err(transport_error)?;
        match response.status() {
            StatusCode::OK => Ok(true),
            StatusCode::NOT_FOUND => Ok(false),
            status => Err(classify_status(status.as_u16(), status.canonical_reason().unwrap_or(""))),
        }
    }

    fn create(&self, index: &str, body: &Value) -> std::result::Result<Value, ApiError> {
        let response = self
            .client
            .put(self.index_url(index))
            .json(body)
            .send()
            .map_err(transport_error)?;
        let status = response.status();
        let text = response.text().unwrap_or_else(|_| "<body unavailable>".to_string());
        if !status.is_success() {
            return Err(classify_status(status.as_u16(), text));
        }
        Ok(serde_json::from_str(&text).unwrap_or(Value::String(text)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_auth_statuses_are_forbidden() {
        assert!(matches!(classify_status(403, "x"), ApiError::Forbidden { status: 403, .. }));
        assert!(matches!(classify_status(401, "x"), ApiError::Forbidden { status: 401, .. }));
        assert!(matches!(classify_status(503, "403 in the body"), ApiError::Unavailable(_)));
        assert!(matches!(classify_status(400, "Forbidden"), ApiError::Rejected { status: 400, .. }));
    }

    #[test]
    fn endpoint_scheme_is_stripped() {
        assert_eq!(normalize_host("https://abc.us-east-1.aoss.amazonaws.com/"), "abc.us-east-1.aoss.amazonaws.com");
        assert_eq!(normalize_host("http://localhost"), "localhost");
        assert_eq!(normalize_host("search.local"), "search.local");
    }

    #[test]
    fn client_targets_https_443() {
        let api = HttpIndicesApi::new("http://search.local", None, REQUEST_TIMEOUT).unwrap();
        assert_eq!(api.base_url(), "https://search.local:443");
        assert_eq!(api.index_url("docs"), "https://search.local:443/docs");
    }
}
