//! Bedrock `InvokeModel` transport for Titan-style text embedding models.

use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use serde::{Deserialize, Serialize};

use super::{CallError, EmbedTransport};

const ERROR_TYPE_HEADER: &str = "x-amzn-errortype";

/// Blocking client for `POST {endpoint}/model/{model_id}/invoke`.
///
/// Request signing is left to the network path (a signing proxy or a bearer
/// API key); this type only speaks the wire format and classifies failures.
#[derive(Clone)]
pub struct BedrockTransport {
    client: Client,
    url: String,
    id: String,
}

impl BedrockTransport {
    pub fn new(endpoint: &str, model_id: &str, api_key: Option<&str>, timeout: Duration) -> Result<Self> {
        anyhow::ensure!(!model_id.trim().is_empty(), "missing embedding model id");
        anyhow::ensure!(
            endpoint.starts_with("http://") || endpoint.starts_with("https://"),
            "embedding endpoint must be an http(s) URL: {endpoint}"
        );
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        if let Some(key) = api_key {
            let auth = format!("Bearer {}", key.trim());
            headers.insert(AUTHORIZATION, HeaderValue::from_str(&auth).context("invalid embedding API key")?);
        }
        let client = Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()
            .context("failed to build embedding HTTP client")?;
        Ok(Self {
            client,
            url: format!("{}/model/{}/invoke", endpoint.trim_end_matches('/'), model_id),
            id: format!("bedrock:{model_id}"),
        })
    }
}

impl EmbedTransport for BedrockTransport {
    fn embedder_id(&self) -> &str {
        &self.id
    }

    fn embed(&self, text: &str) -> std::result::Result<Vec<f32>, CallError> {
        let response = self
            .client
            .post(&self.url)
            .json(&InvokeRequest { input_text: text })
            .send()
            .map_err(classify_transport_error)?;

        let status = response.status();
        if status.is_success() {
            let parsed: InvokeResponse = response
                .json()
                .map_err(|e| CallError::Fatal(format!("malformed embedding response: {e}")))?;
            return Ok(parsed.embedding);
        }
        let error_type = response
            .headers()
            .get(ERROR_TYPE_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = response.text().unwrap_or_else(|_| "<body unavailable>".to_string());
        Err(classify_response(status.as_u16(), error_type.as_deref(), &body))
    }
}

/// Map a non-success response onto a retry class using the status code and
/// the service's structured error type (`Code[:details]`).
pub fn classify_response(status: u16, error_type: Option<&str>, body: &str) -> CallError {
    let code = error_type.map(|t| t.split(':').next().unwrap_or(t).trim());
    let detail = format!("{status} {}: {body}", code.unwrap_or("-"));
    match (status, code) {
        (_, Some("ThrottlingException")) | (429, _) => CallError::Throttled(detail),
        (_, Some("ServiceUnavailableException")) | (503, _) => CallError::Unavailable(detail),
        _ => CallError::Fatal(detail),
    }
}

fn classify_transport_error(err: reqwest::Error) -> CallError {
    if err.is_timeout() || err.is_connect() {
        CallError::Unavailable(err.to_string())
    } else {
        CallError::Fatal(err.to_string())
    }
}

#[derive(Serialize)]
struct InvokeRequest<'a> {
    #[serde(rename = "inputText")]
    input_text: &'a str,
}

#[derive(Debug, Deserialize)]
struct InvokeResponse {
    embedding: Vec<f32>,
}
