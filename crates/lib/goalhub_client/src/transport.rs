//! Transport: sends a pipeline-prepared request over HTTP.

use std::sync::Arc;

use async_trait::async_trait;
use http::header::CONTENT_TYPE;
use reqwest::cookie::Jar;
use thiserror::Error;
use tracing::debug;

use crate::pipeline::{ApiRequest, ApiResponse, Body};

/// Transport failures (no response received, or unreadable body).
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Failed to build HTTP client: {0}")]
    Client(String),
}

/// Sends one request and returns the raw response.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn execute(&self, request: ApiRequest) -> Result<ApiResponse, TransportError>;
}

/// reqwest-backed transport.
///
/// Requests with `with_credentials` go through a client sharing the cookie
/// jar; the others through a client that neither sends nor stores cookies.
#[derive(Clone)]
pub struct ReqwestTransport {
    with_cookies: reqwest::Client,
    without_cookies: reqwest::Client,
    jar: Arc<Jar>,
}

impl ReqwestTransport {
    pub fn new() -> Result<Self, TransportError> {
        Self::with_jar(Arc::new(Jar::default()))
    }

    pub fn with_jar(jar: Arc<Jar>) -> Result<Self, TransportError> {
        let with_cookies = reqwest::Client::builder()
            .cookie_provider(jar.clone())
            .build()
            .map_err(|e| TransportError::Client(e.to_string()))?;
        let without_cookies = reqwest::Client::builder()
            .build()
            .map_err(|e| TransportError::Client(e.to_string()))?;
        Ok(Self {
            with_cookies,
            without_cookies,
            jar,
        })
    }

    /// Cookie jar shared with the credentialed client.
    pub fn jar(&self) -> Arc<Jar> {
        self.jar.clone()
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn execute(&self, request: ApiRequest) -> Result<ApiResponse, TransportError> {
        let client = if request.with_credentials {
            &self.with_cookies
        } else {
            &self.without_cookies
        };

        debug!(method = %request.method, url = %request.url, "sending request");
        let mut builder = client
            .request(request.method, request.url)
            .headers(request.headers);
        builder = match request.body {
            Body::Empty => builder,
            Body::Json(value) => builder.json(&value),
            Body::Text(text) => builder.body(text),
        };

        let response = builder.send().await?;
        let status = response.status();
        let headers = response.headers().clone();
        let is_json = headers
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.contains("json"));
        let bytes = response.bytes().await?;
        debug!(%status, len = bytes.len(), "response received");

        Ok(ApiResponse {
            status,
            headers,
            body: parse_body(&bytes, is_json),
        })
    }
}

/// Interpret a response body. Unparseable JSON falls back to text.
fn parse_body(bytes: &[u8], is_json: bool) -> Body {
    if bytes.is_empty() {
        return Body::Empty;
    }
    if is_json && let Ok(value) = serde_json::from_slice(bytes) {
        return Body::Json(value);
    }
    Body::Text(String::from_utf8_lossy(bytes).into_owned())
}
