//! Request/response pipeline around the transport.
//!
//! Stages form an ordered pipeline. `run_request` calls `on_request` in
//! order; `run_response` calls `on_response` in reverse order (onion model).
//! Stages never look at the response status: they apply to success and
//! failure responses alike.

pub mod bearer;
pub mod casing;
pub mod csrf;

use std::sync::Arc;

use http::{HeaderMap, Method, StatusCode};
use serde_json::Value;
use url::Url;

pub use bearer::BearerStage;
pub use casing::CaseConversionStage;
pub use csrf::CsrfStage;

/// Request or response body.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Body {
    #[default]
    Empty,
    Json(Value),
    Text(String),
}

impl Body {
    pub fn as_json(&self) -> Option<&Value> {
        match self {
            Body::Json(value) => Some(value),
            _ => None,
        }
    }
}

/// An outgoing request as seen by the pipeline.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
    pub body: Body,
    /// Send ambient cookie credentials with this request.
    pub with_credentials: bool,
}

impl ApiRequest {
    pub fn new(method: Method, url: Url) -> Self {
        Self {
            method,
            url,
            headers: HeaderMap::new(),
            body: Body::Empty,
            with_credentials: false,
        }
    }

    pub fn with_json(mut self, body: Value) -> Self {
        self.body = Body::Json(body);
        self
    }
}

/// An incoming response as seen by the pipeline.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Body,
}

/// Errors a stage can raise to abort a request.
#[derive(Debug, thiserror::Error)]
pub enum StageError {
    #[error("{stage}: {message}")]
    Rejected { stage: String, message: String },
}

/// A request/response transform.
pub trait RequestStage: Send + Sync {
    /// Transform the outgoing request. Return Err to abort it.
    fn on_request(&self, _request: &mut ApiRequest) -> Result<(), StageError> {
        Ok(())
    }

    /// Transform the incoming response.
    fn on_response(&self, _response: &mut ApiResponse) -> Result<(), StageError> {
        Ok(())
    }

    /// Stage identifier for debugging/logging.
    fn name(&self) -> &str;
}

/// Ordered pipeline of stages.
#[derive(Clone, Default)]
pub struct StagePipeline {
    stages: Vec<Arc<dyn RequestStage>>,
}

impl StagePipeline {
    /// Create a pipeline from an ordered list of stages (outermost first).
    pub fn new(stages: Vec<Arc<dyn RequestStage>>) -> Self {
        Self { stages }
    }

    /// Create an empty pipeline (no-op).
    pub fn empty() -> Self {
        Self::default()
    }

    /// Stage names, outermost first.
    pub fn names(&self) -> Vec<&str> {
        self.stages.iter().map(|s| s.name()).collect()
    }

    /// Run all `on_request` transforms in order. Short-circuits on error.
    pub fn run_request(&self, request: &mut ApiRequest) -> Result<(), StageError> {
        for stage in &self.stages {
            stage.on_request(request)?;
        }
        Ok(())
    }

    /// Run all `on_response` transforms in reverse order.
    pub fn run_response(&self, response: &mut ApiResponse) -> Result<(), StageError> {
        for stage in self.stages.iter().rev() {
            stage.on_response(response)?;
        }
        Ok(())
    }
}
