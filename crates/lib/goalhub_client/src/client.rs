//! API client: runs requests through the stage pipeline and the transport.

use std::sync::Arc;

use goalhub_core::storage::TokenStorage;
use http::Method;
use serde_json::Value;
use tracing::{debug, warn};
use url::Url;

use crate::config::ClientConfig;
use crate::cookies::PersistedCsrfCookie;
use crate::error::{ClientError, ClientResult};
use crate::pipeline::{
    ApiRequest, ApiResponse, BearerStage, Body, CaseConversionStage, CsrfStage, RequestStage,
    StagePipeline,
};
use crate::transport::{ReqwestTransport, Transport};

/// Client for the backend REST API.
#[derive(Clone)]
pub struct ApiClient {
    base_url: Url,
    pipeline: StagePipeline,
    transport: Arc<dyn Transport>,
    csrf_cookie: Option<PersistedCsrfCookie>,
    csrf_path: String,
}

impl ApiClient {
    pub fn new(base_url: Url, pipeline: StagePipeline, transport: Arc<dyn Transport>) -> Self {
        Self {
            base_url,
            pipeline,
            transport,
            csrf_cookie: None,
            csrf_path: String::new(),
        }
    }

    /// Client with the standard pipeline: bearer → CSRF → key casing.
    ///
    /// The CSRF stage reads cookies from the transport's jar. The jar starts
    /// with the CSRF cookie persisted in `storage`, if any.
    pub fn standard(config: &ClientConfig, storage: Arc<dyn TokenStorage>) -> ClientResult<Self> {
        let transport = ReqwestTransport::new()?;
        let csrf = CsrfStage::with_names(transport.jar(), &config.csrf_cookie, &config.csrf_header)?;
        let csrf_cookie = PersistedCsrfCookie::new(
            transport.jar(),
            storage.clone(),
            config.api_url.clone(),
            &config.csrf_cookie,
        );
        if let Err(e) = csrf_cookie.restore() {
            warn!("could not restore CSRF cookie: {e}");
        }

        let stages: Vec<Arc<dyn RequestStage>> = vec![
            Arc::new(BearerStage::new(storage)),
            Arc::new(csrf),
            Arc::new(CaseConversionStage),
        ];
        let mut client = Self::new(
            config.api_url.clone(),
            StagePipeline::new(stages),
            Arc::new(transport),
        );
        client.csrf_cookie = Some(csrf_cookie);
        client.csrf_path = config.csrf_path.clone();
        Ok(client)
    }

    /// Make sure a CSRF cookie is held before a mutating call.
    ///
    /// When the jar has none, GETs the configured CSRF path so the backend
    /// can set one, and persists it. A non-2xx answer still counts as an
    /// attempt. Returns whether a cookie is now held; always `false` for
    /// clients built without a cookie jar.
    pub async fn ensure_csrf_cookie(&self) -> ClientResult<bool> {
        let Some(cookie) = &self.csrf_cookie else {
            return Ok(false);
        };
        if cookie.value().is_some() {
            return Ok(true);
        }

        match self.get(&self.csrf_path).await {
            Ok(_) | Err(ClientError::Status { .. }) => {}
            Err(e) => return Err(e),
        }
        let held = cookie.save()?;
        if !held {
            warn!(path = %self.csrf_path, "backend did not set a CSRF cookie");
        }
        Ok(held)
    }

    /// Persist the jar's CSRF cookie for later processes.
    pub fn save_csrf_cookie(&self) -> ClientResult<bool> {
        match &self.csrf_cookie {
            Some(cookie) => Ok(cookie.save()?),
            None => Ok(false),
        }
    }

    /// Resolve `path` against the base URL. A leading `/` is ignored so paths
    /// always stay under the API prefix.
    pub fn url(&self, path: &str) -> ClientResult<Url> {
        self.base_url
            .join(path.trim_start_matches('/'))
            .map_err(|e| ClientError::Url(format!("{path}: {e}")))
    }

    /// Run a request through the pipeline and transport, whatever the status.
    pub async fn send(&self, mut request: ApiRequest) -> ClientResult<ApiResponse> {
        self.pipeline.run_request(&mut request)?;
        let mut response = self.transport.execute(request).await?;
        self.pipeline.run_response(&mut response)?;
        Ok(response)
    }

    /// Send `method path` with an optional JSON body; non-2xx is an error.
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> ClientResult<Body> {
        let mut request = ApiRequest::new(method, self.url(path)?);
        if let Some(body) = body {
            request.body = Body::Json(body);
        }

        let response = self.send(request).await?;
        debug!(status = %response.status, path, "request completed");
        if !response.status.is_success() {
            return Err(ClientError::Status {
                status: response.status,
                body: response.body,
            });
        }
        Ok(response.body)
    }

    pub async fn get(&self, path: &str) -> ClientResult<Body> {
        self.request(Method::GET, path, None).await
    }

    pub async fn post(&self, path: &str, body: Value) -> ClientResult<Body> {
        self.request(Method::POST, path, Some(body)).await
    }

    pub async fn put(&self, path: &str, body: Value) -> ClientResult<Body> {
        self.request(Method::PUT, path, Some(body)).await
    }

    pub async fn patch(&self, path: &str, body: Value) -> ClientResult<Body> {
        self.request(Method::PATCH, path, Some(body)).await
    }

    pub async fn delete(&self, path: &str) -> ClientResult<Body> {
        self.request(Method::DELETE, path, None).await
    }
}
