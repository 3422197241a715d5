//! Backend authenticator: credential exchange and logout over the API.

use async_trait::async_trait;
use goalhub_core::auth::{AuthError, Authenticator};
use goalhub_core::models::auth::Credentials;
use http::StatusCode;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use crate::client::ApiClient;
use crate::error::ClientError;
use crate::pipeline::Body;

/// Login endpoint, relative to the API base URL.
pub const LOGIN_PATH: &str = "auth/login/";
/// Logout endpoint, relative to the API base URL.
pub const LOGOUT_PATH: &str = "auth/logout/";

/// Token pair returned by the login endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct JwtResponse {
    pub access: String,
    #[serde(default)]
    pub refresh: Option<String>,
}

/// [`Authenticator`] backed by the REST API.
#[derive(Clone)]
pub struct HttpAuthenticator {
    client: ApiClient,
}

impl HttpAuthenticator {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Authenticator for HttpAuthenticator {
    async fn exchange(&self, credentials: &Credentials) -> Result<String, AuthError> {
        debug!(username = %credentials.username, "POST {LOGIN_PATH}");
        let body = self
            .client
            .post(
                LOGIN_PATH,
                json!({
                    "username": credentials.username,
                    "password": credentials.password,
                }),
            )
            .await
            .map_err(auth_error)?;

        let Body::Json(value) = body else {
            return Err(AuthError::Network("login response is not JSON".into()));
        };
        let tokens: JwtResponse = serde_json::from_value(value)
            .map_err(|e| AuthError::Network(format!("login response: {e}")))?;
        Ok(tokens.access)
    }

    async fn invalidate(&self) -> Result<(), AuthError> {
        debug!("POST {LOGOUT_PATH}");
        self.client
            .post(LOGOUT_PATH, json!({}))
            .await
            .map(|_| ())
            .map_err(auth_error)
    }
}

/// Rejections of the credentials themselves map to `CredentialError`;
/// everything else is a network failure. A 403 from the CSRF check is not a
/// verdict on the credentials.
fn auth_error(e: ClientError) -> AuthError {
    if let ClientError::Status {
        status: StatusCode::FORBIDDEN,
        body,
    } = &e
        && let Some(detail) = csrf_failure(body)
    {
        return AuthError::Network(detail);
    }

    match e {
        ClientError::Status { status, .. }
            if matches!(
                status,
                StatusCode::BAD_REQUEST | StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN
            ) =>
        {
            AuthError::CredentialError
        }
        other => AuthError::Network(other.to_string()),
    }
}

/// The backend's `detail` message, when it reports a failed CSRF check.
fn csrf_failure(body: &Body) -> Option<String> {
    let detail = body.as_json()?.get("detail")?.as_str()?;
    detail
        .to_ascii_lowercase()
        .contains("csrf")
        .then(|| detail.to_string())
}
