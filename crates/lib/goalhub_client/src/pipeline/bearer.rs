//! Bearer stage: attaches the persisted session token.

use std::sync::Arc;

use goalhub_core::storage::{SESSION_TOKEN_KEY, TokenStorage};
use http::HeaderValue;
use http::header::AUTHORIZATION;
use tracing::warn;

use super::{ApiRequest, RequestStage, StageError};

/// Sets `Authorization: Bearer <token>` when a session token is persisted.
///
/// The token is re-read from storage for every request, so a logout takes
/// effect on the very next request.
pub struct BearerStage {
    storage: Arc<dyn TokenStorage>,
}

impl BearerStage {
    pub fn new(storage: Arc<dyn TokenStorage>) -> Self {
        Self { storage }
    }
}

impl RequestStage for BearerStage {
    fn on_request(&self, request: &mut ApiRequest) -> Result<(), StageError> {
        if request.headers.contains_key(AUTHORIZATION) {
            return Ok(());
        }
        let token = match self.storage.get(SESSION_TOKEN_KEY) {
            Ok(Some(token)) => token,
            Ok(None) => return Ok(()),
            Err(e) => {
                warn!("failed to read session token: {e}");
                return Ok(());
            }
        };
        match HeaderValue::from_str(&format!("Bearer {token}")) {
            Ok(value) => {
                request.headers.insert(AUTHORIZATION, value);
            }
            Err(_) => warn!("session token is not a valid header value"),
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "BearerStage"
    }
}
