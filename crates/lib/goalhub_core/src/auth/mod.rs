//! Authentication and authorization logic.
//!
//! Provides token decoding, the session store, and the collaborator trait
//! used to exchange credentials with the backend.

pub mod session;
pub mod token;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::auth::Credentials;
use crate::storage::StorageError;

pub use session::{BootstrapOutcome, SessionState, SessionStore};
pub use token::{DecodeError, decode};

/// Authentication errors.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid credentials")]
    CredentialError,

    #[error("Network error: {0}")]
    Network(String),

    #[error("Token error: {0}")]
    Token(#[from] DecodeError),

    #[error("Token expired")]
    Expired,

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Backend collaborator that issues and revokes session tokens.
#[async_trait]
pub trait Authenticator: Send + Sync {
    /// Exchange credentials for a raw session token.
    async fn exchange(&self, credentials: &Credentials) -> Result<String, AuthError>;

    /// Invalidate the current session server-side.
    async fn invalidate(&self) -> Result<(), AuthError>;
}
