//! Session store: the single holder of the current decoded claims.
//!
//! The store is a cheap handle; clone it into every consumer. Reads are
//! synchronous projections of the current state. Login and logout are
//! serialized through one async lock and run on a spawned task, so a caller
//! abandoning the future does not abort a transition already in flight.

use std::sync::{Arc, PoisonError, RwLock};

use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::token::decode;
use super::{AuthError, Authenticator};
use crate::models::auth::{Claims, Credentials};
use crate::storage::{SESSION_TOKEN_KEY, TokenStorage};

/// Snapshot of the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Empty,
    Active(Claims),
}

/// What [`SessionStore::bootstrap`] found in storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootstrapOutcome {
    /// No persisted token.
    NoSession,
    /// Token decoded and unexpired; session is active.
    Restored,
    /// Token could not be decoded; storage cleared.
    Malformed,
    /// Token expired; storage cleared.
    Expired,
}

struct Inner {
    state: RwLock<Option<Claims>>,
    transition: Mutex<()>,
    storage: Arc<dyn TokenStorage>,
    authenticator: Arc<dyn Authenticator>,
}

/// Shared handle to the session state.
#[derive(Clone)]
pub struct SessionStore {
    inner: Arc<Inner>,
}

impl SessionStore {
    /// Create an empty store. Call [`bootstrap`](Self::bootstrap) to restore a
    /// persisted session.
    pub fn new(storage: Arc<dyn TokenStorage>, authenticator: Arc<dyn Authenticator>) -> Self {
        Self {
            inner: Arc::new(Inner {
                state: RwLock::new(None),
                transition: Mutex::new(()),
                storage,
                authenticator,
            }),
        }
    }

    /// Restore the session from the persisted token, if it is still valid.
    ///
    /// Meant to run once at startup before any login/logout.
    pub fn bootstrap(&self) -> BootstrapOutcome {
        self.bootstrap_at(chrono::Utc::now().timestamp())
    }

    fn bootstrap_at(&self, now: i64) -> BootstrapOutcome {
        let raw = match self.inner.storage.get(SESSION_TOKEN_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                self.inner.set_state(None);
                return BootstrapOutcome::NoSession;
            }
            Err(e) => {
                warn!("failed to read persisted session: {e}");
                self.inner.set_state(None);
                return BootstrapOutcome::NoSession;
            }
        };

        match decode(&raw) {
            Ok(claims) if claims.is_expired_at(now) => {
                info!(user_id = claims.user_id, exp = ?claims.exp, "persisted session expired");
                self.inner.discard();
                BootstrapOutcome::Expired
            }
            Ok(claims) => {
                info!(user_id = claims.user_id, username = %claims.username, "session restored");
                self.inner.set_state(Some(claims));
                BootstrapOutcome::Restored
            }
            Err(e) => {
                warn!("persisted session token is malformed: {e}");
                self.inner.discard();
                BootstrapOutcome::Malformed
            }
        }
    }

    /// Exchange credentials for a session token and activate it.
    ///
    /// On exchange failure the current state is left untouched. A token that
    /// does not decode, or is already expired, clears the session.
    pub async fn login(&self, credentials: &Credentials) -> Result<Claims, AuthError> {
        let inner = self.inner.clone();
        let credentials = credentials.clone();
        tokio::spawn(async move { inner.login(credentials).await })
            .await
            .map_err(|e| AuthError::Internal(format!("login task: {e}")))?
    }

    /// Invalidate the session server-side (best-effort) and clear it locally.
    ///
    /// The local session is always cleared, whatever the backend answers.
    pub async fn logout(&self) {
        let inner = self.inner.clone();
        if let Err(e) = tokio::spawn(async move { inner.logout().await }).await {
            warn!("logout task failed: {e}");
            let _guard = self.inner.transition.lock().await;
            self.inner.discard();
        }
    }

    /// Current state snapshot.
    pub fn state(&self) -> SessionState {
        match self.current_user() {
            Some(claims) => SessionState::Active(claims),
            None => SessionState::Empty,
        }
    }

    /// Claims of the current session, if any.
    pub fn current_user(&self) -> Option<Claims> {
        self.read(|claims| claims.cloned())
    }

    pub fn is_authenticated(&self) -> bool {
        self.read(|claims| claims.is_some())
    }

    /// Whether the session's elevated-role flag is set.
    pub fn is_admin(&self) -> bool {
        self.read(|claims| claims.is_some_and(|c| c.is_superuser))
    }

    pub fn is_staff(&self) -> bool {
        self.read(|claims| claims.is_some_and(|c| c.is_staff))
    }

    /// Group the session's subject belongs to.
    pub fn user_group(&self) -> Option<i64> {
        self.read(|claims| claims.and_then(|c| c.group))
    }

    /// Admins can edit every group; members only their own.
    pub fn can_edit_group(&self, group_id: i64) -> bool {
        self.read(|claims| match claims {
            None => false,
            Some(c) if c.is_superuser => true,
            Some(c) => c.group == Some(group_id),
        })
    }

    fn read<T>(&self, f: impl FnOnce(Option<&Claims>) -> T) -> T {
        let state = self
            .inner
            .state
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        f(state.as_ref())
    }
}

impl Inner {
    async fn login(&self, credentials: Credentials) -> Result<Claims, AuthError> {
        let _guard = self.transition.lock().await;
        debug!(username = %credentials.username, "exchanging credentials");

        let raw = self.authenticator.exchange(&credentials).await.map_err(|e| {
            warn!(username = %credentials.username, "login failed: {e}");
            e
        })?;

        self.storage.set(SESSION_TOKEN_KEY, &raw)?;

        let claims = match decode(&raw) {
            Ok(claims) if claims.is_expired() => {
                warn!(user_id = claims.user_id, "login returned an expired token");
                self.discard();
                return Err(AuthError::Expired);
            }
            Ok(claims) => claims,
            Err(e) => {
                warn!("login returned a malformed token: {e}");
                self.discard();
                return Err(AuthError::Token(e));
            }
        };

        info!(user_id = claims.user_id, username = %claims.username, "logged in");
        self.set_state(Some(claims.clone()));
        Ok(claims)
    }

    async fn logout(&self) {
        let _guard = self.transition.lock().await;
        if let Err(e) = self.authenticator.invalidate().await {
            warn!("logout request failed, clearing local session anyway: {e}");
        }
        self.discard();
        info!("logged out");
    }

    /// Remove the persisted token and empty the session.
    fn discard(&self) {
        if let Err(e) = self.storage.remove(SESSION_TOKEN_KEY) {
            warn!("failed to remove persisted session: {e}");
        }
        self.set_state(None);
    }

    fn set_state(&self, claims: Option<Claims>) {
        *self.state.write().unwrap_or_else(PoisonError::into_inner) = claims;
    }
}
