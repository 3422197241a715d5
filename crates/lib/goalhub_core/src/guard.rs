//! Navigation guards over the session store.
//!
//! Guards read the store synchronously and never mutate it.

use tracing::{debug, warn};
use url::form_urlencoded;

use crate::auth::SessionStore;

/// Where unauthenticated callers are sent.
pub const LOGIN_ROUTE: &str = "/login";
/// Where authenticated non-admins are sent by admin-only routes.
pub const DASHBOARD_ROUTE: &str = "/dashboard";

/// Outcome of a guard check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    Allow,
    /// Send to the login view, then back to `return_url`.
    RedirectToLogin { return_url: String },
    RedirectToDashboard,
}

impl GuardDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, GuardDecision::Allow)
    }

    /// Route the caller should be sent to, if not allowed. The return URL is
    /// percent-encoded so its own query survives.
    pub fn redirect_target(&self) -> Option<String> {
        match self {
            GuardDecision::Allow => None,
            GuardDecision::RedirectToLogin { return_url } => {
                let encoded: String =
                    form_urlencoded::byte_serialize(return_url.as_bytes()).collect();
                Some(format!("{LOGIN_ROUTE}?returnUrl={encoded}"))
            }
            GuardDecision::RedirectToDashboard => Some(DASHBOARD_ROUTE.to_string()),
        }
    }
}

/// Allow only authenticated sessions.
pub fn require_auth(session: &SessionStore, url: &str) -> GuardDecision {
    if session.is_authenticated() {
        return GuardDecision::Allow;
    }
    warn!(url, "access denied, login required");
    GuardDecision::RedirectToLogin {
        return_url: url.to_string(),
    }
}

/// Allow only authenticated admin sessions.
pub fn require_admin(session: &SessionStore, url: &str) -> GuardDecision {
    match require_auth(session, url) {
        GuardDecision::Allow if session.is_admin() => GuardDecision::Allow,
        GuardDecision::Allow => {
            debug!(url, "admin route, redirecting to dashboard");
            GuardDecision::RedirectToDashboard
        }
        denied => denied,
    }
}
