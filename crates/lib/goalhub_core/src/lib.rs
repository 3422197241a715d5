//! # goalhub_core
//!
//! Session and authorization core for GoalHub: token decoding, the session
//! store, durable token storage and route guards.

pub mod auth;
pub mod guard;
pub mod models;
pub mod storage;

/// Returns the crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
