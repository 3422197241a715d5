//! # goalhub_client
//!
//! HTTP client for the GoalHub API: request pipeline stages (bearer token,
//! CSRF double-submit, key casing), a reqwest transport, and the backend
//! authenticator used by the session store.

pub mod auth;
pub mod client;
pub mod config;
pub mod cookies;
pub mod error;
pub mod pipeline;
pub mod transport;

pub use client::ApiClient;
pub use config::ClientConfig;
pub use error::{ClientError, ClientResult};
