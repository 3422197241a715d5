//! Client error types and backend validation-error formatting.

use goalhub_core::storage::StorageError;
use http::StatusCode;
use serde_json::Value;
use thiserror::Error;

use crate::pipeline::{Body, StageError};
use crate::transport::TransportError;

/// Convenience alias for client results.
pub type ClientResult<T> = Result<T, ClientError>;

/// Client-level errors.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Invalid URL: {0}")]
    Url(String),

    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Pipeline stage error: {0}")]
    Stage(#[from] StageError),

    #[error("Request failed with status {status}")]
    Status { status: StatusCode, body: Body },

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

impl ClientError {
    /// Human-readable messages for this error.
    ///
    /// Status errors carrying a validation body yield one line per field
    /// message; everything else yields the error's display string.
    pub fn messages(&self) -> Vec<String> {
        if let ClientError::Status {
            body: Body::Json(value),
            ..
        } = self
        {
            let messages = validation_messages(value);
            if !messages.is_empty() {
                return messages;
            }
        }
        vec![self.to_string()]
    }
}

/// Flatten a validation body (`{field: [msg, ..] | msg | {..}}`) into
/// `"Field Name: msg"` lines. Non-object bodies yield nothing.
pub fn validation_messages(body: &Value) -> Vec<String> {
    let Some(fields) = body.as_object() else {
        return Vec::new();
    };

    let mut messages = Vec::new();
    for (key, errors) in fields {
        let field = format_field_name(key);
        match errors {
            Value::Array(items) => {
                for item in items {
                    match item {
                        Value::String(msg) => messages.push(format!("{field}: {msg}")),
                        other => messages.push(format!("{field}: {other}")),
                    }
                }
            }
            Value::String(msg) => messages.push(format!("{field}: {msg}")),
            Value::Object(_) => messages.push(format!("{field}: {errors}")),
            _ => {}
        }
    }
    messages
}

/// `link_django` / `linkDjango` → `Link Django`.
pub fn format_field_name(name: &str) -> String {
    let mut words: Vec<String> = Vec::new();
    let mut current = String::new();
    for c in name.chars() {
        if c == '_' || (c.is_ascii_uppercase() && !current.is_empty()) {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            if c == '_' {
                continue;
            }
        }
        current.push(c);
    }
    if !current.is_empty() {
        words.push(current);
    }

    words
        .iter()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
