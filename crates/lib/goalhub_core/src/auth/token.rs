//! Session token decoding.
//!
//! Only the payload segment is inspected. The signature is treated as opaque
//! and is never verified here; the backend verifies it on every request.

use base64::Engine;
use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use thiserror::Error;

use crate::models::auth::Claims;

/// Standard alphabet, padding optional (token segments are unpadded).
const PAYLOAD_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Why a raw token could not be decoded.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("expected 3 segments, found {0}")]
    SegmentCount(usize),

    #[error("segment {0} is empty")]
    EmptySegment(usize),

    #[error("payload is not valid base64: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("payload is not valid JSON: {0}")]
    Json(#[source] serde_json::Error),

    #[error("payload is not a JSON object")]
    NotAnObject,

    #[error("payload claims are invalid: {0}")]
    Claims(#[source] serde_json::Error),
}

/// Decode the payload segment of `raw` into [`Claims`].
pub fn decode(raw: &str) -> Result<Claims, DecodeError> {
    let segments: Vec<&str> = raw.split('.').collect();
    if segments.len() != 3 {
        return Err(DecodeError::SegmentCount(segments.len()));
    }
    if let Some(idx) = segments.iter().position(|s| s.is_empty()) {
        return Err(DecodeError::EmptySegment(idx + 1));
    }

    let payload = segments[1].replace('-', "+").replace('_', "/");
    let bytes = PAYLOAD_ENGINE.decode(payload)?;

    let value: serde_json::Value = serde_json::from_slice(&bytes).map_err(DecodeError::Json)?;
    if !value.is_object() {
        return Err(DecodeError::NotAnObject);
    }
    serde_json::from_value(value).map_err(DecodeError::Claims)
}
