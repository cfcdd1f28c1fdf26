//! Token transport encoding.
//!
//! A token travels as base64url (no padding) of the JSON envelope
//! `{"payload":{"initiator","asset_index","nonce","expiry"},"signature"}`,
//! so it can sit in a URL or a QR code without escaping.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use thiserror::Error;

use crate::token::ExchangeToken;

/// Why a token string could not be turned into a token.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("token is empty")]
    Empty,

    #[error("token is not valid base64url: {0}")]
    Base64(String),

    #[error("token is not valid UTF-8")]
    Utf8,

    #[error("token envelope is malformed: {0}")]
    Json(String),
}

pub fn encode(token: &ExchangeToken) -> String {
    // Serializing plain structs of strings and integers cannot fail.
    let json = serde_json::to_vec(token).unwrap_or_default();
    URL_SAFE_NO_PAD.encode(json)
}

/// Decode a transport string. Never yields a partial token.
pub fn decode(input: &str) -> Result<ExchangeToken, DecodeError> {
    let input = input.trim();
    if input.is_empty() {
        return Err(DecodeError::Empty);
    }
    let bytes = URL_SAFE_NO_PAD
        .decode(input)
        .map_err(|e| DecodeError::Base64(e.to_string()))?;
    let json = std::str::from_utf8(&bytes).map_err(|_| DecodeError::Utf8)?;
    serde_json::from_str(json).map_err(|e| DecodeError::Json(e.to_string()))
}
