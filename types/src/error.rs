//! Errors raised while constructing primitive values from untrusted input.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum TypesError {
    #[error("invalid handle: {0}")]
    InvalidHandle(String),

    #[error("invalid location: lat={lat}, lon={lon}")]
    InvalidLocation { lat: f64, lon: f64 },

    #[error("invalid nonce: {0}")]
    InvalidNonce(String),
}
