//! Cryptographic primitives for the Tradepost protocol.
//!
//! - **HMAC-SHA256** over a canonical token payload, verified in constant time
//! - **OS randomness** for token nonces and ephemeral signing keys
//!
//! The signing key is always passed in explicitly; nothing here reads
//! process-wide configuration.

pub mod error;
pub mod keys;
pub mod nonce;
pub mod sign;

pub use error::CryptoError;
pub use keys::SigningKey;
pub use nonce::generate_nonce;
pub use sign::{sign_message, verify_signature, Signature, TokenSigner};
