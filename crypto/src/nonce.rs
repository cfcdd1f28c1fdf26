//! Nonce generation.

use rand::rngs::OsRng;
use rand::RngCore;
use tradepost_types::Nonce;

/// Draw a fresh 128-bit nonce from the OS random source.
pub fn generate_nonce() -> Nonce {
    let mut bytes = [0u8; Nonce::LEN];
    OsRng.fill_bytes(&mut bytes);
    Nonce::new(bytes)
}
