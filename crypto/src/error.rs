use thiserror::Error;

#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("signing key too short: {len} bytes, need at least {min}")]
    KeyTooShort { len: usize, min: usize },

    #[error("signing key is not valid hex")]
    InvalidKeyHex,
}
