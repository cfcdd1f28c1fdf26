use thiserror::Error;
use tradepost_store::StoreError;

#[derive(Debug, Error)]
pub enum LmdbError {
    #[error("LMDB error: {0}")]
    Heed(String),

    #[error("key not found: {0}")]
    NotFound(String),

    #[error("duplicate key: {0}")]
    Duplicate(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("corrupt record: {0}")]
    Corruption(String),
}

impl From<heed::Error> for LmdbError {
    fn from(e: heed::Error) -> Self {
        LmdbError::Heed(e.to_string())
    }
}

impl From<bincode::Error> for LmdbError {
    fn from(e: bincode::Error) -> Self {
        LmdbError::Serialization(e.to_string())
    }
}

impl From<LmdbError> for StoreError {
    fn from(e: LmdbError) -> Self {
        match e {
            LmdbError::NotFound(k) => StoreError::NotFound(k),
            LmdbError::Duplicate(k) => StoreError::Duplicate(k),
            LmdbError::Serialization(m) => StoreError::Serialization(m),
            LmdbError::Corruption(m) => StoreError::Corruption(m),
            LmdbError::Heed(m) => StoreError::Backend(m),
        }
    }
}
