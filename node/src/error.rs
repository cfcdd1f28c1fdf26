use thiserror::Error;

#[derive(Debug, Error)]
pub enum NodeError {
    #[error("store error: {0}")]
    Store(#[from] tradepost_store::StoreError),

    #[error("LMDB error: {0}")]
    Lmdb(#[from] tradepost_store_lmdb::LmdbError),

    #[error("crypto error: {0}")]
    Crypto(#[from] tradepost_crypto::CryptoError),

    #[error("metrics error: {0}")]
    Metrics(#[from] prometheus::Error),

    #[error("config error: {0}")]
    Config(String),

    #[error("data directory error: {0}")]
    DataDir(String),

    #[error("integrity check failed: {0}")]
    Integrity(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
