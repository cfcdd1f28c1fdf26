//! LMDB storage backend for the Tradepost protocol.
//!
//! Implements all storage traits from `tradepost-store` using the `heed` LMDB
//! bindings. Each logical store maps to one or more LMDB databases within a
//! single environment. LMDB admits one write transaction at a time, which is
//! what makes redemption linearizable across threads and requests.

pub mod environment;
pub mod error;
pub mod identity;
pub mod integrity;
mod keys;
pub mod meta;
pub mod migration;
pub mod nonce;
pub mod trade;
pub mod write_txn;

pub use environment::LmdbEnvironment;
pub use error::LmdbError;
pub use write_txn::LmdbWriteTxn;
