//! Abstract storage traits for the Tradepost protocol.
//!
//! Every storage backend (LMDB, in-memory for testing) implements these
//! traits. The protocol crates depend only on the traits, receiving a
//! backend as `Arc<dyn ExchangeStore>`.
//!
//! Reads go through the per-entity traits. Every mutation that must be
//! atomic with respect to other requests goes through a [`WriteTxn`], which
//! is all-or-nothing: dropping it without [`WriteTxn::commit`] discards
//! every change made through it.

pub mod error;
pub mod identity;
pub mod meta;
pub mod nonce;
pub mod trade;

pub use error::StoreError;
pub use identity::{Identity, IdentityStore};
pub use meta::MetaStore;
pub use nonce::{NonceRecord, NonceStore};
pub use trade::{NewTrade, TradeEntry, TradeStore};

use tradepost_types::{AssetIndex, Handle, Nonce};

/// Writable transaction handle for atomic multi-store operations.
///
/// Backends serialize write transactions: while one is open, no other
/// write transaction on the same store can observe or change state, and
/// readers see either none or all of its effects.
pub trait WriteTxn {
    /// Read an identity as seen by this transaction.
    fn get_identity(&self, handle: &Handle) -> Result<Option<Identity>, StoreError>;

    /// The handle currently recorded as owning `asset`, if any.
    fn owner_of(&self, asset: AssetIndex) -> Result<Option<Handle>, StoreError>;

    /// Insert or replace an identity.
    ///
    /// Keeps the owner index in step: the identity's previous asset stops
    /// pointing at it (unless already reassigned) and its new asset does.
    fn put_identity(&mut self, identity: &Identity) -> Result<(), StoreError>;

    /// Insert a nonce record; `StoreError::Duplicate` if it already exists.
    fn create_nonce(&mut self, record: &NonceRecord) -> Result<(), StoreError>;

    /// Read and delete a nonce record in one step.
    fn consume_nonce(&mut self, nonce: &Nonce) -> Result<Option<NonceRecord>, StoreError>;

    /// Append a ledger entry, assigning the next trade id.
    fn append_trade(&mut self, trade: &NewTrade) -> Result<TradeEntry, StoreError>;

    /// Make every change durable and visible at once.
    fn commit(self: Box<Self>) -> Result<(), StoreError>;
}

/// A complete backend: entity reads plus transactional writes.
pub trait ExchangeStore: IdentityStore + NonceStore + TradeStore + Send + Sync {
    /// Begin a write transaction. Blocks while another one is open.
    fn write_txn(&self) -> Result<Box<dyn WriteTxn + '_>, StoreError>;
}
