//! Nonce ledger storage trait.

use crate::StoreError;
use serde::{Deserialize, Serialize};
use tradepost_types::{GeoPoint, Nonce, Timestamp};

/// The persisted half of an issued token.
///
/// A record exists iff its token has been neither redeemed nor swept.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NonceRecord {
    pub nonce: Nonce,
    pub expiry: Timestamp,
    /// Where the initiator stood when the token was issued.
    pub location: GeoPoint,
}

impl NonceRecord {
    pub fn is_expired(&self, now: Timestamp) -> bool {
        self.expiry.is_passed(now)
    }
}

/// Trait for the nonce ledger.
///
/// Each method is atomic on its own. Redemption uses the transactional
/// variant on [`crate::WriteTxn`] instead, so that consumption commits or
/// rolls back together with the ownership swap.
pub trait NonceStore {
    /// Insert a record; `StoreError::Duplicate` if the nonce already exists.
    fn create_nonce(&self, record: &NonceRecord) -> Result<(), StoreError>;

    /// Read and delete a record in one indivisible step.
    ///
    /// Of any number of concurrent calls for the same nonce, exactly one
    /// returns `Some`.
    fn consume_nonce(&self, nonce: &Nonce) -> Result<Option<NonceRecord>, StoreError>;

    /// Delete every record whose expiry is strictly before `now`.
    /// Returns the number of records removed.
    fn sweep_expired(&self, now: Timestamp) -> Result<u64, StoreError>;

    fn nonce_count(&self) -> Result<u64, StoreError>;
}
