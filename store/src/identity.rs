//! Identity storage trait.

use crate::StoreError;
use serde::{Deserialize, Serialize};
use tradepost_types::{AssetIndex, Handle, Timestamp};

/// A participant in the exchange game.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Identity {
    pub handle: Handle,
    /// The asset currently held; `None` means the identity holds nothing.
    pub asset_index: Option<AssetIndex>,
    /// Set once by an authority; never cleared.
    pub verified: bool,
    pub verified_at: Option<Timestamp>,
    /// Reference to the authority that verified this identity.
    pub verified_by: Option<String>,
    pub created_at: Timestamp,
}

impl Identity {
    /// A fresh, unverified identity.
    pub fn new(handle: Handle, asset_index: Option<AssetIndex>, created_at: Timestamp) -> Self {
        Self {
            handle,
            asset_index,
            verified: false,
            verified_at: None,
            verified_by: None,
            created_at,
        }
    }
}

/// Trait for identity reads.
///
/// Writes go through [`crate::WriteTxn`] so they can share a transaction
/// with nonce consumption and ledger appends.
pub trait IdentityStore {
    /// `StoreError::NotFound` if no identity has this handle.
    fn get_identity(&self, handle: &Handle) -> Result<Identity, StoreError>;
    fn identity_exists(&self, handle: &Handle) -> Result<bool, StoreError>;
    fn identity_count(&self) -> Result<u64, StoreError>;
    fn iter_identities(&self) -> Result<Vec<Identity>, StoreError>;

    fn iter_verified_identities(&self) -> Result<Vec<Identity>, StoreError> {
        Ok(self
            .iter_identities()?
            .into_iter()
            .filter(|i| i.verified)
            .collect())
    }

    /// The handle currently owning `asset`, if any.
    fn asset_owner(&self, asset: AssetIndex) -> Result<Option<Handle>, StoreError>;
}
