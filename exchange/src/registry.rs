//! First-seen identity creation.
//!
//! A newcomer receives one asset, picked uniformly at random among the
//! indices nobody currently owns. Assignment happens inside a write
//! transaction so two concurrent registrations can never pick the same
//! index.

use std::sync::Arc;

use rand::Rng;

use tradepost_store::{ExchangeStore, Identity, StoreError, WriteTxn};
use tradepost_types::{AssetIndex, Clock, Handle};

use crate::catalog::{AssetMetadata, CatalogResolver};
use crate::error::ExchangeError;

#[derive(Clone, Debug, PartialEq)]
pub struct Registration {
    pub identity: Identity,
    /// `false` when the handle was already known.
    pub created: bool,
    pub asset: Option<AssetMetadata>,
}

pub struct IdentityRegistry {
    store: Arc<dyn ExchangeStore>,
    catalog: Arc<dyn CatalogResolver>,
    clock: Arc<dyn Clock>,
}

impl IdentityRegistry {
    pub fn new(
        store: Arc<dyn ExchangeStore>,
        catalog: Arc<dyn CatalogResolver>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            catalog,
            clock,
        }
    }

    /// Return the identity for `handle`, creating it on first sight.
    ///
    /// When every index in the catalog is owned the identity is created
    /// without an asset.
    pub fn register(&self, handle: &str) -> Result<Registration, ExchangeError> {
        let handle = Handle::parse(handle)?;
        let mut txn = self.store.write_txn()?;

        if let Some(identity) = txn.get_identity(&handle)? {
            return Ok(Registration {
                asset: self.resolve(&identity),
                identity,
                created: false,
            });
        }

        let start = match self.catalog.catalog_size() {
            0 => 0,
            size => rand::thread_rng().gen_range(0..size),
        };
        let asset_index = find_unowned(&*txn, self.catalog.catalog_size(), start)?;
        let identity = Identity::new(handle, asset_index, self.clock.now());
        txn.put_identity(&identity)?;
        txn.commit()?;

        match asset_index {
            Some(asset) => {
                tracing::info!(handle = %identity.handle, asset = %asset, "registered identity")
            }
            None => tracing::warn!(
                handle = %identity.handle,
                "registered identity without asset: catalog exhausted"
            ),
        }

        Ok(Registration {
            asset: self.resolve(&identity),
            identity,
            created: true,
        })
    }

    /// Look up an identity together with its asset metadata.
    pub fn get(&self, handle: &Handle) -> Result<(Identity, Option<AssetMetadata>), ExchangeError> {
        match self.store.get_identity(handle) {
            Ok(identity) => {
                let asset = self.resolve(&identity);
                Ok((identity, asset))
            }
            Err(StoreError::NotFound(_)) => Err(ExchangeError::IdentityNotFound(handle.clone())),
            Err(e) => Err(e.into()),
        }
    }

    fn resolve(&self, identity: &Identity) -> Option<AssetMetadata> {
        identity.asset_index.and_then(|i| self.catalog.resolve(i))
    }
}

/// Probe linearly from `start`, wrapping, for an index with no owner.
fn find_unowned(
    txn: &dyn WriteTxn,
    size: u32,
    start: u32,
) -> Result<Option<AssetIndex>, StoreError> {
    for offset in 0..size {
        let candidate = AssetIndex::new(((start as u64 + offset as u64) % size as u64) as u32);
        if txn.owner_of(candidate)?.is_none() {
            return Ok(Some(candidate));
        }
    }
    Ok(None)
}
