//! LMDB implementation of IdentityStore.

use tradepost_store::{Identity, IdentityStore, StoreError};
use tradepost_types::{AssetIndex, Handle};

use crate::{LmdbEnvironment, LmdbError};

pub(crate) fn decode_handle(bytes: &[u8]) -> Result<Handle, StoreError> {
    let s = std::str::from_utf8(bytes)
        .map_err(|e| LmdbError::Corruption(format!("owner handle: {e}")))?;
    Handle::parse(s).map_err(|e| LmdbError::Corruption(e.to_string()).into())
}

impl IdentityStore for LmdbEnvironment {
    fn get_identity(&self, handle: &Handle) -> Result<Identity, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let bytes = self
            .identities_db
            .get(&rtxn, handle.as_str().as_bytes())
            .map_err(LmdbError::from)?
            .ok_or_else(|| LmdbError::NotFound(format!("identity {handle}")))?;
        Ok(bincode::deserialize(bytes).map_err(LmdbError::from)?)
    }

    fn identity_exists(&self, handle: &Handle) -> Result<bool, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        Ok(self
            .identities_db
            .get(&rtxn, handle.as_str().as_bytes())
            .map_err(LmdbError::from)?
            .is_some())
    }

    fn identity_count(&self) -> Result<u64, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        Ok(self.identities_db.len(&rtxn).map_err(LmdbError::from)?)
    }

    fn iter_identities(&self) -> Result<Vec<Identity>, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let iter = self.identities_db.iter(&rtxn).map_err(LmdbError::from)?;
        let mut identities = Vec::new();
        for entry in iter {
            let (_key, bytes) = entry.map_err(LmdbError::from)?;
            identities.push(bincode::deserialize(bytes).map_err(LmdbError::from)?);
        }
        Ok(identities)
    }

    fn asset_owner(&self, asset: AssetIndex) -> Result<Option<Handle>, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        self.asset_owners_db
            .get(&rtxn, &asset.to_be_bytes())
            .map_err(LmdbError::from)?
            .map(decode_handle)
            .transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::environment::test_support::temp_env;
    use tradepost_store::{ExchangeStore, WriteTxn};
    use tradepost_types::Timestamp;

    fn h(s: &str) -> Handle {
        Handle::parse(s).unwrap()
    }

    #[test]
    fn missing_identity_is_not_found() {
        let (_dir, env) = temp_env();
        assert!(matches!(
            env.get_identity(&h("ghost")),
            Err(StoreError::NotFound(_))
        ));
        assert!(!env.identity_exists(&h("ghost")).unwrap());
    }

    #[test]
    fn verified_filter() {
        let (_dir, env) = temp_env();
        let mut txn = env.write_txn().unwrap();
        let mut alice = Identity::new(h("alice"), Some(AssetIndex::new(1)), Timestamp::EPOCH);
        alice.verified = true;
        alice.verified_at = Some(Timestamp::from_millis(10));
        txn.put_identity(&alice).unwrap();
        txn.put_identity(&Identity::new(h("bob"), None, Timestamp::EPOCH))
            .unwrap();
        txn.commit().unwrap();

        assert_eq!(env.identity_count().unwrap(), 2);
        let verified = env.iter_verified_identities().unwrap();
        assert_eq!(verified.len(), 1);
        assert_eq!(verified[0].handle, h("alice"));
        assert_eq!(env.asset_owner(AssetIndex::new(1)).unwrap(), Some(h("alice")));
        assert_eq!(env.asset_owner(AssetIndex::new(2)).unwrap(), None);
    }
}
