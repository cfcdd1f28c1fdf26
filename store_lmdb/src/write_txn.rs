//! Write transactions: groups identity, nonce and ledger mutations into a
//! single LMDB write transaction.
//!
//! # Usage
//!
//! ```ignore
//! let mut txn = env.begin_write()?;
//! let record = txn.consume_nonce(&nonce)?;
//! txn.put_identity(&initiator)?;
//! txn.put_identity(&confirmer)?;
//! txn.append_trade(&trade)?;
//! txn.commit()?;
//! ```
//!
//! If the transaction is dropped without calling `commit`, all operations
//! are rolled back (the underlying LMDB transaction is aborted). LMDB allows
//! one write transaction per environment at a time; `new` blocks until the
//! previous one finishes.

use std::ops::Bound;

use heed::RwTxn;

use tradepost_store::{Identity, NewTrade, NonceRecord, StoreError, TradeEntry, WriteTxn};
use tradepost_types::{AssetIndex, Handle, Nonce};

use crate::environment::LmdbEnvironment;
use crate::keys;
use crate::LmdbError;

const NEXT_TRADE_ID_KEY: &[u8] = b"next_trade_id";

pub struct LmdbWriteTxn<'a> {
    txn: RwTxn<'a>,
    env: &'a LmdbEnvironment,
}

impl<'a> LmdbWriteTxn<'a> {
    pub(crate) fn new(env: &'a LmdbEnvironment) -> Result<Self, StoreError> {
        let txn = env.env.write_txn().map_err(LmdbError::from)?;
        Ok(Self { txn, env })
    }

    /// Delete every nonce whose expiry is strictly before `now`.
    pub(crate) fn sweep_expired(
        &mut self,
        now: tradepost_types::Timestamp,
    ) -> Result<u64, StoreError> {
        let upper = keys::expiry_floor(now);
        let expired: Vec<Vec<u8>> = {
            let iter = self
                .env
                .nonce_expiry_db
                .range(
                    &self.txn,
                    &(Bound::Unbounded, Bound::Excluded(upper.as_slice())),
                )
                .map_err(LmdbError::from)?;
            let mut keys = Vec::new();
            for entry in iter {
                let (key, _) = entry.map_err(LmdbError::from)?;
                keys.push(key.to_vec());
            }
            keys
        };

        for key in &expired {
            let nonce = key
                .get(8..)
                .ok_or_else(|| LmdbError::Corruption("short nonce expiry key".into()))?;
            self.env
                .nonces_db
                .delete(&mut self.txn, nonce)
                .map_err(LmdbError::from)?;
            self.env
                .nonce_expiry_db
                .delete(&mut self.txn, key)
                .map_err(LmdbError::from)?;
        }
        Ok(expired.len() as u64)
    }

    pub(crate) fn put_meta(&mut self, key: &str, value: &[u8]) -> Result<(), StoreError> {
        self.env
            .meta_db
            .put(&mut self.txn, key.as_bytes(), value)
            .map_err(LmdbError::from)?;
        Ok(())
    }

    pub(crate) fn commit_inner(self) -> Result<(), StoreError> {
        self.txn.commit().map_err(LmdbError::from)?;
        Ok(())
    }

    fn next_trade_id(&mut self) -> Result<u64, StoreError> {
        let next = self
            .env
            .meta_db
            .get(&self.txn, NEXT_TRADE_ID_KEY)
            .map_err(LmdbError::from)?
            .and_then(keys::read_u64)
            .unwrap_or(1);
        self.env
            .meta_db
            .put(&mut self.txn, NEXT_TRADE_ID_KEY, &(next + 1).to_be_bytes())
            .map_err(LmdbError::from)?;
        Ok(next)
    }
}

impl WriteTxn for LmdbWriteTxn<'_> {
    fn get_identity(&self, handle: &Handle) -> Result<Option<Identity>, StoreError> {
        let bytes = self
            .env
            .identities_db
            .get(&self.txn, handle.as_str().as_bytes())
            .map_err(LmdbError::from)?;
        match bytes {
            Some(b) => Ok(Some(bincode::deserialize(b).map_err(LmdbError::from)?)),
            None => Ok(None),
        }
    }

    fn owner_of(&self, asset: AssetIndex) -> Result<Option<Handle>, StoreError> {
        let bytes = self
            .env
            .asset_owners_db
            .get(&self.txn, &asset.to_be_bytes())
            .map_err(LmdbError::from)?;
        bytes.map(crate::identity::decode_handle).transpose()
    }

    fn put_identity(&mut self, identity: &Identity) -> Result<(), StoreError> {
        let previous = self.get_identity(&identity.handle)?;
        let handle_bytes = identity.handle.as_str().as_bytes();

        if let Some(old_asset) = previous.and_then(|p| p.asset_index) {
            if Some(old_asset) != identity.asset_index
                && self.owner_of(old_asset)?.as_ref() == Some(&identity.handle)
            {
                self.env
                    .asset_owners_db
                    .delete(&mut self.txn, &old_asset.to_be_bytes())
                    .map_err(LmdbError::from)?;
            }
        }
        if let Some(asset) = identity.asset_index {
            self.env
                .asset_owners_db
                .put(&mut self.txn, &asset.to_be_bytes(), handle_bytes)
                .map_err(LmdbError::from)?;
        }

        let bytes = bincode::serialize(identity).map_err(LmdbError::from)?;
        self.env
            .identities_db
            .put(&mut self.txn, handle_bytes, &bytes)
            .map_err(LmdbError::from)?;
        Ok(())
    }

    fn create_nonce(&mut self, record: &NonceRecord) -> Result<(), StoreError> {
        let key = record.nonce.as_bytes();
        let exists = self
            .env
            .nonces_db
            .get(&self.txn, key)
            .map_err(LmdbError::from)?
            .is_some();
        if exists {
            return Err(LmdbError::Duplicate(format!("nonce {}", record.nonce)).into());
        }

        let bytes = bincode::serialize(record).map_err(LmdbError::from)?;
        self.env
            .nonces_db
            .put(&mut self.txn, key, &bytes)
            .map_err(LmdbError::from)?;
        self.env
            .nonce_expiry_db
            .put(&mut self.txn, &keys::expiry_key(record.expiry, &record.nonce), &[])
            .map_err(LmdbError::from)?;
        Ok(())
    }

    fn consume_nonce(&mut self, nonce: &Nonce) -> Result<Option<NonceRecord>, StoreError> {
        let record: NonceRecord = match self
            .env
            .nonces_db
            .get(&self.txn, nonce.as_bytes())
            .map_err(LmdbError::from)?
        {
            Some(b) => bincode::deserialize(b).map_err(LmdbError::from)?,
            None => return Ok(None),
        };

        self.env
            .nonces_db
            .delete(&mut self.txn, nonce.as_bytes())
            .map_err(LmdbError::from)?;
        self.env
            .nonce_expiry_db
            .delete(&mut self.txn, &keys::expiry_key(record.expiry, nonce))
            .map_err(LmdbError::from)?;
        Ok(Some(record))
    }

    fn append_trade(&mut self, trade: &NewTrade) -> Result<TradeEntry, StoreError> {
        let id = self.next_trade_id()?;
        let entry = trade.with_id(id);
        let bytes = bincode::serialize(&entry).map_err(LmdbError::from)?;

        self.env
            .trades_db
            .put(&mut self.txn, &id.to_be_bytes(), &bytes)
            .map_err(LmdbError::from)?;
        for participant in [&entry.participant_a, &entry.participant_b] {
            self.env
                .participant_trades_db
                .put(&mut self.txn, &keys::participant_key(participant, id), &[])
                .map_err(LmdbError::from)?;
        }
        Ok(entry)
    }

    fn commit(self: Box<Self>) -> Result<(), StoreError> {
        (*self).commit_inner()
    }
}
