//! Nullable store: thread-safe in-memory storage for testing.
//!
//! All state sits behind one mutex. A write transaction holds that mutex
//! for its whole life and works on a private copy of the state, which
//! replaces the shared state on commit and is discarded on drop. That
//! gives the same all-or-nothing, one-writer-at-a-time behaviour as the
//! LMDB backend.
//!
//! Unlike LMDB, readers also wait for the mutex, so a thread must not read
//! through the store while it holds an open write transaction.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};

use tradepost_store::{
    ExchangeStore, Identity, IdentityStore, NewTrade, NonceRecord, NonceStore, StoreError,
    TradeEntry, TradeStore, WriteTxn,
};
use tradepost_types::{AssetIndex, Handle, Nonce, Timestamp};

#[derive(Clone, Default)]
struct MemState {
    identities: BTreeMap<Handle, Identity>,
    owners: BTreeMap<AssetIndex, Handle>,
    nonces: HashMap<Nonce, NonceRecord>,
    trades: Vec<TradeEntry>,
}

impl MemState {
    fn put_identity(&mut self, identity: &Identity) {
        let previous = self
            .identities
            .get(&identity.handle)
            .and_then(|p| p.asset_index);
        if let Some(old) = previous {
            if Some(old) != identity.asset_index
                && self.owners.get(&old) == Some(&identity.handle)
            {
                self.owners.remove(&old);
            }
        }
        if let Some(asset) = identity.asset_index {
            self.owners.insert(asset, identity.handle.clone());
        }
        self.identities
            .insert(identity.handle.clone(), identity.clone());
    }

    fn create_nonce(&mut self, record: &NonceRecord) -> Result<(), StoreError> {
        if self.nonces.contains_key(&record.nonce) {
            return Err(StoreError::Duplicate(format!("nonce {}", record.nonce)));
        }
        self.nonces.insert(record.nonce, record.clone());
        Ok(())
    }

    fn append_trade(&mut self, trade: &NewTrade) -> TradeEntry {
        let entry = trade.with_id(self.trades.len() as u64 + 1);
        self.trades.push(entry.clone());
        entry
    }
}

/// An in-memory implementation of every store trait.
/// Thread-safe for use with tokio's multi-threaded runtime.
pub struct NullStore {
    state: Mutex<MemState>,
    fail_commits: AtomicBool,
}

impl NullStore {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(MemState::default()),
            fail_commits: AtomicBool::new(false),
        }
    }

    /// Begin a concrete write transaction.
    pub fn begin_write(&self) -> NullWriteTxn<'_> {
        let guard = self.state.lock().unwrap();
        let working = guard.clone();
        NullWriteTxn {
            guard,
            working,
            fail_commit: self.fail_commits.load(Ordering::SeqCst),
        }
    }

    /// Make every subsequent commit fail with `StoreError::Backend`,
    /// simulating a storage failure at the last moment.
    pub fn fail_commits(&self, fail: bool) {
        self.fail_commits.store(fail, Ordering::SeqCst);
    }

    fn state(&self) -> MutexGuard<'_, MemState> {
        self.state.lock().unwrap()
    }
}

impl Default for NullStore {
    fn default() -> Self {
        Self::new()
    }
}

impl IdentityStore for NullStore {
    fn get_identity(&self, handle: &Handle) -> Result<Identity, StoreError> {
        self.state()
            .identities
            .get(handle)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("identity {handle}")))
    }

    fn identity_exists(&self, handle: &Handle) -> Result<bool, StoreError> {
        Ok(self.state().identities.contains_key(handle))
    }

    fn identity_count(&self) -> Result<u64, StoreError> {
        Ok(self.state().identities.len() as u64)
    }

    fn iter_identities(&self) -> Result<Vec<Identity>, StoreError> {
        Ok(self.state().identities.values().cloned().collect())
    }

    fn asset_owner(&self, asset: AssetIndex) -> Result<Option<Handle>, StoreError> {
        Ok(self.state().owners.get(&asset).cloned())
    }
}

impl NonceStore for NullStore {
    fn create_nonce(&self, record: &NonceRecord) -> Result<(), StoreError> {
        self.state().create_nonce(record)
    }

    fn consume_nonce(&self, nonce: &Nonce) -> Result<Option<NonceRecord>, StoreError> {
        Ok(self.state().nonces.remove(nonce))
    }

    fn sweep_expired(&self, now: Timestamp) -> Result<u64, StoreError> {
        let mut state = self.state();
        let before = state.nonces.len();
        state.nonces.retain(|_, r| !r.is_expired(now));
        Ok((before - state.nonces.len()) as u64)
    }

    fn nonce_count(&self) -> Result<u64, StoreError> {
        Ok(self.state().nonces.len() as u64)
    }
}

impl TradeStore for NullStore {
    fn get_trade(&self, id: u64) -> Result<TradeEntry, StoreError> {
        let state = self.state();
        id.checked_sub(1)
            .and_then(|i| state.trades.get(i as usize))
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("trade {id}")))
    }

    fn trades_for(&self, handle: &Handle) -> Result<Vec<TradeEntry>, StoreError> {
        Ok(self
            .state()
            .trades
            .iter()
            .filter(|t| t.involves(handle))
            .cloned()
            .collect())
    }

    fn trade_count(&self) -> Result<u64, StoreError> {
        Ok(self.state().trades.len() as u64)
    }
}

impl ExchangeStore for NullStore {
    fn write_txn(&self) -> Result<Box<dyn WriteTxn + '_>, StoreError> {
        Ok(Box::new(self.begin_write()))
    }
}

/// Write transaction over a [`NullStore`].
pub struct NullWriteTxn<'a> {
    guard: MutexGuard<'a, MemState>,
    working: MemState,
    fail_commit: bool,
}

impl WriteTxn for NullWriteTxn<'_> {
    fn get_identity(&self, handle: &Handle) -> Result<Option<Identity>, StoreError> {
        Ok(self.working.identities.get(handle).cloned())
    }

    fn owner_of(&self, asset: AssetIndex) -> Result<Option<Handle>, StoreError> {
        Ok(self.working.owners.get(&asset).cloned())
    }

    fn put_identity(&mut self, identity: &Identity) -> Result<(), StoreError> {
        self.working.put_identity(identity);
        Ok(())
    }

    fn create_nonce(&mut self, record: &NonceRecord) -> Result<(), StoreError> {
        self.working.create_nonce(record)
    }

    fn consume_nonce(&mut self, nonce: &Nonce) -> Result<Option<NonceRecord>, StoreError> {
        Ok(self.working.nonces.remove(nonce))
    }

    fn append_trade(&mut self, trade: &NewTrade) -> Result<TradeEntry, StoreError> {
        Ok(self.working.append_trade(trade))
    }

    fn commit(self: Box<Self>) -> Result<(), StoreError> {
        if self.fail_commit {
            return Err(StoreError::Backend("simulated commit failure".into()));
        }
        let NullWriteTxn {
            mut guard, working, ..
        } = *self;
        *guard = working;
        Ok(())
    }
}
