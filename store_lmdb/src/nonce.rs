//! LMDB implementation of NonceStore.
//!
//! Records live in `nonces`, keyed by the raw 16 nonce bytes. A secondary
//! index `nonce_expiry` keyed `expiry_be ++ nonce` lets the sweeper find
//! expired records with one range scan instead of a full table walk.

use tradepost_store::{NonceRecord, NonceStore, StoreError, WriteTxn};
use tradepost_types::{Nonce, Timestamp};

use crate::{LmdbEnvironment, LmdbError};

impl NonceStore for LmdbEnvironment {
    fn create_nonce(&self, record: &NonceRecord) -> Result<(), StoreError> {
        let mut txn = self.begin_write()?;
        txn.create_nonce(record)?;
        txn.commit_inner()
    }

    fn consume_nonce(&self, nonce: &Nonce) -> Result<Option<NonceRecord>, StoreError> {
        let mut txn = self.begin_write()?;
        let record = txn.consume_nonce(nonce)?;
        if record.is_some() {
            txn.commit_inner()?;
        }
        Ok(record)
    }

    fn sweep_expired(&self, now: Timestamp) -> Result<u64, StoreError> {
        let mut txn = self.begin_write()?;
        let removed = txn.sweep_expired(now)?;
        if removed > 0 {
            txn.commit_inner()?;
        }
        Ok(removed)
    }

    fn nonce_count(&self) -> Result<u64, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        Ok(self.nonces_db.len(&rtxn).map_err(LmdbError::from)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::environment::test_support::temp_env;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tradepost_types::GeoPoint;

    fn record(byte: u8, expiry_ms: u64) -> NonceRecord {
        NonceRecord {
            nonce: Nonce::new([byte; Nonce::LEN]),
            expiry: Timestamp::from_millis(expiry_ms),
            location: GeoPoint::new(0.0, 0.0).unwrap(),
        }
    }

    #[test]
    fn duplicate_nonce_rejected() {
        let (_dir, env) = temp_env();
        env.create_nonce(&record(1, 100)).unwrap();
        assert!(matches!(
            env.create_nonce(&record(1, 200)),
            Err(StoreError::Duplicate(_))
        ));
        assert_eq!(env.nonce_count().unwrap(), 1);
    }

    #[test]
    fn consume_returns_record_once() {
        let (_dir, env) = temp_env();
        let rec = record(2, 100);
        env.create_nonce(&rec).unwrap();
        assert_eq!(env.consume_nonce(&rec.nonce).unwrap(), Some(rec.clone()));
        assert_eq!(env.consume_nonce(&rec.nonce).unwrap(), None);
    }

    #[test]
    fn sweep_removes_only_strictly_expired() {
        let (_dir, env) = temp_env();
        env.create_nonce(&record(1, 999)).unwrap();
        env.create_nonce(&record(2, 1_000)).unwrap();
        env.create_nonce(&record(3, 1_001)).unwrap();

        assert_eq!(env.sweep_expired(Timestamp::from_millis(1_000)).unwrap(), 1);
        assert_eq!(env.nonce_count().unwrap(), 2);
        assert!(env.consume_nonce(&record(1, 0).nonce).unwrap().is_none());
        assert!(env.consume_nonce(&record(2, 0).nonce).unwrap().is_some());

        // index entry for a consumed nonce is gone too
        assert_eq!(env.sweep_expired(Timestamp::from_millis(5_000)).unwrap(), 1);
        assert_eq!(env.nonce_count().unwrap(), 0);
    }

    #[test]
    fn concurrent_consumers_see_exactly_one_success() {
        let (_dir, env) = temp_env();
        let env = Arc::new(env);
        let rec = record(7, 10_000);
        env.create_nonce(&rec).unwrap();

        let wins = Arc::new(AtomicUsize::new(0));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let env = Arc::clone(&env);
                let wins = Arc::clone(&wins);
                let nonce = rec.nonce;
                std::thread::spawn(move || {
                    if env.consume_nonce(&nonce).unwrap().is_some() {
                        wins.fetch_add(1, Ordering::SeqCst);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(wins.load(Ordering::SeqCst), 1);
    }
}
