//! LMDB implementation of TradeStore.
//!
//! Entries are keyed by big-endian id so iteration is insertion order.
//! `participant_trades` holds `handle ++ 0x00 ++ id_be` for per-handle
//! history as a prefix range-scan.

use std::ops::Bound;

use tradepost_store::{StoreError, TradeEntry, TradeStore};
use tradepost_types::Handle;

use crate::keys::{handle_prefix, increment_prefix};
use crate::{LmdbEnvironment, LmdbError};

impl LmdbEnvironment {
    /// Trade ids for `handle`, ascending.
    fn trade_ids_for(&self, handle: &Handle) -> Result<Vec<u64>, LmdbError> {
        let rtxn = self.env.read_txn()?;
        let prefix = handle_prefix(handle);
        let mut upper = prefix.clone();
        increment_prefix(&mut upper);
        let bounds = (
            Bound::Included(prefix.as_slice()),
            Bound::Excluded(upper.as_slice()),
        );
        let mut ids = Vec::new();
        for entry in self.participant_trades_db.range(&rtxn, &bounds)? {
            let (key, _) = entry?;
            let id = key
                .get(prefix.len()..)
                .and_then(crate::keys::read_u64)
                .ok_or_else(|| LmdbError::Corruption("participant trade key".into()))?;
            ids.push(id);
        }
        Ok(ids)
    }
}

impl TradeStore for LmdbEnvironment {
    fn get_trade(&self, id: u64) -> Result<TradeEntry, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let bytes = self
            .trades_db
            .get(&rtxn, &id.to_be_bytes())
            .map_err(LmdbError::from)?
            .ok_or_else(|| LmdbError::NotFound(format!("trade {id}")))?;
        Ok(bincode::deserialize(bytes).map_err(LmdbError::from)?)
    }

    fn trades_for(&self, handle: &Handle) -> Result<Vec<TradeEntry>, StoreError> {
        self.trade_ids_for(handle)?
            .into_iter()
            .map(|id| self.get_trade(id))
            .collect()
    }

    fn trade_count(&self) -> Result<u64, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        Ok(self.trades_db.len(&rtxn).map_err(LmdbError::from)?)
    }

    fn trade_count_for(&self, handle: &Handle) -> Result<u64, StoreError> {
        Ok(self.trade_ids_for(handle)?.len() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::environment::test_support::temp_env;
    use tradepost_store::{ExchangeStore, NewTrade};
    use tradepost_types::{AssetIndex, Timestamp};

    fn h(s: &str) -> Handle {
        Handle::parse(s).unwrap()
    }

    fn trade(a: &str, b: &str, at: u64) -> NewTrade {
        NewTrade {
            participant_a: h(a),
            participant_b: h(b),
            asset_a: AssetIndex::new(1),
            asset_b: AssetIndex::new(2),
            timestamp: Timestamp::from_millis(at),
        }
    }

    #[test]
    fn history_is_per_handle_and_ordered() {
        let (_dir, env) = temp_env();
        let mut txn = env.write_txn().unwrap();
        txn.append_trade(&trade("bob", "carol", 1)).unwrap();
        txn.append_trade(&trade("bobby", "bob", 2)).unwrap();
        txn.append_trade(&trade("carol", "bobby", 3)).unwrap();
        txn.commit().unwrap();

        let bob = env.trades_for(&h("bob")).unwrap();
        assert_eq!(bob.iter().map(|t| t.id).collect::<Vec<_>>(), vec![1, 2]);
        assert_eq!(env.trade_count_for(&h("bobby")).unwrap(), 2);
        assert_eq!(env.trade_count_for(&h("dave")).unwrap(), 0);
        assert_eq!(env.trade_count().unwrap(), 3);
        assert_eq!(env.get_trade(3).unwrap().participant_a, h("carol"));
        assert!(matches!(env.get_trade(4), Err(StoreError::NotFound(_))));
    }
}
