//! Trade ledger storage trait.

use crate::StoreError;
use serde::{Deserialize, Serialize};
use tradepost_types::{AssetIndex, Handle, Timestamp};

/// An immutable record of a completed swap.
///
/// `participant_a` is the token's initiator and `participant_b` the
/// confirmer; the asset fields hold what each held *before* the swap.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeEntry {
    pub id: u64,
    pub participant_a: Handle,
    pub participant_b: Handle,
    pub asset_a: AssetIndex,
    pub asset_b: AssetIndex,
    pub timestamp: Timestamp,
}

impl TradeEntry {
    pub fn involves(&self, handle: &Handle) -> bool {
        &self.participant_a == handle || &self.participant_b == handle
    }

    /// The other side of the trade, or `None` if `handle` took no part.
    pub fn counterparty(&self, handle: &Handle) -> Option<&Handle> {
        if &self.participant_a == handle {
            Some(&self.participant_b)
        } else if &self.participant_b == handle {
            Some(&self.participant_a)
        } else {
            None
        }
    }
}

/// A ledger entry before the store has assigned its id.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewTrade {
    pub participant_a: Handle,
    pub participant_b: Handle,
    pub asset_a: AssetIndex,
    pub asset_b: AssetIndex,
    pub timestamp: Timestamp,
}

impl NewTrade {
    pub fn with_id(&self, id: u64) -> TradeEntry {
        TradeEntry {
            id,
            participant_a: self.participant_a.clone(),
            participant_b: self.participant_b.clone(),
            asset_a: self.asset_a,
            asset_b: self.asset_b,
            timestamp: self.timestamp,
        }
    }
}

/// Trait for append-only ledger reads.
pub trait TradeStore {
    /// `StoreError::NotFound` if no entry has this id.
    fn get_trade(&self, id: u64) -> Result<TradeEntry, StoreError>;

    /// Every entry the handle took part in, oldest first.
    fn trades_for(&self, handle: &Handle) -> Result<Vec<TradeEntry>, StoreError>;

    fn trade_count(&self) -> Result<u64, StoreError>;

    /// Number of entries the handle took part in.
    fn trade_count_for(&self, handle: &Handle) -> Result<u64, StoreError> {
        self.trades_for(handle).map(|t| t.len() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn h(s: &str) -> Handle {
        Handle::parse(s).unwrap()
    }

    #[test]
    fn counterparty_is_symmetric() {
        let entry = NewTrade {
            participant_a: h("alice"),
            participant_b: h("bob"),
            asset_a: AssetIndex::new(1),
            asset_b: AssetIndex::new(2),
            timestamp: Timestamp::from_millis(10),
        }
        .with_id(7);

        assert_eq!(entry.counterparty(&h("alice")), Some(&h("bob")));
        assert_eq!(entry.counterparty(&h("bob")), Some(&h("alice")));
        assert_eq!(entry.counterparty(&h("carol")), None);
        assert!(entry.involves(&h("bob")));
        assert!(!entry.involves(&h("carol")));
    }
}
