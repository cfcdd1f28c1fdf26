//! Points, rank and the leaderboard, computed live from the ledger and the
//! current verification flags. Nothing here is cached.

use std::collections::HashSet;
use std::sync::Arc;

use serde::Serialize;

use tradepost_store::{ExchangeStore, Identity, TradeEntry};
use tradepost_types::Handle;

use crate::error::VerificationError;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct LeaderboardEntry {
    pub rank: u64,
    pub handle: Handle,
    pub points: u64,
    pub trade_count: u64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Leaderboard {
    pub entries: Vec<LeaderboardEntry>,
    /// Number of verified identities, before slicing.
    pub total: u64,
}

pub struct ScoringEngine {
    store: Arc<dyn ExchangeStore>,
}

impl ScoringEngine {
    pub fn new(store: Arc<dyn ExchangeStore>) -> Self {
        Self { store }
    }

    /// Distinct currently-verified counterparties; 0 if `handle` itself is
    /// unverified.
    pub fn points(&self, handle: &Handle) -> Result<u64, VerificationError> {
        let identity = self.identity(handle)?;
        if !identity.verified {
            return Ok(0);
        }
        let verified = self.verified_handles()?;
        let trades = self.store.trades_for(handle)?;
        Ok(count_points(handle, &trades, &verified))
    }

    /// `1 + number of verified identities with strictly more points`.
    pub fn rank(&self, points: u64) -> Result<u64, VerificationError> {
        let above = self
            .standings()?
            .iter()
            .filter(|s| s.points > points)
            .count() as u64;
        Ok(above + 1)
    }

    pub fn rank_of(&self, handle: &Handle) -> Result<u64, VerificationError> {
        let points = self.points(handle)?;
        self.rank(points)
    }

    /// Verified identities ordered by points, then trade count, then handle.
    ///
    /// Ranks come from the full ordering: an entry's rank is one more than
    /// the number of entries with a strictly greater (points, trade count)
    /// key, so equal keys share a rank.
    pub fn leaderboard(&self, limit: usize, offset: usize) -> Result<Leaderboard, VerificationError> {
        let standings = self.standings()?;
        let total = standings.len() as u64;

        let mut ranked = Vec::with_capacity(standings.len());
        let mut rank = 0u64;
        let mut previous: Option<(u64, u64)> = None;
        for (position, s) in standings.into_iter().enumerate() {
            let key = (s.points, s.trade_count);
            if previous != Some(key) {
                rank = position as u64 + 1;
                previous = Some(key);
            }
            ranked.push(LeaderboardEntry {
                rank,
                handle: s.handle,
                points: s.points,
                trade_count: s.trade_count,
            });
        }

        Ok(Leaderboard {
            entries: ranked.into_iter().skip(offset).take(limit).collect(),
            total,
        })
    }

    pub fn trade_count(&self, handle: &Handle) -> Result<u64, VerificationError> {
        self.identity(handle)?;
        Ok(self.store.trade_count_for(handle)?)
    }

    /// Ledger entries involving `handle`, newest first.
    pub fn history(
        &self,
        handle: &Handle,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<TradeEntry>, VerificationError> {
        self.identity(handle)?;
        let mut trades = self.store.trades_for(handle)?;
        trades.reverse();
        Ok(trades.into_iter().skip(offset).take(limit).collect())
    }

    fn identity(&self, handle: &Handle) -> Result<Identity, VerificationError> {
        self.store
            .get_identity(handle)
            .map_err(|e| VerificationError::lookup(handle, e))
    }

    fn verified_handles(&self) -> Result<HashSet<Handle>, VerificationError> {
        Ok(self
            .store
            .iter_verified_identities()?
            .into_iter()
            .map(|i| i.handle)
            .collect())
    }

    /// Every verified identity with its score, in leaderboard order.
    fn standings(&self) -> Result<Vec<Standing>, VerificationError> {
        let verified = self.verified_handles()?;
        let mut standings = Vec::with_capacity(verified.len());
        for handle in &verified {
            let trades = self.store.trades_for(handle)?;
            standings.push(Standing {
                points: count_points(handle, &trades, &verified),
                trade_count: trades.len() as u64,
                handle: handle.clone(),
            });
        }
        standings.sort_by(|a, b| {
            b.points
                .cmp(&a.points)
                .then(b.trade_count.cmp(&a.trade_count))
                .then_with(|| a.handle.cmp(&b.handle))
        });
        Ok(standings)
    }
}

struct Standing {
    handle: Handle,
    points: u64,
    trade_count: u64,
}

fn count_points(handle: &Handle, trades: &[TradeEntry], verified: &HashSet<Handle>) -> u64 {
    trades
        .iter()
        .filter_map(|t| t.counterparty(handle))
        .filter(|c| verified.contains(*c))
        .collect::<HashSet<_>>()
        .len() as u64
}
