//! Token redemption and the atomic ownership swap.
//!
//! Checks run in a fixed order and the first failure wins:
//!
//! 1. decode the token
//! 2. expiry (inclusive: a token is still good at its expiry instant)
//! 3. signature
//! 4. self-trade
//! 5. consume the nonce
//! 6. the initiator still holds the offered asset
//! 7. confirmer location present and valid
//! 8. distance to where the initiator stood at issuance
//! 9. confirmer identity and asset
//!
//! Steps 5 through 9 and the swap share one storage write transaction.
//! A rejection in that range drops the transaction, which puts the nonce
//! back; a commit makes the swap, the ledger entry and the nonce deletion
//! visible together.

use std::sync::Arc;

use tradepost_crypto::TokenSigner;
use tradepost_store::{ExchangeStore, NewTrade, TradeEntry};
use tradepost_types::{Clock, ExchangeParams, GeoPoint, Handle};

use crate::catalog::{AssetMetadata, CatalogResolver};
use crate::codec;
use crate::error::ExchangeError;
use crate::events::{publish_best_effort, ExchangeEvent, NotificationSink};
use crate::proximity::{distance_meters, within_threshold};

/// A completed swap.
#[derive(Clone, Debug, PartialEq)]
pub struct RedeemOutcome {
    pub entry: TradeEntry,
    /// What the confirmer now holds, if the catalog knows it.
    pub confirmer_asset: Option<AssetMetadata>,
}

pub struct TradeExecutor {
    store: Arc<dyn ExchangeStore>,
    signer: Arc<TokenSigner>,
    clock: Arc<dyn Clock>,
    params: ExchangeParams,
    catalog: Arc<dyn CatalogResolver>,
    sink: Arc<dyn NotificationSink>,
}

impl TradeExecutor {
    pub fn new(
        store: Arc<dyn ExchangeStore>,
        signer: Arc<TokenSigner>,
        clock: Arc<dyn Clock>,
        params: ExchangeParams,
        catalog: Arc<dyn CatalogResolver>,
        sink: Arc<dyn NotificationSink>,
    ) -> Self {
        Self {
            store,
            signer,
            clock,
            params,
            catalog,
            sink,
        }
    }

    /// Redeem `token` on behalf of `confirmer` standing at `location`.
    pub fn redeem(
        &self,
        token: &str,
        confirmer: &Handle,
        location: Option<GeoPoint>,
    ) -> Result<RedeemOutcome, ExchangeError> {
        let result = self.execute(token, confirmer, location);
        if let Err(e) = &result {
            tracing::debug!(confirmer = %confirmer, code = e.code(), error = %e, "redemption rejected");
        }
        result
    }

    fn execute(
        &self,
        token: &str,
        confirmer: &Handle,
        location: Option<GeoPoint>,
    ) -> Result<RedeemOutcome, ExchangeError> {
        let token = codec::decode(token)?;
        let payload = &token.payload;

        let now = self.clock.now();
        if payload.expiry.is_passed(now) {
            return Err(ExchangeError::Expired {
                expiry: payload.expiry,
            });
        }

        if !token.verify(&self.signer) {
            return Err(ExchangeError::InvalidSignature);
        }

        if &payload.initiator == confirmer {
            return Err(ExchangeError::SelfTrade);
        }

        let mut txn = self.store.write_txn()?;

        let record = txn
            .consume_nonce(&payload.nonce)?
            .ok_or(ExchangeError::ReplayOrInvalid)?;

        let mut initiator = txn
            .get_identity(&payload.initiator)?
            .filter(|i| i.asset_index == Some(payload.asset_index))
            .ok_or(ExchangeError::StaleOffer)?;

        let location = location.ok_or(ExchangeError::LocationRequired)?;
        location.validate()?;

        let distance_m = distance_meters(&record.location, &location);
        if !within_threshold(distance_m, self.params.proximity_threshold_m) {
            return Err(ExchangeError::OutOfRange {
                distance_m,
                threshold_m: self.params.proximity_threshold_m,
            });
        }

        let mut counterpart = txn
            .get_identity(confirmer)?
            .ok_or_else(|| ExchangeError::IdentityNotFound(confirmer.clone()))?;
        let confirmer_asset = counterpart
            .asset_index
            .ok_or_else(|| ExchangeError::NoAsset(confirmer.clone()))?;

        let initiator_asset = payload.asset_index;
        initiator.asset_index = Some(confirmer_asset);
        counterpart.asset_index = Some(initiator_asset);
        txn.put_identity(&initiator)?;
        txn.put_identity(&counterpart)?;

        let entry = txn.append_trade(&NewTrade {
            participant_a: initiator.handle.clone(),
            participant_b: counterpart.handle.clone(),
            asset_a: initiator_asset,
            asset_b: confirmer_asset,
            timestamp: now,
        })?;
        txn.commit()?;

        tracing::info!(
            trade_id = entry.id,
            initiator = %entry.participant_a,
            confirmer = %entry.participant_b,
            asset_a = %entry.asset_a,
            asset_b = %entry.asset_b,
            distance_m,
            "trade completed"
        );

        publish_best_effort(
            self.sink.as_ref(),
            &ExchangeEvent::TradeCompleted {
                entry: entry.clone(),
            },
        );

        Ok(RedeemOutcome {
            confirmer_asset: self.catalog.resolve(initiator_asset),
            entry,
        })
    }
}
