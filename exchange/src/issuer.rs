//! Token issuance.

use std::sync::Arc;

use tradepost_crypto::{generate_nonce, TokenSigner};
use tradepost_store::{ExchangeStore, NonceRecord, StoreError};
use tradepost_types::{Clock, ExchangeParams, GeoPoint, Handle, Nonce, Timestamp};

use crate::codec;
use crate::error::ExchangeError;
use crate::token::TokenPayload;

/// Result of a successful issuance.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IssuedToken {
    /// Opaque transport string handed to the confirmer.
    pub token: String,
    pub expiry: Timestamp,
    pub nonce: Nonce,
}

/// Mints signed, single-use exchange tokens.
///
/// Issuance writes exactly one nonce record and touches nothing else:
/// no identity or ledger state changes until a token is redeemed.
pub struct TokenIssuer {
    store: Arc<dyn ExchangeStore>,
    signer: Arc<TokenSigner>,
    clock: Arc<dyn Clock>,
    params: ExchangeParams,
}

impl TokenIssuer {
    pub fn new(
        store: Arc<dyn ExchangeStore>,
        signer: Arc<TokenSigner>,
        clock: Arc<dyn Clock>,
        params: ExchangeParams,
    ) -> Self {
        Self {
            store,
            signer,
            clock,
            params,
        }
    }

    pub fn issue(
        &self,
        initiator: &Handle,
        location: Option<GeoPoint>,
    ) -> Result<IssuedToken, ExchangeError> {
        let identity = match self.store.get_identity(initiator) {
            Ok(identity) => identity,
            Err(StoreError::NotFound(_)) => {
                return Err(ExchangeError::IdentityNotFound(initiator.clone()))
            }
            Err(e) => return Err(e.into()),
        };
        let asset_index = identity
            .asset_index
            .ok_or_else(|| ExchangeError::NoAsset(initiator.clone()))?;
        let location = location.ok_or(ExchangeError::LocationRequired)?;
        location.validate()?;

        let expiry = self.clock.now().plus_secs(self.params.token_ttl_secs);
        let nonce = generate_nonce();
        let token = TokenPayload {
            initiator: initiator.clone(),
            asset_index,
            nonce,
            expiry,
        }
        .sign(&self.signer);

        self.store.create_nonce(&NonceRecord {
            nonce,
            expiry,
            location,
        })?;

        tracing::debug!(
            initiator = %initiator,
            asset = %asset_index,
            nonce = %nonce,
            expiry = %expiry,
            "issued exchange token"
        );

        Ok(IssuedToken {
            token: codec::encode(&token),
            expiry,
            nonce,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tradepost_crypto::SigningKey;
    use tradepost_nullables::{NullClock, NullStore};
    use tradepost_store::{Identity, NonceStore, TradeStore, WriteTxn};
    use tradepost_types::AssetIndex;

    fn h(s: &str) -> Handle {
        Handle::parse(s).unwrap()
    }

    fn setup() -> (Arc<NullStore>, Arc<NullClock>, TokenIssuer) {
        let store = Arc::new(NullStore::new());
        let mut txn = store.begin_write();
        txn.put_identity(&Identity::new(h("alice"), Some(AssetIndex::new(10)), Timestamp::EPOCH))
            .unwrap();
        txn.put_identity(&Identity::new(h("empty"), None, Timestamp::EPOCH))
            .unwrap();
        Box::new(txn).commit().unwrap();

        let clock = Arc::new(NullClock::new(1_000_000));
        let signer = Arc::new(TokenSigner::new(SigningKey::from_bytes(&[7; 32]).unwrap()));
        let issuer = TokenIssuer::new(
            store.clone(),
            signer,
            clock.clone(),
            ExchangeParams::default(),
        );
        (store, clock, issuer)
    }

    fn here() -> Option<GeoPoint> {
        Some(GeoPoint::new(40.0, -74.0).unwrap())
    }

    #[test]
    fn issue_persists_exactly_one_nonce() {
        let (store, _clock, issuer) = setup();
        let issued = issuer.issue(&h("alice"), here()).unwrap();

        assert_eq!(issued.expiry, Timestamp::from_millis(1_000_000 + 60_000));
        assert_eq!(store.nonce_count().unwrap(), 1);
        assert_eq!(store.trade_count().unwrap(), 0);

        let decoded = codec::decode(&issued.token).unwrap();
        assert_eq!(decoded.payload.initiator, h("alice"));
        assert_eq!(decoded.payload.asset_index, AssetIndex::new(10));
        assert_eq!(decoded.payload.nonce, issued.nonce);
    }

    #[test]
    fn issue_rejections_write_nothing() {
        let (store, _clock, issuer) = setup();

        assert!(matches!(
            issuer.issue(&h("nobody"), here()),
            Err(ExchangeError::IdentityNotFound(_))
        ));
        assert!(matches!(
            issuer.issue(&h("empty"), here()),
            Err(ExchangeError::NoAsset(_))
        ));
        assert!(matches!(
            issuer.issue(&h("alice"), None),
            Err(ExchangeError::LocationRequired)
        ));
        assert!(matches!(
            issuer.issue(&h("alice"), Some(GeoPoint { lat: 95.0, lon: 0.0 })),
            Err(ExchangeError::InvalidLocation { .. })
        ));
        assert_eq!(store.nonce_count().unwrap(), 0);
    }

    #[test]
    fn nonces_are_unique_per_issue() {
        let (store, _clock, issuer) = setup();
        let a = issuer.issue(&h("alice"), here()).unwrap();
        let b = issuer.issue(&h("alice"), here()).unwrap();
        assert_ne!(a.nonce, b.nonce);
        assert_ne!(a.token, b.token);
        assert_eq!(store.nonce_count().unwrap(), 2);
    }
}
