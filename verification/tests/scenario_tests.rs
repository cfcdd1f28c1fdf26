//! Scoring follows verification changes made after the trades it counts.

use std::sync::Arc;

use tradepost_crypto::{SigningKey, TokenSigner};
use tradepost_exchange::{StaticCatalog, TokenIssuer, TradeExecutor};
use tradepost_nullables::{NullClock, NullNotifier, NullStore};
use tradepost_store::{ExchangeStore, Identity, IdentityStore, TradeStore};
use tradepost_types::{AssetIndex, ExchangeParams, GeoPoint, Handle, Timestamp};
use tradepost_verification::{ScoringEngine, VerificationEngine};

fn h(s: &str) -> Handle {
    Handle::parse(s).unwrap()
}

#[test]
fn later_verification_scores_earlier_trade() {
    let store = Arc::new(NullStore::new());
    let clock = Arc::new(NullClock::new(1_000_000));
    let notifier = Arc::new(NullNotifier::new());
    let signer = Arc::new(TokenSigner::new(SigningKey::generate()));
    let params = ExchangeParams::default();

    let mut txn = store.write_txn().unwrap();
    txn.put_identity(&Identity::new(h("a"), Some(AssetIndex::new(10)), Timestamp::EPOCH))
        .unwrap();
    txn.put_identity(&Identity::new(h("b"), Some(AssetIndex::new(42)), Timestamp::EPOCH))
        .unwrap();
    txn.commit().unwrap();

    let issuer = TokenIssuer::new(store.clone(), signer.clone(), clock.clone(), params.clone());
    let executor = TradeExecutor::new(
        store.clone(),
        signer,
        clock.clone(),
        params,
        Arc::new(StaticCatalog::numbered(100)),
        notifier.clone(),
    );
    let verification = VerificationEngine::new(store.clone(), clock.clone(), notifier.clone());
    let scoring = ScoringEngine::new(store.clone());

    verification.verify(&h("b"), "authority").unwrap();

    let here = GeoPoint::new(35.6762, 139.6503).unwrap();
    let issued = issuer.issue(&h("a"), Some(here)).unwrap();
    clock.advance_secs(5);
    executor.redeem(&issued.token, &h("b"), Some(here)).unwrap();

    assert_eq!(store.get_identity(&h("a")).unwrap().asset_index, Some(AssetIndex::new(42)));
    assert_eq!(store.get_identity(&h("b")).unwrap().asset_index, Some(AssetIndex::new(10)));
    assert_eq!(store.trade_count().unwrap(), 1);
    assert_eq!(scoring.points(&h("a")).unwrap(), 0);
    // b is verified but a is not yet, so b has no verified counterparty
    assert_eq!(scoring.points(&h("b")).unwrap(), 0);

    verification.verify(&h("a"), "authority").unwrap();

    assert_eq!(scoring.points(&h("a")).unwrap(), 1);
    assert_eq!(scoring.points(&h("b")).unwrap(), 1);
    assert_eq!(store.trade_count().unwrap(), 1);
    assert_eq!(scoring.rank_of(&h("a")).unwrap(), 1);

    let board = scoring.leaderboard(10, 0).unwrap();
    assert_eq!(board.total, 2);
    assert!(board.entries.iter().all(|e| e.rank == 1 && e.points == 1));

    let topics: Vec<&str> = notifier.events().iter().map(|e| e.topic()).collect();
    assert_eq!(topics, vec!["verification", "trades", "verification"]);
}
