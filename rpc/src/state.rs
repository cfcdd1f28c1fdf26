//! Shared handler state.

use std::sync::Arc;

use tradepost_crypto::TokenSigner;
use tradepost_exchange::{
    CatalogResolver, IdentityRegistry, NotificationSink, TokenIssuer, TradeExecutor,
};
use tradepost_store::ExchangeStore;
use tradepost_types::{Clock, ExchangeParams};
use tradepost_verification::{ScoringEngine, VerificationEngine};

/// Counters the API reports into. Implemented by the node's metrics
/// registry.
pub trait RpcMetrics: Send + Sync {
    fn token_issued(&self);
    fn trade_completed(&self);
    fn redemption_rejected(&self, code: &str);
    fn identity_verified(&self);
    /// Prometheus text exposition of the whole registry.
    fn render(&self) -> String;
}

#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<IdentityRegistry>,
    pub issuer: Arc<TokenIssuer>,
    pub executor: Arc<TradeExecutor>,
    pub verification: Arc<VerificationEngine>,
    pub scoring: Arc<ScoringEngine>,
    /// Verifier references allowed to call verify. Empty allows any.
    pub trusted_verifiers: Arc<Vec<String>>,
    pub metrics: Option<Arc<dyn RpcMetrics>>,
}

impl AppState {
    /// Wire every protocol service over one store.
    pub fn new(
        store: Arc<dyn ExchangeStore>,
        signer: Arc<TokenSigner>,
        clock: Arc<dyn Clock>,
        params: ExchangeParams,
        catalog: Arc<dyn CatalogResolver>,
        sink: Arc<dyn NotificationSink>,
    ) -> Self {
        Self {
            registry: Arc::new(IdentityRegistry::new(
                store.clone(),
                catalog.clone(),
                clock.clone(),
            )),
            issuer: Arc::new(TokenIssuer::new(
                store.clone(),
                signer.clone(),
                clock.clone(),
                params.clone(),
            )),
            executor: Arc::new(TradeExecutor::new(
                store.clone(),
                signer,
                clock.clone(),
                params,
                catalog,
                sink.clone(),
            )),
            verification: Arc::new(VerificationEngine::new(store.clone(), clock, sink)),
            scoring: Arc::new(ScoringEngine::new(store)),
            trusted_verifiers: Arc::new(Vec::new()),
            metrics: None,
        }
    }

    pub fn with_trusted_verifiers(mut self, verifiers: Vec<String>) -> Self {
        self.trusted_verifiers = Arc::new(verifiers);
        self
    }

    pub fn with_metrics(mut self, metrics: Arc<dyn RpcMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn is_trusted_verifier(&self, verifier: &str) -> bool {
        self.trusted_verifiers.is_empty()
            || self.trusted_verifiers.iter().any(|v| v == verifier.trim())
    }

    pub(crate) fn record(&self, f: impl FnOnce(&dyn RpcMetrics)) {
        if let Some(metrics) = &self.metrics {
            f(metrics.as_ref());
        }
    }
}
