//! Prometheus metrics for the Tradepost node.
//!
//! [`NodeMetrics`] owns a dedicated [`Registry`] that the HTTP `/metrics`
//! endpoint encodes into the Prometheus text exposition format.

use prometheus::{
    register_int_counter_vec_with_registry, register_int_counter_with_registry, Encoder,
    IntCounter, IntCounterVec, Opts, Registry, TextEncoder,
};

use tradepost_rpc::RpcMetrics;

pub struct NodeMetrics {
    /// The Prometheus registry that owns every metric below.
    pub registry: Registry,

    pub tokens_issued: IntCounter,
    pub trades_completed: IntCounter,
    /// Rejected redemptions, labelled by error code.
    pub redemptions_rejected: IntCounterVec,
    pub nonces_swept: IntCounter,
    /// First-time verifications only.
    pub identities_verified: IntCounter,
}

impl NodeMetrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let tokens_issued = register_int_counter_with_registry!(
            Opts::new("tradepost_tokens_issued_total", "Exchange tokens issued"),
            registry
        )?;
        let trades_completed = register_int_counter_with_registry!(
            Opts::new("tradepost_trades_completed_total", "Trades committed to the ledger"),
            registry
        )?;
        let redemptions_rejected = register_int_counter_vec_with_registry!(
            Opts::new(
                "tradepost_redemptions_rejected_total",
                "Token redemptions rejected, by error code"
            ),
            &["code"],
            registry
        )?;
        let nonces_swept = register_int_counter_with_registry!(
            Opts::new("tradepost_nonces_swept_total", "Expired nonce records removed"),
            registry
        )?;
        let identities_verified = register_int_counter_with_registry!(
            Opts::new(
                "tradepost_identities_verified_total",
                "Identities moved to the verified state"
            ),
            registry
        )?;

        Ok(Self {
            registry,
            tokens_issued,
            trades_completed,
            redemptions_rejected,
            nonces_swept,
            identities_verified,
        })
    }

    /// Encode every registered metric as Prometheus text.
    pub fn encode(&self) -> String {
        let mut buf = Vec::new();
        if let Err(e) = TextEncoder::new().encode(&self.registry.gather(), &mut buf) {
            tracing::warn!("failed to encode metrics: {e}");
        }
        String::from_utf8(buf).unwrap_or_default()
    }
}

impl RpcMetrics for NodeMetrics {
    fn token_issued(&self) {
        self.tokens_issued.inc();
    }

    fn trade_completed(&self) {
        self.trades_completed.inc();
    }

    fn redemption_rejected(&self, code: &str) {
        self.redemptions_rejected.with_label_values(&[code]).inc();
    }

    fn identity_verified(&self) {
        self.identities_verified.inc();
    }

    fn render(&self) -> String {
        self.encode()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_show_up_in_text_output() {
        let metrics = NodeMetrics::new().unwrap();
        metrics.token_issued();
        metrics.redemption_rejected("ReplayOrInvalid");
        metrics.redemption_rejected("ReplayOrInvalid");
        metrics.nonces_swept.inc_by(3);

        let text = metrics.render();
        assert!(text.contains("tradepost_tokens_issued_total 1"));
        assert!(text.contains(r#"tradepost_redemptions_rejected_total{code="ReplayOrInvalid"} 2"#));
        assert!(text.contains("tradepost_nonces_swept_total 3"));
        assert!(text.contains("tradepost_trades_completed_total 0"));
    }
}
