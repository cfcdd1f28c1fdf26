//! Exchange parameters supplied by configuration.

use serde::{Deserialize, Serialize};

/// Tunable protocol values.
///
/// These come from the node configuration rather than from tokens, so a
/// client can never widen the proximity limit or extend a token's life.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ExchangeParams {
    /// Lifetime of an issued token in seconds.
    pub token_ttl_secs: u64,

    /// Maximum initiator/confirmer distance in meters (inclusive).
    pub proximity_threshold_m: f64,
}

impl ExchangeParams {
    pub const DEFAULT_TOKEN_TTL_SECS: u64 = 60;
    pub const DEFAULT_PROXIMITY_THRESHOLD_M: f64 = 100.0;
}

impl Default for ExchangeParams {
    fn default() -> Self {
        Self {
            token_ttl_secs: Self::DEFAULT_TOKEN_TTL_SECS,
            proximity_threshold_m: Self::DEFAULT_PROXIMITY_THRESHOLD_M,
        }
    }
}
