//! Node configuration with TOML file support.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use tradepost_crypto::SigningKey;
use tradepost_types::ExchangeParams;

use crate::NodeError;

/// Configuration for a Tradepost node.
///
/// Can be loaded from a TOML file via [`NodeConfig::from_toml_file`] or
/// built programmatically (e.g. for tests).
#[derive(Clone, Serialize, Deserialize)]
pub struct NodeConfig {
    /// Data directory for LMDB storage.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Whether to enable the HTTP API.
    #[serde(default = "default_true")]
    pub enable_rpc: bool,

    #[serde(default = "default_rpc_port")]
    pub rpc_port: u16,

    /// Whether to enable the WebSocket event stream.
    #[serde(default)]
    pub enable_websocket: bool,

    #[serde(default = "default_ws_port")]
    pub websocket_port: u16,

    /// Whether to serve Prometheus metrics at `/metrics`.
    #[serde(default)]
    pub enable_metrics: bool,

    /// Log format: "human" or "json".
    #[serde(default = "default_log_format")]
    pub log_format: String,

    /// Log level filter: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Lifetime of an exchange token.
    #[serde(default = "default_token_ttl_secs")]
    pub token_ttl_secs: u64,

    /// Maximum distance between the two parties of a trade, in meters.
    #[serde(default = "default_proximity_threshold_m")]
    pub proximity_threshold_m: f64,

    /// How often expired nonces are swept.
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,

    /// Number of assets in the catalog.
    #[serde(default = "default_catalog_size")]
    pub catalog_size: u32,

    /// Verifier references allowed to verify identities. Empty allows any.
    #[serde(default)]
    pub trusted_verifiers: Vec<String>,

    /// Hex-encoded token signing key. An ephemeral key is generated when
    /// absent, which invalidates outstanding tokens on restart.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signing_key_hex: Option<String>,
}

// ── Serde default helpers ──────────────────────────────────────────────

fn default_data_dir() -> PathBuf {
    PathBuf::from("./tradepost_data")
}

fn default_true() -> bool {
    true
}

fn default_rpc_port() -> u16 {
    7380
}

fn default_ws_port() -> u16 {
    7381
}

fn default_log_format() -> String {
    "human".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_token_ttl_secs() -> u64 {
    ExchangeParams::DEFAULT_TOKEN_TTL_SECS
}

fn default_proximity_threshold_m() -> f64 {
    ExchangeParams::DEFAULT_PROXIMITY_THRESHOLD_M
}

fn default_sweep_interval_secs() -> u64 {
    30
}

fn default_catalog_size() -> u32 {
    1000
}

// ── Impl ───────────────────────────────────────────────────────────────

impl NodeConfig {
    /// Load configuration from a TOML file.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, NodeError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| NodeError::Config(e.to_string()))?;
        Self::from_toml_str(&content)
    }

    /// Parse and validate configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, NodeError> {
        let config: Self = toml::from_str(s).map_err(|e| NodeError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize the configuration to a TOML string.
    pub fn to_toml_string(&self) -> Result<String, NodeError> {
        toml::to_string_pretty(self).map_err(|e| NodeError::Config(e.to_string()))
    }

    pub fn validate(&self) -> Result<(), NodeError> {
        if self.token_ttl_secs == 0 {
            return Err(NodeError::Config("token_ttl_secs must be positive".into()));
        }
        if !self.proximity_threshold_m.is_finite() || self.proximity_threshold_m < 0.0 {
            return Err(NodeError::Config(
                "proximity_threshold_m must be a non-negative number".into(),
            ));
        }
        if self.sweep_interval_secs == 0 {
            return Err(NodeError::Config("sweep_interval_secs must be positive".into()));
        }
        if self.catalog_size == 0 {
            return Err(NodeError::Config("catalog_size must be positive".into()));
        }
        Ok(())
    }

    pub fn exchange_params(&self) -> ExchangeParams {
        ExchangeParams {
            token_ttl_secs: self.token_ttl_secs,
            proximity_threshold_m: self.proximity_threshold_m,
        }
    }

    /// The configured signing key, or `None` when one must be generated.
    pub fn signing_key(&self) -> Result<Option<SigningKey>, NodeError> {
        self.signing_key_hex
            .as_deref()
            .map(SigningKey::from_hex)
            .transpose()
            .map_err(NodeError::from)
    }
}

impl std::fmt::Debug for NodeConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NodeConfig")
            .field("data_dir", &self.data_dir)
            .field("enable_rpc", &self.enable_rpc)
            .field("rpc_port", &self.rpc_port)
            .field("enable_websocket", &self.enable_websocket)
            .field("websocket_port", &self.websocket_port)
            .field("enable_metrics", &self.enable_metrics)
            .field("log_format", &self.log_format)
            .field("log_level", &self.log_level)
            .field("token_ttl_secs", &self.token_ttl_secs)
            .field("proximity_threshold_m", &self.proximity_threshold_m)
            .field("sweep_interval_secs", &self.sweep_interval_secs)
            .field("catalog_size", &self.catalog_size)
            .field("trusted_verifiers", &self.trusted_verifiers)
            .field("signing_key_hex", &self.signing_key_hex.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            enable_rpc: default_true(),
            rpc_port: default_rpc_port(),
            enable_websocket: false,
            websocket_port: default_ws_port(),
            enable_metrics: false,
            log_format: default_log_format(),
            log_level: default_log_level(),
            token_ttl_secs: default_token_ttl_secs(),
            proximity_threshold_m: default_proximity_threshold_m(),
            sweep_interval_secs: default_sweep_interval_secs(),
            catalog_size: default_catalog_size(),
            trusted_verifiers: Vec::new(),
            signing_key_hex: None,
        }
    }
}
