//! Tradepost daemon: entry point for running a Tradepost node.

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;

use tradepost_crypto::SigningKey;
use tradepost_node::{init_logging, LogFormat, NodeConfig, TradepostNode};

#[derive(Parser)]
#[command(name = "tradepost-daemon", about = "Tradepost exchange node daemon")]
struct Cli {
    /// Path to a TOML configuration file. File settings are the base;
    /// CLI flags and env vars override them.
    #[arg(long, env = "TRADEPOST_CONFIG")]
    config: Option<PathBuf>,

    /// Data directory for LMDB storage.
    #[arg(long, env = "TRADEPOST_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Enable or disable the HTTP API.
    #[arg(long, env = "TRADEPOST_ENABLE_RPC")]
    rpc: Option<bool>,

    #[arg(long, env = "TRADEPOST_RPC_PORT")]
    rpc_port: Option<u16>,

    /// Enable the WebSocket event stream.
    #[arg(long, env = "TRADEPOST_ENABLE_WEBSOCKET")]
    websocket: bool,

    #[arg(long, env = "TRADEPOST_WS_PORT")]
    websocket_port: Option<u16>,

    /// Enable the Prometheus metrics endpoint.
    #[arg(long, env = "TRADEPOST_ENABLE_METRICS")]
    metrics: bool,

    /// Token lifetime in seconds.
    #[arg(long, env = "TRADEPOST_TOKEN_TTL_SECS")]
    token_ttl_secs: Option<u64>,

    /// Maximum trade distance in meters.
    #[arg(long, env = "TRADEPOST_PROXIMITY_THRESHOLD_M")]
    proximity_threshold_m: Option<f64>,

    #[arg(long, env = "TRADEPOST_SWEEP_INTERVAL_SECS")]
    sweep_interval_secs: Option<u64>,

    #[arg(long, env = "TRADEPOST_CATALOG_SIZE")]
    catalog_size: Option<u32>,

    /// Trusted verifier references (comma-separated).
    #[arg(long, env = "TRADEPOST_TRUSTED_VERIFIERS", value_delimiter = ',')]
    trusted_verifiers: Vec<String>,

    /// Hex-encoded token signing key.
    #[arg(long, env = "TRADEPOST_SIGNING_KEY", hide_env_values = true)]
    signing_key: Option<String>,

    /// Log format: "human" or "json".
    #[arg(long, env = "TRADEPOST_LOG_FORMAT")]
    log_format: Option<String>,

    /// Log level: "trace", "debug", "info", "warn", "error".
    #[arg(long, env = "TRADEPOST_LOG_LEVEL")]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand)]
enum Command {
    /// Node operations.
    #[command(name = "node")]
    Node {
        #[command(subcommand)]
        action: NodeAction,
    },
    /// Print the effective configuration as TOML.
    #[command(name = "config")]
    Config,
    /// Generate a signing key and print it as hex.
    #[command(name = "keygen")]
    Keygen,
}

#[derive(clap::Subcommand)]
enum NodeAction {
    /// Run the node.
    Run,
}

impl Cli {
    /// Layer flags and env vars over the file config (or defaults).
    fn into_config(self) -> anyhow::Result<(NodeConfig, Command)> {
        let mut config = match &self.config {
            Some(path) => NodeConfig::from_toml_file(path)
                .with_context(|| format!("failed to load config from {}", path.display()))?,
            None => NodeConfig::default(),
        };

        if let Some(dir) = self.data_dir {
            config.data_dir = dir;
        }
        if let Some(rpc) = self.rpc {
            config.enable_rpc = rpc;
        }
        if let Some(port) = self.rpc_port {
            config.rpc_port = port;
        }
        config.enable_websocket |= self.websocket;
        if let Some(port) = self.websocket_port {
            config.websocket_port = port;
        }
        config.enable_metrics |= self.metrics;
        if let Some(ttl) = self.token_ttl_secs {
            config.token_ttl_secs = ttl;
        }
        if let Some(threshold) = self.proximity_threshold_m {
            config.proximity_threshold_m = threshold;
        }
        if let Some(interval) = self.sweep_interval_secs {
            config.sweep_interval_secs = interval;
        }
        if let Some(size) = self.catalog_size {
            config.catalog_size = size;
        }
        if !self.trusted_verifiers.is_empty() {
            config.trusted_verifiers = self.trusted_verifiers;
        }
        if self.signing_key.is_some() {
            config.signing_key_hex = self.signing_key;
        }
        if let Some(format) = self.log_format {
            config.log_format = format;
        }
        if let Some(level) = self.log_level {
            config.log_level = level;
        }

        config.validate()?;
        Ok((config, self.command))
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let (config, command) = Cli::parse().into_config()?;

    match command {
        Command::Config => {
            let redacted = NodeConfig {
                signing_key_hex: config.signing_key_hex.as_ref().map(|_| "<redacted>".into()),
                ..config
            };
            print!("{}", redacted.to_toml_string()?);
        }
        Command::Keygen => {
            println!("{}", SigningKey::generate().to_secret_hex());
        }
        Command::Node {
            action: NodeAction::Run,
        } => {
            let format: LogFormat = config
                .log_format
                .parse()
                .map_err(|e: String| anyhow::anyhow!(e))?;
            init_logging(format, &config.log_level);

            tracing::info!(
                "Starting Tradepost node (RPC:{}, WS:{}, metrics:{})",
                if config.enable_rpc {
                    config.rpc_port.to_string()
                } else {
                    "off".into()
                },
                if config.enable_websocket {
                    config.websocket_port.to_string()
                } else {
                    "off".into()
                },
                config.enable_metrics,
            );

            let mut node = TradepostNode::new(config).context("failed to open node")?;
            node.run().await?;
        }
    }

    Ok(())
}
