//! Tradepost node: wires storage, the exchange protocol, verification and
//! scoring behind the HTTP API and the WebSocket event stream.
//!
//! The node:
//! - Opens and migrates the LMDB environment
//! - Holds the token signing key
//! - Sweeps expired nonces in the background
//! - Serves the HTTP API and, optionally, WebSocket events and metrics

pub mod config;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod node;
pub mod shutdown;

pub use config::NodeConfig;
pub use error::NodeError;
pub use logging::{init_logging, LogFormat};
pub use metrics::NodeMetrics;
pub use node::TradepostNode;
pub use shutdown::ShutdownController;
