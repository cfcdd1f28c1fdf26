//! HTTP API for the Tradepost node.
//!
//! Provides endpoints for:
//! - Identity registration and lookup
//! - Exchange token issuance and redemption
//! - Verification by a trusted authority
//! - Points, rank, trade history and the leaderboard
//! - Health and Prometheus metrics

pub mod error;
pub mod handlers;
pub mod pagination;
pub mod server;
pub mod state;

pub use error::RpcError;
pub use server::{router, RpcServer};
pub use state::{AppState, RpcMetrics};
