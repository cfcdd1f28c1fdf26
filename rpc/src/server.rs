//! Axum-based HTTP server.

use std::net::SocketAddr;

use axum::routing::{get, post};
use axum::Router;
use tokio::sync::broadcast;
use tower_http::cors::CorsLayer;
use tracing::info;

use crate::handlers;
use crate::state::AppState;

/// Build the API router. `/metrics` is mounted only when the state carries
/// a metrics registry.
pub fn router(state: AppState) -> Router {
    let mut app = Router::new()
        .route("/health", get(handlers::health))
        .route("/identities", post(handlers::register))
        .route("/identities/:handle", get(handlers::get_identity))
        .route("/identities/:handle/verify", post(handlers::verify))
        .route("/identities/:handle/points", get(handlers::points))
        .route("/identities/:handle/rank", get(handlers::rank))
        .route("/identities/:handle/trades", get(handlers::trades))
        .route("/tokens", post(handlers::issue_token))
        .route("/tokens/redeem", post(handlers::redeem_token))
        .route("/leaderboard", get(handlers::leaderboard));
    if state.metrics.is_some() {
        app = app.route("/metrics", get(handlers::metrics));
    }
    app.layer(CorsLayer::permissive()).with_state(state)
}

pub struct RpcServer {
    pub port: u16,
    pub state: AppState,
}

impl RpcServer {
    pub fn new(port: u16, state: AppState) -> Self {
        Self { port, state }
    }

    /// Serve the API until `shutdown` fires.
    pub async fn start(&self, mut shutdown: broadcast::Receiver<()>) -> std::io::Result<()> {
        let addr = SocketAddr::from(([0, 0, 0, 0], self.port));
        let listener = tokio::net::TcpListener::bind(addr).await?;
        info!("RPC server listening on {}", listener.local_addr()?);
        axum::serve(listener, router(self.state.clone()))
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
            })
            .await
    }
}
