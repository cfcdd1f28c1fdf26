//! The Tradepost node: storage, protocol services and their servers.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;

use tradepost_crypto::{SigningKey, TokenSigner};
use tradepost_exchange::{LogSink, NotificationSink, StaticCatalog};
use tradepost_rpc::{AppState, RpcServer};
use tradepost_store::{ExchangeStore, IdentityStore, NonceStore, TradeStore};
use tradepost_store_lmdb::integrity::{check_data_dir, check_integrity};
use tradepost_store_lmdb::migration::Migrator;
use tradepost_store_lmdb::LmdbEnvironment;
use tradepost_types::{Clock, SystemClock};
use tradepost_websocket::{WebSocketServer, WsState};

use crate::config::NodeConfig;
use crate::error::NodeError;
use crate::metrics::NodeMetrics;
use crate::shutdown::ShutdownController;

/// How long `stop` waits for background tasks.
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(10);

/// Per-topic buffer of the WebSocket broadcast channels.
const WS_CHANNEL_CAPACITY: usize = 256;

pub struct TradepostNode {
    pub config: NodeConfig,
    pub store: Arc<LmdbEnvironment>,
    /// Handler state shared by every HTTP route.
    pub api: AppState,
    pub ws_state: Arc<WsState>,
    pub metrics: Arc<NodeMetrics>,
    pub shutdown: Arc<ShutdownController>,
    clock: Arc<dyn Clock>,
    task_handles: Vec<JoinHandle<()>>,
}

impl TradepostNode {
    /// Open storage at `config.data_dir` and wire the protocol services
    /// with the system clock.
    pub fn new(config: NodeConfig) -> Result<Self, NodeError> {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    pub fn with_clock(config: NodeConfig, clock: Arc<dyn Clock>) -> Result<Self, NodeError> {
        config.validate()?;
        check_data_dir(&config.data_dir).map_err(NodeError::DataDir)?;

        let store = Arc::new(LmdbEnvironment::open_default(&config.data_dir)?);
        Migrator::run(&*store)?;

        let report = check_integrity(store.env())?;
        if !report.is_healthy() {
            return Err(NodeError::Integrity(report.errors.join("; ")));
        }
        tracing::info!(
            databases = report.databases_checked,
            entries = report.total_entries,
            "storage integrity check passed"
        );

        let key = match config.signing_key()? {
            Some(key) => key,
            None => {
                tracing::warn!(
                    "no signing key configured; generated an ephemeral key, \
                     tokens will not survive a restart"
                );
                SigningKey::generate()
            }
        };
        let signer = Arc::new(TokenSigner::new(key));

        let metrics = Arc::new(NodeMetrics::new()?);
        let ws_state = Arc::new(WsState::new(WS_CHANNEL_CAPACITY));
        let sink: Arc<dyn NotificationSink> = if config.enable_websocket {
            ws_state.clone()
        } else {
            Arc::new(LogSink)
        };

        let exchange_store: Arc<dyn ExchangeStore> = store.clone();
        let mut api = AppState::new(
            exchange_store,
            signer,
            clock.clone(),
            config.exchange_params(),
            Arc::new(StaticCatalog::numbered(config.catalog_size)),
            sink,
        )
        .with_trusted_verifiers(config.trusted_verifiers.clone());
        if config.enable_metrics {
            api = api.with_metrics(metrics.clone());
        }

        Ok(Self {
            config,
            store,
            api,
            ws_state,
            metrics,
            shutdown: Arc::new(ShutdownController::new()),
            clock,
            task_handles: Vec::new(),
        })
    }

    /// Remove expired nonce records now. Returns how many were removed.
    pub fn sweep_once(&self) -> Result<u64, NodeError> {
        let removed = self.store.sweep_expired(self.clock.now())?;
        self.metrics.nonces_swept.inc_by(removed);
        Ok(removed)
    }

    /// Spawn the sweep task and the enabled servers.
    pub fn start(&mut self) -> Result<(), NodeError> {
        tracing::info!(
            data_dir = %self.store.path().display(),
            identities = self.store.identity_count()?,
            trades = self.store.trade_count()?,
            pending_nonces = self.store.nonce_count()?,
            "Tradepost node starting"
        );

        // ── Expired nonce sweep ──────────────────────────────────────────
        let store = Arc::clone(&self.store);
        let clock = Arc::clone(&self.clock);
        let metrics = Arc::clone(&self.metrics);
        let interval_secs = self.config.sweep_interval_secs;
        let mut shutdown_rx_sweep = self.shutdown.subscribe();

        let sweep_handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(interval_secs));
            loop {
                tokio::select! {
                    biased;
                    _ = shutdown_rx_sweep.recv() => {
                        tracing::info!("nonce sweep task shutting down");
                        break;
                    }
                    _ = interval.tick() => {
                        let store = Arc::clone(&store);
                        let now = clock.now();
                        let swept = tokio::task::spawn_blocking(move || store.sweep_expired(now)).await;
                        match swept {
                            Ok(Ok(0)) => {}
                            Ok(Ok(removed)) => {
                                metrics.nonces_swept.inc_by(removed);
                                tracing::debug!(removed, "swept expired nonces");
                            }
                            Ok(Err(e)) => tracing::warn!("failed to sweep expired nonces: {e}"),
                            Err(e) => tracing::warn!("nonce sweep task panicked: {e}"),
                        }
                    }
                }
            }
        });
        self.task_handles.push(sweep_handle);

        // ── HTTP API (optional) ──────────────────────────────────────────
        if self.config.enable_rpc {
            let rpc_server = RpcServer::new(self.config.rpc_port, self.api.clone());
            let shutdown_rx_rpc = self.shutdown.subscribe();
            let rpc_handle = tokio::spawn(async move {
                match rpc_server.start(shutdown_rx_rpc).await {
                    Ok(()) => tracing::info!("RPC server exited"),
                    Err(e) => tracing::error!("RPC server error: {e}"),
                }
            });
            self.task_handles.push(rpc_handle);
        }

        // ── WebSocket server (optional) ──────────────────────────────────
        if self.config.enable_websocket {
            let ws_server =
                WebSocketServer::with_state(self.config.websocket_port, Arc::clone(&self.ws_state));
            let shutdown_rx_ws = self.shutdown.subscribe();
            let ws_handle = tokio::spawn(async move {
                match ws_server.start(shutdown_rx_ws).await {
                    Ok(()) => tracing::info!("WebSocket server exited"),
                    Err(e) => tracing::error!("WebSocket server error: {e}"),
                }
            });
            self.task_handles.push(ws_handle);
        }

        tracing::info!("Tradepost node started");
        Ok(())
    }

    /// Start, block until SIGINT/SIGTERM, then stop.
    pub async fn run(&mut self) -> Result<(), NodeError> {
        self.start()?;
        self.shutdown.wait_for_signal().await;
        self.stop().await
    }

    /// Stop the node gracefully.
    ///
    /// Signals every background task, flushes LMDB, then waits for the
    /// tasks with a timeout.
    pub async fn stop(&mut self) -> Result<(), NodeError> {
        tracing::info!("Tradepost node stopping");
        self.shutdown.shutdown();

        if let Err(e) = self.store.sync() {
            tracing::warn!("LMDB sync failed: {e}");
        } else {
            tracing::info!("LMDB flushed to disk");
        }

        let handles: Vec<JoinHandle<()>> = self.task_handles.drain(..).collect();
        let wait_all = async {
            for handle in handles {
                let _ = handle.await;
            }
        };
        if tokio::time::timeout(SHUTDOWN_TIMEOUT, wait_all).await.is_err() {
            tracing::warn!(
                "shutdown timeout ({:?}), some tasks may still be running",
                SHUTDOWN_TIMEOUT
            );
        }

        tracing::info!("Tradepost node stopped");
        Ok(())
    }

    pub fn running_tasks(&self) -> usize {
        self.task_handles.iter().filter(|h| !h.is_finished()).count()
    }
}
