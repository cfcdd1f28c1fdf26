//! WebSocket server implementation.
//!
//! Accepts WebSocket connections at `/ws` and allows clients to subscribe
//! to the `trades` and `verification` topics. Events are delivered via
//! broadcast channels and filtered per-client by handle.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::ws::{Message, WebSocket, WebSocketUpgrade},
    extract::State,
    response::IntoResponse,
    routing::get,
    Router,
};
use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};
use serde::Serialize;
use tokio::sync::{broadcast, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use tradepost_exchange::{ExchangeEvent, NotificationSink, NotifyError};
use tradepost_types::Timestamp;

use crate::subscriptions::{
    ClientMessage, ClientSubscriptions, ServerMessage, SubscriptionEvent, SubscriptionFilter,
    SubscriptionTopic,
};

type WsSender = Arc<Mutex<SplitSink<WebSocket, Message>>>;

/// Shared state for the WebSocket server, holding one broadcast channel
/// per topic.
pub struct WsState {
    pub trades_tx: broadcast::Sender<String>,
    pub verification_tx: broadcast::Sender<String>,
}

impl WsState {
    /// Create a new `WsState` with the given channel capacity for each topic.
    pub fn new(channel_capacity: usize) -> Self {
        let (trades_tx, _) = broadcast::channel(channel_capacity);
        let (verification_tx, _) = broadcast::channel(channel_capacity);
        Self {
            trades_tx,
            verification_tx,
        }
    }

    pub fn sender_for(&self, topic: &SubscriptionTopic) -> &broadcast::Sender<String> {
        match topic {
            SubscriptionTopic::Trades => &self.trades_tx,
            SubscriptionTopic::Verification => &self.verification_tx,
        }
    }

    /// Number of connected forwarders across all topics.
    pub fn subscriber_count(&self) -> usize {
        self.trades_tx.receiver_count() + self.verification_tx.receiver_count()
    }
}

impl NotificationSink for WsState {
    fn publish(&self, event: &ExchangeEvent) -> Result<(), NotifyError> {
        let topic = SubscriptionTopic::from_name(event.topic())
            .ok_or_else(|| NotifyError::Rejected(format!("unknown topic {}", event.topic())))?;
        let data =
            serde_json::to_value(event).map_err(|e| NotifyError::Rejected(e.to_string()))?;
        let envelope = SubscriptionEvent {
            topic: topic.as_str().to_string(),
            data,
            timestamp: Timestamp::now().as_millis(),
            handles: event.handles().into_iter().map(|h| h.to_string()).collect(),
        };
        let text = to_json(&envelope);
        // A send error only means nobody is listening right now.
        if self.sender_for(&topic).send(text).is_err() {
            debug!(%topic, "no websocket subscribers");
        }
        Ok(())
    }
}

/// The WebSocket server, configured with a port and shared state.
pub struct WebSocketServer {
    pub port: u16,
    pub state: Arc<WsState>,
}

impl WebSocketServer {
    /// Create a new server with a default channel capacity of 256.
    pub fn new(port: u16) -> Self {
        Self {
            port,
            state: Arc::new(WsState::new(256)),
        }
    }

    pub fn with_state(port: u16, state: Arc<WsState>) -> Self {
        Self { port, state }
    }

    pub fn router(&self) -> Router {
        Router::new()
            .route("/ws", get(ws_handler))
            .with_state(self.state.clone())
    }

    /// Listen for WebSocket connections until `shutdown` fires.
    pub async fn start(&self, mut shutdown: broadcast::Receiver<()>) -> std::io::Result<()> {
        let addr = SocketAddr::from(([0, 0, 0, 0], self.port));
        let listener = tokio::net::TcpListener::bind(addr).await?;
        info!("WebSocket server listening on {}", listener.local_addr()?);
        axum::serve(listener, self.router())
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
            })
            .await
    }
}

async fn ws_handler(ws: WebSocketUpgrade, State(state): State<Arc<WsState>>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Handle a single WebSocket connection.
///
/// Each active subscription owns a forwarder task reading the topic's
/// broadcast channel. All forwarders are aborted on disconnect.
async fn handle_socket(socket: WebSocket, state: Arc<WsState>) {
    let (ws_sender, mut ws_receiver) = socket.split();
    let ws_sender: WsSender = Arc::new(Mutex::new(ws_sender));

    let mut client_subs = ClientSubscriptions::new();
    let mut forwarders: HashMap<SubscriptionTopic, JoinHandle<()>> = HashMap::new();

    debug!("websocket client connected");

    while let Some(msg_result) = ws_receiver.next().await {
        let msg = match msg_result {
            Ok(msg) => msg,
            Err(e) => {
                warn!("WebSocket receive error: {}", e);
                break;
            }
        };

        match msg {
            Message::Text(text) => {
                handle_text_message(&text, &state, &mut client_subs, &mut forwarders, &ws_sender)
                    .await;
            }
            Message::Close(_) => break,
            Message::Ping(data) => {
                let mut sender = ws_sender.lock().await;
                let _ = sender.send(Message::Pong(data)).await;
            }
            _ => {}
        }
    }

    for (topic, handle) in forwarders.drain() {
        debug!("aborting forwarder for topic {}", topic);
        handle.abort();
    }
    debug!("websocket client disconnected");
}

async fn handle_text_message(
    text: &str,
    state: &Arc<WsState>,
    client_subs: &mut ClientSubscriptions,
    forwarders: &mut HashMap<SubscriptionTopic, JoinHandle<()>>,
    ws_sender: &WsSender,
) {
    let reply = match serde_json::from_str::<ClientMessage>(text) {
        Err(e) => ServerMessage::Error {
            message: format!("Invalid message: {}", e),
        },
        Ok(ClientMessage::Subscribe { topic, filter }) => {
            if let Some(handle) = forwarders.remove(&topic) {
                handle.abort();
            }
            client_subs.subscribe(topic, filter.clone());

            let rx = state.sender_for(&topic).subscribe();
            let sender = ws_sender.clone();
            forwarders.insert(
                topic,
                tokio::spawn(forward_events(rx, sender, topic, filter)),
            );
            debug!("client subscribed to {}", topic);
            ServerMessage::Ack {
                action: "subscribe".to_string(),
                topic,
            }
        }
        Ok(ClientMessage::Unsubscribe { topic }) => {
            let was_subscribed = client_subs.unsubscribe(&topic);
            if let Some(handle) = forwarders.remove(&topic) {
                handle.abort();
            }
            if was_subscribed {
                ServerMessage::Ack {
                    action: "unsubscribe".to_string(),
                    topic,
                }
            } else {
                ServerMessage::Error {
                    message: format!("Not subscribed to {}", topic),
                }
            }
        }
        Ok(ClientMessage::Ping) => ServerMessage::Pong,
    };

    let mut sender = ws_sender.lock().await;
    let _ = sender.send(Message::Text(to_json(&reply))).await;
}

/// Reads events from a broadcast receiver and sends the matching ones to
/// the client.
async fn forward_events(
    mut rx: broadcast::Receiver<String>,
    ws_sender: WsSender,
    topic: SubscriptionTopic,
    filter: Option<SubscriptionFilter>,
) {
    let mut matcher = ClientSubscriptions::new();
    matcher.subscribe(topic, filter);

    loop {
        match rx.recv().await {
            Ok(event_str) => {
                let should_send = match serde_json::from_str::<SubscriptionEvent>(&event_str) {
                    Ok(event) => matcher.matches_filter(&topic, &event),
                    Err(_) => true,
                };
                if should_send {
                    let mut sender = ws_sender.lock().await;
                    if sender.send(Message::Text(event_str)).await.is_err() {
                        break;
                    }
                }
            }
            Err(broadcast::error::RecvError::Lagged(n)) => {
                warn!("client lagged behind by {} events on topic {}", n, topic);
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}

fn to_json<T: Serialize>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_else(|e| {
        warn!(error = %e, "failed to serialize websocket message");
        String::from("{}")
    })
}
