//! WebSocket server for real-time updates.
//!
//! Clients can subscribe to:
//! - Completed trades (`trades`)
//! - Identity verifications (`verification`)
//!
//! Either subscription can be narrowed to a set of handles. The shared
//! [`WsState`] is also the protocol's notification sink.

pub mod server;
pub mod subscriptions;

pub use server::{WebSocketServer, WsState};
pub use subscriptions::{SubscriptionFilter, SubscriptionTopic};
