//! Subscription management for WebSocket clients.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Available subscription topics.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionTopic {
    /// Completed trades.
    Trades,
    /// Identity verifications.
    Verification,
}

impl SubscriptionTopic {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionTopic::Trades => "trades",
            SubscriptionTopic::Verification => "verification",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "trades" => Some(SubscriptionTopic::Trades),
            "verification" => Some(SubscriptionTopic::Verification),
            _ => None,
        }
    }
}

impl fmt::Display for SubscriptionTopic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Optional filter for subscriptions.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct SubscriptionFilter {
    /// Only receive events concerning these handles.
    pub handles: Option<Vec<String>>,
}

/// Messages a client may send.
#[derive(Clone, Debug, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ClientMessage {
    Subscribe {
        topic: SubscriptionTopic,
        #[serde(default)]
        filter: Option<SubscriptionFilter>,
    },
    Unsubscribe {
        topic: SubscriptionTopic,
    },
    Ping,
}

/// Control messages the server sends back.
#[derive(Clone, Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    Ack {
        action: String,
        topic: SubscriptionTopic,
    },
    Error {
        message: String,
    },
    Pong,
}

/// An event sent to subscribed clients.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SubscriptionEvent {
    pub topic: String,
    pub data: serde_json::Value,
    /// Unix milliseconds at publication.
    pub timestamp: u64,
    /// Handles the event concerns; used for filtering.
    #[serde(default)]
    pub handles: Vec<String>,
}

/// One client's active subscriptions.
#[derive(Debug, Default)]
pub struct ClientSubscriptions {
    topics: HashMap<SubscriptionTopic, Option<SubscriptionFilter>>,
}

impl ClientSubscriptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe, replacing any earlier filter for the topic.
    pub fn subscribe(&mut self, topic: SubscriptionTopic, filter: Option<SubscriptionFilter>) {
        self.topics.insert(topic, filter);
    }

    /// Returns `false` if the client was not subscribed.
    pub fn unsubscribe(&mut self, topic: &SubscriptionTopic) -> bool {
        self.topics.remove(topic).is_some()
    }

    pub fn is_subscribed(&self, topic: &SubscriptionTopic) -> bool {
        self.topics.contains_key(topic)
    }

    /// Whether `event` passes the client's filter for `topic`.
    pub fn matches_filter(&self, topic: &SubscriptionTopic, event: &SubscriptionEvent) -> bool {
        match self.topics.get(topic) {
            None => false,
            Some(None) => true,
            Some(Some(filter)) => match &filter.handles {
                None => true,
                Some(wanted) => event.handles.iter().any(|h| wanted.contains(h)),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(handles: &[&str]) -> SubscriptionEvent {
        SubscriptionEvent {
            topic: "trades".into(),
            data: serde_json::Value::Null,
            timestamp: 0,
            handles: handles.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn client_messages_parse() {
        let msg: ClientMessage = serde_json::from_str(
            r#"{"action":"subscribe","topic":"trades","filter":{"handles":["alice"]}}"#,
        )
        .unwrap();
        assert!(matches!(
            msg,
            ClientMessage::Subscribe { topic: SubscriptionTopic::Trades, filter: Some(_) }
        ));
        let msg: ClientMessage = serde_json::from_str(r#"{"action":"ping"}"#).unwrap();
        assert!(matches!(msg, ClientMessage::Ping));
        assert!(serde_json::from_str::<ClientMessage>(r#"{"action":"subscribe","topic":"blocks"}"#).is_err());
    }

    #[test]
    fn handle_filter() {
        let mut subs = ClientSubscriptions::new();
        subs.subscribe(
            SubscriptionTopic::Trades,
            Some(SubscriptionFilter {
                handles: Some(vec!["alice".into()]),
            }),
        );
        assert!(subs.matches_filter(&SubscriptionTopic::Trades, &event(&["bob", "alice"])));
        assert!(!subs.matches_filter(&SubscriptionTopic::Trades, &event(&["bob", "carol"])));
        assert!(!subs.matches_filter(&SubscriptionTopic::Verification, &event(&["alice"])));

        subs.subscribe(SubscriptionTopic::Verification, None);
        assert!(subs.matches_filter(&SubscriptionTopic::Verification, &event(&["anyone"])));
        assert!(subs.unsubscribe(&SubscriptionTopic::Verification));
        assert!(!subs.unsubscribe(&SubscriptionTopic::Verification));
    }

    #[test]
    fn ack_serializes_with_type_tag() {
        let json = serde_json::to_string(&ServerMessage::Ack {
            action: "subscribe".into(),
            topic: SubscriptionTopic::Trades,
        })
        .unwrap();
        assert_eq!(json, r#"{"type":"ack","action":"subscribe","topic":"trades"}"#);
    }
}
