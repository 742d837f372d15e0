//! Event Router
//!
//! Decides who receives what for each hub-level event. The router is pure:
//! it takes the event and the current membership and returns addressed
//! deliveries, leaving the actual sending to the hub.

use super::messages::ServerMessage;
use super::registry::ConnectionId;

/// Default notification preview length, in characters
pub const DEFAULT_PREVIEW_LENGTH: usize = 50;

/// A validated chat message
#[derive(Debug, Clone, PartialEq)]
pub struct ChatMessage {
    pub sender_id: ConnectionId,
    pub text: String,
}

impl ChatMessage {
    /// Build a chat message, rejecting text that is empty after trimming.
    ///
    /// The text itself is kept as received.
    pub fn new(sender_id: ConnectionId, text: impl Into<String>) -> Option<Self> {
        let text = text.into();
        if text.trim().is_empty() {
            return None;
        }
        Some(Self { sender_id, text })
    }
}

/// Hub-level event to be routed
#[derive(Debug, Clone)]
pub enum RouteEvent {
    /// A connection joined; membership already includes it
    Joined(ConnectionId),
    /// A chat message was received
    Chat(ChatMessage),
    /// A connection left; membership no longer includes it
    Left(ConnectionId),
}

/// One message addressed to one connection
#[derive(Debug, Clone, PartialEq)]
pub struct Delivery {
    pub target: ConnectionId,
    pub message: ServerMessage,
}

impl Delivery {
    fn new(target: &ConnectionId, message: ServerMessage) -> Self {
        Self {
            target: target.clone(),
            message,
        }
    }
}

/// Computes recipient sets and payloads
#[derive(Debug, Clone)]
pub struct EventRouter {
    preview_length: usize,
}

impl Default for EventRouter {
    fn default() -> Self {
        Self::new(DEFAULT_PREVIEW_LENGTH)
    }
}

impl EventRouter {
    pub fn new(preview_length: usize) -> Self {
        Self { preview_length }
    }

    pub fn preview_length(&self) -> usize {
        self.preview_length
    }

    /// Route an event against the current membership.
    ///
    /// Deliveries come back in send order:
    /// - `Joined`: snapshot to the joiner, then `user_connected` to everyone else
    /// - `Chat`: relay pass (sender excluded), then notification pass (sender included)
    /// - `Left`: `user_disconnected` to every remaining member
    pub fn route(&self, event: &RouteEvent, members: &[ConnectionId]) -> Vec<Delivery> {
        match event {
            RouteEvent::Joined(id) => {
                let mut deliveries = Vec::with_capacity(members.len());
                deliveries.push(Delivery::new(
                    id,
                    ServerMessage::UsersList {
                        users: members.to_vec(),
                    },
                ));
                deliveries.extend(members.iter().filter(|m| *m != id).map(|m| {
                    Delivery::new(m, ServerMessage::UserConnected { id: id.clone() })
                }));
                deliveries
            }
            RouteEvent::Chat(chat) => {
                let relay = ServerMessage::Chat {
                    message: chat.text.clone(),
                    sender_id: Some(chat.sender_id.clone()),
                };
                let notification = self.notification(chat);

                let mut deliveries = Vec::with_capacity(members.len() * 2);
                deliveries.extend(
                    members
                        .iter()
                        .filter(|m| **m != chat.sender_id)
                        .map(|m| Delivery::new(m, relay.clone())),
                );
                deliveries.extend(
                    members
                        .iter()
                        .map(|m| Delivery::new(m, notification.clone())),
                );
                deliveries
            }
            RouteEvent::Left(id) => members
                .iter()
                .map(|m| Delivery::new(m, ServerMessage::UserDisconnected { id: id.clone() }))
                .collect(),
        }
    }

    fn notification(&self, chat: &ChatMessage) -> ServerMessage {
        let (preview, truncated) = truncate_chars(&chat.text, self.preview_length);
        ServerMessage::Notification {
            sender_id: chat.sender_id.clone(),
            sender_name: chat.sender_id.short().to_string(),
            preview: preview.to_string(),
            truncated,
        }
    }
}

/// Cut `text` to at most `max` characters without splitting a character
fn truncate_chars(text: &str, max: usize) -> (&str, bool) {
    match text.char_indices().nth(max) {
        Some((idx, _)) => (&text[..idx], true),
        None => (text, false),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> ConnectionId {
        ConnectionId::from(s)
    }

    fn targets(deliveries: &[Delivery]) -> Vec<&str> {
        deliveries.iter().map(|d| d.target.as_str()).collect()
    }

    #[test]
    fn test_blank_text_is_rejected() {
        assert!(ChatMessage::new(id("a"), "").is_none());
        assert!(ChatMessage::new(id("a"), "   ").is_none());
        assert!(ChatMessage::new(id("a"), "\n\t ").is_none());

        let msg = ChatMessage::new(id("a"), "  hi  ").unwrap();
        assert_eq!(msg.text, "  hi  ");
    }

    #[test]
    fn test_join_routing() {
        let router = EventRouter::default();
        let members = vec![id("a"), id("b"), id("c")];
        let deliveries = router.route(&RouteEvent::Joined(id("c")), &members);

        assert_eq!(targets(&deliveries), vec!["c", "a", "b"]);
        assert_eq!(
            deliveries[0].message,
            ServerMessage::UsersList {
                users: members.clone()
            }
        );
        for delivery in &deliveries[1..] {
            assert_eq!(delivery.message, ServerMessage::UserConnected { id: id("c") });
        }
    }

    #[test]
    fn test_first_join_only_gets_snapshot() {
        let router = EventRouter::default();
        let deliveries = router.route(&RouteEvent::Joined(id("a")), &[id("a")]);

        assert_eq!(deliveries.len(), 1);
        assert_eq!(
            deliveries[0].message,
            ServerMessage::UsersList { users: vec![id("a")] }
        );
    }

    #[test]
    fn test_chat_routing_relay_then_notification() {
        let router = EventRouter::default();
        let members = vec![id("a"), id("b"), id("c")];
        let chat = ChatMessage::new(id("b"), "hello").unwrap();
        let deliveries = router.route(&RouteEvent::Chat(chat), &members);

        assert_eq!(targets(&deliveries), vec!["a", "c", "a", "b", "c"]);

        for delivery in &deliveries[..2] {
            assert_eq!(
                delivery.message,
                ServerMessage::Chat {
                    message: "hello".to_string(),
                    sender_id: Some(id("b")),
                }
            );
        }
        for delivery in &deliveries[2..] {
            assert!(matches!(
                &delivery.message,
                ServerMessage::Notification { sender_id, preview, truncated: false, .. }
                    if sender_id == &id("b") && preview == "hello"
            ));
        }
    }

    #[test]
    fn test_sender_never_gets_own_relay() {
        let router = EventRouter::default();
        let members = vec![id("a"), id("b")];
        let chat = ChatMessage::new(id("a"), "hi").unwrap();
        let deliveries = router.route(&RouteEvent::Chat(chat), &members);

        let to_sender: Vec<_> = deliveries.iter().filter(|d| d.target == id("a")).collect();
        assert_eq!(to_sender.len(), 1);
        assert!(matches!(to_sender[0].message, ServerMessage::Notification { .. }));
    }

    #[test]
    fn test_truncation_only_affects_preview() {
        let router = EventRouter::new(50);
        let text = "x".repeat(200);
        let chat = ChatMessage::new(id("a"), text.clone()).unwrap();
        let deliveries = router.route(&RouteEvent::Chat(chat), &[id("a"), id("b")]);

        match &deliveries[0].message {
            ServerMessage::Chat { message, .. } => assert_eq!(message.len(), 200),
            other => panic!("Expected Chat, got {:?}", other),
        }
        match &deliveries[1].message {
            ServerMessage::Notification {
                preview, truncated, ..
            } => {
                assert_eq!(preview.chars().count(), 50);
                assert!(*truncated);
            }
            other => panic!("Expected Notification, got {:?}", other),
        }
    }

    #[test]
    fn test_truncation_respects_char_boundaries() {
        assert_eq!(truncate_chars("héllo wörld", 4), ("héll", true));
        assert_eq!(truncate_chars("短い", 5), ("短い", false));
        assert_eq!(truncate_chars("abc", 3), ("abc", false));
    }

    #[test]
    fn test_notification_sender_name() {
        let router = EventRouter::default();
        let sender = id("0123456789abcdef");
        let chat = ChatMessage::new(sender.clone(), "hey").unwrap();
        let deliveries = router.route(&RouteEvent::Chat(chat), &[sender]);

        match &deliveries[0].message {
            ServerMessage::Notification { sender_name, .. } => assert_eq!(sender_name, "01234567"),
            other => panic!("Expected Notification, got {:?}", other),
        }
    }

    #[test]
    fn test_leave_routing() {
        let router = EventRouter::default();
        let remaining = vec![id("b"), id("c")];
        let deliveries = router.route(&RouteEvent::Left(id("a")), &remaining);

        assert_eq!(targets(&deliveries), vec!["b", "c"]);
        for delivery in &deliveries {
            assert_eq!(delivery.message, ServerMessage::UserDisconnected { id: id("a") });
        }
    }

    #[test]
    fn test_leave_with_no_remaining_members() {
        let router = EventRouter::default();
        assert!(router.route(&RouteEvent::Left(id("a")), &[]).is_empty());
    }
}
