//! WebSocket Message Types
//!
//! Defines all message types exchanged between chat clients and the hub.

use serde::{Deserialize, Serialize};

use super::registry::ConnectionId;

/// Messages sent from client to server
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// A chat message for the room
    Message {
        /// Message text as typed by the user
        text: String,
    },
    /// Acknowledgment of the server greeting
    Ack(AckPayload),
    /// Ping for keepalive
    Ping,
}

/// Body of a handshake acknowledgment
///
/// Every field is optional on the wire; validation happens in the handshake
/// module so that a malformed ack is logged rather than rejected as an
/// unparseable frame.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AckPayload {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    /// RFC 3339 string or Unix milliseconds
    #[serde(default)]
    pub timestamp: Option<serde_json::Value>,
}

/// Messages sent from server to client
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Full presence snapshot, sent once to a newly joined connection
    UsersList {
        users: Vec<ConnectionId>,
    },
    /// Another connection joined
    UserConnected {
        id: ConnectionId,
    },
    /// A connection left
    UserDisconnected {
        id: ConnectionId,
    },
    /// Chat text. `sender_id` is absent for server-originated text such as
    /// the welcome message.
    Chat {
        message: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        sender_id: Option<ConnectionId>,
    },
    /// "New message" notification, delivered to every participant
    Notification {
        sender_id: ConnectionId,
        /// Short display label of the sender
        sender_name: String,
        /// Message text cut to the configured preview length
        preview: String,
        /// Whether `preview` is shorter than the full message text
        truncated: bool,
    },
    /// Handshake greeting; the client is expected to reply with an ack
    Greeting {
        text: String,
    },
    /// Pong response to ping
    Pong,
    /// Error message
    Error {
        message: String,
    },
}

impl ServerMessage {
    /// Senderless chat text
    pub fn server_text(message: impl Into<String>) -> Self {
        Self::Chat {
            message: message.into(),
            sender_id: None,
        }
    }
}
