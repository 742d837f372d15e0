//! Chat Hub
//!
//! Owns the presence registry and the outbound channel of every active
//! connection, and sequences the join / message / leave lifecycle.
//!
//! Each connection moves through `Connecting → Active → Closed`. Every
//! transition runs under one lock, so the registry mutation and the fan-out
//! it triggers are atomic with respect to other events. Sends go onto
//! unbounded per-connection channels and never block the hub.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use thiserror::Error;
use tokio::sync::{mpsc, Mutex};

use super::handshake::{self, Acknowledgment, HandshakeError, HandshakeState};
use super::messages::{AckPayload, ServerMessage};
use super::registry::{ConnectionId, ConnectionRegistry};
use super::router::{ChatMessage, Delivery, EventRouter, RouteEvent, DEFAULT_PREVIEW_LENGTH};

/// Outbound half of a connection as seen by the hub
pub type Outbound = mpsc::UnboundedSender<ServerMessage>;

/// Configuration for the chat hub
#[derive(Debug, Clone, Deserialize)]
pub struct HubConfig {
    /// Maximum number of concurrent connections
    #[serde(default = "default_max_connections")]
    pub max_connections: usize,
    /// Notification preview length, in characters
    #[serde(default = "default_preview_length")]
    pub preview_length: usize,
    /// Senderless text sent to each new connection; an empty string disables it
    #[serde(default = "default_welcome_message")]
    pub welcome_message: Option<String>,
    /// Handshake greeting text
    #[serde(default = "default_greeting")]
    pub greeting: String,
}

fn default_max_connections() -> usize {
    1000
}

fn default_preview_length() -> usize {
    DEFAULT_PREVIEW_LENGTH
}

fn default_welcome_message() -> Option<String> {
    Some("Welcome to Anonymous Chat!".to_string())
}

fn default_greeting() -> String {
    handshake::DEFAULT_GREETING.to_string()
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            max_connections: default_max_connections(),
            preview_length: default_preview_length(),
            welcome_message: default_welcome_message(),
            greeting: default_greeting(),
        }
    }
}

/// Lifecycle state of a connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    /// Identifier assigned, not yet admitted
    Connecting,
    /// Present in the room
    Active,
    /// Disconnected; terminal
    Closed,
}

/// What happened to an inbound chat message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageOutcome {
    /// Routed; counts are deliveries actually enqueued
    Relayed { relayed: usize, notified: usize },
    /// Text was empty after trimming
    Blank,
    /// Sender is not an active connection
    NotActive,
}

/// Point-in-time hub counters
#[derive(Debug, Clone, Serialize)]
pub struct HubStats {
    pub connections: usize,
    pub pending_handshakes: usize,
    pub total_connections: u64,
    pub total_messages: u64,
}

/// Per-connection bookkeeping
struct ConnectionHandle {
    sender: Outbound,
    handshake: HandshakeState,
    connected_at: DateTime<Utc>,
}

#[derive(Default)]
struct HubState {
    registry: ConnectionRegistry,
    connections: HashMap<ConnectionId, ConnectionHandle>,
    /// Ids handed out by `reserve` whose `connect` has not run yet
    reserved: HashSet<ConnectionId>,
    total_connections: u64,
    total_messages: u64,
}

impl HubState {
    /// Enqueue deliveries, returning how many were accepted
    fn dispatch(&self, deliveries: Vec<Delivery>) -> usize {
        let mut sent = 0;
        for delivery in deliveries {
            if self.send(&delivery.target, delivery.message) {
                sent += 1;
            }
        }
        sent
    }

    fn send(&self, target: &ConnectionId, message: ServerMessage) -> bool {
        let Some(handle) = self.connections.get(target) else {
            tracing::debug!(connection_id = %target, "Dropping message for unknown connection");
            return false;
        };
        match handle.sender.send(message) {
            Ok(()) => true,
            Err(_) => {
                tracing::debug!(connection_id = %target, "Connection channel closed, message dropped");
                false
            }
        }
    }
}

/// Real-time chat and presence hub
pub struct ChatHub {
    inner: Mutex<HubState>,
    router: EventRouter,
    config: HubConfig,
}

impl ChatHub {
    pub fn new(config: HubConfig) -> Self {
        Self {
            inner: Mutex::new(HubState::default()),
            router: EventRouter::new(config.preview_length),
            config,
        }
    }

    pub fn config(&self) -> &HubConfig {
        &self.config
    }

    /// Welcome text, treating an empty string as disabled
    fn welcome_message(&self) -> Option<&str> {
        self.config
            .welcome_message
            .as_deref()
            .filter(|w| !w.trim().is_empty())
    }

    /// Assign a fresh identifier in the `Connecting` state.
    ///
    /// The id stays `Connecting` until `connect` admits or rejects it.
    pub async fn reserve(&self) -> ConnectionId {
        let id = ConnectionId::generate();
        self.inner.lock().await.reserved.insert(id.clone());
        tracing::trace!(connection_id = %id, "Connection id reserved");
        id
    }

    /// Admit a connection: `Connecting → Active`.
    ///
    /// In order: add to the registry, send the presence snapshot to the new
    /// connection, announce it to everyone else, send the welcome text, then
    /// start the handshake. Returns the resulting presence count.
    pub async fn connect(&self, id: ConnectionId, sender: Outbound) -> Result<usize, HubError> {
        let mut state = self.inner.lock().await;

        // Admitted or rejected, the id leaves `Connecting` here
        state.reserved.remove(&id);

        if state.connections.contains_key(&id) {
            return Err(HubError::AlreadyConnected(id));
        }
        if state.connections.len() >= self.config.max_connections {
            return Err(HubError::TooManyConnections(self.config.max_connections));
        }

        state.connections.insert(
            id.clone(),
            ConnectionHandle {
                sender,
                handshake: HandshakeState::started(),
                connected_at: Utc::now(),
            },
        );
        let count = state.registry.add(id.clone());
        state.total_connections += 1;

        let members = state.registry.snapshot();
        let deliveries = self.router.route(&RouteEvent::Joined(id.clone()), &members);
        state.dispatch(deliveries);

        if let Some(welcome) = self.welcome_message() {
            state.send(&id, ServerMessage::server_text(welcome));
        }
        state.send(&id, handshake::greeting(&self.config.greeting));

        tracing::info!(connection_id = %id, online = count, "User connected");
        Ok(count)
    }

    /// Handle an inbound chat message: `Active → Active`.
    ///
    /// Blank text and messages from inactive connections are ignored.
    pub async fn message(&self, id: &ConnectionId, text: &str) -> MessageOutcome {
        let mut state = self.inner.lock().await;

        if !state.registry.contains(id) {
            tracing::debug!(connection_id = %id, "Message from inactive connection ignored");
            return MessageOutcome::NotActive;
        }
        let Some(chat) = ChatMessage::new(id.clone(), text) else {
            tracing::trace!(connection_id = %id, "Blank message ignored");
            return MessageOutcome::Blank;
        };

        state.total_messages += 1;
        let members = state.registry.snapshot();
        let deliveries = self.router.route(&RouteEvent::Chat(chat), &members);

        let (relay, notify): (Vec<_>, Vec<_>) = deliveries
            .into_iter()
            .partition(|d| matches!(d.message, ServerMessage::Chat { .. }));
        let relayed = state.dispatch(relay);
        let notified = state.dispatch(notify);

        tracing::debug!(connection_id = %id, relayed, notified, "Message relayed");
        MessageOutcome::Relayed { relayed, notified }
    }

    /// Remove a connection: `Active → Closed`.
    ///
    /// Returns false if the connection was not active.
    pub async fn disconnect(&self, id: &ConnectionId) -> bool {
        let mut state = self.inner.lock().await;

        let Some(handle) = state.connections.remove(id) else {
            return false;
        };
        let count = state.registry.remove(id);

        let members = state.registry.snapshot();
        let deliveries = self.router.route(&RouteEvent::Left(id.clone()), &members);
        state.dispatch(deliveries);

        if !handle.handshake.is_acknowledged() {
            tracing::debug!(connection_id = %id, "Connection closed before handshake ack");
        }
        let duration = Utc::now() - handle.connected_at;
        tracing::info!(
            connection_id = %id,
            online = count,
            connected_secs = duration.num_seconds(),
            "User disconnected"
        );
        true
    }

    /// Record a handshake acknowledgment.
    ///
    /// Deviations are logged and returned; they never affect presence or chat.
    pub async fn acknowledge(
        &self,
        id: &ConnectionId,
        payload: &AckPayload,
    ) -> Result<Acknowledgment, HandshakeError> {
        let mut state = self.inner.lock().await;

        let result = match state.connections.get_mut(id) {
            Some(handle) => handshake::accept_ack(&mut handle.handshake, payload),
            None => Err(HandshakeError::UnknownConnection),
        };

        match &result {
            Ok(ack) => tracing::info!(
                connection_id = %id,
                status = %ack.status,
                message = %ack.message,
                latency_ms = ack.latency.as_millis() as u64,
                "Handshake acknowledged"
            ),
            Err(e) => tracing::warn!(connection_id = %id, error = %e, "Invalid handshake acknowledgment"),
        }
        result
    }

    /// Send a message directly to one connection
    pub async fn send_to(&self, id: &ConnectionId, message: ServerMessage) -> bool {
        self.inner.lock().await.send(id, message)
    }

    /// Lifecycle state of a connection as known by the hub.
    ///
    /// Reserved ids are `Connecting`. Identifiers the hub never handed out,
    /// rejected, or has already removed are reported as `Closed`.
    pub async fn state(&self, id: &ConnectionId) -> ConnectionState {
        let state = self.inner.lock().await;
        if state.registry.contains(id) {
            ConnectionState::Active
        } else if state.reserved.contains(id) {
            ConnectionState::Connecting
        } else {
            ConnectionState::Closed
        }
    }

    /// Current presence snapshot in join order
    pub async fn presence(&self) -> Vec<ConnectionId> {
        self.inner.lock().await.registry.snapshot()
    }

    /// Get the current connection count
    pub async fn connection_count(&self) -> usize {
        self.inner.lock().await.registry.len()
    }

    pub async fn stats(&self) -> HubStats {
        let state = self.inner.lock().await;
        HubStats {
            connections: state.registry.len(),
            pending_handshakes: state
                .connections
                .values()
                .filter(|h| !h.handshake.is_acknowledged())
                .count(),
            total_connections: state.total_connections,
            total_messages: state.total_messages,
        }
    }
}

/// Errors that can occur when admitting a connection
#[derive(Debug, Error)]
pub enum HubError {
    #[error("Too many connections (limit: {0})")]
    TooManyConnections(usize),

    #[error("Connection {0} is already active")]
    AlreadyConnected(ConnectionId),
}
