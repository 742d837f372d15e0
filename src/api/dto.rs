//! Data Transfer Objects
//!
//! Response bodies for the HTTP endpoints.

use serde::Serialize;

use crate::chat::ConnectionId;

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Overall status
    pub status: String,
    /// Active WebSocket connections
    pub connections: usize,
    /// Connections that have not acknowledged the greeting yet
    pub pending_handshakes: usize,
    /// Connections admitted since start
    pub total_connections: u64,
    /// Chat messages relayed since start
    pub total_messages: u64,
    /// Server uptime in seconds
    pub uptime_seconds: u64,
    /// Application version
    pub version: String,
}

/// Presence listing
#[derive(Debug, Serialize)]
pub struct PresenceResponse {
    pub count: usize,
    /// Connection ids in join order
    pub users: Vec<ConnectionId>,
}
