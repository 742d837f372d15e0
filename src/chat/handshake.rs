//! Handshake Protocol
//!
//! A one-shot greeting sent to each new connection, answered by a single
//! acknowledgment. The exchange is diagnostic only: participation in the
//! room never waits on it.

use chrono::{DateTime, Utc};
use std::time::{Duration, Instant};
use thiserror::Error;

use super::messages::{AckPayload, ServerMessage};

/// Default greeting text
pub const DEFAULT_GREETING: &str = "Hello! You are connected to the server.";

/// Build the greeting message
pub fn greeting(text: &str) -> ServerMessage {
    ServerMessage::Greeting {
        text: text.to_string(),
    }
}

/// Handshake progress for one connection
#[derive(Debug, Clone, Copy)]
pub enum HandshakeState {
    /// Greeting sent, no ack yet
    Pending { sent_at: Instant },
    /// Ack received and accepted
    Acknowledged { latency: Duration },
}

impl HandshakeState {
    pub fn started() -> Self {
        Self::Pending {
            sent_at: Instant::now(),
        }
    }

    pub fn is_acknowledged(&self) -> bool {
        matches!(self, Self::Acknowledged { .. })
    }
}

/// A well-formed acknowledgment
#[derive(Debug, Clone, PartialEq)]
pub struct Acknowledgment {
    pub status: String,
    pub message: String,
    /// Client-side time the ack was produced
    pub timestamp: Option<DateTime<Utc>>,
    /// Time between sending the greeting and receiving the ack
    pub latency: Duration,
}

/// Ways an acknowledgment can deviate from the protocol
#[derive(Debug, Error, PartialEq)]
pub enum HandshakeError {
    #[error("Acknowledgment is missing a status")]
    MissingStatus,

    #[error("Acknowledgment is missing a message")]
    MissingMessage,

    #[error("Invalid acknowledgment timestamp: {0}")]
    InvalidTimestamp(String),

    #[error("Acknowledgment already received")]
    AlreadyAcknowledged,

    #[error("Acknowledgment from unknown connection")]
    UnknownConnection,
}

/// Validate an ack against the pending handshake and advance the state.
///
/// On error the state is left untouched.
pub fn accept_ack(
    state: &mut HandshakeState,
    payload: &AckPayload,
) -> Result<Acknowledgment, HandshakeError> {
    let sent_at = match *state {
        HandshakeState::Pending { sent_at } => sent_at,
        HandshakeState::Acknowledged { .. } => return Err(HandshakeError::AlreadyAcknowledged),
    };

    let status = non_empty(payload.status.as_deref()).ok_or(HandshakeError::MissingStatus)?;
    let message = non_empty(payload.message.as_deref()).ok_or(HandshakeError::MissingMessage)?;
    let timestamp = payload.timestamp.as_ref().map(parse_timestamp).transpose()?;

    let latency = sent_at.elapsed();
    *state = HandshakeState::Acknowledged { latency };

    Ok(Acknowledgment {
        status: status.to_string(),
        message: message.to_string(),
        timestamp,
        latency,
    })
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Parse an RFC 3339 string or Unix milliseconds
fn parse_timestamp(value: &serde_json::Value) -> Result<DateTime<Utc>, HandshakeError> {
    match value {
        serde_json::Value::String(s) => DateTime::parse_from_rfc3339(s)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| HandshakeError::InvalidTimestamp(format!("{}: {}", s, e))),
        serde_json::Value::Number(n) => n
            .as_i64()
            .and_then(DateTime::from_timestamp_millis)
            .ok_or_else(|| HandshakeError::InvalidTimestamp(n.to_string())),
        other => Err(HandshakeError::InvalidTimestamp(other.to_string())),
    }
}
