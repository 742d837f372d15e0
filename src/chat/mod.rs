//! Chat and Presence Hub
//!
//! Tracks who is online and relays chat traffic between connections.
//!
//! ## Architecture
//!
//! - **ConnectionRegistry**: The presence set of active connections
//! - **EventRouter**: Computes recipients and payloads per event
//! - **Handshake**: Greeting / acknowledgment exchange for new connections
//! - **ChatHub**: Owns the registry and drives the connection lifecycle
//!
//! ## Routing rules
//!
//! | Event | Recipients | Payload |
//! |-------|------------|---------|
//! | join  | the joiner | `users_list` (includes the joiner) |
//! | join  | everyone else | `user_connected` |
//! | chat  | everyone but the sender | `chat` with full text |
//! | chat  | everyone, sender included | `notification` with preview |
//! | leave | everyone remaining | `user_disconnected` |

mod handshake;
mod hub;
mod messages;
mod registry;
mod router;

pub use handshake::{Acknowledgment, HandshakeError, HandshakeState, DEFAULT_GREETING};
pub use hub::{ChatHub, ConnectionState, HubConfig, HubError, HubStats, MessageOutcome, Outbound};
pub use messages::{AckPayload, ClientMessage, ServerMessage};
pub use registry::{ConnectionId, ConnectionRegistry};
pub use router::{ChatMessage, Delivery, EventRouter, RouteEvent, DEFAULT_PREVIEW_LENGTH};
