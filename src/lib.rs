//! # Murmur
//!
//! Real-time chat and presence hub. Clients connect over WebSocket, see who
//! else is online, and exchange chat messages relayed by a single in-process
//! hub.
//!
//! ## Features
//!
//! - **Presence**: join order snapshot for newcomers, join/leave events for everyone else
//! - **Relay**: chat text to everyone but the sender, notification previews to everyone
//! - **Handshake**: greeting / acknowledgment exchange per connection
//! - **Serialized events**: each connect, message and disconnect is applied atomically
//!
//! ## Modules
//!
//! - [`chat`]: Registry, router, handshake and the hub itself
//! - [`websocket`]: WebSocket transport feeding the hub
//! - [`api`]: HTTP server with Axum
//! - [`config`]: TOML and environment configuration
//!
//! ## Quick Start
//!
//! ```rust
//! use murmur::chat::{ChatHub, ConnectionId, HubConfig};
//! use tokio::sync::mpsc;
//!
//! #[tokio::main]
//! async fn main() {
//!     let hub = ChatHub::new(HubConfig::default());
//!
//!     let (tx, mut rx) = mpsc::unbounded_channel();
//!     let id = ConnectionId::generate();
//!     hub.connect(id.clone(), tx).await.expect("hub has room");
//!
//!     hub.message(&id, "hello, anyone here?").await;
//!     while let Ok(msg) = rx.try_recv() {
//!         println!("{:?}", msg);
//!     }
//!
//!     hub.disconnect(&id).await;
//! }
//! ```

pub mod api;
pub mod chat;
pub mod config;
pub mod websocket;

pub use chat::{ChatHub, ConnectionId, HubConfig, ServerMessage};
pub use config::Config;
