//! Connection Registry
//!
//! Holds the presence set: every connection that has joined and not yet left.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use uuid::Uuid;

/// Opaque identifier assigned to a connection by the transport
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConnectionId(String);

impl ConnectionId {
    /// Length of the display label returned by [`ConnectionId::short`]
    pub const SHORT_LEN: usize = 8;

    /// Wrap an existing identifier
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generate a fresh random identifier
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Short display label (first 8 characters)
    pub fn short(&self) -> &str {
        match self.0.char_indices().nth(Self::SHORT_LEN) {
            Some((idx, _)) => &self.0[..idx],
            None => &self.0,
        }
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ConnectionId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for ConnectionId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Set of currently present connections
///
/// `order` holds members in join order; `members` answers lookups. Both are
/// always updated together.
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    members: HashSet<ConnectionId>,
    order: Vec<ConnectionId>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a connection, returning the resulting set size.
    ///
    /// Adding an id that is already present leaves its position unchanged.
    pub fn add(&mut self, id: ConnectionId) -> usize {
        if self.members.insert(id.clone()) {
            self.order.push(id);
        }
        self.order.len()
    }

    /// Remove a connection, returning the resulting set size
    pub fn remove(&mut self, id: &ConnectionId) -> usize {
        if self.members.remove(id) {
            self.order.retain(|member| member != id);
        }
        self.order.len()
    }

    /// Point-in-time copy of all members in join order
    pub fn snapshot(&self) -> Vec<ConnectionId> {
        self.order.clone()
    }

    pub fn contains(&self, id: &ConnectionId) -> bool {
        self.members.contains(id)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}
