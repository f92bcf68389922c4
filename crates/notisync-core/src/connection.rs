//! Push channel connection state
//!
//! A three-state lifecycle driven by the transport channel task. Consumers
//! only ever care about the boolean projection: the poll driver runs while
//! `is_connected()` is false, and the presentation snapshot exposes the same
//! flag.

use serde::{Deserialize, Serialize};

/// Lifecycle state of the push channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConnectionState {
    /// No connection and no attempt in flight
    Disconnected,
    /// A connection attempt is in flight
    Connecting,
    /// Subscribed and receiving push events
    Connected,
}

impl ConnectionState {
    /// Whether push delivery is live. `Connecting` counts as disconnected;
    /// the fallback keeps polling until the subscription is confirmed.
    pub fn is_connected(&self) -> bool {
        matches!(self, ConnectionState::Connected)
    }

    /// Short lowercase name for logging
    pub fn state_name(&self) -> &'static str {
        match self {
            ConnectionState::Disconnected => "disconnected",
            ConnectionState::Connecting => "connecting",
            ConnectionState::Connected => "connected",
        }
    }
}

impl Default for ConnectionState {
    fn default() -> Self {
        ConnectionState::Disconnected
    }
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.state_name())
    }
}
