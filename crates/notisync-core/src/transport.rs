//! Push transport abstraction
//!
//! The broker delivers events on four per-user topics. `PushTransport` is the
//! seam the runtime drives: the channel task calls `connect`, pulls events
//! with `next_event` until an error, then closes and backs off. Concrete
//! transports live in their own crates; tests substitute scripted mocks.

use async_trait::async_trait;

use crate::errors::Result;
use crate::model::RawNotification;
use crate::types::{NotificationId, UserId};

// ----------------------------------------------------------------------------
// Topics
// ----------------------------------------------------------------------------

/// Per-user broker topics carrying notification events
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NotificationTopic {
    /// New notification record (full payload)
    Created,
    /// Single record marked read (bare id payload)
    Read,
    /// All records marked read (payload ignored)
    ReadAll,
    /// Record deleted (bare id payload)
    Deleted,
}

impl NotificationTopic {
    pub const ALL: [NotificationTopic; 4] = [
        NotificationTopic::Created,
        NotificationTopic::Read,
        NotificationTopic::ReadAll,
        NotificationTopic::Deleted,
    ];

    /// Broker destination path for the given user
    pub fn path(&self, user: UserId) -> String {
        match self {
            NotificationTopic::Created => format!("/topic/notifications/{}", user),
            NotificationTopic::Read => format!("/topic/notifications/{}/read", user),
            NotificationTopic::ReadAll => format!("/topic/notifications/{}/read-all", user),
            NotificationTopic::Deleted => format!("/topic/notifications/{}/deleted", user),
        }
    }

    /// Reverse-map a destination path back to its topic, checking that it
    /// belongs to the given user's subscription
    pub fn from_path(path: &str, user: UserId) -> Option<NotificationTopic> {
        NotificationTopic::ALL
            .into_iter()
            .find(|topic| topic.path(user) == path)
    }
}

// ----------------------------------------------------------------------------
// Push Events
// ----------------------------------------------------------------------------

/// Decoded event from the push channel
#[derive(Debug, Clone, PartialEq)]
pub enum PushEvent {
    /// A new notification arrived
    Created(RawNotification),
    /// A notification was marked read elsewhere
    Read(NotificationId),
    /// All notifications were marked read elsewhere
    ReadAll,
    /// A notification was deleted elsewhere
    Deleted(NotificationId),
}

impl PushEvent {
    /// Decode a topic's frame body into an event. Created frames carry a full
    /// JSON record; Read and Deleted frames carry a bare numeric id.
    pub fn decode(topic: NotificationTopic, body: &str) -> Result<PushEvent> {
        match topic {
            NotificationTopic::Created => {
                let raw: RawNotification = serde_json::from_str(body)?;
                Ok(PushEvent::Created(raw))
            }
            NotificationTopic::Read => {
                let id: i64 = serde_json::from_str(body.trim())?;
                Ok(PushEvent::Read(NotificationId(id)))
            }
            NotificationTopic::ReadAll => Ok(PushEvent::ReadAll),
            NotificationTopic::Deleted => {
                let id: i64 = serde_json::from_str(body.trim())?;
                Ok(PushEvent::Deleted(NotificationId(id)))
            }
        }
    }
}

// ----------------------------------------------------------------------------
// Transport Trait
// ----------------------------------------------------------------------------

/// A push connection to the notification broker
///
/// One value represents one connection attempt's lifetime. `connect` must
/// subscribe to all four topics for the user before returning; after an
/// error from `next_event` the channel task closes the transport and
/// reconnects with a fresh `connect` call.
#[async_trait]
pub trait PushTransport: Send {
    /// Open the connection and subscribe to the user's topics
    async fn connect(&mut self, user: UserId) -> Result<()>;

    /// Wait for the next push event. An `Err` means the connection is dead
    /// and the caller should tear it down and reconnect.
    async fn next_event(&mut self) -> Result<PushEvent>;

    /// Close the connection; idempotent
    async fn close(&mut self) -> Result<()>;
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
