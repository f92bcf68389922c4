//! Notification records and payload normalization
//!
//! Server payloads are untrusted: titles and bodies may be missing, the read
//! flag and body text each arrive under one of two field names depending on
//! which server path produced the record, and timestamps may be malformed.
//! `RawNotification` captures the wire shape verbatim; `Notification` is the
//! normalized record every other module works with.

use chrono::{DateTime, NaiveDateTime, Utc};
use core::fmt;
use serde::{Deserialize, Serialize};

use crate::types::{NotificationId, UserId};

// ----------------------------------------------------------------------------
// Constants
// ----------------------------------------------------------------------------

/// Generic label substituted for a missing title
pub const DEFAULT_TITLE: &str = "Notification";

/// Placeholder substituted for a missing body
pub const DEFAULT_BODY: &str = "No content";

// ----------------------------------------------------------------------------
// Notification Kind
// ----------------------------------------------------------------------------

/// Category of a notification, as assigned by the server
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationKind {
    RoomInvitation,
    UserJoined,
    PostCreated,
    CommentAdded,
    SystemUpdate,
    Reminder,
    Achievement,
    /// Catch-all for kinds this client does not know; unrecognized wire
    /// values decode here instead of failing the whole payload.
    #[serde(other)]
    Unknown,
}

impl Default for NotificationKind {
    fn default() -> Self {
        Self::Unknown
    }
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::RoomInvitation => "room invitation",
            Self::UserJoined => "user joined",
            Self::PostCreated => "post created",
            Self::CommentAdded => "comment added",
            Self::SystemUpdate => "system update",
            Self::Reminder => "reminder",
            Self::Achievement => "achievement",
            Self::Unknown => "notification",
        };
        write!(f, "{}", name)
    }
}

// ----------------------------------------------------------------------------
// Wire and Normalized Records
// ----------------------------------------------------------------------------

/// Originating user attached to some notifications
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Actor {
    pub user_id: UserId,
    pub username: String,
}

/// Raw notification record exactly as the server ships it
///
/// `message`/`content` and `is_read`/`read` are alternate field names for the
/// same attribute; both are kept so a payload carrying either (or both)
/// decodes without error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawNotification {
    pub id: NotificationId,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(rename = "type", default)]
    pub kind: NotificationKind,
    #[serde(default)]
    pub is_read: Option<bool>,
    #[serde(default)]
    pub read: Option<bool>,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub user: Option<Actor>,
}

/// Normalized notification record, the only shape the store holds
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Notification {
    pub id: NotificationId,
    pub kind: NotificationKind,
    pub title: String,
    pub body: String,
    pub read: bool,
    /// Creation timestamp as received; kept verbatim so a malformed value
    /// still renders instead of being dropped.
    pub created_at: String,
    pub actor: Option<Actor>,
}

impl Notification {
    /// Parse the creation timestamp, degrading gracefully: accepts RFC 3339
    /// and the offset-less `LocalDateTime` form some servers emit (treated
    /// as UTC); anything else yields `None`.
    pub fn created_at_utc(&self) -> Option<DateTime<Utc>> {
        parse_timestamp(&self.created_at)
    }
}

impl From<RawNotification> for Notification {
    fn from(raw: RawNotification) -> Self {
        let title = match raw.title {
            Some(t) if !t.is_empty() => t,
            _ => DEFAULT_TITLE.to_string(),
        };
        let body = match raw.message.or(raw.content) {
            Some(b) if !b.is_empty() => b,
            _ => DEFAULT_BODY.to_string(),
        };
        // `isRead` wins over `read` when both are present; missing means unread.
        let read = raw.is_read.or(raw.read).unwrap_or(false);

        Self {
            id: raw.id,
            kind: raw.kind,
            title,
            body,
            read,
            created_at: raw.created_at,
            actor: raw.user,
        }
    }
}

fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalization_applies_fallbacks() {
        let raw: RawNotification = serde_json::from_str(r#"{"id": 1}"#).unwrap();
        let n = Notification::from(raw);

        assert_eq!(n.id, NotificationId(1));
        assert_eq!(n.title, DEFAULT_TITLE);
        assert_eq!(n.body, DEFAULT_BODY);
        assert_eq!(n.kind, NotificationKind::Unknown);
        assert!(!n.read);
        assert!(n.created_at_utc().is_none());
    }

    #[test]
    fn test_alternate_field_names_accepted() {
        let raw: RawNotification = serde_json::from_str(
            r#"{"id": 2, "content": "body via content", "read": true, "type": "REMINDER"}"#,
        )
        .unwrap();
        let n = Notification::from(raw);

        assert_eq!(n.body, "body via content");
        assert!(n.read);
        assert_eq!(n.kind, NotificationKind::Reminder);
    }

    #[test]
    fn test_is_read_wins_over_read() {
        let raw: RawNotification =
            serde_json::from_str(r#"{"id": 3, "isRead": false, "read": true}"#).unwrap();
        assert!(!Notification::from(raw).read);
    }

    #[test]
    fn test_unknown_kind_degrades() {
        let raw: RawNotification =
            serde_json::from_str(r#"{"id": 4, "type": "SOMETHING_NEW"}"#).unwrap();
        assert_eq!(raw.kind, NotificationKind::Unknown);
    }

    #[test]
    fn test_timestamp_parsing() {
        let mk = |ts: &str| Notification {
            id: NotificationId(1),
            kind: NotificationKind::SystemUpdate,
            title: DEFAULT_TITLE.into(),
            body: DEFAULT_BODY.into(),
            read: false,
            created_at: ts.to_string(),
            actor: None,
        };

        assert!(mk("2024-03-01T12:30:00Z").created_at_utc().is_some());
        assert!(mk("2024-03-01T12:30:00.123").created_at_utc().is_some());
        assert!(mk("not a date").created_at_utc().is_none());
        assert!(mk("").created_at_utc().is_none());
    }

    #[test]
    fn test_actor_round_trip() {
        let raw: RawNotification = serde_json::from_str(
            r#"{"id": 5, "user": {"userId": 9, "username": "marcus"}}"#,
        )
        .unwrap();
        let n = Notification::from(raw);
        let actor = n.actor.unwrap();
        assert_eq!(actor.user_id, UserId(9));
        assert_eq!(actor.username, "marcus");
    }
}
