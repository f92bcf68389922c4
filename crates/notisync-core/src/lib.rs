//! Core data model and state for the notisync notification engine
//!
//! This crate provides the notification record types, payload normalization,
//! the in-memory notification store, and the seam traits consumed by the
//! runtime crate. It performs no network I/O of its own.

// ----------------------------------------------------------------------------
// Module Declarations
// ----------------------------------------------------------------------------

pub mod api;
pub mod config;
pub mod connection;
pub mod errors;
pub mod model;
pub mod store;
pub mod transport;
pub mod types;

// ----------------------------------------------------------------------------
// Public API
// ----------------------------------------------------------------------------

pub use api::NotificationApi;
pub use config::SyncConfig;
pub use connection::ConnectionState;
pub use errors::{FetchError, Result, SyncError, TransportError};
pub use model::{Actor, Notification, NotificationKind, RawNotification};
pub use store::{NotificationStore, StoreStats};
pub use transport::{NotificationTopic, PushEvent, PushTransport};
pub use types::{NotificationId, UserId};
