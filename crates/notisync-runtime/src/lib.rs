//! Task runtime for the notisync notification engine
//!
//! Wires the core model into a running system of three cooperating tokio
//! tasks connected by channels:
//!
//! - `TransportChannel`: maintains the push connection, reconnecting forever
//! - `PollDriver`: interval fetches, active only while the push channel is down
//! - `SyncCoordinator`: sole owner of the store; applies events, commands, and
//!   optimistic mutations, and publishes snapshots to the presentation side
//!
//! `NotificationSession::start` assembles the tasks; `NotificationsHandle` is
//! the presentation-facing surface.

// ----------------------------------------------------------------------------
// Module Declarations
// ----------------------------------------------------------------------------

pub mod channel;
pub mod coordinator;
pub mod poller;
pub mod rest;
pub mod session;

// ----------------------------------------------------------------------------
// Public API
// ----------------------------------------------------------------------------

pub use channel::TransportChannel;
pub use coordinator::{SyncCommand, SyncCoordinator, SyncEvent};
pub use poller::PollDriver;
pub use rest::HttpNotificationApi;
pub use session::{NotificationSession, NotificationSnapshot, NotificationsHandle};
