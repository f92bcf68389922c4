//! Notification REST API seam
//!
//! The synchronous source of truth. The coordinator calls these for full
//! refreshes and to confirm optimistic mutations; the poll driver calls
//! `fetch_all` on its interval. The HTTP implementation lives in the runtime
//! crate; tests substitute scripted mocks.

use async_trait::async_trait;

use crate::errors::Result;
use crate::model::RawNotification;
use crate::types::{NotificationId, UserId};

/// REST operations against the notification service
#[async_trait]
pub trait NotificationApi: Send + Sync {
    /// Fetch the user's full notification list, newest first
    async fn fetch_all(&self, user: UserId) -> Result<Vec<RawNotification>>;

    /// Fetch the server-side unread count
    async fn unread_count(&self, user: UserId) -> Result<u64>;

    /// Mark one notification read
    async fn mark_read(&self, user: UserId, id: NotificationId) -> Result<()>;

    /// Mark all of the user's notifications read
    async fn mark_all_read(&self, user: UserId) -> Result<()>;

    /// Delete one notification
    async fn delete(&self, user: UserId, id: NotificationId) -> Result<()>;
}
