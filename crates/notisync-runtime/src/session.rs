//! Session assembly and the presentation-facing handle
//!
//! `NotificationSession::start` wires the three tasks together and returns a
//! `NotificationsHandle`, the only surface the presentation layer sees: a
//! snapshot of `{notifications, unread_count, is_connected}` plus the four
//! commands. Stopping the session tears down every task, timer included; no
//! reconnect attempt or poll tick survives it.

use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::info;

use notisync_core::{
    ConnectionState, Notification, NotificationApi, NotificationId, NotificationStore,
    PushTransport, Result, SyncConfig, SyncError, UserId,
};

use crate::channel::TransportChannel;
use crate::coordinator::{SyncCommand, SyncCoordinator};
use crate::poller::PollDriver;

/// Buffer for command and event channels
const CHANNEL_CAPACITY: usize = 64;

// ----------------------------------------------------------------------------
// Snapshot
// ----------------------------------------------------------------------------

/// Point-in-time view published to the presentation layer
#[derive(Debug, Clone, Default)]
pub struct NotificationSnapshot {
    /// Current list, newest first
    pub notifications: Vec<Notification>,
    /// Number of unread entries
    pub unread_count: usize,
    /// Whether the push channel is live
    pub is_connected: bool,
}

// ----------------------------------------------------------------------------
// Handle
// ----------------------------------------------------------------------------

/// Presentation-facing surface of one running session
///
/// Cheap to clone; every clone talks to the same coordinator. Commands return
/// once enqueued; their effect shows up in a later snapshot.
#[derive(Clone)]
pub struct NotificationsHandle {
    command_tx: mpsc::Sender<SyncCommand>,
    snapshot_rx: watch::Receiver<NotificationSnapshot>,
}

impl NotificationsHandle {
    /// Mark one notification read, optimistically
    pub async fn mark_as_read(&self, id: NotificationId) -> Result<()> {
        self.send(SyncCommand::MarkRead(id)).await
    }

    /// Mark every notification read, optimistically
    pub async fn mark_all_as_read(&self) -> Result<()> {
        self.send(SyncCommand::MarkAllRead).await
    }

    /// Delete one notification, optimistically
    pub async fn delete_notification(&self, id: NotificationId) -> Result<()> {
        self.send(SyncCommand::Delete(id)).await
    }

    /// Fetch the full list from the server immediately
    pub async fn force_refresh(&self) -> Result<()> {
        self.send(SyncCommand::ForceRefresh).await
    }

    /// Current snapshot
    pub fn snapshot(&self) -> NotificationSnapshot {
        self.snapshot_rx.borrow().clone()
    }

    /// Current list, newest first
    pub fn notifications(&self) -> Vec<Notification> {
        self.snapshot_rx.borrow().notifications.clone()
    }

    /// Current unread count
    pub fn unread_count(&self) -> usize {
        self.snapshot_rx.borrow().unread_count
    }

    /// Whether the push channel is live
    pub fn is_connected(&self) -> bool {
        self.snapshot_rx.borrow().is_connected
    }

    /// Watch receiver for snapshot changes, for reactive consumers
    pub fn subscribe(&self) -> watch::Receiver<NotificationSnapshot> {
        self.snapshot_rx.clone()
    }

    async fn send(&self, command: SyncCommand) -> Result<()> {
        self.command_tx
            .send(command)
            .await
            .map_err(|_| SyncError::channel_error("coordinator task has stopped"))
    }
}

// ----------------------------------------------------------------------------
// Session
// ----------------------------------------------------------------------------

/// One running synchronization session; owns the task handles
pub struct NotificationSession {
    shutdown_tx: watch::Sender<bool>,
    tasks: Vec<JoinHandle<()>>,
}

impl NotificationSession {
    /// Validate the config, spawn the three tasks, and hand back the
    /// presentation surface
    pub fn start(
        user: UserId,
        config: SyncConfig,
        api: Arc<dyn NotificationApi>,
        transport: Box<dyn PushTransport>,
    ) -> Result<(NotificationSession, NotificationsHandle)> {
        config.validate()?;

        let (command_tx, command_rx) = mpsc::channel(CHANNEL_CAPACITY);
        let (event_tx, event_rx) = mpsc::channel(CHANNEL_CAPACITY);
        let (state_tx, state_rx) = watch::channel(ConnectionState::Disconnected);
        let (snapshot_tx, snapshot_rx) = watch::channel(NotificationSnapshot::default());
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let channel = TransportChannel::new(
            transport,
            user,
            config.reconnect_delay,
            state_tx,
            event_tx.clone(),
            shutdown_rx.clone(),
        );
        let poller = PollDriver::new(
            Arc::clone(&api),
            user,
            config.poll_interval,
            state_rx.clone(),
            event_tx,
            shutdown_rx.clone(),
        );
        let coordinator = SyncCoordinator::new(
            NotificationStore::new(config.duplicate_window),
            api,
            user,
            command_rx,
            event_rx,
            state_rx,
            snapshot_tx,
            shutdown_rx,
        );

        let tasks = vec![
            tokio::spawn(channel.run()),
            tokio::spawn(poller.run()),
            tokio::spawn(coordinator.run()),
        ];

        info!(user = %user, "Notification session started");

        let session = NotificationSession { shutdown_tx, tasks };
        let handle = NotificationsHandle {
            command_tx,
            snapshot_rx,
        };
        Ok((session, handle))
    }

    /// Signal shutdown and wait for every task to finish
    pub async fn stop(self) {
        self.shutdown_tx.send_replace(true);
        for task in self.tasks {
            let _ = task.await;
        }
        info!("Notification session stopped");
    }
}
