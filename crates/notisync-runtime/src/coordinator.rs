//! Synchronization coordinator task
//!
//! Sole owner of the notification store. Everything that mutates the list
//! flows through this task's loop: push events and poll results from the
//! other tasks, and presentation commands from the handle. Mutation commands
//! are optimistic: the store is updated and the snapshot published before the
//! server call, and a failed call triggers a full resync instead of an
//! inverse patch or a retry.

use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

use notisync_core::{
    ConnectionState, NotificationApi, NotificationId, NotificationStore, PushEvent,
    RawNotification, UserId,
};

use crate::channel::wait_for_shutdown;
use crate::session::NotificationSnapshot;

// ----------------------------------------------------------------------------
// Commands and Events
// ----------------------------------------------------------------------------

/// Presentation commands accepted by the coordinator
#[derive(Debug, Clone, PartialEq)]
pub enum SyncCommand {
    /// Mark one notification read
    MarkRead(NotificationId),
    /// Mark every notification read
    MarkAllRead,
    /// Delete one notification
    Delete(NotificationId),
    /// Fetch the full list from the server immediately
    ForceRefresh,
}

/// Inbound events from the transport channel and poll driver
#[derive(Debug, Clone, PartialEq)]
pub enum SyncEvent {
    /// Decoded push event from the broker
    Push(PushEvent),
    /// Full list fetched by the poll fallback
    Refreshed(Vec<RawNotification>),
}

// ----------------------------------------------------------------------------
// Coordinator Statistics
// ----------------------------------------------------------------------------

/// Counters for coordinator activity
#[derive(Debug, Clone, Default)]
pub struct CoordinatorStats {
    /// Full-list fetches performed by this task
    pub refreshes: u64,
    /// Full-list fetches that failed
    pub refresh_failures: u64,
    /// Push events applied
    pub push_events: u64,
    /// Optimistic mutations issued
    pub optimistic_mutations: u64,
    /// Resyncs triggered by failed mutation confirmations
    pub resyncs: u64,
}

// ----------------------------------------------------------------------------
// Coordinator Task
// ----------------------------------------------------------------------------

/// Applies events and commands to the store and publishes snapshots
pub struct SyncCoordinator {
    store: NotificationStore,
    api: Arc<dyn NotificationApi>,
    user: UserId,
    command_rx: mpsc::Receiver<SyncCommand>,
    event_rx: mpsc::Receiver<SyncEvent>,
    state_rx: watch::Receiver<ConnectionState>,
    snapshot_tx: watch::Sender<NotificationSnapshot>,
    shutdown_rx: watch::Receiver<bool>,
    stats: CoordinatorStats,
}

impl SyncCoordinator {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        store: NotificationStore,
        api: Arc<dyn NotificationApi>,
        user: UserId,
        command_rx: mpsc::Receiver<SyncCommand>,
        event_rx: mpsc::Receiver<SyncEvent>,
        state_rx: watch::Receiver<ConnectionState>,
        snapshot_tx: watch::Sender<NotificationSnapshot>,
        shutdown_rx: watch::Receiver<bool>,
    ) -> Self {
        Self {
            store,
            api,
            user,
            command_rx,
            event_rx,
            state_rx,
            snapshot_tx,
            shutdown_rx,
            stats: CoordinatorStats::default(),
        }
    }

    pub async fn run(mut self) {
        info!(user = %self.user, "Sync coordinator starting");

        // Initial load. A failure here is not fatal; the poll fallback or a
        // later force-refresh will fill the list in.
        self.refresh().await;
        self.publish();

        loop {
            tokio::select! {
                Some(command) = self.command_rx.recv() => {
                    self.handle_command(command).await;
                }
                Some(event) = self.event_rx.recv() => {
                    self.handle_event(event);
                }
                result = self.state_rx.changed() => {
                    if result.is_err() {
                        break;
                    }
                    // Only is_connected changed; republish the same list.
                    self.publish();
                }
                _ = wait_for_shutdown(&mut self.shutdown_rx) => break,
                else => break,
            }
        }

        info!(
            user = %self.user,
            refreshes = self.stats.refreshes,
            resyncs = self.stats.resyncs,
            "Sync coordinator stopped"
        );
    }

    // ------------------------------------------------------------------------
    // Command Handling
    // ------------------------------------------------------------------------

    async fn handle_command(&mut self, command: SyncCommand) {
        debug!(user = %self.user, ?command, "Handling command");
        match command {
            SyncCommand::MarkRead(id) => {
                if self.store.mark_read(id) {
                    self.publish();
                }
                self.stats.optimistic_mutations += 1;
                if let Err(e) = self.api.mark_read(self.user, id).await {
                    warn!(user = %self.user, %id, error = %e, "Mark-read failed, resyncing");
                    self.resync().await;
                }
            }
            SyncCommand::MarkAllRead => {
                if self.store.mark_all_read() > 0 {
                    self.publish();
                }
                self.stats.optimistic_mutations += 1;
                if let Err(e) = self.api.mark_all_read(self.user).await {
                    warn!(user = %self.user, error = %e, "Mark-all-read failed, resyncing");
                    self.resync().await;
                }
            }
            SyncCommand::Delete(id) => {
                if self.store.remove(id) {
                    self.publish();
                }
                self.stats.optimistic_mutations += 1;
                if let Err(e) = self.api.delete(self.user, id).await {
                    warn!(user = %self.user, %id, error = %e, "Delete failed, resyncing");
                    self.resync().await;
                }
            }
            SyncCommand::ForceRefresh => {
                self.refresh().await;
                self.publish();
            }
        }
    }

    // ------------------------------------------------------------------------
    // Event Handling
    // ------------------------------------------------------------------------

    fn handle_event(&mut self, event: SyncEvent) {
        match event {
            SyncEvent::Push(push) => {
                self.stats.push_events += 1;
                let changed = match push {
                    PushEvent::Created(raw) => self.store.upsert_one(raw),
                    PushEvent::Read(id) => self.store.mark_read(id),
                    PushEvent::ReadAll => self.store.mark_all_read() > 0,
                    PushEvent::Deleted(id) => self.store.remove(id),
                };
                if changed {
                    self.publish();
                }
            }
            SyncEvent::Refreshed(list) => {
                debug!(user = %self.user, count = list.len(), "Applying polled list");
                self.store.bulk_replace(list);
                self.publish();
            }
        }
    }

    // ------------------------------------------------------------------------
    // Refresh and Resync
    // ------------------------------------------------------------------------

    /// Fetch the full list and replace the store. On failure the current
    /// list is kept as-is.
    async fn refresh(&mut self) {
        self.stats.refreshes += 1;
        match self.api.fetch_all(self.user).await {
            Ok(list) => {
                debug!(user = %self.user, count = list.len(), "Refresh succeeded");
                self.store.bulk_replace(list);
            }
            Err(e) => {
                warn!(user = %self.user, error = %e, "Refresh failed, keeping current list");
                self.stats.refresh_failures += 1;
            }
        }
    }

    /// Recover from a failed mutation confirmation by refetching the truth
    async fn resync(&mut self) {
        self.stats.resyncs += 1;
        self.refresh().await;
        self.publish();
    }

    fn publish(&self) {
        self.snapshot_tx.send_replace(NotificationSnapshot {
            notifications: self.store.notifications().to_vec(),
            unread_count: self.store.unread_count(),
            is_connected: self.state_rx.borrow().is_connected(),
        });
    }
}
