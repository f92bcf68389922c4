//! Transport channel task
//!
//! Owns the push transport for the lifetime of a session. The loop is a
//! connect/pump/teardown cycle that never gives up: every failure path ends
//! in a fixed delay and a fresh connection attempt. Connection state is
//! published through a watch channel; decoded push events are forwarded to
//! the coordinator.

use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

use notisync_core::{ConnectionState, PushTransport, UserId};

use crate::coordinator::SyncEvent;

// ----------------------------------------------------------------------------
// Channel Statistics
// ----------------------------------------------------------------------------

/// Counters for the channel's lifetime
#[derive(Debug, Clone, Default)]
pub struct ChannelStats {
    /// Successful connections established
    pub connections: u64,
    /// Connection attempts that failed outright
    pub failed_attempts: u64,
    /// Established connections that later dropped
    pub disconnects: u64,
    /// Push events forwarded to the coordinator
    pub events_forwarded: u64,
}

// ----------------------------------------------------------------------------
// Transport Channel Task
// ----------------------------------------------------------------------------

/// Maintains the push connection and forwards its events
pub struct TransportChannel {
    transport: Box<dyn PushTransport>,
    user: UserId,
    reconnect_delay: Duration,
    state_tx: watch::Sender<ConnectionState>,
    event_tx: mpsc::Sender<SyncEvent>,
    shutdown_rx: watch::Receiver<bool>,
    stats: ChannelStats,
}

impl TransportChannel {
    pub fn new(
        transport: Box<dyn PushTransport>,
        user: UserId,
        reconnect_delay: Duration,
        state_tx: watch::Sender<ConnectionState>,
        event_tx: mpsc::Sender<SyncEvent>,
        shutdown_rx: watch::Receiver<bool>,
    ) -> Self {
        Self {
            transport,
            user,
            reconnect_delay,
            state_tx,
            event_tx,
            shutdown_rx,
            stats: ChannelStats::default(),
        }
    }

    /// Run until shutdown. Leaves the published state at `Disconnected`.
    pub async fn run(mut self) {
        info!(user = %self.user, "Transport channel starting");

        loop {
            if *self.shutdown_rx.borrow() {
                break;
            }

            self.state_tx.send_replace(ConnectionState::Connecting);

            let connected = tokio::select! {
                result = self.transport.connect(self.user) => match result {
                    Ok(()) => true,
                    Err(e) => {
                        warn!(user = %self.user, error = %e, "Push connection attempt failed");
                        self.stats.failed_attempts += 1;
                        false
                    }
                },
                _ = wait_for_shutdown(&mut self.shutdown_rx) => break,
            };

            if connected {
                info!(user = %self.user, "Push channel connected");
                self.stats.connections += 1;
                self.state_tx.send_replace(ConnectionState::Connected);

                if self.pump_events().await {
                    break;
                }
                self.stats.disconnects += 1;
            }

            // Best-effort teardown; the transport may already be dead.
            if let Err(e) = self.transport.close().await {
                debug!(error = %e, "Transport close failed");
            }
            self.state_tx.send_replace(ConnectionState::Disconnected);

            tokio::select! {
                _ = tokio::time::sleep(self.reconnect_delay) => {}
                _ = wait_for_shutdown(&mut self.shutdown_rx) => break,
            }
        }

        if let Err(e) = self.transport.close().await {
            debug!(error = %e, "Transport close failed");
        }
        self.state_tx.send_replace(ConnectionState::Disconnected);
        info!(
            user = %self.user,
            connections = self.stats.connections,
            "Transport channel stopped"
        );
    }

    /// Forward events until the connection drops or shutdown is signalled.
    /// Returns true when the task should exit entirely.
    async fn pump_events(&mut self) -> bool {
        loop {
            tokio::select! {
                result = self.transport.next_event() => match result {
                    Ok(event) => {
                        debug!(user = %self.user, ?event, "Push event received");
                        self.stats.events_forwarded += 1;
                        if self.event_tx.send(SyncEvent::Push(event)).await.is_err() {
                            // Coordinator is gone; nothing left to serve.
                            return true;
                        }
                    }
                    Err(e) => {
                        warn!(user = %self.user, error = %e, "Push connection lost");
                        return false;
                    }
                },
                _ = wait_for_shutdown(&mut self.shutdown_rx) => return true,
            }
        }
    }
}

/// Resolves once the shutdown flag flips to true
pub(crate) async fn wait_for_shutdown(shutdown_rx: &mut watch::Receiver<bool>) {
    while !*shutdown_rx.borrow() {
        if shutdown_rx.changed().await.is_err() {
            // Session dropped the sender; treat as shutdown.
            return;
        }
    }
}
