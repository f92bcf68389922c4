//! Poll fallback driver
//!
//! Interval fetches that cover for the push channel while it is down. Every
//! tick checks the live connection state; while connected the tick is skipped
//! without touching the network. Fetch failures are logged and swallowed so
//! the last delivered list stays on screen until a later tick succeeds.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use notisync_core::{ConnectionState, NotificationApi, UserId};

use crate::channel::wait_for_shutdown;
use crate::coordinator::SyncEvent;

/// Interval fetch task, gated on the push channel being down
pub struct PollDriver {
    api: Arc<dyn NotificationApi>,
    user: UserId,
    poll_interval: Duration,
    state_rx: watch::Receiver<ConnectionState>,
    event_tx: mpsc::Sender<SyncEvent>,
    shutdown_rx: watch::Receiver<bool>,
}

impl PollDriver {
    pub fn new(
        api: Arc<dyn NotificationApi>,
        user: UserId,
        poll_interval: Duration,
        state_rx: watch::Receiver<ConnectionState>,
        event_tx: mpsc::Sender<SyncEvent>,
        shutdown_rx: watch::Receiver<bool>,
    ) -> Self {
        Self {
            api,
            user,
            poll_interval,
            state_rx,
            event_tx,
            shutdown_rx,
        }
    }

    pub async fn run(mut self) {
        info!(user = %self.user, interval = ?self.poll_interval, "Poll driver starting");

        // The coordinator does the initial load; the first poll tick comes a
        // full interval later.
        let mut ticker = interval_at(Instant::now() + self.poll_interval, self.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if self.state_rx.borrow().is_connected() {
                        debug!(user = %self.user, "Push channel live, skipping poll tick");
                        continue;
                    }
                    if !self.poll_once().await {
                        break;
                    }
                }
                _ = wait_for_shutdown(&mut self.shutdown_rx) => break,
            }
        }

        info!(user = %self.user, "Poll driver stopped");
    }

    /// One fallback fetch. Returns false when the coordinator is gone.
    async fn poll_once(&mut self) -> bool {
        match self.api.fetch_all(self.user).await {
            Ok(list) => {
                debug!(user = %self.user, count = list.len(), "Poll fetch succeeded");
                self.event_tx.send(SyncEvent::Refreshed(list)).await.is_ok()
            }
            Err(e) => {
                warn!(user = %self.user, error = %e, "Poll fetch failed, keeping stale list");
                true
            }
        }
    }
}
