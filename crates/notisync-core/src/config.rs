//! Engine configuration
//!
//! Timing knobs for the transport channel, the poll fallback, and the store's
//! duplicate heuristic. Defaults match the production server deployment.

use std::time::Duration;

use crate::errors::{Result, SyncError};
use crate::store::DEFAULT_DUPLICATE_WINDOW;

/// Tunable timings for one synchronization session
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Fallback fetch cadence while the push channel is down
    pub poll_interval: Duration,
    /// Fixed pause between push reconnection attempts
    pub reconnect_delay: Duration,
    /// Tolerance for the store's near-duplicate heuristic
    pub duplicate_window: Duration,
    /// Per-request timeout for REST calls
    pub request_timeout: Duration,
}

impl SyncConfig {
    /// Reject degenerate timings that would spin the runtime
    pub fn validate(&self) -> Result<()> {
        if self.poll_interval.is_zero() {
            return Err(SyncError::config_error("poll_interval must be non-zero"));
        }
        if self.reconnect_delay.is_zero() {
            return Err(SyncError::config_error("reconnect_delay must be non-zero"));
        }
        Ok(())
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(30),
            reconnect_delay: Duration::from_secs(5),
            duplicate_window: DEFAULT_DUPLICATE_WINDOW,
            request_timeout: Duration::from_secs(10),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        assert!(SyncConfig::default().validate().is_ok());
    }

    #[test]
    fn test_zero_intervals_rejected() {
        let mut config = SyncConfig::default();
        config.poll_interval = Duration::ZERO;
        assert!(config.validate().is_err());

        let mut config = SyncConfig::default();
        config.reconnect_delay = Duration::ZERO;
        assert!(config.validate().is_err());
    }
}
