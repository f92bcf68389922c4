//! Error types for the notification synchronization engine
//!
//! This module contains all error types used across the notisync crates:
//! transport errors (push channel), fetch errors (REST calls), payload
//! errors, and the main SyncError type that unifies them. None of these are
//! fatal to the engine: transport errors drive reconnection, fetch errors
//! drive resync, payload errors are absorbed by normalization.

// ----------------------------------------------------------------------------
// Specific Error Types
// ----------------------------------------------------------------------------

/// Errors raised by the push channel
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("Connection failed: {reason}")]
    ConnectionFailed { reason: String },
    #[error("Connection closed: {reason}")]
    ConnectionClosed { reason: String },
    #[error("Protocol error: {reason}")]
    Protocol { reason: String },
    #[error("Transport is not connected")]
    NotConnected,
}

/// Errors raised by REST calls against the notification API
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("Request failed: {reason}")]
    RequestFailed { reason: String },
    #[error("Server returned status {status}")]
    Status { status: u16 },
    #[error("Response decode failed: {reason}")]
    Decode { reason: String },
}

// ----------------------------------------------------------------------------
// Unified Error Type
// ----------------------------------------------------------------------------

/// Core error type for the notisync engine
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    #[error("Malformed payload: {0}")]
    Payload(#[from] serde_json::Error),

    /// Channel communication error (internal to the task architecture)
    #[error("Channel error: {message}")]
    Channel { message: String },

    /// Configuration error
    #[error("Configuration error: {reason}")]
    Configuration { reason: String },
}

// ----------------------------------------------------------------------------
// Convenience Error Constructors
// ----------------------------------------------------------------------------

impl SyncError {
    /// Create a transport connection-failed error
    pub fn connection_failed<R: Into<String>>(reason: R) -> Self {
        SyncError::Transport(TransportError::ConnectionFailed {
            reason: reason.into(),
        })
    }

    /// Create a transport connection-closed error
    pub fn connection_closed<R: Into<String>>(reason: R) -> Self {
        SyncError::Transport(TransportError::ConnectionClosed {
            reason: reason.into(),
        })
    }

    /// Create a transport protocol error
    pub fn protocol<R: Into<String>>(reason: R) -> Self {
        SyncError::Transport(TransportError::Protocol {
            reason: reason.into(),
        })
    }

    /// Create a fetch request error
    pub fn fetch<R: Into<String>>(reason: R) -> Self {
        SyncError::Fetch(FetchError::RequestFailed {
            reason: reason.into(),
        })
    }

    /// Create a channel error with a message
    pub fn channel_error<M: Into<String>>(message: M) -> Self {
        SyncError::Channel {
            message: message.into(),
        }
    }

    /// Create a configuration error with a reason
    pub fn config_error<R: Into<String>>(reason: R) -> Self {
        SyncError::Configuration {
            reason: reason.into(),
        }
    }
}

// ----------------------------------------------------------------------------
// Type Aliases
// ----------------------------------------------------------------------------

pub type Result<T> = core::result::Result<T, SyncError>;
