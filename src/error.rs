//! Error types for kvwire
//!
//! Provides a unified error type for all driver operations.

use thiserror::Error;

/// Result type alias using DriverError
pub type Result<T> = std::result::Result<T, DriverError>;

/// Unified error type for kvwire operations
#[derive(Debug, Error)]
pub enum DriverError {
    // -------------------------------------------------------------------------
    // Caller Errors
    // -------------------------------------------------------------------------
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Not connected")]
    NotConnected,

    // -------------------------------------------------------------------------
    // Connection Errors (connection-fatal)
    // -------------------------------------------------------------------------
    #[error("Transport error: {0}")]
    Transport(#[from] std::io::Error),

    #[error("Timed out: {0}")]
    Timeout(String),

    #[error("Protocol error: {0}")]
    Protocol(String),

    // -------------------------------------------------------------------------
    // Application Errors (connection stays usable)
    // -------------------------------------------------------------------------
    #[error("Server error: {0}")]
    Server(String),

    #[error("Unexpected reply: {0}")]
    UnexpectedReply(String),

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}

impl DriverError {
    /// Whether the connection that produced this error must be closed and
    /// reopened before it is used again.
    pub fn is_connection_fatal(&self) -> bool {
        matches!(
            self,
            DriverError::Transport(_) | DriverError::Timeout(_) | DriverError::Protocol(_)
        )
    }

    /// Build a `Server` error from the raw bytes of an error reply.
    pub(crate) fn server(message: &[u8]) -> Self {
        DriverError::Server(String::from_utf8_lossy(message).into_owned())
    }
}
