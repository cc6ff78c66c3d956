//! Error types for the relay server
//!
//! Defines startup/application errors and outbound send errors.
//! Uses thiserror for ergonomic error definitions.

use thiserror::Error;

/// Application-level errors
///
/// Every variant here is fatal at startup. Per-connection I/O errors
/// never leave their handler task and are not represented here.
#[derive(Debug, Error)]
pub enum AppError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Could not bind or listen on the configured address
    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    /// `-b` was given without `-e`
    #[error("-b option requires -e option")]
    BroadcastRequiresEcho,

    /// Capacity ceiling of zero would reject every client
    #[error("max clients must be at least 1")]
    InvalidCapacity,
}

/// Outbound send errors
///
/// Occurs when a chunk is queued for a client whose writer has shut down.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SendError {
    /// The client's writer task has ended
    #[error("Channel closed")]
    ChannelClosed,
}
