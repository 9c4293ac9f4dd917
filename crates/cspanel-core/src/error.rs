//! Sync error handling
//!
//! Typed errors for the bootstrap reads and the push channel. None of these
//! ever reach the rendering layer as a failure: the channel manager logs them
//! and schedules another attempt.

use serde::Deserialize;
use thiserror::Error;

/// Error envelope returned by the server on non-success responses
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ErrorResponse {
    pub status: String,
    pub message: String,
    #[serde(default)]
    pub request_id: String,
}

/// Errors that can occur while synchronizing with the server
#[derive(Error, Debug)]
pub enum SyncError {
    /// Transport-level HTTP failure (connect, timeout, body read)
    #[error("HTTP request to '{path}' failed: {source}")]
    Http {
        path: String,
        #[source]
        source: reqwest::Error,
    },

    /// Server answered with its error envelope
    #[error("Server rejected '{path}' ({}): {} [request {}]", .response.status, .response.message, .response.request_id)]
    Server { path: String, response: ErrorResponse },

    /// Non-success status code without a readable error envelope
    #[error("'{path}' returned {status}")]
    UnexpectedStatus { path: String, status: u16 },

    /// Body could not be decoded into the expected shape
    #[error("Invalid response body from '{path}': {details}")]
    Decode { path: String, details: String },

    /// Push channel could not be opened or failed while open
    #[error("Push channel error ({url}): {details}")]
    Channel { url: String, details: String },

    /// Push channel was closed by the peer
    #[error("Push channel ({url}) closed")]
    ChannelClosed { url: String },
}

impl SyncError {
    /// Check if retrying the same request could succeed
    ///
    /// Decode failures and client errors (4xx) point at a version mismatch
    /// between panel and server; everything else is worth another attempt.
    pub fn is_transient(&self) -> bool {
        match self {
            SyncError::Http { .. } | SyncError::Channel { .. } | SyncError::ChannelClosed { .. } => {
                true
            }
            SyncError::UnexpectedStatus { status, .. } => *status >= 500,
            SyncError::Server { response, .. } => !response.status.starts_with('4'),
            SyncError::Decode { .. } => false,
        }
    }
}

/// Result type for sync operations
pub type SyncResult<T> = Result<T, SyncError>;
