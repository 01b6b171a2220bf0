//! Error types for scadalink-net.

use std::io;

/// Result type alias for link operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for link operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Listener bind failed. Fatal to the plant role, never retried.
    #[error("bind failed on {addr}: {source}")]
    Bind { addr: String, source: io::Error },

    /// One outbound connect attempt failed. Retried with backoff.
    #[error("connect to {addr} failed: {source}")]
    Connect { addr: String, source: io::Error },

    /// The configured retry budget was spent without a successful connect.
    #[error("gave up connecting after {0} attempts")]
    RetriesExhausted(u32),

    /// Peer closed the stream (zero-length read).
    #[error("stream closed by peer")]
    StreamClosed,

    /// IO fault on an established stream.
    #[error("stream error: {0}")]
    Stream(#[from] io::Error),

    /// No live connection to send on.
    #[error("not connected")]
    NotConnected,

    /// The endpoint is already serving.
    #[error("already running")]
    AlreadyRunning,
}
