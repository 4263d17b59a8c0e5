//! Error types for the peer connection shim

use thiserror::Error;

/// Result type alias for peer shim operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by the peer shim
///
/// Every error is surfaced to the caller at the point of violation. Nothing
/// here is retried.
#[derive(Debug, Error)]
pub enum Error {
    /// No capability provider exists in this environment
    #[error("Unavailable: {0}")]
    Unavailable(String),

    /// Operation attempted without an underlying peer connection
    #[error("Peer connection does not exist")]
    NotInitialized,

    /// Empty or malformed signaling payload
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Send attempted on an absent or not-yet-open data channel
    #[error("Data channel is not open. Cannot send data.")]
    ChannelNotOpen,

    /// Offerer-only operation invoked on an answering peer
    #[error("Wrong role: {0}")]
    WrongRole(&'static str),

    /// Failure reported by the platform implementation
    #[error("Platform error: {0}")]
    Platform(String),

    /// Outbound data could not be serialized
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Wrap a platform failure with a short context string
    pub fn platform(context: &str, err: impl std::fmt::Display) -> Self {
        Error::Platform(format!("{}: {}", context, err))
    }
}
