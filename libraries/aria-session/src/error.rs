//! Error types for the playback session

use thiserror::Error;

/// Session errors reported synchronously to command callers
#[derive(Debug, Error)]
pub enum SessionError {
    /// Queue is empty
    #[error("Queue is empty")]
    QueueEmpty,

    /// No track is currently loaded
    #[error("No track loaded")]
    NoTrackLoaded,

    /// Index out of bounds
    #[error("Index out of bounds: {0}")]
    IndexOutOfBounds(usize),

    /// Invalid operation
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    /// Store-layer error
    #[error(transparent)]
    Store(#[from] aria_core::StoreError),
}

/// Classification of an asynchronous preparation or playback failure.
///
/// These are surfaced to listeners through the notification hub, not thrown
/// back through the command call: preparation is asynchronous.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ResolutionError {
    /// The player primitive reported an error
    #[error("player error")]
    PlayerError,

    /// No network is available and the track is not cached
    #[error("network unavailable")]
    NetworkUnavailable,

    /// The wifi-only restriction is active and the track is not cached
    #[error("wifi-only restriction active")]
    WifiOnlyRestricted,
}

/// Result type for session operations
pub type Result<T> = std::result::Result<T, SessionError>;
