//! # Playback Error Types
//!
//! Errors surfaced across the session boundary. Engine failures that happen
//! while the session is running never appear here; they become
//! [`SessionState::Error`](crate::types::SessionState::Error) instead.

use bridge_traits::error::BridgeError;
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur while building or driving a playback session.
#[derive(Error, Debug)]
pub enum PlaybackError {
    // ========================================================================
    // Construction Errors
    // ========================================================================
    /// The session was built without a track list.
    #[error("Track queue is empty")]
    EmptyQueue,

    /// Starting index does not address a track in the queue.
    #[error("Start index {index} out of range for queue of {len} tracks")]
    StartIndexOutOfRange { index: usize, len: usize },

    /// A required host capability was not injected.
    #[error("Required capability missing: {0}")]
    CapabilityMissing(String),

    /// Session configuration failed validation.
    #[error("Invalid session configuration: {0}")]
    InvalidConfig(String),

    // ========================================================================
    // Session Lifecycle Errors
    // ========================================================================
    /// A command was submitted after the session shut down.
    #[error("Command rejected: session has shut down")]
    CommandAfterShutdown,

    // ========================================================================
    // Load Errors
    // ========================================================================
    /// The engine could not load the resource.
    #[error("Failed to load {resource}: {message}")]
    LoadFailed { resource: String, message: String },

    /// The engine did not finish loading within the configured bound.
    #[error("Loading {resource} timed out after {timeout:?}")]
    LoadTimedOut { resource: String, timeout: Duration },

    // ========================================================================
    // Engine Errors
    // ========================================================================
    #[error("Audio engine error: {0}")]
    Engine(#[from] BridgeError),
}

impl PlaybackError {
    /// Returns `true` if the error came from loading a track.
    pub fn is_load_error(&self) -> bool {
        matches!(
            self,
            PlaybackError::LoadFailed { .. } | PlaybackError::LoadTimedOut { .. }
        )
    }

    /// Returns `true` if the error was raised while building a session.
    pub fn is_construction_error(&self) -> bool {
        matches!(
            self,
            PlaybackError::EmptyQueue
                | PlaybackError::StartIndexOutOfRange { .. }
                | PlaybackError::CapabilityMissing(_)
                | PlaybackError::InvalidConfig(_)
        )
    }
}

/// Result type for playback operations.
pub type Result<T> = std::result::Result<T, PlaybackError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_classification() {
        let timeout = PlaybackError::LoadTimedOut {
            resource: "raw/song_a".to_string(),
            timeout: Duration::from_secs(30),
        };
        assert!(timeout.is_load_error());
        assert!(!timeout.is_construction_error());

        assert!(PlaybackError::EmptyQueue.is_construction_error());
        assert!(!PlaybackError::CommandAfterShutdown.is_load_error());
    }

    #[test]
    fn test_error_messages() {
        let err = PlaybackError::StartIndexOutOfRange { index: 3, len: 2 };
        assert_eq!(
            err.to_string(),
            "Start index 3 out of range for queue of 2 tracks"
        );

        let err: PlaybackError = BridgeError::Unplayable("raw/x".to_string()).into();
        assert_eq!(
            err.to_string(),
            "Audio engine error: Resource cannot be played: raw/x"
        );
    }
}
