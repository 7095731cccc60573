//! # Playback Session Core
//!
//! Owns the state of one listening session and drives a host audio engine.
//!
//! ## Overview
//!
//! This module handles:
//! - A serialized command actor with an Idle / Loading / Playing / Paused /
//!   Error state machine ([`PlaybackSession`])
//! - Bounded navigation over a fixed track queue ([`TrackQueueNavigator`])
//! - Once-per-second progress reporting while playing ([`ProgressPublisher`])
//! - Keeping the host's transport notification in step with playback
//!   ([`NotificationMirror`])
//!
//! Observers subscribe to the [`SessionEventBus`]; the host engine and
//! notification presenter are injected through `bridge-traits`.

pub mod config;
pub mod error;
pub mod events;
pub mod notification;
pub mod progress;
pub mod queue;
pub mod session;
pub mod types;

pub use config::SessionConfig;
pub use error::{PlaybackError, Result};
pub use events::{SessionEvent, SessionEventBus, SessionEventStream};
pub use notification::NotificationMirror;
pub use progress::{ProgressPublisher, DEFAULT_PROGRESS_INTERVAL};
pub use queue::TrackQueueNavigator;
pub use session::{PlaybackSession, PlaybackSessionBuilder};
pub use types::{Command, ProgressEvent, SessionState, Track, VolumeLevel};
