//! Session events published on the [`SessionEventBus`].

use crate::types::{ProgressEvent, SessionState, VolumeLevel};
use core_runtime::events::{EventBus, EventSeverity, EventStream};
use serde::{Deserialize, Serialize};

/// Bus carrying [`SessionEvent`]s to any number of observers.
pub type SessionEventBus = EventBus<SessionEvent>;

/// Subscription to a [`SessionEventBus`].
pub type SessionEventStream = EventStream<SessionEvent>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionEvent {
    /// The session entered `state`.
    StateChanged { state: SessionState },
    /// Periodic playhead sample, plus a reset sample whenever a track starts.
    ProgressTicked { progress: ProgressEvent },
    /// Output volume changed.
    VolumeChanged { level: VolumeLevel },
    /// Teardown finished; nothing else is published.
    SessionEnded,
}

impl SessionEvent {
    pub fn description(&self) -> String {
        match self {
            SessionEvent::StateChanged { state } => match state.track() {
                Some(track) => format!("State changed to {} ({})", state.name(), track.resource),
                None => format!("State changed to {}", state.name()),
            },
            SessionEvent::ProgressTicked { progress } => format!(
                "Progress {} / -{}",
                progress.elapsed_label(),
                progress.remaining_label()
            ),
            SessionEvent::VolumeChanged { level } => level.to_string(),
            SessionEvent::SessionEnded => "Session ended".to_string(),
        }
    }

    pub fn severity(&self) -> EventSeverity {
        match self {
            SessionEvent::StateChanged {
                state: SessionState::Error { .. },
            } => EventSeverity::Error,
            SessionEvent::StateChanged { .. } | SessionEvent::SessionEnded => EventSeverity::Info,
            SessionEvent::ProgressTicked { .. } | SessionEvent::VolumeChanged { .. } => {
                EventSeverity::Debug
            }
        }
    }

    pub fn is_state_change(&self) -> bool {
        matches!(self, SessionEvent::StateChanged { .. })
    }

    pub fn is_progress(&self) -> bool {
        matches!(self, SessionEvent::ProgressTicked { .. })
    }
}
