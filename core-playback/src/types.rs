//! # Session Data Model
//!
//! Value types shared by the session actor, its observers and the host:
//! tracks, the session state machine's states, inbound commands, progress
//! snapshots and the normalized volume level.

use bridge_traits::notification::{NowPlaying, TransportAction};
use bridge_traits::playback::ResourceId;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::time::Duration;

// ============================================================================
// Track
// ============================================================================

/// Immutable track description. Identity is the resource id alone.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Track {
    pub resource: ResourceId,
    pub title: String,
    pub artist: String,
    pub artwork_url: String,
}

impl Track {
    pub fn new(
        resource: impl Into<ResourceId>,
        title: impl Into<String>,
        artist: impl Into<String>,
        artwork_url: impl Into<String>,
    ) -> Self {
        Self {
            resource: resource.into(),
            title: title.into(),
            artist: artist.into(),
            artwork_url: artwork_url.into(),
        }
    }

    /// Snapshot handed to the notification presenter.
    pub fn now_playing(&self, is_playing: bool) -> NowPlaying {
        NowPlaying {
            resource: self.resource.clone(),
            title: self.title.clone(),
            artist: self.artist.clone(),
            artwork_url: self.artwork_url.clone(),
            is_playing,
        }
    }
}

impl PartialEq for Track {
    fn eq(&self, other: &Self) -> bool {
        self.resource == other.resource
    }
}

impl Eq for Track {}

impl Hash for Track {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.resource.hash(state);
    }
}

impl fmt::Display for Track {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {} ({})", self.artist, self.title, self.resource)
    }
}

// ============================================================================
// Session State
// ============================================================================

/// State of a playback session.
///
/// Replaced as a whole on every transition; observers always receive a
/// complete snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SessionState {
    /// Nothing loaded, or the queue ran out.
    Idle,
    /// Engine is loading `track`. Commands queue until it resolves.
    Loading { track: Track },
    Playing {
        track: Track,
        position: Duration,
        duration: Duration,
    },
    Paused {
        track: Track,
        position: Duration,
        duration: Duration,
    },
    /// A load or engine call failed. A new `PlayTrack` (or `Resume`) recovers.
    Error { track: Option<Track>, cause: String },
}

impl SessionState {
    /// Short lowercase name, used in logs.
    pub fn name(&self) -> &'static str {
        match self {
            SessionState::Idle => "idle",
            SessionState::Loading { .. } => "loading",
            SessionState::Playing { .. } => "playing",
            SessionState::Paused { .. } => "paused",
            SessionState::Error { .. } => "error",
        }
    }

    pub fn track(&self) -> Option<&Track> {
        match self {
            SessionState::Idle => None,
            SessionState::Loading { track }
            | SessionState::Playing { track, .. }
            | SessionState::Paused { track, .. } => Some(track),
            SessionState::Error { track, .. } => track.as_ref(),
        }
    }

    pub fn is_playing(&self) -> bool {
        matches!(self, SessionState::Playing { .. })
    }

    pub fn is_paused(&self) -> bool {
        matches!(self, SessionState::Paused { .. })
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, SessionState::Loading { .. })
    }

    pub fn is_error(&self) -> bool {
        matches!(self, SessionState::Error { .. })
    }

    /// Playhead position for `Playing`/`Paused`, otherwise `None`.
    pub fn position(&self) -> Option<Duration> {
        match self {
            SessionState::Playing { position, .. } | SessionState::Paused { position, .. } => {
                Some(*position)
            }
            _ => None,
        }
    }

    /// Track duration for `Playing`/`Paused`, otherwise `None`.
    pub fn duration(&self) -> Option<Duration> {
        match self {
            SessionState::Playing { duration, .. } | SessionState::Paused { duration, .. } => {
                Some(*duration)
            }
            _ => None,
        }
    }
}

impl Default for SessionState {
    fn default() -> Self {
        SessionState::Idle
    }
}

// ============================================================================
// Commands
// ============================================================================

/// Request submitted to a session. Effects are observed through events.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "command", content = "value", rename_all = "snake_case")]
pub enum Command {
    /// Load and play the queued track with this resource id.
    PlayTrack(ResourceId),
    Resume,
    Pause,
    Next,
    Previous,
    /// Move the playhead. Clamped to the track's duration.
    Seek(Duration),
    /// Normalized level. Clamped into `0.0..=1.0`.
    SetVolume(f32),
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Command::PlayTrack(_) => "play_track",
            Command::Resume => "resume",
            Command::Pause => "pause",
            Command::Next => "next",
            Command::Previous => "previous",
            Command::Seek(_) => "seek",
            Command::SetVolume(_) => "set_volume",
        }
    }
}

impl From<TransportAction> for Command {
    fn from(action: TransportAction) -> Self {
        match action {
            TransportAction::Play => Command::Resume,
            TransportAction::Pause => Command::Pause,
            TransportAction::Next => Command::Next,
            TransportAction::Previous => Command::Previous,
        }
    }
}

// ============================================================================
// Progress
// ============================================================================

/// Position/duration snapshot emitted once per progress tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ProgressEvent {
    pub position_ms: u64,
    pub duration_ms: u64,
}

impl ProgressEvent {
    /// Build a snapshot; the position is clamped to the duration.
    pub fn new(position: Duration, duration: Duration) -> Self {
        Self::from_millis(position.as_millis() as u64, duration.as_millis() as u64)
    }

    pub fn from_millis(position_ms: u64, duration_ms: u64) -> Self {
        Self {
            position_ms: position_ms.min(duration_ms),
            duration_ms,
        }
    }

    /// Reset snapshot emitted when a new track starts.
    pub fn start_of(duration: Duration) -> Self {
        Self::new(Duration::ZERO, duration)
    }

    pub fn position(&self) -> Duration {
        Duration::from_millis(self.position_ms)
    }

    pub fn duration(&self) -> Duration {
        Duration::from_millis(self.duration_ms)
    }

    /// Played fraction in `0.0..=1.0`; zero for an unknown duration.
    pub fn fraction(&self) -> f32 {
        if self.duration_ms == 0 {
            return 0.0;
        }
        self.position_ms as f32 / self.duration_ms as f32
    }

    /// Elapsed time as `m:ss`.
    pub fn elapsed_label(&self) -> String {
        format_clock(self.position_ms)
    }

    /// Remaining time as `m:ss`.
    pub fn remaining_label(&self) -> String {
        format_clock(self.duration_ms.saturating_sub(self.position_ms))
    }
}

fn format_clock(millis: u64) -> String {
    let total_secs = millis / 1000;
    format!("{}:{:02}", total_secs / 60, total_secs % 60)
}

// ============================================================================
// Volume
// ============================================================================

/// Normalized output volume in `0.0..=1.0`.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct VolumeLevel(f32);

impl VolumeLevel {
    pub const MUTE: VolumeLevel = VolumeLevel(0.0);
    pub const MAX: VolumeLevel = VolumeLevel(1.0);

    /// Clamp `level` into range. NaN maps to mute.
    pub fn new(level: f32) -> Self {
        if level.is_nan() {
            return Self::MUTE;
        }
        Self(level.clamp(0.0, 1.0))
    }

    pub fn get(&self) -> f32 {
        self.0
    }

    /// Whole percent, truncated.
    pub fn percent(&self) -> u8 {
        (self.0 * 100.0) as u8
    }

    /// Map onto a platform stream volume scale of `0..=max_step`, truncating.
    pub fn to_stream_step(&self, max_step: u32) -> u32 {
        (self.0 * max_step as f32) as u32
    }

    /// Inverse of [`to_stream_step`](Self::to_stream_step).
    pub fn from_stream_step(step: u32, max_step: u32) -> Self {
        if max_step == 0 {
            return Self::MUTE;
        }
        Self::new(step as f32 / max_step as f32)
    }
}

impl Default for VolumeLevel {
    fn default() -> Self {
        Self::MAX
    }
}

impl From<f32> for VolumeLevel {
    fn from(level: f32) -> Self {
        Self::new(level)
    }
}

impl fmt::Display for VolumeLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Volume: {}%", self.percent())
    }
}
