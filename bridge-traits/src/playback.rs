//! Audio engine bridge.
//!
//! The session core never decodes or renders audio itself. It drives a
//! host-provided [`AudioEngine`] (Android `MediaPlayer`, AVFoundation, a desktop
//! decoder, ...) that owns exactly one loaded track at a time. The core decides
//! *what* the engine should do; the engine decides *how*.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Opaque identifier the host engine uses to locate a track's audio data.
///
/// On Android this is typically a raw resource id; on other hosts it may be a
/// file path or content URI. The core only compares and forwards it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceId(String);

impl ResourceId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ResourceId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for ResourceId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<u32> for ResourceId {
    fn from(value: u32) -> Self {
        Self(value.to_string())
    }
}

/// Callback invoked by the engine when the loaded track plays to its end.
///
/// Engines must call it at most once per loaded track and must tolerate the
/// handler being replaced by a later [`AudioEngine::on_completion`] call.
pub type CompletionHandler = Arc<dyn Fn() + Send + Sync>;

/// Host audio engine driven by the playback session.
///
/// All methods are called from the session's command task, never from a UI
/// thread. `load` may take arbitrarily long; the session bounds it with its own
/// timeout and keeps queueing commands meanwhile.
#[async_trait::async_trait]
pub trait AudioEngine: Send + Sync {
    /// Load `resource`, replacing whatever was loaded before. Returns the
    /// track's total duration.
    async fn load(&self, resource: &ResourceId) -> Result<Duration>;

    /// Start playback of the freshly loaded track from its beginning.
    async fn play(&self) -> Result<()>;

    /// Pause playback, keeping the current position.
    async fn pause(&self) -> Result<()>;

    /// Continue playback from the paused position.
    async fn resume(&self) -> Result<()>;

    /// Move the playhead to an absolute position within the loaded track.
    async fn seek(&self, position: Duration) -> Result<()>;

    /// Current playhead position. Must be cheap; it is sampled on every tick.
    fn current_position(&self) -> Duration;

    /// Total duration of the loaded track, or zero when nothing is loaded.
    fn duration(&self) -> Duration;

    /// Forward a normalized output volume in `0.0..=1.0`.
    async fn set_volume(&self, level: f32) -> Result<()>;

    /// Register the completion callback for the currently loaded track.
    fn on_completion(&self, handler: CompletionHandler);

    /// Release every native resource held by the engine.
    async fn release(&self) -> Result<()>;
}
