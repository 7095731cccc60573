//! # Session Configuration
//!
//! Tunables for a playback session. Every field has a serde default so hosts
//! can ship a partial config.

use crate::progress::DEFAULT_PROGRESS_INTERVAL;
use core_runtime::events::DEFAULT_EVENT_BUFFER_SIZE;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Cadence of progress ticks while playing.
    ///
    /// Default: 1000 ms.
    #[serde(default = "default_progress_interval")]
    pub progress_interval: Duration,

    /// Per-subscriber buffer of the session event bus. Subscribers that fall
    /// further behind observe a lag error.
    ///
    /// Default: 100 events.
    #[serde(default = "default_event_buffer_size")]
    pub event_buffer_size: usize,

    /// Volume forwarded to the engine when the session starts. Clamped into
    /// `0.0..=1.0`.
    ///
    /// Default: 1.0.
    #[serde(default = "default_initial_volume")]
    pub initial_volume: f32,

    /// Upper bound on a single engine load. Expiry moves the session to
    /// `Error`.
    ///
    /// Default: 30 seconds.
    #[serde(default = "default_load_timeout")]
    pub load_timeout: Duration,

    /// Start playing the queue's starting track as soon as the session is
    /// built.
    ///
    /// Default: false.
    #[serde(default)]
    pub autoplay: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            progress_interval: default_progress_interval(),
            event_buffer_size: default_event_buffer_size(),
            initial_volume: default_initial_volume(),
            load_timeout: default_load_timeout(),
            autoplay: false,
        }
    }
}

impl SessionConfig {
    pub fn with_progress_interval(mut self, interval: Duration) -> Self {
        self.progress_interval = interval;
        self
    }

    pub fn with_event_buffer_size(mut self, size: usize) -> Self {
        self.event_buffer_size = size;
        self
    }

    pub fn with_initial_volume(mut self, level: f32) -> Self {
        self.initial_volume = level;
        self
    }

    pub fn with_load_timeout(mut self, timeout: Duration) -> Self {
        self.load_timeout = timeout;
        self
    }

    pub fn with_autoplay(mut self, autoplay: bool) -> Self {
        self.autoplay = autoplay;
        self
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), String> {
        if self.progress_interval.is_zero() {
            return Err("progress_interval must be > 0".to_string());
        }

        if self.event_buffer_size == 0 {
            return Err("event_buffer_size must be > 0".to_string());
        }

        if self.initial_volume.is_nan() {
            return Err("initial_volume must be a number".to_string());
        }

        if self.load_timeout.is_zero() {
            return Err("load_timeout must be > 0".to_string());
        }

        Ok(())
    }
}

fn default_progress_interval() -> Duration {
    DEFAULT_PROGRESS_INTERVAL
}

fn default_event_buffer_size() -> usize {
    DEFAULT_EVENT_BUFFER_SIZE
}

fn default_initial_volume() -> f32 {
    1.0
}

fn default_load_timeout() -> Duration {
    Duration::from_secs(30)
}
