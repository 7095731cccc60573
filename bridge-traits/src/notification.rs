//! Notification bridge.
//!
//! Hosts surface the playing track as persistent OS-level UI (an Android
//! foreground-service notification, the iOS Now Playing center, an MPRIS
//! entry). The core hands the presenter an immutable [`NotificationContent`]
//! snapshot after every state change; taps on the rendered transport controls
//! come back as [`TransportAction`]s.

use crate::error::Result;
use crate::playback::ResourceId;
use serde::{Deserialize, Serialize};

/// Channel the Android host registers for playback notifications.
pub const NOTIFICATION_CHANNEL_ID: &str = "running_channel";

/// User-visible name of the notification channel.
pub const NOTIFICATION_CHANNEL_NAME: &str = "Music Player Service Channel";

/// Transport control exposed on the notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransportAction {
    Play,
    Pause,
    Next,
    Previous,
}

impl TransportAction {
    /// Intent action string used by the Android host.
    pub fn intent_action(&self) -> &'static str {
        match self {
            TransportAction::Play => "action_play",
            TransportAction::Pause => "action_pause",
            TransportAction::Next => "action_next",
            TransportAction::Previous => "action_previous",
        }
    }

    /// Parse an Android intent action back into a transport action.
    pub fn from_intent_action(action: &str) -> Option<Self> {
        match action {
            "action_play" => Some(TransportAction::Play),
            "action_pause" => Some(TransportAction::Pause),
            "action_next" => Some(TransportAction::Next),
            "action_previous" => Some(TransportAction::Previous),
            _ => None,
        }
    }

    /// Button label shown next to the icon.
    pub fn label(&self) -> &'static str {
        match self {
            TransportAction::Play => "Play",
            TransportAction::Pause => "Pause",
            TransportAction::Next => "Next",
            TransportAction::Previous => "Previous",
        }
    }
}

/// Track data and play flag the presenter renders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NowPlaying {
    pub resource: ResourceId,
    pub title: String,
    pub artist: String,
    pub artwork_url: String,
    pub is_playing: bool,
}

/// Fully resolved notification the presenter should show.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationContent {
    pub channel_id: String,
    pub title: String,
    pub text: String,
    pub now_playing: NowPlaying,
    /// Buttons in display order: previous, play/pause toggle, next.
    pub actions: Vec<TransportAction>,
    pub low_priority: bool,
}

impl NotificationContent {
    /// Build the standard three-button playback notification.
    pub fn for_now_playing(now_playing: NowPlaying) -> Self {
        let toggle = if now_playing.is_playing {
            TransportAction::Pause
        } else {
            TransportAction::Play
        };

        Self {
            channel_id: NOTIFICATION_CHANNEL_ID.to_string(),
            title: "Music Player".to_string(),
            text: "Now Playing".to_string(),
            now_playing,
            actions: vec![TransportAction::Previous, toggle, TransportAction::Next],
            low_priority: true,
        }
    }

    /// The play/pause toggle currently offered.
    pub fn toggle_action(&self) -> TransportAction {
        if self.now_playing.is_playing {
            TransportAction::Pause
        } else {
            TransportAction::Play
        }
    }
}

/// Host presenter for the persistent playback notification.
#[async_trait::async_trait]
pub trait NotificationPresenter: Send + Sync {
    /// Show or replace the notification.
    async fn render(&self, content: NotificationContent) -> Result<()>;

    /// Remove the notification entirely.
    async fn clear(&self) -> Result<()>;
}
