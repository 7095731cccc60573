//! Mirrors session state into the host notification presenter.

use crate::types::SessionState;
use bridge_traits::notification::{NotificationContent, NotificationPresenter};
use std::sync::Arc;
use tracing::{debug, warn};

/// Keeps the persistent notification in step with the session.
///
/// Only `Playing` is rendered as playing. `Idle`, and `Error` without a track,
/// remove the notification. Content identical to what is already shown is not
/// re-rendered. Presenter failures are logged and otherwise ignored.
pub struct NotificationMirror {
    presenter: Option<Arc<dyn NotificationPresenter>>,
    shown: Option<NotificationContent>,
}

impl NotificationMirror {
    pub fn new(presenter: Option<Arc<dyn NotificationPresenter>>) -> Self {
        Self {
            presenter,
            shown: None,
        }
    }

    /// Content currently rendered, if any.
    pub fn shown(&self) -> Option<&NotificationContent> {
        self.shown.as_ref()
    }

    pub async fn sync(&mut self, state: &SessionState) {
        let Some(presenter) = self.presenter.clone() else {
            return;
        };

        let Some(track) = state.track() else {
            self.clear_with(presenter.as_ref()).await;
            return;
        };

        let content = NotificationContent::for_now_playing(track.now_playing(state.is_playing()));
        if self.shown.as_ref() == Some(&content) {
            return;
        }

        debug!(
            track = %track.resource,
            is_playing = content.now_playing.is_playing,
            "Rendering playback notification"
        );
        match presenter.render(content.clone()).await {
            Ok(()) => self.shown = Some(content),
            Err(err) => warn!(error = %err, "Failed to render playback notification"),
        }
    }

    /// Remove the notification if one is shown.
    pub async fn clear(&mut self) {
        if let Some(presenter) = self.presenter.clone() {
            self.clear_with(presenter.as_ref()).await;
        }
    }

    async fn clear_with(&mut self, presenter: &dyn NotificationPresenter) {
        if self.shown.take().is_none() {
            return;
        }
        if let Err(err) = presenter.clear().await {
            warn!(error = %err, "Failed to clear playback notification");
        }
    }
}
