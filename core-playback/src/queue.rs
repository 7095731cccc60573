//! Track queue navigation.
//!
//! The queue is fixed when the session starts. Navigation never wraps: at
//! either end `next`/`previous` return `None` and leave the index alone.

use crate::error::{PlaybackError, Result};
use crate::types::Track;
use bridge_traits::playback::ResourceId;

#[derive(Debug, Clone)]
pub struct TrackQueueNavigator {
    tracks: Vec<Track>,
    index: usize,
}

impl TrackQueueNavigator {
    /// Build a navigator positioned at `start`.
    ///
    /// # Errors
    ///
    /// [`PlaybackError::EmptyQueue`] for an empty list and
    /// [`PlaybackError::StartIndexOutOfRange`] when `start` is past the end.
    pub fn new(tracks: Vec<Track>, start: usize) -> Result<Self> {
        if tracks.is_empty() {
            return Err(PlaybackError::EmptyQueue);
        }
        if start >= tracks.len() {
            return Err(PlaybackError::StartIndexOutOfRange {
                index: start,
                len: tracks.len(),
            });
        }
        Ok(Self {
            tracks,
            index: start,
        })
    }

    pub fn current(&self) -> &Track {
        &self.tracks[self.index]
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    /// Always `false`; construction rejects empty queues.
    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    pub fn has_next(&self) -> bool {
        self.index + 1 < self.tracks.len()
    }

    pub fn has_previous(&self) -> bool {
        self.index > 0
    }

    /// Advance and return the new current track, or `None` at the end.
    pub fn next(&mut self) -> Option<&Track> {
        if !self.has_next() {
            return None;
        }
        self.index += 1;
        Some(self.current())
    }

    /// Step back and return the new current track, or `None` at the start.
    pub fn previous(&mut self) -> Option<&Track> {
        if !self.has_previous() {
            return None;
        }
        self.index -= 1;
        Some(self.current())
    }

    /// Position the queue on the track with `resource`.
    ///
    /// Unknown ids leave the index unchanged and return `None`.
    pub fn jump_to(&mut self, resource: &ResourceId) -> Option<&Track> {
        let position = self.tracks.iter().position(|t| &t.resource == resource)?;
        self.index = position;
        Some(self.current())
    }
}
