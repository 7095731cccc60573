//! # Playback Session
//!
//! The session controller: a single actor task that owns the audio engine,
//! the track queue, the progress publisher and the notification mirror.
//!
//! ## Ordering
//!
//! Commands and engine completion signals travel through one unbounded
//! channel and are applied strictly in arrival order. A load runs inline in
//! the actor, so anything submitted while a track is loading waits in the
//! channel until the load resolves. Two loads can never overlap.
//!
//! Each load bumps a generation counter. The completion handler registered
//! with the engine carries its generation, and completions from an earlier
//! load are dropped.
//!
//! ## Observing
//!
//! [`PlaybackSession::current_state`] reads a snapshot that the actor replaces
//! whole on every transition. The same snapshot is published as
//! [`SessionEvent::StateChanged`] on the session's event bus.
//!
//! ## Usage
//!
//! ```ignore
//! let session = PlaybackSessionBuilder::new()
//!     .engine(engine)
//!     .presenter(presenter)
//!     .tracks(tracks)
//!     .build()?;
//!
//! let mut events = session.subscribe();
//! session.submit(Command::PlayTrack(ResourceId::new("raw/song_a")))?;
//! while let Ok(event) = events.recv().await {
//!     println!("{}", event.description());
//! }
//! ```

use crate::config::SessionConfig;
use crate::error::{PlaybackError, Result};
use crate::events::{SessionEvent, SessionEventBus, SessionEventStream};
use crate::notification::NotificationMirror;
use crate::progress::ProgressPublisher;
use crate::queue::TrackQueueNavigator;
use crate::types::{Command, ProgressEvent, SessionState, Track, VolumeLevel};
use bridge_traits::notification::{NotificationPresenter, TransportAction};
use bridge_traits::playback::{AudioEngine, ResourceId};
use parking_lot::{Mutex, RwLock};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;

/// Message applied by the session actor.
#[derive(Debug)]
enum SessionMessage {
    Command(Command),
    /// Engine reported the end of the track loaded under `generation`.
    Completed { generation: u64 },
}

/// State readable from outside the actor. Written only by the actor.
struct SharedState {
    state: RwLock<SessionState>,
    volume: RwLock<VolumeLevel>,
    progress_active: AtomicBool,
}

// ============================================================================
// Builder
// ============================================================================

/// Fail-fast construction of a [`PlaybackSession`].
#[derive(Default)]
pub struct PlaybackSessionBuilder {
    engine: Option<Arc<dyn AudioEngine>>,
    presenter: Option<Arc<dyn NotificationPresenter>>,
    event_bus: Option<SessionEventBus>,
    tracks: Vec<Track>,
    start_index: usize,
    config: SessionConfig,
}

impl PlaybackSessionBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Audio engine driven by the session. Required.
    pub fn engine(mut self, engine: Arc<dyn AudioEngine>) -> Self {
        self.engine = Some(engine);
        self
    }

    pub fn presenter(mut self, presenter: Arc<dyn NotificationPresenter>) -> Self {
        self.presenter = Some(presenter);
        self
    }

    /// Publish on an existing bus instead of creating one.
    pub fn event_bus(mut self, bus: SessionEventBus) -> Self {
        self.event_bus = Some(bus);
        self
    }

    pub fn tracks(mut self, tracks: Vec<Track>) -> Self {
        self.tracks = tracks;
        self
    }

    pub fn start_index(mut self, index: usize) -> Self {
        self.start_index = index;
        self
    }

    pub fn config(mut self, config: SessionConfig) -> Self {
        self.config = config;
        self
    }

    /// Validate the inputs and spawn the session actor on the current Tokio
    /// runtime.
    ///
    /// # Errors
    ///
    /// - [`PlaybackError::InvalidConfig`] if the config fails validation
    /// - [`PlaybackError::CapabilityMissing`] without an audio engine, or when
    ///   called outside a Tokio runtime
    /// - [`PlaybackError::EmptyQueue`] / [`PlaybackError::StartIndexOutOfRange`]
    ///   for a bad queue
    pub fn build(self) -> Result<PlaybackSession> {
        self.config
            .validate()
            .map_err(PlaybackError::InvalidConfig)?;
        let engine = self
            .engine
            .ok_or_else(|| PlaybackError::CapabilityMissing("AudioEngine".to_string()))?;
        let navigator = TrackQueueNavigator::new(self.tracks, self.start_index)?;
        let runtime = Handle::try_current()
            .map_err(|_| PlaybackError::CapabilityMissing("Tokio runtime".to_string()))?;

        let session_id = Uuid::new_v4();
        let bus = self
            .event_bus
            .unwrap_or_else(|| SessionEventBus::new(self.config.event_buffer_size));
        let initial_volume = VolumeLevel::new(self.config.initial_volume);
        let shared = Arc::new(SharedState {
            state: RwLock::new(SessionState::Idle),
            volume: RwLock::new(initial_volume),
            progress_active: AtomicBool::new(false),
        });
        let (tx, rx) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();
        let queue_len = navigator.len();
        let start_resource = navigator.current().resource.clone();

        let actor = SessionActor {
            engine,
            navigator,
            progress: ProgressPublisher::new(self.config.progress_interval),
            mirror: NotificationMirror::new(self.presenter),
            bus: bus.clone(),
            shared: Arc::clone(&shared),
            tx: tx.downgrade(),
            cancel: cancel.clone(),
            load_timeout: self.config.load_timeout,
            state: SessionState::Idle,
            generation: 0,
        };

        let span = info_span!("playback_session", session_id = %session_id);
        let handle = runtime.spawn(actor.run(rx).instrument(span));
        info!(session_id = %session_id, tracks = queue_len, "Playback session started");

        let session = PlaybackSession {
            session_id,
            tx,
            shared,
            bus,
            cancel,
            shut_down: AtomicBool::new(false),
            actor: Mutex::new(Some(handle)),
            queue_len,
        };

        if self.config.autoplay {
            session.submit(Command::PlayTrack(start_resource))?;
        }

        Ok(session)
    }
}

// ============================================================================
// Session Handle
// ============================================================================

/// Handle to a running playback session.
///
/// Dropping the handle without calling [`shutdown`](Self::shutdown) still
/// stops the actor, which then releases the engine in the background.
pub struct PlaybackSession {
    session_id: Uuid,
    tx: mpsc::UnboundedSender<SessionMessage>,
    shared: Arc<SharedState>,
    bus: SessionEventBus,
    cancel: CancellationToken,
    shut_down: AtomicBool,
    actor: Mutex<Option<JoinHandle<()>>>,
    queue_len: usize,
}

impl PlaybackSession {
    pub fn builder() -> PlaybackSessionBuilder {
        PlaybackSessionBuilder::new()
    }

    /// Queue a command. Effects are observed through events.
    ///
    /// # Errors
    ///
    /// [`PlaybackError::CommandAfterShutdown`] once the session is shutting
    /// down or gone.
    pub fn submit(&self, command: Command) -> Result<()> {
        if self.shut_down.load(Ordering::SeqCst) || self.cancel.is_cancelled() {
            return Err(PlaybackError::CommandAfterShutdown);
        }
        debug!(session_id = %self.session_id, command = command.name(), "Command submitted");
        self.tx
            .send(SessionMessage::Command(command))
            .map_err(|_| PlaybackError::CommandAfterShutdown)
    }

    /// Forward a tap on a notification transport control.
    pub fn dispatch_transport(&self, action: TransportAction) -> Result<()> {
        self.submit(Command::from(action))
    }

    /// Stop the session and wait for teardown to finish.
    ///
    /// Queued commands that were not applied yet are discarded. Calling this
    /// more than once is harmless.
    pub async fn shutdown(&self) {
        self.shut_down.store(true, Ordering::SeqCst);
        self.cancel.cancel();

        let handle = self.actor.lock().take();
        if let Some(handle) = handle {
            if let Err(err) = handle.await {
                warn!(session_id = %self.session_id, error = %err, "Session task ended abnormally");
            }
            info!(session_id = %self.session_id, "Playback session shut down");
        }
    }

    pub fn current_state(&self) -> SessionState {
        self.shared.state.read().clone()
    }

    pub fn current_track(&self) -> Option<Track> {
        self.shared.state.read().track().cloned()
    }

    pub fn volume(&self) -> VolumeLevel {
        *self.shared.volume.read()
    }

    /// Whether progress ticks are currently being produced.
    pub fn is_progress_active(&self) -> bool {
        self.shared.progress_active.load(Ordering::SeqCst)
    }

    pub fn is_shut_down(&self) -> bool {
        self.shut_down.load(Ordering::SeqCst) || self.cancel.is_cancelled()
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub fn queue_len(&self) -> usize {
        self.queue_len
    }

    pub fn event_bus(&self) -> &SessionEventBus {
        &self.bus
    }

    pub fn subscribe(&self) -> SessionEventStream {
        self.bus.subscribe()
    }
}

impl fmt::Debug for PlaybackSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlaybackSession")
            .field("session_id", &self.session_id)
            .field("state", &self.current_state().name())
            .field("queue_len", &self.queue_len)
            .field("shut_down", &self.is_shut_down())
            .finish()
    }
}

impl Drop for PlaybackSession {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

// ============================================================================
// Actor
// ============================================================================

struct SessionActor {
    engine: Arc<dyn AudioEngine>,
    navigator: TrackQueueNavigator,
    progress: ProgressPublisher,
    mirror: NotificationMirror,
    bus: SessionEventBus,
    shared: Arc<SharedState>,
    /// Weak so the channel closes once every session handle is gone.
    tx: mpsc::WeakUnboundedSender<SessionMessage>,
    cancel: CancellationToken,
    load_timeout: Duration,
    /// Authoritative state; `shared.state` is a copy for readers.
    state: SessionState,
    generation: u64,
}

impl SessionActor {
    async fn run(mut self, mut rx: mpsc::UnboundedReceiver<SessionMessage>) {
        let volume = *self.shared.volume.read();
        if let Err(err) = self.engine.set_volume(volume.get()).await {
            warn!(error = %err, "Failed to apply initial volume");
        }

        loop {
            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => break,
                message = rx.recv() => match message {
                    Some(message) => self.handle(message).await,
                    None => break,
                },
            }
        }

        self.teardown().await;
    }

    async fn handle(&mut self, message: SessionMessage) {
        match message {
            SessionMessage::Command(command) => {
                debug!(command = command.name(), state = self.state.name(), "Applying command");
                match command {
                    Command::PlayTrack(resource) => self.play_track(&resource).await,
                    Command::Resume => self.resume().await,
                    Command::Pause => self.pause().await,
                    Command::Next => self.skip(true).await,
                    Command::Previous => self.skip(false).await,
                    Command::Seek(position) => self.seek(position).await,
                    Command::SetVolume(level) => self.set_volume(level).await,
                }
            }
            SessionMessage::Completed { generation } => self.track_completed(generation).await,
        }
    }

    async fn play_track(&mut self, resource: &ResourceId) {
        match self.navigator.jump_to(resource).cloned() {
            Some(track) => self.load_and_play(track).await,
            None => warn!(track = %resource, "PlayTrack for a track that is not queued"),
        }
    }

    async fn resume(&mut self) {
        match &self.state {
            SessionState::Paused {
                track, duration, ..
            } => {
                let (track, duration) = (track.clone(), *duration);
                if let Err(err) = self.engine.resume().await {
                    self.fail(Some(track), PlaybackError::Engine(err)).await;
                    return;
                }
                let position = self.engine.current_position().min(duration);
                self.start_progress();
                self.transition(SessionState::Playing {
                    track,
                    position,
                    duration,
                })
                .await;
            }
            SessionState::Idle | SessionState::Error { .. } => {
                let track = self.navigator.current().clone();
                self.load_and_play(track).await;
            }
            SessionState::Playing { .. } | SessionState::Loading { .. } => {
                debug!(state = self.state.name(), "Resume ignored");
            }
        }
    }

    async fn pause(&mut self) {
        let SessionState::Playing {
            track, duration, ..
        } = &self.state
        else {
            debug!(state = self.state.name(), "Pause ignored");
            return;
        };
        let (track, duration) = (track.clone(), *duration);

        self.stop_progress();
        if let Err(err) = self.engine.pause().await {
            self.fail(Some(track), PlaybackError::Engine(err)).await;
            return;
        }
        let position = self.engine.current_position().min(duration);
        self.transition(SessionState::Paused {
            track,
            position,
            duration,
        })
        .await;
    }

    /// Next (`forward`) or Previous. No-op at the queue boundary.
    async fn skip(&mut self, forward: bool) {
        if !matches!(
            self.state,
            SessionState::Playing { .. } | SessionState::Paused { .. }
        ) {
            debug!(state = self.state.name(), forward, "Skip ignored");
            return;
        }

        let target = if forward {
            self.navigator.next().cloned()
        } else {
            self.navigator.previous().cloned()
        };

        match target {
            Some(track) => self.load_and_play(track).await,
            None => debug!(forward, "Queue boundary reached; staying on current track"),
        }
    }

    async fn seek(&mut self, requested: Duration) {
        let (track, duration, playing) = match &self.state {
            SessionState::Playing {
                track, duration, ..
            } => (track.clone(), *duration, true),
            SessionState::Paused {
                track, duration, ..
            } => (track.clone(), *duration, false),
            _ => {
                debug!(state = self.state.name(), "Seek ignored");
                return;
            }
        };

        let position = requested.min(duration);
        if let Err(err) = self.engine.seek(position).await {
            self.fail(Some(track), PlaybackError::Engine(err)).await;
            return;
        }

        let next = if playing {
            SessionState::Playing {
                track,
                position,
                duration,
            }
        } else {
            SessionState::Paused {
                track,
                position,
                duration,
            }
        };
        self.transition(next).await;
        self.publish(SessionEvent::ProgressTicked {
            progress: ProgressEvent::new(position, duration),
        });
    }

    async fn set_volume(&mut self, requested: f32) {
        let level = VolumeLevel::new(requested);
        *self.shared.volume.write() = level;
        if let Err(err) = self.engine.set_volume(level.get()).await {
            warn!(error = %err, level = level.get(), "Failed to forward volume");
        }
        self.publish(SessionEvent::VolumeChanged { level });
    }

    async fn track_completed(&mut self, generation: u64) {
        if generation != self.generation {
            debug!(generation, current = self.generation, "Dropping stale completion");
            return;
        }
        if !self.state.is_playing() {
            debug!(state = self.state.name(), "Completion ignored");
            return;
        }

        match self.navigator.next().cloned() {
            Some(track) => {
                info!(track = %track.resource, "Track finished; advancing");
                self.load_and_play(track).await;
            }
            None => {
                info!("Queue finished");
                self.stop_progress();
                self.transition(SessionState::Idle).await;
            }
        }
    }

    async fn load_and_play(&mut self, track: Track) {
        self.stop_progress();
        self.generation += 1;
        let generation = self.generation;
        self.transition(SessionState::Loading {
            track: track.clone(),
        })
        .await;

        let load = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => return,
            result = tokio::time::timeout(self.load_timeout, self.engine.load(&track.resource)) => result,
        };

        let duration = match load {
            Ok(Ok(duration)) => duration,
            Ok(Err(err)) => {
                let err = PlaybackError::LoadFailed {
                    resource: track.resource.to_string(),
                    message: err.to_string(),
                };
                self.fail(Some(track), err).await;
                return;
            }
            Err(_) => {
                let err = PlaybackError::LoadTimedOut {
                    resource: track.resource.to_string(),
                    timeout: self.load_timeout,
                };
                self.fail(Some(track), err).await;
                return;
            }
        };

        let tx = self.tx.clone();
        self.engine.on_completion(Arc::new(move || {
            if let Some(tx) = tx.upgrade() {
                let _ = tx.send(SessionMessage::Completed { generation });
            }
        }));

        if let Err(err) = self.engine.play().await {
            self.fail(Some(track), PlaybackError::Engine(err)).await;
            return;
        }

        info!(track = %track.resource, duration_ms = duration.as_millis() as u64, "Track playing");
        self.start_progress();
        self.transition(SessionState::Playing {
            track,
            position: Duration::ZERO,
            duration,
        })
        .await;
        self.publish(SessionEvent::ProgressTicked {
            progress: ProgressEvent::start_of(duration),
        });
    }

    async fn fail(&mut self, track: Option<Track>, err: PlaybackError) {
        warn!(
            track = track.as_ref().map(|t| t.resource.as_str()).unwrap_or("-"),
            error = %err,
            "Playback failed"
        );
        self.stop_progress();
        self.transition(SessionState::Error {
            track,
            cause: err.to_string(),
        })
        .await;
    }

    async fn transition(&mut self, next: SessionState) {
        debug!(from = self.state.name(), to = next.name(), "State transition");
        self.state = next.clone();
        *self.shared.state.write() = next.clone();
        self.publish(SessionEvent::StateChanged {
            state: next.clone(),
        });
        self.mirror.sync(&next).await;
    }

    fn publish(&self, event: SessionEvent) {
        // No subscribers is not an error.
        let _ = self.bus.emit(event);
    }

    fn start_progress(&mut self) {
        let engine = Arc::clone(&self.engine);
        let bus = self.bus.clone();
        self.progress.start(
            move || (engine.current_position(), engine.duration()),
            move |progress| {
                let _ = bus.emit(SessionEvent::ProgressTicked { progress });
            },
        );
        self.shared.progress_active.store(true, Ordering::SeqCst);
    }

    fn stop_progress(&mut self) {
        self.progress.stop();
        self.shared.progress_active.store(false, Ordering::SeqCst);
    }

    async fn teardown(&mut self) {
        debug!(state = self.state.name(), "Tearing down session");
        self.stop_progress();
        if let Err(err) = self.engine.release().await {
            warn!(error = %err, "Failed to release audio engine");
        }
        if !matches!(self.state, SessionState::Idle) {
            self.transition(SessionState::Idle).await;
        }
        self.mirror.clear().await;
        self.publish(SessionEvent::SessionEnded);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bridge_traits::error::Result as BridgeResult;
    use bridge_traits::playback::CompletionHandler;
    use mockall::mock;

    mock! {
        Engine {}

        #[async_trait]
        impl AudioEngine for Engine {
            async fn load(&self, resource: &ResourceId) -> BridgeResult<Duration>;
            async fn play(&self) -> BridgeResult<()>;
            async fn pause(&self) -> BridgeResult<()>;
            async fn resume(&self) -> BridgeResult<()>;
            async fn seek(&self, position: Duration) -> BridgeResult<()>;
            fn current_position(&self) -> Duration;
            fn duration(&self) -> Duration;
            async fn set_volume(&self, level: f32) -> BridgeResult<()>;
            fn on_completion(&self, handler: CompletionHandler);
            async fn release(&self) -> BridgeResult<()>;
        }
    }

    fn tracks() -> Vec<Track> {
        vec![Track::new("raw/a", "A", "Artist", "")]
    }

    #[tokio::test]
    async fn test_builder_requires_engine() {
        let result = PlaybackSessionBuilder::new().tracks(tracks()).build();
        assert!(matches!(result, Err(PlaybackError::CapabilityMissing(_))));
    }

    #[test]
    fn test_builder_requires_runtime() {
        let result = PlaybackSessionBuilder::new()
            .engine(Arc::new(MockEngine::new()))
            .tracks(tracks())
            .build();
        assert!(matches!(
            result,
            Err(PlaybackError::CapabilityMissing(ref what)) if what == "Tokio runtime"
        ));
    }

    #[tokio::test]
    async fn test_builder_rejects_bad_queue_and_config() {
        let result = PlaybackSessionBuilder::new()
            .engine(Arc::new(MockEngine::new()))
            .build();
        assert!(matches!(result, Err(PlaybackError::EmptyQueue)));

        let result = PlaybackSessionBuilder::new()
            .engine(Arc::new(MockEngine::new()))
            .tracks(tracks())
            .start_index(1)
            .build();
        assert!(matches!(
            result,
            Err(PlaybackError::StartIndexOutOfRange { index: 1, len: 1 })
        ));

        let result = PlaybackSessionBuilder::new()
            .engine(Arc::new(MockEngine::new()))
            .tracks(tracks())
            .config(SessionConfig::default().with_event_buffer_size(0))
            .build();
        assert!(matches!(result, Err(PlaybackError::InvalidConfig(_))));
    }

    #[tokio::test]
    async fn test_shutdown_releases_engine_and_rejects_commands() {
        let mut engine = MockEngine::new();
        engine.expect_set_volume().times(1).returning(|_| Ok(()));
        engine.expect_release().times(1).returning(|| Ok(()));

        let session = PlaybackSessionBuilder::new()
            .engine(Arc::new(engine))
            .tracks(tracks())
            .config(SessionConfig::default().with_initial_volume(0.4))
            .build()
            .unwrap();
        let mut events = session.subscribe();

        assert_eq!(session.queue_len(), 1);
        assert_eq!(session.volume(), VolumeLevel::new(0.4));

        session.shutdown().await;
        session.shutdown().await;

        assert!(session.is_shut_down());
        assert!(matches!(
            session.submit(Command::Resume),
            Err(PlaybackError::CommandAfterShutdown)
        ));
        assert_eq!(events.drain().last().cloned(), Some(SessionEvent::SessionEnded));
    }

    #[tokio::test]
    async fn test_actor_stops_when_last_sender_dropped() {
        let mut engine = MockEngine::new();
        engine.expect_set_volume().returning(|_| Ok(()));
        engine.expect_release().times(1).returning(|| Ok(()));

        let mut session = PlaybackSessionBuilder::new()
            .engine(Arc::new(engine))
            .tracks(tracks())
            .build()
            .unwrap();
        let mut ended = session.subscribe().filter(|e| *e == SessionEvent::SessionEnded);
        let actor = session.actor.lock().take().unwrap();

        // close the command channel without touching the cancel token
        session.tx = mpsc::unbounded_channel().0;
        tokio::time::timeout(Duration::from_secs(5), actor)
            .await
            .unwrap()
            .unwrap();

        assert!(!session.cancel.is_cancelled());
        assert_eq!(ended.try_recv().unwrap().unwrap(), SessionEvent::SessionEnded);
    }

    #[tokio::test]
    async fn test_release_failure_still_ends_session() {
        let mut engine = MockEngine::new();
        engine.expect_set_volume().returning(|_| Ok(()));
        engine.expect_release().times(1).returning(|| {
            Err(bridge_traits::BridgeError::OperationFailed(
                "device lost".to_string(),
            ))
        });

        let session = PlaybackSessionBuilder::new()
            .engine(Arc::new(engine))
            .tracks(tracks())
            .build()
            .unwrap();
        let mut events = session.subscribe().filter(|e| *e == SessionEvent::SessionEnded);

        session.shutdown().await;
        assert_eq!(events.try_recv().unwrap().unwrap(), SessionEvent::SessionEnded);
    }
}
