//! Shared fixtures for session integration tests.
//!
//! `FakeEngine` is a scripted in-memory audio engine driven by Tokio's clock,
//! so tests running with `start_paused = true` advance playback
//! deterministically.

#![allow(dead_code)]

use async_trait::async_trait;
use bridge_traits::error::{BridgeError, Result as BridgeResult};
use bridge_traits::notification::{NotificationContent, NotificationPresenter};
use bridge_traits::playback::{AudioEngine, CompletionHandler, ResourceId};
use core_playback::{SessionEvent, SessionEventStream, SessionState, Track};
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::Instant;

pub const DEFAULT_DURATION: Duration = Duration::from_secs(180);

#[derive(Debug, Clone, PartialEq)]
pub enum EngineCall {
    Load(String),
    Play,
    Pause,
    Resume,
    Seek(Duration),
    SetVolume(f32),
    Release,
}

#[derive(Default)]
struct Script {
    durations: HashMap<String, Duration>,
    failing: HashSet<String>,
    load_delay: Duration,
    auto_complete: bool,
}

#[derive(Default)]
struct Playhead {
    duration: Duration,
    base: Duration,
    playing_since: Option<Instant>,
}

impl Playhead {
    fn position(&self) -> Duration {
        let running = self
            .playing_since
            .map(|since| since.elapsed())
            .unwrap_or_default();
        (self.base + running).min(self.duration)
    }
}

pub struct FakeEngine {
    script: Mutex<Script>,
    playhead: Mutex<Playhead>,
    calls: Mutex<Vec<EngineCall>>,
    handlers: Mutex<Vec<CompletionHandler>>,
    completion_timer: Mutex<Option<JoinHandle<()>>>,
    volume: Mutex<Option<f32>>,
    loads_in_flight: AtomicUsize,
    max_concurrent_loads: AtomicUsize,
}

impl FakeEngine {
    pub fn new() -> Self {
        Self {
            script: Mutex::new(Script::default()),
            playhead: Mutex::new(Playhead::default()),
            calls: Mutex::new(Vec::new()),
            handlers: Mutex::new(Vec::new()),
            completion_timer: Mutex::new(None),
            volume: Mutex::new(None),
            loads_in_flight: AtomicUsize::new(0),
            max_concurrent_loads: AtomicUsize::new(0),
        }
    }

    pub fn with_duration(self, resource: &str, duration: Duration) -> Self {
        self.script
            .lock()
            .durations
            .insert(resource.to_string(), duration);
        self
    }

    pub fn failing(self, resource: &str) -> Self {
        self.script.lock().failing.insert(resource.to_string());
        self
    }

    pub fn with_load_delay(self, delay: Duration) -> Self {
        self.script.lock().load_delay = delay;
        self
    }

    /// Fire the completion handler when the playhead reaches the end.
    pub fn auto_complete(self) -> Self {
        self.script.lock().auto_complete = true;
        self
    }

    pub fn calls(&self) -> Vec<EngineCall> {
        self.calls.lock().clone()
    }

    pub fn loads(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                EngineCall::Load(id) => Some(id),
                _ => None,
            })
            .collect()
    }

    pub fn count(&self, call: &EngineCall) -> usize {
        self.calls.lock().iter().filter(|c| *c == call).count()
    }

    pub fn volume(&self) -> Option<f32> {
        *self.volume.lock()
    }

    pub fn released(&self) -> bool {
        self.count(&EngineCall::Release) > 0
    }

    pub fn max_concurrent_loads(&self) -> usize {
        self.max_concurrent_loads.load(Ordering::SeqCst)
    }

    /// Signal completion of the current track, as the engine would at its end.
    pub fn complete_now(&self) {
        let handler = self.handlers.lock().last().cloned();
        if let Some(handler) = handler {
            handler();
        }
    }

    /// Invoke the `index`th handler ever registered.
    pub fn fire_handler(&self, index: usize) {
        let handler = self.handlers.lock().get(index).cloned();
        if let Some(handler) = handler {
            handler();
        }
    }

    fn record(&self, call: EngineCall) {
        self.calls.lock().push(call);
    }

    fn cancel_completion_timer(&self) {
        if let Some(timer) = self.completion_timer.lock().take() {
            timer.abort();
        }
    }

    fn arm_completion_timer(&self, remaining: Duration) {
        self.cancel_completion_timer();
        if !self.script.lock().auto_complete {
            return;
        }
        let handler = self.handlers.lock().last().cloned();
        if let Some(handler) = handler {
            let timer = tokio::spawn(async move {
                tokio::time::sleep(remaining).await;
                handler();
            });
            *self.completion_timer.lock() = Some(timer);
        }
    }

    fn remaining(&self) -> Duration {
        let playhead = self.playhead.lock();
        playhead.duration.saturating_sub(playhead.position())
    }
}

#[async_trait]
impl AudioEngine for FakeEngine {
    async fn load(&self, resource: &ResourceId) -> BridgeResult<Duration> {
        self.record(EngineCall::Load(resource.to_string()));
        self.cancel_completion_timer();

        let in_flight = self.loads_in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_concurrent_loads.fetch_max(in_flight, Ordering::SeqCst);

        let (delay, fails, duration) = {
            let script = self.script.lock();
            (
                script.load_delay,
                script.failing.contains(resource.as_str()),
                script
                    .durations
                    .get(resource.as_str())
                    .copied()
                    .unwrap_or(DEFAULT_DURATION),
            )
        };
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        self.loads_in_flight.fetch_sub(1, Ordering::SeqCst);

        if fails {
            return Err(BridgeError::ResourceNotFound(resource.to_string()));
        }
        *self.playhead.lock() = Playhead {
            duration,
            base: Duration::ZERO,
            playing_since: None,
        };
        Ok(duration)
    }

    async fn play(&self) -> BridgeResult<()> {
        self.record(EngineCall::Play);
        self.playhead.lock().playing_since = Some(Instant::now());
        self.arm_completion_timer(self.remaining());
        Ok(())
    }

    async fn pause(&self) -> BridgeResult<()> {
        self.record(EngineCall::Pause);
        self.cancel_completion_timer();
        let mut playhead = self.playhead.lock();
        playhead.base = playhead.position();
        playhead.playing_since = None;
        Ok(())
    }

    async fn resume(&self) -> BridgeResult<()> {
        self.record(EngineCall::Resume);
        self.playhead.lock().playing_since = Some(Instant::now());
        self.arm_completion_timer(self.remaining());
        Ok(())
    }

    async fn seek(&self, position: Duration) -> BridgeResult<()> {
        self.record(EngineCall::Seek(position));
        let playing = {
            let mut playhead = self.playhead.lock();
            playhead.base = position.min(playhead.duration);
            let playing = playhead.playing_since.is_some();
            if playing {
                playhead.playing_since = Some(Instant::now());
            }
            playing
        };
        if playing {
            self.arm_completion_timer(self.remaining());
        }
        Ok(())
    }

    fn current_position(&self) -> Duration {
        self.playhead.lock().position()
    }

    fn duration(&self) -> Duration {
        self.playhead.lock().duration
    }

    async fn set_volume(&self, level: f32) -> BridgeResult<()> {
        self.record(EngineCall::SetVolume(level));
        *self.volume.lock() = Some(level);
        Ok(())
    }

    fn on_completion(&self, handler: CompletionHandler) {
        self.handlers.lock().push(handler);
    }

    async fn release(&self) -> BridgeResult<()> {
        self.record(EngineCall::Release);
        self.cancel_completion_timer();
        *self.playhead.lock() = Playhead::default();
        Ok(())
    }
}

/// Presenter that keeps every rendered notification.
#[derive(Default)]
pub struct RecordingPresenter {
    rendered: Mutex<Vec<NotificationContent>>,
    clears: AtomicUsize,
}

impl RecordingPresenter {
    pub fn rendered(&self) -> Vec<NotificationContent> {
        self.rendered.lock().clone()
    }

    pub fn clears(&self) -> usize {
        self.clears.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl NotificationPresenter for RecordingPresenter {
    async fn render(&self, content: NotificationContent) -> BridgeResult<()> {
        self.rendered.lock().push(content);
        Ok(())
    }

    async fn clear(&self) -> BridgeResult<()> {
        self.clears.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

pub fn tracks(ids: &[&str]) -> Vec<Track> {
    ids.iter()
        .map(|id| {
            Track::new(
                *id,
                format!("Song {}", id.to_uppercase()),
                "Test Artist",
                format!("https://example.com/{}.jpg", id),
            )
        })
        .collect()
}

pub fn resource(id: &str) -> ResourceId {
    ResourceId::new(id)
}

const WAIT: Duration = Duration::from_secs(600);

/// Next `StateChanged` payload, skipping other events.
pub async fn next_state(events: &mut SessionEventStream) -> SessionState {
    loop {
        match next_event(events).await {
            SessionEvent::StateChanged { state } => return state,
            _ => continue,
        }
    }
}

pub async fn next_event(events: &mut SessionEventStream) -> SessionEvent {
    tokio::time::timeout(WAIT, events.recv())
        .await
        .expect("timed out waiting for a session event")
        .expect("event stream closed or lagged")
}

/// Collect state names until `done` matches a state, inclusive.
pub async fn states_until<F>(events: &mut SessionEventStream, done: F) -> Vec<SessionState>
where
    F: Fn(&SessionState) -> bool,
{
    let mut seen = Vec::new();
    loop {
        let state = next_state(events).await;
        let finished = done(&state);
        seen.push(state);
        if finished {
            return seen;
        }
    }
}

pub fn is_playing(id: &str) -> impl Fn(&SessionState) -> bool + '_ {
    move |state| {
        matches!(state, SessionState::Playing { track, .. } if track.resource.as_str() == id)
    }
}

pub fn names(states: &[SessionState]) -> Vec<&'static str> {
    states.iter().map(SessionState::name).collect()
}
