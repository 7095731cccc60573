//! Playback session demo
//!
//! Plays a three-track queue against a simulated engine, printing every
//! session event and the notification the host would show.
//!
//! Run with:
//! ```bash
//! cargo run -p core-playback --example session_demo
//! ```

use anyhow::Result;
use async_trait::async_trait;
use bridge_traits::error::Result as BridgeResult;
use bridge_traits::logging::{ConsoleLogger, LogLevel};
use bridge_traits::notification::{NotificationContent, NotificationPresenter, TransportAction};
use bridge_traits::playback::{AudioEngine, CompletionHandler, ResourceId};
use core_playback::{Command, PlaybackSessionBuilder, SessionConfig, SessionEvent, Track};
use core_runtime::logging::{init_logging, LogFormat, LoggingConfig};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::Instant;

/// Every track lasts three seconds and completes on its own.
#[derive(Default)]
struct SimulatedEngine {
    started: Mutex<Option<Instant>>,
    handler: Mutex<Option<CompletionHandler>>,
    timer: Mutex<Option<JoinHandle<()>>>,
}

const TRACK_LENGTH: Duration = Duration::from_secs(3);

impl SimulatedEngine {
    fn arm(&self, remaining: Duration) {
        let handler = self.handler.lock().clone();
        if let Some(handler) = handler {
            let timer = tokio::spawn(async move {
                tokio::time::sleep(remaining).await;
                handler();
            });
            if let Some(previous) = self.timer.lock().replace(timer) {
                previous.abort();
            }
        }
    }

    fn disarm(&self) {
        if let Some(timer) = self.timer.lock().take() {
            timer.abort();
        }
    }
}

#[async_trait]
impl AudioEngine for SimulatedEngine {
    async fn load(&self, resource: &ResourceId) -> BridgeResult<Duration> {
        println!("  [engine] loading {}", resource);
        self.disarm();
        tokio::time::sleep(Duration::from_millis(200)).await;
        Ok(TRACK_LENGTH)
    }

    async fn play(&self) -> BridgeResult<()> {
        *self.started.lock() = Some(Instant::now());
        self.arm(TRACK_LENGTH);
        Ok(())
    }

    async fn pause(&self) -> BridgeResult<()> {
        self.disarm();
        Ok(())
    }

    async fn resume(&self) -> BridgeResult<()> {
        let remaining = TRACK_LENGTH.saturating_sub(self.current_position());
        self.arm(remaining);
        Ok(())
    }

    async fn seek(&self, _position: Duration) -> BridgeResult<()> {
        Ok(())
    }

    fn current_position(&self) -> Duration {
        self.started
            .lock()
            .map(|started| started.elapsed().min(TRACK_LENGTH))
            .unwrap_or_default()
    }

    fn duration(&self) -> Duration {
        TRACK_LENGTH
    }

    async fn set_volume(&self, level: f32) -> BridgeResult<()> {
        println!("  [engine] volume {:.2}", level);
        Ok(())
    }

    fn on_completion(&self, handler: CompletionHandler) {
        *self.handler.lock() = Some(handler);
    }

    async fn release(&self) -> BridgeResult<()> {
        self.disarm();
        println!("  [engine] released");
        Ok(())
    }
}

struct ConsolePresenter;

#[async_trait]
impl NotificationPresenter for ConsolePresenter {
    async fn render(&self, content: NotificationContent) -> BridgeResult<()> {
        let buttons: Vec<&str> = content.actions.iter().map(TransportAction::label).collect();
        println!(
            "  [notification] {} - {} [{}]",
            content.now_playing.artist,
            content.now_playing.title,
            buttons.join(" | ")
        );
        Ok(())
    }

    async fn clear(&self) -> BridgeResult<()> {
        println!("  [notification] cleared");
        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging(
        LoggingConfig::default()
            .with_format(LogFormat::Compact)
            .with_level(LogLevel::Info)
            .with_logger_sink(Arc::new(ConsoleLogger {
                tag: "demo".to_string(),
                min_level: LogLevel::Warn,
            })),
    )?;

    let tracks = vec![
        Track::new("raw/intro", "Intro", "Demo Band", "https://example.com/intro.jpg"),
        Track::new("raw/theme", "Main Theme", "Demo Band", "https://example.com/theme.jpg"),
        Track::new("raw/outro", "Outro", "Demo Band", "https://example.com/outro.jpg"),
    ];

    let session = PlaybackSessionBuilder::new()
        .engine(Arc::new(SimulatedEngine::default()))
        .presenter(Arc::new(ConsolePresenter))
        .tracks(tracks)
        .config(SessionConfig::default().with_initial_volume(0.8))
        .build()?;

    let mut events = session.subscribe();
    let printer = tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            println!("{}", event.description());
            if event == SessionEvent::SessionEnded {
                break;
            }
        }
    });

    session.dispatch_transport(TransportAction::Play)?;
    tokio::time::sleep(Duration::from_millis(1500)).await;

    session.submit(Command::Pause)?;
    session.submit(Command::SetVolume(0.5))?;
    tokio::time::sleep(Duration::from_secs(1)).await;

    session.submit(Command::Resume)?;
    session.submit(Command::Next)?;

    // let the rest of the queue play out
    tokio::time::sleep(Duration::from_secs(8)).await;
    println!("Final state: {:?}", session.current_state().name());

    session.shutdown().await;
    printer.await?;
    Ok(())
}
