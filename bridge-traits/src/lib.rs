//! # Host Bridge Traits
//!
//! Capabilities the playback session core needs from its host platform.
//!
//! ## Overview
//!
//! The session core owns playback state and decides what should happen next.
//! Everything that touches the operating system is expressed here as a trait
//! that each host (Android, iOS, desktop) implements once:
//!
//! - [`AudioEngine`](playback::AudioEngine) - load, play, pause, seek and
//!   release one track at a time; report position and completion
//! - [`NotificationPresenter`](notification::NotificationPresenter) - render
//!   the persistent transport-control notification
//! - [`LoggerSink`](logging::LoggerSink) - receive structured core logs
//!
//! ## Error Handling
//!
//! Every bridge returns [`BridgeError`](error::BridgeError). Implementations
//! should map platform errors onto the closest variant and keep the message
//! actionable (resource id, native error code).
//!
//! ## Thread Safety
//!
//! All traits require `Send + Sync`; the core calls them from background
//! tasks and shares them behind `Arc`.

pub mod error;
pub mod logging;
pub mod notification;
pub mod playback;

pub use error::BridgeError;

pub use logging::{ConsoleLogger, LogEntry, LogLevel, LoggerSink};
pub use notification::{
    NotificationContent, NotificationPresenter, NowPlaying, TransportAction,
    NOTIFICATION_CHANNEL_ID, NOTIFICATION_CHANNEL_NAME,
};
pub use playback::{AudioEngine, CompletionHandler, ResourceId};
