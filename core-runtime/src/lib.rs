//! # Core Runtime Module
//!
//! Runtime infrastructure shared by the playback session core:
//! - Logging and tracing setup with host log forwarding
//! - A typed publish/subscribe event bus
//!
//! Domain crates define their own event enums and instantiate
//! [`EventBus`](events::EventBus) with them; nothing in here knows about
//! tracks or playback states.

pub mod error;
pub mod events;
pub mod logging;

pub use error::{Error, Result};
pub use events::{EventBus, EventStream};
