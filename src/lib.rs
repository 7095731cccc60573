//! Workspace facade crate.
//!
//! Host applications can depend on `playback-session-workspace` and reach the
//! session core, the runtime utilities, and the host bridge contracts through a
//! single dependency instead of wiring each crate individually.

pub use bridge_traits as bridge;
pub use core_playback as playback;
pub use core_runtime as runtime;
