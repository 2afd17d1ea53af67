//! tubetech Core - YouTube embed playback tech
//!
//! Makes the asynchronous, callback-driven YouTube iframe player behave like a
//! synchronously queryable media element:
//! - Source URL resolution (video and playlist ids)
//! - Readiness gate for the page-wide embed API
//! - Deferred play/cue intents until the player is ready
//! - Player state to media event translation
//! - Seek completion emulation while paused
//! - Player error translation
//! - Thumbnail poster resolution
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                        tubetech Core                            │
//! ├─────────────────────────────────────────────────────────────────┤
//! │                                                                 │
//! │  ┌──────────────┐  ┌──────────────┐  ┌──────────────┐           │
//! │  │     URL      │  │    Poster    │  │    Error     │           │
//! │  │   Resolver   │  │   Resolver   │  │  Translator  │           │
//! │  └──────┬───────┘  └──────┬───────┘  └──────┬───────┘           │
//! │         │                 │                 │                   │
//! │         └─────────────────┼─────────────────┘                   │
//! │                           │                                     │
//! │                    ┌──────┴──────┐                              │
//! │                    │ YoutubeTech │                              │
//! │                    │  (states)   │                              │
//! │                    └──────┬──────┘                              │
//! │                           │                                     │
//! │  ┌──────────────┐  ┌──────┴──────┐  ┌──────────────┐            │
//! │  │  Readiness   │  │   Backend   │  │     Seek     │            │
//! │  │     Gate     │  │ (YT.Player) │  │   Emulator   │            │
//! │  └──────────────┘  └─────────────┘  └──────────────┘            │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

pub mod backend;
pub mod config;
pub mod error;
pub mod gate;
pub mod locator;
pub mod media_error;
pub mod poster;
pub mod scheduler;
pub mod seek;
pub mod tech;
pub mod types;

pub use backend::{Backend, BackendApi, BackendEvent, BackendListener, VideoRequest};
pub use config::{Platform, PlayerSetup, TechOptions};
pub use error::{Error, Result};
pub use gate::{ReadinessGate, SharedGate};
pub use locator::{can_play_type, ResourceLocator};
pub use media_error::{BackendErrorKind, MediaError};
pub use poster::{ImageProbe, ImageSize, ProbeError};
pub use scheduler::{Scheduler, TimerKind};
pub use seek::SeekEmulator;
pub use tech::{release_gate, TechDeps, TechEvents, TechGate, TechHandle, YoutubeTech};
pub use types::*;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize the library
pub fn init() {
    tracing::info!(version = VERSION, "tubetech Core initialized");
}
