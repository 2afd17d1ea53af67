//! Embed API capability traits
//!
//! [`BackendApi`] stands for the page-wide iframe API (the `YT` namespace),
//! [`Backend`] for one `YT.Player` object. Player callbacks come back as
//! [`BackendEvent`] values through the [`BackendListener`] handed to
//! [`BackendApi::create_player`].

use crate::config::PlayerSetup;
use serde::{Deserialize, Serialize};
use std::rc::Rc;

/// Callback from the embedded player
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum BackendEvent {
    Ready,
    StateChange(i32),
    PlaybackQualityChange(String),
    PlaybackRateChange(f64),
    VolumeChange,
    Error(i32),
}

/// Receives player callbacks
pub type BackendListener = Rc<dyn Fn(BackendEvent)>;

/// Arguments for `loadVideoById` / `cueVideoById`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoRequest {
    pub video_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_seconds: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_seconds: Option<u32>,
}

impl VideoRequest {
    /// Zero offsets are dropped, they mean "not set"
    pub fn new(video_id: impl Into<String>, start: Option<u32>, end: Option<u32>) -> Self {
        Self {
            video_id: video_id.into(),
            start_seconds: start.filter(|s| *s > 0),
            end_seconds: end.filter(|s| *s > 0),
        }
    }
}

/// One embedded player object
///
/// Commands are fire-and-forget; queries read the player's current view.
pub trait Backend {
    fn play_video(&self);
    fn pause_video(&self);
    fn stop_video(&self);
    fn seek_to(&self, seconds: f64, allow_seek_ahead: bool);
    fn load_video_by_id(&self, request: &VideoRequest);
    fn cue_video_by_id(&self, request: &VideoRequest);
    fn load_playlist(&self, list_id: &str);

    fn current_time(&self) -> f64;
    fn duration(&self) -> f64;
    fn playback_rate(&self) -> f64;
    fn set_playback_rate(&self, rate: f64);
    fn available_playback_rates(&self) -> Vec<f64>;

    /// Volume in 0..=100
    fn volume(&self) -> f64;
    fn set_volume(&self, volume: f64);
    fn is_muted(&self) -> bool;
    fn mute(&self);
    fn un_mute(&self);

    /// Loaded fraction of the video; `None` when the player cannot tell
    fn video_loaded_fraction(&self) -> Option<f64>;
    /// Raw state code as `getPlayerState` reports it
    fn player_state(&self) -> i32;

    /// Release the iframe
    fn destroy(&self);
}

/// The page-wide embed API
pub trait BackendApi {
    /// Construct a player replacing `setup.element_id`. The player reports
    /// `Ready` through `listener` once it accepts commands.
    fn create_player(&self, setup: &PlayerSetup, listener: BackendListener) -> Box<dyn Backend>;
}
