//! Core types for tubetech

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a mounted tech instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InstanceId(pub Uuid);

impl InstanceId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for InstanceId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for InstanceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Raw playback state reported by the embedded player
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BackendState {
    /// Any negative code; the player has a video but has not started it
    Unstarted,
    Ended,
    Playing,
    Paused,
    Buffering,
    /// Video cued but not loaded
    Cued,
    /// Code outside the documented set
    Other(i32),
}

impl BackendState {
    pub fn from_code(code: i32) -> Self {
        match code {
            c if c < 0 => BackendState::Unstarted,
            0 => BackendState::Ended,
            1 => BackendState::Playing,
            2 => BackendState::Paused,
            3 => BackendState::Buffering,
            5 => BackendState::Cued,
            other => BackendState::Other(other),
        }
    }

    pub fn code(&self) -> i32 {
        match self {
            BackendState::Unstarted => -1,
            BackendState::Ended => 0,
            BackendState::Playing => 1,
            BackendState::Paused => 2,
            BackendState::Buffering => 3,
            BackendState::Cued => 5,
            BackendState::Other(code) => *code,
        }
    }
}

impl std::fmt::Display for BackendState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BackendState::Unstarted => write!(f, "unstarted"),
            BackendState::Ended => write!(f, "ended"),
            BackendState::Playing => write!(f, "playing"),
            BackendState::Paused => write!(f, "paused"),
            BackendState::Buffering => write!(f, "buffering"),
            BackendState::Cued => write!(f, "cued"),
            BackendState::Other(code) => write!(f, "other({})", code),
        }
    }
}

/// Tech lifecycle states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TechState {
    /// Constructed, not yet attached to the embed API
    Uninitialized,
    /// Queued in the readiness gate
    AwaitingBackendApi,
    /// Player object created, waiting for its ready callback
    BackendConstructed,
    /// Usable; no playback sub-state reported yet (or unstarted/cued)
    Ready,
    Playing,
    Paused,
    Buffering,
    Ended,
    /// Torn down
    Disposed,
}

impl TechState {
    /// Check if transition to target state is valid
    pub fn can_transition_to(&self, target: TechState) -> bool {
        use TechState::*;
        matches!(
            (self, target),
            // Anything alive can be torn down
            (Uninitialized | AwaitingBackendApi | BackendConstructed | Ready
                | Playing | Paused | Buffering | Ended, Disposed) |
            // From Uninitialized
            (Uninitialized, AwaitingBackendApi) | (Uninitialized, BackendConstructed) |
            // From AwaitingBackendApi
            (AwaitingBackendApi, BackendConstructed) |
            // From BackendConstructed
            (BackendConstructed, Ready) |
            // From Ready
            (Ready, Playing) | (Ready, Paused) | (Ready, Buffering) | (Ready, Ended) |
            // Between playback sub-states, and back to Ready on unstarted/cued
            (Playing | Paused | Buffering | Ended, Ready | Playing | Paused | Buffering | Ended)
        ) && *self != target
    }

    /// True once the player accepts commands
    pub fn is_usable(&self) -> bool {
        matches!(
            self,
            TechState::Ready
                | TechState::Playing
                | TechState::Paused
                | TechState::Buffering
                | TechState::Ended
        )
    }

    /// Sub-state entered for a reported backend state
    pub fn for_backend(state: BackendState) -> Option<TechState> {
        match state {
            BackendState::Unstarted | BackendState::Cued => Some(TechState::Ready),
            BackendState::Playing => Some(TechState::Playing),
            BackendState::Paused => Some(TechState::Paused),
            BackendState::Buffering => Some(TechState::Buffering),
            BackendState::Ended => Some(TechState::Ended),
            BackendState::Other(_) => None,
        }
    }
}

impl std::fmt::Display for TechState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TechState::Uninitialized => write!(f, "uninitialized"),
            TechState::AwaitingBackendApi => write!(f, "awaiting_backend_api"),
            TechState::BackendConstructed => write!(f, "backend_constructed"),
            TechState::Ready => write!(f, "ready"),
            TechState::Playing => write!(f, "playing"),
            TechState::Paused => write!(f, "paused"),
            TechState::Buffering => write!(f, "buffering"),
            TechState::Ended => write!(f, "ended"),
            TechState::Disposed => write!(f, "disposed"),
        }
    }
}

/// Events emitted to the host player
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TechEvent {
    /// The tech finished its own setup (host `triggerReady`)
    Ready,
    LoadStart,
    LoadedMetadata,
    DurationChange,
    RateChange,
    Playing,
    Play,
    Pause,
    CanPlay,
    Waiting,
    TimeUpdate,
    Ended,
    Seeking,
    Seeked,
    VolumeChange,
    PosterChange,
    Error,
}

impl TechEvent {
    /// Event name as the host player expects it
    pub fn name(&self) -> &'static str {
        match self {
            TechEvent::Ready => "ready",
            TechEvent::LoadStart => "loadstart",
            TechEvent::LoadedMetadata => "loadedmetadata",
            TechEvent::DurationChange => "durationchange",
            TechEvent::RateChange => "ratechange",
            TechEvent::Playing => "playing",
            TechEvent::Play => "play",
            TechEvent::Pause => "pause",
            TechEvent::CanPlay => "canplay",
            TechEvent::Waiting => "waiting",
            TechEvent::TimeUpdate => "timeupdate",
            TechEvent::Ended => "ended",
            TechEvent::Seeking => "seeking",
            TechEvent::Seeked => "seeked",
            TechEvent::VolumeChange => "volumechange",
            TechEvent::PosterChange => "posterchange",
            TechEvent::Error => "error",
        }
    }
}

impl std::fmt::Display for TechEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A contiguous time span in seconds
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeRange {
    pub start: f64,
    pub end: f64,
}

/// Set of time spans, as reported for buffered and seekable queries
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TimeRanges {
    ranges: Vec<TimeRange>,
}

impl TimeRanges {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn single(start: f64, end: f64) -> Self {
        Self {
            ranges: vec![TimeRange { start, end }],
        }
    }

    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    pub fn start(&self, index: usize) -> Option<f64> {
        self.ranges.get(index).map(|r| r.start)
    }

    pub fn end(&self, index: usize) -> Option<f64> {
        self.ranges.get(index).map(|r| r.end)
    }

    pub fn iter(&self) -> impl Iterator<Item = &TimeRange> {
        self.ranges.iter()
    }
}

/// Media element network state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NetworkState {
    Empty = 0,
    Idle = 1,
    Loading = 2,
}

/// Media element ready state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReadyState {
    HaveNothing = 0,
    HaveMetadata = 1,
    HaveCurrentData = 2,
    HaveFutureData = 3,
    HaveEnoughData = 4,
}

impl NetworkState {
    pub fn for_backend(state: BackendState) -> Self {
        match state {
            BackendState::Unstarted => NetworkState::Empty,
            BackendState::Buffering => NetworkState::Loading,
            _ => NetworkState::Idle,
        }
    }
}

impl ReadyState {
    pub fn for_backend(state: BackendState) -> Self {
        match state {
            BackendState::Unstarted => ReadyState::HaveNothing,
            BackendState::Cued => ReadyState::HaveMetadata,
            BackendState::Buffering => ReadyState::HaveCurrentData,
            _ => ReadyState::HaveEnoughData,
        }
    }
}
