//! Timer facility
//!
//! Each tech owns at most one timer per [`TimerKind`]. Starting a kind that is
//! already running replaces it.

use std::time::Duration;

/// Interval of the paused-seek completion poll
pub const SEEK_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Delay before reporting a mute change
pub const VOLUME_CHANGE_DELAY: Duration = Duration::from_millis(50);

/// Timers a tech may own
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerKind {
    /// Repeating poll while a seek is in flight on a paused player
    SeekPoll,
    /// One-shot `volumechange` after a mute toggle
    VolumeChange,
}

impl TimerKind {
    pub fn period(&self) -> Duration {
        match self {
            TimerKind::SeekPoll => SEEK_POLL_INTERVAL,
            TimerKind::VolumeChange => VOLUME_CHANGE_DELAY,
        }
    }

    pub fn repeats(&self) -> bool {
        matches!(self, TimerKind::SeekPoll)
    }
}

/// Timer callback
pub type TimerCallback = Box<dyn FnMut()>;

/// Runs callbacks later on the tech's thread
///
/// One scheduler serves one tech. `start` must cancel a running timer of
/// the same kind first; one-shot timers are forgotten once they fire.
pub trait Scheduler {
    fn start(&self, kind: TimerKind, callback: TimerCallback);
    fn cancel(&self, kind: TimerKind);
}
