//! Seek completion tracking
//!
//! The embed player reports a state change after a seek only while playing.
//! A seek issued on a paused player is confirmed by polling the current time
//! until it moves away from the pre-seek position.

use tracing::trace;

/// What the tech should do after issuing a seek
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeekPlan {
    /// Paused and the position will move; poll for completion
    Poll,
    /// Paused and already at the target; nothing will report completion
    CompleteNow,
    /// Playing; the next state change completes the seek
    AwaitStateChange,
}

/// Result of one poll tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    /// Position unchanged, keep polling
    Continue,
    /// Position moved; the seek is done
    Completed,
    /// Seek no longer pending or player left paused; stop polling
    Cancel,
}

/// Seek bookkeeping for one tech
#[derive(Debug, Clone, Default)]
pub struct SeekEmulator {
    seeking: bool,
    polling: bool,
    time_before_seek: Option<f64>,
    was_paused_before_seek: bool,
}

impl SeekEmulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_seeking(&self) -> bool {
        self.seeking
    }

    pub fn is_polling(&self) -> bool {
        self.polling
    }

    pub fn was_paused_before_seek(&self) -> bool {
        self.was_paused_before_seek
    }

    /// An explicit play cancels the intent to stay paused after a seek
    pub fn clear_pause_intent(&mut self) {
        self.was_paused_before_seek = false;
    }

    /// Record a seek to `target`.
    ///
    /// `backend_paused` is whether the last reported state is paused,
    /// `current_time` the position before the seek is issued and
    /// `paused` the tech's own paused query.
    pub fn begin(&mut self, target: f64, backend_paused: bool, current_time: f64, paused: bool) -> SeekPlan {
        if backend_paused {
            self.time_before_seek = Some(current_time);
        }
        // A superseding seek keeps the status from before the first one
        if !self.seeking {
            self.was_paused_before_seek = paused;
        }
        self.seeking = true;
        self.polling = false;

        if !backend_paused {
            return SeekPlan::AwaitStateChange;
        }

        if self.time_before_seek == Some(target) {
            SeekPlan::CompleteNow
        } else {
            self.polling = true;
            SeekPlan::Poll
        }
    }

    /// One poll tick
    pub fn poll(&mut self, backend_paused: bool, current_time: f64) -> PollOutcome {
        if !self.seeking || !backend_paused {
            self.polling = false;
            return PollOutcome::Cancel;
        }
        if Some(current_time) != self.time_before_seek {
            trace!(current_time, "Paused seek landed");
            return PollOutcome::Completed;
        }
        PollOutcome::Continue
    }

    /// Stop polling without finishing the seek
    pub fn stop_polling(&mut self) {
        self.polling = false;
    }

    /// Finish the pending seek. Returns whether playback should be paused
    /// again to restore the pre-seek status.
    pub fn complete(&mut self) -> bool {
        self.seeking = false;
        self.polling = false;
        self.was_paused_before_seek
    }

    /// Drop all pending state
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paused_seek_polls_until_position_moves() {
        let mut seek = SeekEmulator::new();
        assert_eq!(seek.begin(30.0, true, 10.0, true), SeekPlan::Poll);
        assert!(seek.is_seeking());
        assert!(seek.is_polling());

        assert_eq!(seek.poll(true, 10.0), PollOutcome::Continue);
        assert_eq!(seek.poll(true, 30.0), PollOutcome::Completed);
        assert!(seek.complete());
        assert!(!seek.is_seeking());
        assert!(!seek.is_polling());
    }

    #[test]
    fn test_paused_seek_to_current_position() {
        let mut seek = SeekEmulator::new();
        assert_eq!(seek.begin(10.0, true, 10.0, true), SeekPlan::CompleteNow);
        assert!(!seek.is_polling());
    }

    #[test]
    fn test_playing_seek_waits_for_state_change() {
        let mut seek = SeekEmulator::new();
        assert_eq!(seek.begin(50.0, false, 10.0, false), SeekPlan::AwaitStateChange);
        assert!(seek.is_seeking());
        assert!(!seek.complete());
    }

    #[test]
    fn test_poll_cancels_when_player_leaves_paused() {
        let mut seek = SeekEmulator::new();
        seek.begin(30.0, true, 10.0, true);
        assert_eq!(seek.poll(false, 10.0), PollOutcome::Cancel);
        assert!(!seek.is_polling());
        assert!(seek.is_seeking());
    }

    #[test]
    fn test_superseding_seek_keeps_original_pause_status() {
        let mut seek = SeekEmulator::new();
        seek.begin(30.0, false, 10.0, false);
        // Second seek lands while the player reports paused
        seek.begin(60.0, true, 30.0, true);
        assert!(!seek.was_paused_before_seek());
        assert_eq!(seek.poll(true, 60.0), PollOutcome::Completed);
    }

    #[test]
    fn test_play_clears_pause_intent() {
        let mut seek = SeekEmulator::new();
        seek.begin(30.0, true, 10.0, true);
        seek.clear_pause_intent();
        assert!(!seek.complete());
    }
}
