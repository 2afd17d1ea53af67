//! YouTube tech - the embed player behind a generic media element contract
//!
//! Coordinates:
//! - Readiness gate admission and deferred player construction
//! - Deferred play/cue intents applied once the player reports ready
//! - Translation of player state changes into host media events
//! - Paused-seek emulation and the latched player error
//! - Poster resolution for the current video

use crate::{
    backend::{Backend, BackendApi, BackendEvent, BackendListener, VideoRequest},
    config::{self, effective_end, effective_start, Platform, PlayerSetup, TechOptions},
    gate::{Admission, SharedGate},
    locator::ResourceLocator,
    media_error::MediaError,
    poster::{self, ImageProbe, ImageSize, ProbeError},
    scheduler::{Scheduler, TimerKind},
    seek::{PollOutcome, SeekEmulator, SeekPlan},
    types::*,
    Error, Result,
};
use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, instrument, trace, warn};

/// Shared handle to a mounted tech
pub type TechHandle = Rc<RefCell<YoutubeTech>>;

/// Handle the readiness gate keeps for queued techs
pub type WeakTech = Weak<RefCell<YoutubeTech>>;

/// Readiness gate specialized for techs
pub type TechGate = SharedGate<WeakTech>;

/// Stream of events for the host player
pub type TechEvents = mpsc::UnboundedReceiver<TechEvent>;

/// Collaborators injected at mount time
#[derive(Clone)]
pub struct TechDeps {
    pub api: Rc<dyn BackendApi>,
    pub scheduler: Rc<dyn Scheduler>,
    pub probe: Rc<dyn ImageProbe>,
    pub gate: TechGate,
    pub platform: Platform,
}

/// Tech instance for one media element
pub struct YoutubeTech {
    /// Unique instance ID
    id: InstanceId,
    /// Self handle for callbacks
    this: WeakTech,
    options: TechOptions,
    api: Rc<dyn BackendApi>,
    scheduler: Rc<dyn Scheduler>,
    probe: Rc<dyn ImageProbe>,
    gate: TechGate,
    platform: Platform,
    /// Lifecycle state
    state: TechState,
    /// State change broadcaster
    state_tx: watch::Sender<TechState>,
    /// Host event sender
    events: mpsc::UnboundedSender<TechEvent>,
    /// Embedded player, once constructed
    backend: Option<Box<dyn Backend>>,
    /// Source as given by the host
    source: Option<String>,
    locator: ResourceLocator,
    /// Video the player has loaded or cued
    active_video_id: Option<String>,
    /// Playlist the player has loaded
    active_list: Option<String>,
    /// Last state reported by the player
    last_state: Option<BackendState>,
    play_on_ready: bool,
    /// `waiting` already sent for the pending play
    waiting_emitted: bool,
    cue_on_ready: bool,
    seek: SeekEmulator,
    /// Latched player error code
    error_code: Option<i32>,
    poster: Option<String>,
    supports_playback_rate: bool,
}

impl YoutubeTech {
    /// Create a tech, apply the initial source and either construct the
    /// player right away or wait in the readiness gate.
    pub fn mount(options: TechOptions, source: Option<&str>, deps: TechDeps) -> (TechHandle, TechEvents) {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (state_tx, _) = watch::channel(TechState::Uninitialized);
        let gate = deps.gate.clone();

        let tech = Rc::new_cyclic(|this| {
            RefCell::new(Self {
                id: InstanceId::new(),
                this: this.clone(),
                poster: options.explicit_poster().map(str::to_string),
                options,
                api: deps.api,
                scheduler: deps.scheduler,
                probe: deps.probe,
                gate: deps.gate,
                platform: deps.platform,
                state: TechState::Uninitialized,
                state_tx,
                events: events_tx,
                backend: None,
                source: None,
                locator: ResourceLocator::default(),
                active_video_id: None,
                active_list: None,
                last_state: None,
                play_on_ready: false,
                waiting_emitted: false,
                cue_on_ready: false,
                seek: SeekEmulator::new(),
                error_code: None,
                supports_playback_rate: false,
            })
        });

        let id = {
            let mut t = tech.borrow_mut();
            if let Some(src) = source {
                t.set_source(src);
            }
            t.id
        };

        let admission = gate.borrow_mut().admit(id, Rc::downgrade(&tech));
        match admission {
            Admission::Ready(_) => tech.borrow_mut().initialize(),
            Admission::Queued => tech.borrow_mut().transition(TechState::AwaitingBackendApi),
        }

        (tech, events_rx)
    }

    /// Get instance ID
    pub fn id(&self) -> InstanceId {
        self.id
    }

    /// Get current lifecycle state
    pub fn state(&self) -> TechState {
        self.state
    }

    /// Subscribe to lifecycle state changes
    pub fn subscribe_state(&self) -> watch::Receiver<TechState> {
        self.state_tx.subscribe()
    }

    pub fn options(&self) -> &TechOptions {
        &self.options
    }

    /// Transition to new state
    fn set_state(&mut self, new_state: TechState) -> Result<()> {
        let current = self.state;
        if current == new_state {
            return Ok(());
        }

        if !current.can_transition_to(new_state) {
            return Err(Error::InvalidStateTransition {
                from: current.to_string(),
                to: new_state.to_string(),
            });
        }

        self.state = new_state;
        self.state_tx.send_replace(new_state);

        info!(instance = %self.id, from = %current, to = %new_state, "Tech state transition");

        Ok(())
    }

    fn transition(&mut self, new_state: TechState) {
        if let Err(e) = self.set_state(new_state) {
            debug!(instance = %self.id, error = %e, "Ignored state transition");
        }
    }

    fn is_disposed(&self) -> bool {
        self.state == TechState::Disposed
    }

    fn is_ready(&self) -> bool {
        self.state.is_usable()
    }

    fn emit(&self, event: TechEvent) {
        trace!(instance = %self.id, event = %event, "Tech event");
        // The host may have dropped its receiver; events are then discarded
        let _ = self.events.send(event);
    }

    /// Construct the embedded player. Runs once, from the gate or from mount.
    fn initialize(&mut self) {
        if !matches!(self.state, TechState::Uninitialized | TechState::AwaitingBackendApi) {
            debug!(instance = %self.id, state = %self.state, "Skipping player construction");
            return;
        }

        let setup = PlayerSetup::build(&self.options, &self.locator);
        self.active_video_id = self.locator.video_id.clone();
        self.active_list = setup.list();

        info!(
            instance = %self.id,
            element = %setup.element_id,
            video_id = ?setup.video_id,
            privacy_host = setup.host.is_some(),
            "Constructing embed player"
        );

        let backend = self.api.create_player(&setup, self.listener());
        self.backend = Some(backend);
        self.transition(TechState::BackendConstructed);
    }

    fn listener(&self) -> BackendListener {
        let this = self.this.clone();
        Rc::new(move |event| with_tech(&this, move |tech| tech.handle_backend_event(event)))
    }

    fn start_timer(&self, kind: TimerKind) {
        let this = self.this.clone();
        self.scheduler.cancel(kind);
        self.scheduler
            .start(kind, Box::new(move || with_tech(&this, |tech| tech.on_timer(kind))));
    }

    // =========================================================================
    // Player callbacks
    // =========================================================================

    /// Dispatch a callback from the embedded player
    pub fn handle_backend_event(&mut self, event: BackendEvent) {
        if self.is_disposed() {
            return;
        }
        debug!(instance = %self.id, event = ?event, "Player event");

        match event {
            BackendEvent::Ready => self.on_player_ready(),
            BackendEvent::StateChange(code) => self.on_state_change(BackendState::from_code(code)),
            BackendEvent::PlaybackQualityChange(_) => {}
            BackendEvent::PlaybackRateChange(_) => self.emit(TechEvent::RateChange),
            BackendEvent::VolumeChange => self.emit(TechEvent::VolumeChange),
            BackendEvent::Error(code) => self.on_error(code),
        }
    }

    fn on_player_ready(&mut self) {
        if self.is_ready() {
            return;
        }
        let Some(backend) = &self.backend else {
            warn!(instance = %self.id, "Ready reported without a player");
            return;
        };

        if self.options.muted {
            backend.mute();
        }
        self.supports_playback_rate = backend.available_playback_rates().len() > 1;

        self.transition(TechState::Ready);
        self.emit(TechEvent::Ready);
        self.waiting_emitted = false;

        if std::mem::take(&mut self.play_on_ready) {
            self.cue_on_ready = false;
            self.play();
        } else if std::mem::take(&mut self.cue_on_ready) {
            self.cue_current();
        }
    }

    fn on_state_change(&mut self, state: BackendState) {
        if self.last_state == Some(state) {
            trace!(instance = %self.id, state = %state, "Repeated player state ignored");
            return;
        }
        if let Some(code) = self.error_code {
            trace!(instance = %self.id, state = %state, error = code, "Player state ignored after error");
            return;
        }
        self.last_state = Some(state);

        if self.is_ready() {
            if let Some(next) = TechState::for_backend(state) {
                self.transition(next);
            }
        }

        if state != BackendState::Paused && self.seek.is_polling() {
            self.scheduler.cancel(TimerKind::SeekPoll);
            self.seek.stop_polling();
        }

        match state {
            BackendState::Unstarted => {
                self.emit(TechEvent::LoadStart);
                self.emit(TechEvent::LoadedMetadata);
                self.emit(TechEvent::DurationChange);
                self.emit(TechEvent::RateChange);
            }
            BackendState::Ended => self.emit(TechEvent::Ended),
            BackendState::Playing => {
                self.emit(TechEvent::TimeUpdate);
                self.emit(TechEvent::DurationChange);
                self.emit(TechEvent::Playing);
                self.emit(TechEvent::Play);
                if self.seek.is_seeking() {
                    self.on_seeked();
                }
            }
            BackendState::Paused => {
                self.emit(TechEvent::CanPlay);
                if self.seek.is_seeking() {
                    self.on_seeked();
                } else {
                    self.emit(TechEvent::Pause);
                }
            }
            BackendState::Buffering => {
                self.emit(TechEvent::TimeUpdate);
                self.emit(TechEvent::Waiting);
            }
            BackendState::Cued | BackendState::Other(_) => {}
        }
    }

    fn on_error(&mut self, code: i32) {
        warn!(instance = %self.id, code, "Player error");
        self.error_code = Some(code);
        self.emit(TechEvent::Pause);
        self.emit(TechEvent::Error);
    }

    fn on_timer(&mut self, kind: TimerKind) {
        if self.is_disposed() {
            return;
        }
        match kind {
            TimerKind::SeekPoll => {
                let backend_paused = self.last_state == Some(BackendState::Paused);
                let current = self.current_time();
                match self.seek.poll(backend_paused, current) {
                    PollOutcome::Continue => {}
                    PollOutcome::Cancel => self.scheduler.cancel(TimerKind::SeekPoll),
                    PollOutcome::Completed => {
                        self.emit(TechEvent::TimeUpdate);
                        self.on_seeked();
                    }
                }
            }
            TimerKind::VolumeChange => self.emit(TechEvent::VolumeChange),
        }
    }

    fn on_seeked(&mut self) {
        self.scheduler.cancel(TimerKind::SeekPoll);
        if self.seek.complete() {
            self.pause();
        }
        debug!(instance = %self.id, position = self.current_time(), "Seek completed");
        self.emit(TechEvent::Seeked);
    }

    // =========================================================================
    // Source and poster
    // =========================================================================

    /// Load a new source. Clears a latched error.
    #[instrument(skip(self), fields(instance = %self.id))]
    pub fn set_source(&mut self, src: &str) {
        if self.is_disposed() || src.is_empty() {
            return;
        }

        self.error_code = None;
        self.source = Some(src.to_string());
        self.locator = ResourceLocator::parse(src);

        info!(video_id = ?self.locator.video_id, list_id = ?self.locator.list_id, "Source set");

        if self.options.explicit_poster().is_none() {
            if let Some(video_id) = self.locator.video_id.clone() {
                self.poster = Some(poster::default_poster_url(&video_id));
                self.emit(TechEvent::PosterChange);
                self.check_high_res_poster(video_id);
            }
        }

        if self.options.autoplay && !self.platform.is_restricted_mobile() {
            if self.is_ready() {
                self.play();
            } else {
                self.play_on_ready = true;
            }
        } else if self.active_video_id != self.locator.video_id {
            if self.is_ready() {
                self.cue_current();
            } else {
                self.cue_on_ready = true;
            }
        }
    }

    fn cue_current(&mut self) {
        let (Some(backend), Some(video_id)) = (&self.backend, self.locator.video_id.clone()) else {
            return;
        };
        backend.cue_video_by_id(&self.video_request(&video_id));
        self.active_video_id = Some(video_id);
    }

    fn video_request(&self, video_id: &str) -> VideoRequest {
        VideoRequest::new(
            video_id,
            effective_start(&self.options, &self.locator),
            effective_end(&self.options, &self.locator),
        )
    }

    fn check_high_res_poster(&mut self, video_id: String) {
        let url = poster::high_res_poster_url(&video_id);

        // Probes may complete before `probe` returns; that outcome is
        // handled below rather than through the handle we are borrowed from.
        let inline: Rc<RefCell<Option<std::result::Result<ImageSize, ProbeError>>>> =
            Rc::new(RefCell::new(None));
        let in_call = Rc::new(Cell::new(true));

        let this = self.this.clone();
        let slot = inline.clone();
        let pending = in_call.clone();
        let (probed_id, probed_url) = (video_id.clone(), url.clone());
        self.probe.probe(
            &url,
            Box::new(move |outcome| {
                if pending.get() {
                    *slot.borrow_mut() = Some(outcome);
                } else {
                    with_tech(&this, move |tech| tech.on_poster_probe(&probed_id, probed_url, outcome));
                }
            }),
        );
        in_call.set(false);

        let outcome = inline.borrow_mut().take();
        if let Some(outcome) = outcome {
            self.on_poster_probe(&video_id, url, outcome);
        }
    }

    fn on_poster_probe(&mut self, video_id: &str, url: String, outcome: std::result::Result<ImageSize, ProbeError>) {
        if self.is_disposed() || self.options.explicit_poster().is_some() {
            return;
        }
        if self.locator.video_id.as_deref() != Some(video_id) {
            debug!(instance = %self.id, video_id, "Stale poster probe ignored");
            return;
        }

        match &outcome {
            Err(e) => debug!(instance = %self.id, error = %e, "High resolution poster unavailable"),
            Ok(size) if !poster::accept_high_res(&outcome) => {
                debug!(instance = %self.id, width = size.width, height = size.height, "Placeholder poster ignored")
            }
            Ok(_) => {
                self.poster = Some(url);
                self.emit(TechEvent::PosterChange);
            }
        }
    }

    /// Current source as given by the host
    pub fn current_src(&self) -> Option<&str> {
        self.source.as_deref()
    }

    /// Resolved source identifiers
    pub fn locator(&self) -> &ResourceLocator {
        &self.locator
    }

    /// Poster URL; restricted mobile platforms show YouTube's own
    pub fn poster(&self) -> Option<&str> {
        if self.platform.is_restricted_mobile() {
            return None;
        }
        self.poster.as_deref()
    }

    pub fn set_poster(&mut self, poster: Option<String>) {
        self.poster = poster;
    }

    // =========================================================================
    // Playback commands
    // =========================================================================

    /// Start or resume playback, deferring until ready
    pub fn play(&mut self) {
        if self.is_disposed() {
            return;
        }
        let Some(video_id) = self.locator.video_id.clone() else {
            return;
        };

        self.seek.clear_pause_intent();

        if !self.is_ready() {
            // Autoplay may have queued the play already; the host still
            // gets its one `waiting`
            if !self.waiting_emitted {
                self.emit(TechEvent::Waiting);
                self.waiting_emitted = true;
            }
            self.play_on_ready = true;
            return;
        }

        let Some(backend) = &self.backend else {
            return;
        };

        if let Some(list_id) = self.locator.list_id.clone() {
            if self.active_list.as_deref() == Some(list_id.as_str()) {
                backend.play_video();
            } else {
                backend.load_playlist(&list_id);
                self.active_list = Some(list_id);
            }
        }

        if self.active_video_id.as_deref() == Some(video_id.as_str()) {
            backend.play_video();
        } else {
            backend.load_video_by_id(&self.video_request(&video_id));
            self.active_video_id = Some(video_id);
        }
    }

    pub fn pause(&mut self) {
        if self.is_disposed() {
            return;
        }
        if let Some(backend) = &self.backend {
            backend.pause_video();
        }
    }

    /// Seek to `seconds`, emulating completion when paused
    pub fn set_current_time(&mut self, seconds: f64) {
        if self.is_disposed() || self.backend.is_none() {
            return;
        }

        let backend_paused = self.last_state == Some(BackendState::Paused);
        let current = self.current_time();
        let paused = self.paused();
        let plan = self.seek.begin(seconds, backend_paused, current, paused);

        // A new seek supersedes any poll in flight
        self.scheduler.cancel(TimerKind::SeekPoll);

        if let Some(backend) = &self.backend {
            backend.seek_to(seconds, true);
        }
        self.emit(TechEvent::TimeUpdate);
        self.emit(TechEvent::Seeking);

        match plan {
            SeekPlan::Poll => self.start_timer(TimerKind::SeekPoll),
            SeekPlan::CompleteNow => {
                // Already paused at the target; nothing else will confirm it
                self.seek.complete();
                self.emit(TechEvent::Seeked);
            }
            SeekPlan::AwaitStateChange => {}
        }
    }

    pub fn set_volume(&mut self, volume: f64) {
        if self.is_disposed() {
            return;
        }
        if let Some(backend) = &self.backend {
            backend.set_volume(volume.clamp(0.0, 1.0) * 100.0);
        }
    }

    /// Mute or unmute. The player reports the change late, so `volumechange`
    /// follows after a short delay.
    pub fn set_muted(&mut self, muted: bool) {
        if self.is_disposed() {
            return;
        }
        let Some(backend) = &self.backend else {
            return;
        };
        if muted {
            backend.mute();
        } else {
            backend.un_mute();
        }
        self.start_timer(TimerKind::VolumeChange);
    }

    pub fn set_playback_rate(&mut self, rate: f64) {
        if self.is_disposed() {
            return;
        }
        if let Some(backend) = &self.backend {
            backend.set_playback_rate(rate);
        }
    }

    pub fn autoplay(&self) -> bool {
        self.options.autoplay
    }

    pub fn set_autoplay(&mut self, autoplay: bool) {
        self.options.autoplay = autoplay;
    }

    pub fn loop_enabled(&self) -> bool {
        self.options.loop_enabled
    }

    pub fn set_loop(&mut self, enabled: bool) {
        self.options.loop_enabled = enabled;
    }

    // =========================================================================
    // Queries
    // =========================================================================

    pub fn current_time(&self) -> f64 {
        self.backend.as_ref().map_or(0.0, |b| b.current_time())
    }

    pub fn duration(&self) -> f64 {
        self.backend.as_ref().map_or(0.0, |b| b.duration())
    }

    /// Paused unless the player last reported playing or buffering
    pub fn paused(&self) -> bool {
        if self.backend.is_none() {
            return true;
        }
        !matches!(
            self.last_state,
            Some(BackendState::Playing) | Some(BackendState::Buffering)
        )
    }

    pub fn ended(&self) -> bool {
        self.backend.is_some() && self.last_state == Some(BackendState::Ended)
    }

    /// Volume in 0..=1
    pub fn volume(&self) -> f64 {
        self.backend.as_ref().map_or(1.0, |b| b.volume() / 100.0)
    }

    pub fn muted(&self) -> bool {
        self.backend.as_ref().is_some_and(|b| b.is_muted())
    }

    pub fn playback_rate(&self) -> f64 {
        self.backend.as_ref().map_or(1.0, |b| b.playback_rate())
    }

    /// True when the player offers more than one playback rate
    pub fn supports_playback_rate(&self) -> bool {
        self.supports_playback_rate
    }

    pub fn buffered(&self) -> TimeRanges {
        let Some(backend) = &self.backend else {
            return TimeRanges::empty();
        };
        match backend.video_loaded_fraction() {
            Some(fraction) => TimeRanges::single(0.0, fraction * backend.duration()),
            None => TimeRanges::empty(),
        }
    }

    pub fn seekable(&self) -> TimeRanges {
        match &self.backend {
            Some(backend) => TimeRanges::single(0.0, backend.duration()),
            None => TimeRanges::empty(),
        }
    }

    pub fn seeking(&self) -> bool {
        self.seek.is_seeking()
    }

    pub fn network_state(&self) -> NetworkState {
        match &self.backend {
            Some(backend) => NetworkState::for_backend(BackendState::from_code(backend.player_state())),
            None => NetworkState::Empty,
        }
    }

    pub fn ready_state(&self) -> ReadyState {
        match &self.backend {
            Some(backend) => ReadyState::for_backend(BackendState::from_code(backend.player_state())),
            None => ReadyState::HaveNothing,
        }
    }

    /// Latched player error, translated on demand
    pub fn error(&self) -> Option<MediaError> {
        self.error_code.map(MediaError::from_backend)
    }

    /// Whether the host should cover the iframe with a click blocker
    pub fn uses_iframe_blocker(&self) -> bool {
        config::uses_iframe_blocker(&self.options, self.platform)
    }

    // =========================================================================
    // Teardown
    // =========================================================================

    /// Stop and release the player, or leave the readiness queue if it was
    /// never constructed.
    pub fn dispose(&mut self) {
        if self.is_disposed() {
            return;
        }
        info!(instance = %self.id, "Disposing tech");
        self.teardown();
        self.transition(TechState::Disposed);
    }

    fn teardown(&mut self) {
        self.scheduler.cancel(TimerKind::SeekPoll);
        self.scheduler.cancel(TimerKind::VolumeChange);
        self.seek.reset();
        self.play_on_ready = false;
        self.waiting_emitted = false;
        self.cue_on_ready = false;

        match self.backend.take() {
            Some(backend) => {
                backend.stop_video();
                backend.destroy();
            }
            None => match self.gate.try_borrow_mut() {
                Ok(mut gate) => {
                    gate.withdraw(self.id);
                }
                Err(_) => warn!(instance = %self.id, "Readiness gate busy; tech left queued"),
            },
        }
    }
}

impl Drop for YoutubeTech {
    fn drop(&mut self) {
        if !self.is_disposed() {
            self.teardown();
        }
    }
}

/// Flush the readiness gate: construct every queued tech in mount order.
///
/// Call once the embed API reports ready; later calls do nothing.
pub fn release_gate(gate: &TechGate) {
    let queued = match gate.try_borrow_mut() {
        Ok(mut gate) => gate.open(),
        Err(_) => {
            warn!("Readiness gate busy; release skipped");
            return;
        }
    };
    for (id, tech) in queued {
        debug!(instance = %id, "Releasing queued tech");
        with_tech(&tech, |tech| tech.initialize());
    }
}

/// Run `f` against a tech from a callback, if it is still alive and not
/// already borrowed further up the stack.
fn with_tech(this: &WeakTech, f: impl FnOnce(&mut YoutubeTech)) {
    let Some(tech) = this.upgrade() else {
        trace!("Callback for dropped tech ignored");
        return;
    };
    match tech.try_borrow_mut() {
        Ok(mut tech) => f(&mut tech),
        Err(_) => warn!("Re-entrant tech callback dropped"),
    };
}
