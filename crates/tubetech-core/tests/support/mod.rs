//! Deterministic stand-ins for the embed API, timers and image loading

#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use tubetech_core::{
    backend::BackendListener,
    poster::ProbeCallback,
    scheduler::TimerCallback,
    Backend, BackendApi, BackendEvent, ImageProbe, ImageSize, Platform, PlayerSetup, ProbeError,
    ReadinessGate, Scheduler, TechDeps, TechEvent, TechEvents, TechGate, TechHandle, TechOptions,
    TimerKind, VideoRequest, YoutubeTech,
};

pub const VIDEO_ID: &str = "abc12345678";
pub const WATCH_URL: &str = "https://www.youtube.com/watch?v=abc12345678&list=PL1";

/// Commands received by the fake player
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Play,
    Pause,
    Stop,
    SeekTo(f64),
    Load(VideoRequest),
    Cue(VideoRequest),
    LoadPlaylist(String),
    SetRate(f64),
    SetVolume(f64),
    Mute,
    UnMute,
    Destroy,
}

/// What the fake player reports when queried
#[derive(Debug, Clone)]
pub struct PlayerModel {
    pub current_time: f64,
    pub duration: f64,
    pub volume: f64,
    pub muted: bool,
    pub rate: f64,
    pub rates: Vec<f64>,
    pub loaded_fraction: Option<f64>,
    pub state: i32,
}

impl Default for PlayerModel {
    fn default() -> Self {
        Self {
            current_time: 0.0,
            duration: 200.0,
            volume: 100.0,
            muted: false,
            rate: 1.0,
            rates: vec![0.5, 1.0, 1.5, 2.0],
            loaded_fraction: Some(0.25),
            state: -1,
        }
    }
}

pub struct FakeBackend {
    calls: Rc<RefCell<Vec<Call>>>,
    model: Rc<RefCell<PlayerModel>>,
}

impl FakeBackend {
    fn record(&self, call: Call) {
        self.calls.borrow_mut().push(call);
    }
}

impl Backend for FakeBackend {
    fn play_video(&self) {
        self.record(Call::Play);
    }
    fn pause_video(&self) {
        self.record(Call::Pause);
    }
    fn stop_video(&self) {
        self.record(Call::Stop);
    }
    fn seek_to(&self, seconds: f64, _allow_seek_ahead: bool) {
        // Position moves only when a test says so
        self.record(Call::SeekTo(seconds));
    }
    fn load_video_by_id(&self, request: &VideoRequest) {
        self.record(Call::Load(request.clone()));
    }
    fn cue_video_by_id(&self, request: &VideoRequest) {
        self.record(Call::Cue(request.clone()));
    }
    fn load_playlist(&self, list_id: &str) {
        self.record(Call::LoadPlaylist(list_id.to_string()));
    }
    fn current_time(&self) -> f64 {
        self.model.borrow().current_time
    }
    fn duration(&self) -> f64 {
        self.model.borrow().duration
    }
    fn playback_rate(&self) -> f64 {
        self.model.borrow().rate
    }
    fn set_playback_rate(&self, rate: f64) {
        self.model.borrow_mut().rate = rate;
        self.record(Call::SetRate(rate));
    }
    fn available_playback_rates(&self) -> Vec<f64> {
        self.model.borrow().rates.clone()
    }
    fn volume(&self) -> f64 {
        self.model.borrow().volume
    }
    fn set_volume(&self, volume: f64) {
        self.model.borrow_mut().volume = volume;
        self.record(Call::SetVolume(volume));
    }
    fn is_muted(&self) -> bool {
        self.model.borrow().muted
    }
    fn mute(&self) {
        self.model.borrow_mut().muted = true;
        self.record(Call::Mute);
    }
    fn un_mute(&self) {
        self.model.borrow_mut().muted = false;
        self.record(Call::UnMute);
    }
    fn video_loaded_fraction(&self) -> Option<f64> {
        self.model.borrow().loaded_fraction
    }
    fn player_state(&self) -> i32 {
        self.model.borrow().state
    }
    fn destroy(&self) {
        self.record(Call::Destroy);
    }
}

/// Embed API that records every player it constructs
#[derive(Default)]
pub struct FakeApi {
    pub setups: RefCell<Vec<PlayerSetup>>,
    listeners: RefCell<Vec<BackendListener>>,
    pub calls: Rc<RefCell<Vec<Call>>>,
    pub model: Rc<RefCell<PlayerModel>>,
}

impl FakeApi {
    /// Deliver a callback from the most recently constructed player
    pub fn emit(&self, event: BackendEvent) {
        let listener = self.listeners.borrow().last().cloned();
        if let Some(listener) = listener {
            listener(event);
        }
    }

    /// Deliver a callback from the player constructed `index`-th
    pub fn emit_to(&self, index: usize, event: BackendEvent) {
        let listener = self.listeners.borrow().get(index).cloned();
        if let Some(listener) = listener {
            listener(event);
        }
    }

    pub fn created(&self) -> usize {
        self.setups.borrow().len()
    }

    pub fn element_ids(&self) -> Vec<String> {
        self.setups.borrow().iter().map(|s| s.element_id.clone()).collect()
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.borrow().clone()
    }

    pub fn count(&self, call: &Call) -> usize {
        self.calls.borrow().iter().filter(|c| *c == call).count()
    }

    pub fn clear_calls(&self) {
        self.calls.borrow_mut().clear();
    }

    pub fn set_time(&self, seconds: f64) {
        self.model.borrow_mut().current_time = seconds;
    }
}

impl BackendApi for FakeApi {
    fn create_player(&self, setup: &PlayerSetup, listener: BackendListener) -> Box<dyn Backend> {
        self.setups.borrow_mut().push(setup.clone());
        self.listeners.borrow_mut().push(listener);
        Box::new(FakeBackend {
            calls: self.calls.clone(),
            model: self.model.clone(),
        })
    }
}

/// Timers that only fire when a test says so
#[derive(Default)]
pub struct FakeScheduler {
    timers: RefCell<HashMap<TimerKind, TimerCallback>>,
    started: RefCell<Vec<TimerKind>>,
    firing: Cell<Option<TimerKind>>,
    cancelled_while_firing: Cell<bool>,
}

impl FakeScheduler {
    pub fn is_active(&self, kind: TimerKind) -> bool {
        self.timers.borrow().contains_key(&kind)
    }

    pub fn starts(&self, kind: TimerKind) -> usize {
        self.started.borrow().iter().filter(|k| **k == kind).count()
    }

    /// Fire a timer once. Returns false if it was not running.
    pub fn fire(&self, kind: TimerKind) -> bool {
        let Some(mut callback) = self.timers.borrow_mut().remove(&kind) else {
            return false;
        };
        self.firing.set(Some(kind));
        self.cancelled_while_firing.set(false);

        callback();

        self.firing.set(None);
        let restarted = self.timers.borrow().contains_key(&kind);
        if kind.repeats() && !self.cancelled_while_firing.get() && !restarted {
            self.timers.borrow_mut().insert(kind, callback);
        }
        true
    }
}

impl Scheduler for FakeScheduler {
    fn start(&self, kind: TimerKind, callback: TimerCallback) {
        self.started.borrow_mut().push(kind);
        self.timers.borrow_mut().insert(kind, callback);
    }

    fn cancel(&self, kind: TimerKind) {
        self.timers.borrow_mut().remove(&kind);
        if self.firing.get() == Some(kind) {
            self.cancelled_while_firing.set(true);
        }
    }
}

/// Image loader whose probes complete on demand
#[derive(Default)]
pub struct FakeProbe {
    pending: RefCell<Vec<(String, ProbeCallback)>>,
    requested: RefCell<Vec<String>>,
}

impl FakeProbe {
    pub fn requested(&self) -> Vec<String> {
        self.requested.borrow().clone()
    }

    pub fn pending(&self) -> usize {
        self.pending.borrow().len()
    }

    /// Complete the oldest pending probe
    pub fn resolve(&self, outcome: Result<ImageSize, ProbeError>) {
        let next = {
            let mut pending = self.pending.borrow_mut();
            if pending.is_empty() {
                None
            } else {
                Some(pending.remove(0))
            }
        };
        if let Some((_, done)) = next {
            done(outcome);
        }
    }
}

impl ImageProbe for FakeProbe {
    fn probe(&self, url: &str, done: ProbeCallback) {
        self.requested.borrow_mut().push(url.to_string());
        self.pending.borrow_mut().push((url.to_string(), done));
    }
}

/// Image loader that answers before returning
pub struct InstantProbe(pub ImageSize);

impl ImageProbe for InstantProbe {
    fn probe(&self, _url: &str, done: ProbeCallback) {
        done(Ok(self.0));
    }
}

/// A mounted tech with all its fakes
pub struct Harness {
    pub tech: TechHandle,
    pub events: TechEvents,
    pub api: Rc<FakeApi>,
    pub scheduler: Rc<FakeScheduler>,
    pub probe: Rc<FakeProbe>,
    pub gate: TechGate,
}

impl Harness {
    /// Mount with the embed API already loaded
    pub fn ready_api(options: TechOptions, source: Option<&str>) -> Self {
        let gate: TechGate = ReadinessGate::shared();
        gate.borrow_mut().open();
        Self::mount_with(options, source, gate, Platform::default())
    }

    /// Mount before the embed API loaded
    pub fn pending_api(options: TechOptions, source: Option<&str>) -> Self {
        Self::mount_with(options, source, ReadinessGate::shared(), Platform::default())
    }

    pub fn mount_with(options: TechOptions, source: Option<&str>, gate: TechGate, platform: Platform) -> Self {
        let api = Rc::new(FakeApi::default());
        let scheduler = Rc::new(FakeScheduler::default());
        let probe = Rc::new(FakeProbe::default());
        let deps = TechDeps {
            api: api.clone(),
            scheduler: scheduler.clone(),
            probe: probe.clone(),
            gate: gate.clone(),
            platform,
        };
        let (tech, events) = YoutubeTech::mount(options, source, deps);
        Self {
            tech,
            events,
            api,
            scheduler,
            probe,
            gate,
        }
    }

    /// Mount, construct and report ready, then forget setup events and calls
    pub fn playable(options: TechOptions, source: &str) -> Self {
        let mut harness = Self::ready_api(options, Some(source));
        harness.api.emit(BackendEvent::Ready);
        harness.drain();
        harness.api.clear_calls();
        harness
    }

    /// Events emitted since the last drain
    pub fn drain(&mut self) -> Vec<TechEvent> {
        drain(&mut self.events)
    }

    pub fn state_change(&self, code: i32) {
        self.api.model.borrow_mut().state = code;
        self.api.emit(BackendEvent::StateChange(code));
    }
}

pub fn drain(events: &mut TechEvents) -> Vec<TechEvent> {
    let mut out = Vec::new();
    while let Ok(event) = events.try_recv() {
        out.push(event);
    }
    out
}

pub fn count(events: &[TechEvent], event: TechEvent) -> usize {
    events.iter().filter(|e| **e == event).count()
}
