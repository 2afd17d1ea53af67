//! `YT.Player` bindings

use crate::pump::EventPump;
use js_sys::{Array, Object, Reflect};
use serde::Serialize;
use serde_json::{Map, Value};
use std::rc::Rc;
use tracing::{error, warn};
use tubetech_core::{Backend, BackendApi, BackendEvent, BackendListener, PlayerSetup, VideoRequest};
use wasm_bindgen::{prelude::*, JsCast};

#[wasm_bindgen]
extern "C" {
    /// The iframe embed player
    #[wasm_bindgen(js_namespace = YT)]
    pub type Player;

    #[wasm_bindgen(constructor, js_namespace = YT, catch)]
    fn new(element_id: &str, config: &JsValue) -> Result<Player, JsValue>;

    // Player methods only exist once the player is ready; every call is
    // caught so early host calls cannot throw through the tech.

    #[wasm_bindgen(method, catch, js_name = playVideo)]
    fn play_video(this: &Player) -> Result<(), JsValue>;

    #[wasm_bindgen(method, catch, js_name = pauseVideo)]
    fn pause_video(this: &Player) -> Result<(), JsValue>;

    #[wasm_bindgen(method, catch, js_name = stopVideo)]
    fn stop_video(this: &Player) -> Result<(), JsValue>;

    #[wasm_bindgen(method, catch, js_name = seekTo)]
    fn seek_to(this: &Player, seconds: f64, allow_seek_ahead: bool) -> Result<(), JsValue>;

    #[wasm_bindgen(method, catch, js_name = loadVideoById)]
    fn load_video_by_id(this: &Player, request: &JsValue) -> Result<(), JsValue>;

    #[wasm_bindgen(method, catch, js_name = cueVideoById)]
    fn cue_video_by_id(this: &Player, request: &JsValue) -> Result<(), JsValue>;

    #[wasm_bindgen(method, catch, js_name = loadPlaylist)]
    fn load_playlist(this: &Player, list: &str) -> Result<(), JsValue>;

    #[wasm_bindgen(method, catch, js_name = getCurrentTime)]
    fn get_current_time(this: &Player) -> Result<f64, JsValue>;

    #[wasm_bindgen(method, catch, js_name = getDuration)]
    fn get_duration(this: &Player) -> Result<f64, JsValue>;

    #[wasm_bindgen(method, catch, js_name = getPlaybackRate)]
    fn get_playback_rate(this: &Player) -> Result<f64, JsValue>;

    #[wasm_bindgen(method, catch, js_name = setPlaybackRate)]
    fn set_playback_rate(this: &Player, rate: f64) -> Result<(), JsValue>;

    #[wasm_bindgen(method, catch, js_name = getAvailablePlaybackRates)]
    fn get_available_playback_rates(this: &Player) -> Result<Array, JsValue>;

    #[wasm_bindgen(method, catch, js_name = getVolume)]
    fn get_volume(this: &Player) -> Result<f64, JsValue>;

    #[wasm_bindgen(method, catch, js_name = setVolume)]
    fn set_volume(this: &Player, volume: f64) -> Result<(), JsValue>;

    #[wasm_bindgen(method, catch, js_name = isMuted)]
    fn is_muted(this: &Player) -> Result<bool, JsValue>;

    #[wasm_bindgen(method, catch)]
    fn mute(this: &Player) -> Result<(), JsValue>;

    #[wasm_bindgen(method, catch, js_name = unMute)]
    fn un_mute(this: &Player) -> Result<(), JsValue>;

    #[wasm_bindgen(method, catch, js_name = getVideoLoadedFraction)]
    fn get_video_loaded_fraction(this: &Player) -> Result<f64, JsValue>;

    #[wasm_bindgen(method, catch, js_name = getPlayerState)]
    fn get_player_state(this: &Player) -> Result<f64, JsValue>;

    #[wasm_bindgen(method, catch)]
    fn destroy(this: &Player) -> Result<(), JsValue>;
}

/// Constructor argument minus the `events` object
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PlayerConfig<'a> {
    video_id: Option<&'a str>,
    player_vars: &'a Map<String, Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    host: Option<&'a str>,
}

type EventMapper = fn(&JsValue) -> Option<BackendEvent>;

fn ready(_: &JsValue) -> Option<BackendEvent> {
    Some(BackendEvent::Ready)
}

fn state_change(data: &JsValue) -> Option<BackendEvent> {
    data.as_f64().map(|code| BackendEvent::StateChange(code as i32))
}

fn quality_change(data: &JsValue) -> Option<BackendEvent> {
    Some(BackendEvent::PlaybackQualityChange(data.as_string().unwrap_or_default()))
}

fn rate_change(data: &JsValue) -> Option<BackendEvent> {
    data.as_f64().map(BackendEvent::PlaybackRateChange)
}

fn volume_change(_: &JsValue) -> Option<BackendEvent> {
    Some(BackendEvent::VolumeChange)
}

fn player_error(data: &JsValue) -> Option<BackendEvent> {
    data.as_f64().map(|code| BackendEvent::Error(code as i32))
}

/// `events` keys of the constructor config and how their `data` maps
const PLAYER_EVENTS: [(&str, EventMapper); 6] = [
    ("onReady", ready),
    ("onStateChange", state_change),
    ("onPlaybackQualityChange", quality_change),
    ("onPlaybackRateChange", rate_change),
    ("onVolumeChange", volume_change),
    ("onError", player_error),
];

/// Constructs `YT.Player` instances
pub struct JsBackendApi {
    pump: Rc<EventPump>,
}

impl JsBackendApi {
    pub fn new(pump: Rc<EventPump>) -> Self {
        Self { pump }
    }

    fn config(setup: &PlayerSetup) -> JsValue {
        let config = PlayerConfig {
            video_id: setup.video_id.as_deref(),
            player_vars: &setup.player_vars,
            host: setup.host.as_deref(),
        };
        let serializer = serde_wasm_bindgen::Serializer::json_compatible();
        match config.serialize(&serializer) {
            Ok(value) => value,
            Err(e) => {
                error!(error = %e, "Failed to serialize player config");
                Object::new().into()
            }
        }
    }
}

impl BackendApi for JsBackendApi {
    fn create_player(&self, setup: &PlayerSetup, listener: BackendListener) -> Box<dyn Backend> {
        let config = Self::config(setup);
        let events = Object::new();
        let mut handlers = Vec::with_capacity(PLAYER_EVENTS.len());

        for (name, map) in PLAYER_EVENTS {
            let listener = listener.clone();
            let pump = self.pump.clone();
            let handler = Closure::wrap(Box::new(move |event: JsValue| {
                let data = Reflect::get(&event, &"data".into()).unwrap_or(JsValue::UNDEFINED);
                if let Some(event) = map(&data) {
                    listener(event);
                }
                pump.flush();
            }) as Box<dyn FnMut(JsValue)>);

            if let Err(e) = Reflect::set(&events, &name.into(), handler.as_ref()) {
                warn!(event = name, error = ?e, "Failed to register player callback");
            }
            handlers.push(handler);
        }
        if let Err(e) = Reflect::set(&config, &"events".into(), &events) {
            warn!(error = ?e, "Failed to attach player callbacks");
        }

        let player = match Player::new(&setup.element_id, &config) {
            Ok(player) => player,
            Err(e) => {
                // Commands on the placeholder fail and are logged
                error!(element = %setup.element_id, error = ?e, "YT.Player construction failed");
                JsValue::UNDEFINED.unchecked_into()
            }
        };

        Box::new(JsBackend {
            player,
            _handlers: handlers,
        })
    }
}

/// One `YT.Player` and the callbacks it holds
pub struct JsBackend {
    player: Player,
    _handlers: Vec<Closure<dyn FnMut(JsValue)>>,
}

fn logged<T>(method: &str, result: Result<T, JsValue>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(e) => {
            warn!(method, error = ?e, "YT.Player call failed");
            None
        }
    }
}

fn request_value(request: &VideoRequest) -> Option<JsValue> {
    match serde_wasm_bindgen::to_value(request) {
        Ok(value) => Some(value),
        Err(e) => {
            error!(video_id = %request.video_id, error = %e, "Failed to serialize video request");
            None
        }
    }
}

impl Backend for JsBackend {
    fn play_video(&self) {
        logged("playVideo", self.player.play_video());
    }

    fn pause_video(&self) {
        logged("pauseVideo", self.player.pause_video());
    }

    fn stop_video(&self) {
        logged("stopVideo", self.player.stop_video());
    }

    fn seek_to(&self, seconds: f64, allow_seek_ahead: bool) {
        logged("seekTo", self.player.seek_to(seconds, allow_seek_ahead));
    }

    fn load_video_by_id(&self, request: &VideoRequest) {
        if let Some(value) = request_value(request) {
            logged("loadVideoById", self.player.load_video_by_id(&value));
        }
    }

    fn cue_video_by_id(&self, request: &VideoRequest) {
        if let Some(value) = request_value(request) {
            logged("cueVideoById", self.player.cue_video_by_id(&value));
        }
    }

    fn load_playlist(&self, list_id: &str) {
        logged("loadPlaylist", self.player.load_playlist(list_id));
    }

    fn current_time(&self) -> f64 {
        self.player.get_current_time().unwrap_or(0.0)
    }

    fn duration(&self) -> f64 {
        self.player.get_duration().unwrap_or(0.0)
    }

    fn playback_rate(&self) -> f64 {
        self.player.get_playback_rate().unwrap_or(1.0)
    }

    fn set_playback_rate(&self, rate: f64) {
        logged("setPlaybackRate", self.player.set_playback_rate(rate));
    }

    fn available_playback_rates(&self) -> Vec<f64> {
        logged("getAvailablePlaybackRates", self.player.get_available_playback_rates())
            .map(|rates| rates.iter().filter_map(|rate| rate.as_f64()).collect())
            .unwrap_or_default()
    }

    fn volume(&self) -> f64 {
        self.player.get_volume().unwrap_or(100.0)
    }

    fn set_volume(&self, volume: f64) {
        logged("setVolume", self.player.set_volume(volume));
    }

    fn is_muted(&self) -> bool {
        self.player.is_muted().unwrap_or(false)
    }

    fn mute(&self) {
        logged("mute", self.player.mute());
    }

    fn un_mute(&self) {
        logged("unMute", self.player.un_mute());
    }

    fn video_loaded_fraction(&self) -> Option<f64> {
        self.player.get_video_loaded_fraction().ok()
    }

    fn player_state(&self) -> i32 {
        self.player.get_player_state().map_or(-1, |state| state as i32)
    }

    fn destroy(&self) {
        logged("destroy", self.player.destroy());
    }
}
