//! The tech as exported to JavaScript

use crate::{
    element::TechElement, player::JsBackendApi, probe::JsImageProbe, pump::EventPump, scheduler::JsScheduler,
};
use js_sys::Function;
use serde::Serialize;
use std::cell::RefCell;
use std::rc::Rc;
use tracing::warn;
use tubetech_core::{config, gate, Platform, TechDeps, TechHandle, TechOptions, TimeRanges, YoutubeTech};
use wasm_bindgen::prelude::*;
use web_sys::{Element, HtmlElement};

/// Platform facts from a user agent string
pub fn detect_platform(user_agent: &str) -> Platform {
    let is_ios = ["iPad", "iPhone", "iPod"].iter().any(|d| user_agent.contains(d));
    // Stock Android browser; Chrome on Android allows programmatic playback
    let is_native_android = user_agent.contains("Android") && !user_agent.contains("Chrome");
    Platform { is_ios, is_native_android }
}

fn current_platform() -> Platform {
    web_sys::window()
        .and_then(|window| window.navigator().user_agent().ok())
        .map(|ua| detect_platform(&ua))
        .unwrap_or_default()
}

fn to_js<T: Serialize>(value: &T) -> JsValue {
    serde_wasm_bindgen::to_value(value).unwrap_or(JsValue::NULL)
}

fn ranges_to_js(ranges: &TimeRanges) -> JsValue {
    to_js(&ranges.iter().collect::<Vec<_>>())
}

/// A mounted YouTube tech for one host media element
#[wasm_bindgen]
pub struct YoutubeTechHandle {
    tech: TechHandle,
    pump: Rc<EventPump>,
    element: RefCell<TechElement>,
}

impl YoutubeTechHandle {
    fn command(&self, f: impl FnOnce(&mut YoutubeTech)) {
        match self.tech.try_borrow_mut() {
            Ok(mut tech) => f(&mut tech),
            Err(_) => warn!("Tech busy; host command dropped"),
        }
        self.pump.flush();
    }

    fn query<R>(&self, fallback: R, f: impl FnOnce(&YoutubeTech) -> R) -> R {
        match self.tech.try_borrow() {
            Ok(tech) => f(&tech),
            Err(_) => fallback,
        }
    }
}

#[wasm_bindgen]
impl YoutubeTechHandle {
    /// Mount a tech inside the host player element `parent`. `trigger`
    /// receives every media event name.
    #[wasm_bindgen(constructor)]
    pub fn new(
        parent: Element,
        options: JsValue,
        source: Option<String>,
        trigger: Function,
    ) -> Result<YoutubeTechHandle, JsValue> {
        let options: TechOptions = if options.is_undefined() || options.is_null() {
            TechOptions::default()
        } else {
            serde_wasm_bindgen::from_value(options)?
        };
        options
            .validate()
            .map_err(|e| JsValue::from_str(&format!("{}: {}", e.error_code(), e)))?;

        // The element must be in the page before the player replaces it
        let platform = current_platform();
        let document = parent
            .owner_document()
            .ok_or_else(|| JsValue::from_str("player element has no document"))?;
        let mut element = TechElement::create(
            &document,
            &options.tech_id,
            config::uses_iframe_blocker(&options, platform),
        )?;
        element.attach(&parent, platform.is_restricted_mobile())?;

        let pump = Rc::new(EventPump::new(trigger));
        let deps = TechDeps {
            api: Rc::new(JsBackendApi::new(pump.clone())),
            scheduler: Rc::new(JsScheduler::new(pump.clone())),
            probe: Rc::new(JsImageProbe::new(pump.clone())),
            gate: gate::global(),
            platform,
        };

        let (tech, events) = YoutubeTech::mount(options, source.as_deref(), deps);
        element.pause_on_click(Rc::downgrade(&tech), pump.clone());
        pump.attach(events);
        pump.flush();

        Ok(Self {
            tech,
            pump,
            element: RefCell::new(element),
        })
    }

    /// Wrapper element appended to the host player element
    pub fn el(&self) -> HtmlElement {
        self.element.borrow().element().clone()
    }

    pub fn play(&self) {
        self.command(|tech| tech.play());
    }

    pub fn pause(&self) {
        self.command(|tech| tech.pause());
    }

    pub fn paused(&self) -> bool {
        self.query(true, |tech| tech.paused())
    }

    pub fn ended(&self) -> bool {
        self.query(false, |tech| tech.ended())
    }

    pub fn seeking(&self) -> bool {
        self.query(false, |tech| tech.seeking())
    }

    pub fn src(&self) -> Option<String> {
        self.query(None, |tech| tech.current_src().map(str::to_string))
    }

    #[wasm_bindgen(js_name = setSrc)]
    pub fn set_src(&self, src: String) {
        self.command(|tech| tech.set_source(&src));
    }

    pub fn poster(&self) -> Option<String> {
        self.query(None, |tech| tech.poster().map(str::to_string))
    }

    #[wasm_bindgen(js_name = setPoster)]
    pub fn set_poster(&self, poster: Option<String>) {
        self.command(|tech| tech.set_poster(poster));
    }

    #[wasm_bindgen(js_name = currentTime)]
    pub fn current_time(&self) -> f64 {
        self.query(0.0, |tech| tech.current_time())
    }

    #[wasm_bindgen(js_name = setCurrentTime)]
    pub fn set_current_time(&self, seconds: f64) {
        self.command(|tech| tech.set_current_time(seconds));
    }

    pub fn duration(&self) -> f64 {
        self.query(0.0, |tech| tech.duration())
    }

    pub fn volume(&self) -> f64 {
        self.query(1.0, |tech| tech.volume())
    }

    #[wasm_bindgen(js_name = setVolume)]
    pub fn set_volume(&self, volume: f64) {
        self.command(|tech| tech.set_volume(volume));
    }

    pub fn muted(&self) -> bool {
        self.query(false, |tech| tech.muted())
    }

    #[wasm_bindgen(js_name = setMuted)]
    pub fn set_muted(&self, muted: bool) {
        self.command(|tech| tech.set_muted(muted));
    }

    #[wasm_bindgen(js_name = playbackRate)]
    pub fn playback_rate(&self) -> f64 {
        self.query(1.0, |tech| tech.playback_rate())
    }

    #[wasm_bindgen(js_name = setPlaybackRate)]
    pub fn set_playback_rate(&self, rate: f64) {
        self.command(|tech| tech.set_playback_rate(rate));
    }

    #[wasm_bindgen(js_name = supportsPlaybackRate)]
    pub fn supports_playback_rate(&self) -> bool {
        self.query(false, |tech| tech.supports_playback_rate())
    }

    /// Array of `{ start, end }` spans
    pub fn buffered(&self) -> JsValue {
        self.query(JsValue::NULL, |tech| ranges_to_js(&tech.buffered()))
    }

    /// Array of `{ start, end }` spans
    pub fn seekable(&self) -> JsValue {
        self.query(JsValue::NULL, |tech| ranges_to_js(&tech.seekable()))
    }

    #[wasm_bindgen(js_name = networkState)]
    pub fn network_state(&self) -> u8 {
        self.query(0, |tech| tech.network_state() as u8)
    }

    #[wasm_bindgen(js_name = readyState)]
    pub fn ready_state(&self) -> u8 {
        self.query(0, |tech| tech.ready_state() as u8)
    }

    /// `{ code, message }` or `null`
    pub fn error(&self) -> JsValue {
        self.query(JsValue::NULL, |tech| {
            tech.error().map_or(JsValue::NULL, |error| to_js(&error))
        })
    }

    pub fn autoplay(&self) -> bool {
        self.query(false, |tech| tech.autoplay())
    }

    #[wasm_bindgen(js_name = setAutoplay)]
    pub fn set_autoplay(&self, autoplay: bool) {
        self.command(|tech| tech.set_autoplay(autoplay));
    }

    #[wasm_bindgen(js_name = "loop")]
    pub fn loop_enabled(&self) -> bool {
        self.query(false, |tech| tech.loop_enabled())
    }

    #[wasm_bindgen(js_name = setLoop)]
    pub fn set_loop(&self, enabled: bool) {
        self.command(|tech| tech.set_loop(enabled));
    }

    /// Whether a click blocker covers the iframe
    #[wasm_bindgen(js_name = usesIframeBlocker)]
    pub fn uses_iframe_blocker(&self) -> bool {
        self.element.borrow().has_blocker()
    }

    /// Lifecycle state name
    pub fn state(&self) -> String {
        self.query(String::new(), |tech| tech.state().to_string())
    }

    /// Release the player and remove the tech from the page
    pub fn dispose(&self) {
        self.command(|tech| tech.dispose());
        self.element.borrow_mut().detach();
    }
}
