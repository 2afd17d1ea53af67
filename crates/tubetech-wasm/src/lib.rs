//! tubetech WASM - YouTube playback tech for browser media players
//!
//! Wires the core tech to the page:
//! - The tech element, click blocker and host player classes
//! - `YT.Player` construction and commands
//! - `setInterval`/`setTimeout` timers
//! - Thumbnail probing through `Image`
//! - iframe API script loading and stylesheet injection
//!
//! ## Integration
//!
//! ```javascript
//! import init, { YoutubeTechHandle, loadApiScript, injectCss } from '@tubetech/wasm';
//!
//! await init();
//! loadApiScript();
//! injectCss();
//!
//! const tech = new YoutubeTechHandle(
//!   player.el(),
//!   { techId: 'vjs_youtube_1', ytControls: false },
//!   'https://www.youtube.com/watch?v=dQw4w9WgXcQ',
//!   (name) => player.trigger(name),
//! );
//! tech.play();
//! ```

use wasm_bindgen::prelude::*;

mod element;
mod handle;
mod logging;
mod page;
mod player;
mod probe;
mod pump;
mod scheduler;

pub use element::TechElement;
pub use handle::YoutubeTechHandle;
pub use page::{inject_css, load_api_script};
pub use player::{JsBackend, JsBackendApi};
pub use probe::JsImageProbe;
pub use pump::EventPump;
pub use scheduler::JsScheduler;

/// Initialize the WASM module
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
    logging::init(logging::DEFAULT_FILTER);
    tubetech_core::init();
}

/// Library version
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

/// Whether the tech plays sources of this MIME type
#[wasm_bindgen(js_name = canPlayType)]
pub fn can_play_type(mime: &str) -> bool {
    tubetech_core::can_play_type(mime)
}
