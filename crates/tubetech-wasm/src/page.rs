//! Page-wide setup: the iframe API script and the tech stylesheet

use js_sys::Function;
use std::cell::Cell;
use tracing::info;
use tubetech_core::{gate, release_gate};
use wasm_bindgen::{prelude::*, JsCast};
use web_sys::{Document, HtmlScriptElement};

/// YouTube iframe API loader
pub const IFRAME_API_URL: &str = "https://www.youtube.com/iframe_api";

/// Hides the click blocker while the host controls are visible and the big
/// play button on restricted mobile platforms
pub const TECH_CSS: &str = concat!(
    ".vjs-youtube .vjs-iframe-blocker { display: none; }",
    ".vjs-youtube.vjs-user-inactive .vjs-iframe-blocker { display: block; }",
    ".vjs-youtube .vjs-poster { background-size: cover; }",
    ".vjs-youtube-mobile .vjs-big-play-button { display: none; }",
);

thread_local! {
    static API_REQUESTED: Cell<bool> = const { Cell::new(false) };
}

#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_namespace = YT, js_name = ready)]
    fn yt_ready(callback: &Function);
}

fn document() -> Result<Document, JsValue> {
    web_sys::window()
        .and_then(|window| window.document())
        .ok_or_else(|| JsValue::from_str("no document available"))
}

/// Insert the iframe API script once per page. When the API reports ready,
/// every tech waiting in the page-wide gate constructs its player.
#[wasm_bindgen(js_name = loadApiScript)]
pub fn load_api_script() -> Result<(), JsValue> {
    if API_REQUESTED.with(|requested| requested.replace(true)) {
        return Ok(());
    }

    let document = document()?;
    let tag: HtmlScriptElement = document.create_element("script")?.unchecked_into();

    let onload = Closure::once_into_js(|| {
        let on_ready = Closure::once_into_js(|| {
            info!("YouTube iframe API ready");
            release_gate(&gate::global());
        });
        yt_ready(on_ready.unchecked_ref());
    });
    tag.set_onload(Some(onload.unchecked_ref()));

    match document.get_elements_by_tag_name("script").item(0) {
        Some(first) => match first.parent_node() {
            Some(parent) => {
                parent.insert_before(&tag, Some(first.as_ref()))?;
            }
            None => {
                document.body().ok_or("no body")?.append_child(&tag)?;
            }
        },
        None => {
            document.head().ok_or("no head")?.append_child(&tag)?;
        }
    }

    tag.set_src(IFRAME_API_URL);
    Ok(())
}

/// Append the tech stylesheet to the document head
#[wasm_bindgen(js_name = injectCss)]
pub fn inject_css() -> Result<(), JsValue> {
    let document = document()?;
    let head = document.head().ok_or("no head")?;
    let style = document.create_element("style")?;
    style.set_attribute("type", "text/css")?;
    style.set_text_content(Some(TECH_CSS));
    head.append_child(&style)?;
    Ok(())
}
