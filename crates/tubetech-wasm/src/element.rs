//! The tech's DOM: the element the iframe replaces and the click blocker

use crate::pump::EventPump;
use std::rc::Rc;
use tracing::{debug, warn};
use tubetech_core::tech::WeakTech;
use wasm_bindgen::{prelude::*, JsCast};
use web_sys::{Document, Element, HtmlElement};

/// Class set on the host player element while the tech is mounted
pub const TECH_CLASS: &str = "vjs-youtube";

/// Extra class on restricted mobile platforms
pub const MOBILE_CLASS: &str = "vjs-youtube-mobile";

const FILL_STYLE: &str = "width:100%;height:100%;top:0;left:0;position:absolute";

/// Classes the host player element carries for this platform
pub fn parent_classes(restricted_mobile: bool) -> &'static [&'static str] {
    if restricted_mobile {
        &[TECH_CLASS, MOBILE_CLASS]
    } else {
        &[TECH_CLASS]
    }
}

fn create_div(document: &Document, class: &str) -> Result<HtmlElement, JsValue> {
    let div: HtmlElement = document.create_element("div")?.unchecked_into();
    div.set_attribute("class", class)?;
    div.set_attribute("style", FILL_STYLE)?;
    Ok(div)
}

/// Wrapper holding the `vjs-tech` div and, without native controls, a
/// transparent blocker that pauses on click
pub struct TechElement {
    wrapper: HtmlElement,
    blocker: Option<HtmlElement>,
    parent: Option<Element>,
    classes: &'static [&'static str],
    on_click: Option<Closure<dyn FnMut()>>,
}

impl TechElement {
    pub fn create(document: &Document, tech_id: &str, with_blocker: bool) -> Result<Self, JsValue> {
        let wrapper: HtmlElement = document.create_element("div")?.unchecked_into();

        let tech = create_div(document, "vjs-tech")?;
        tech.set_id(tech_id);
        wrapper.append_child(&tech)?;

        let blocker = if with_blocker {
            let blocker = create_div(document, "vjs-iframe-blocker")?;
            wrapper.append_child(&blocker)?;
            Some(blocker)
        } else {
            None
        };

        Ok(Self {
            wrapper,
            blocker,
            parent: None,
            classes: &[],
            on_click: None,
        })
    }

    /// Append to the host player element and mark it as hosting the tech
    pub fn attach(&mut self, parent: &Element, restricted_mobile: bool) -> Result<(), JsValue> {
        parent.append_child(&self.wrapper)?;
        self.classes = parent_classes(restricted_mobile);
        for class in self.classes {
            parent.class_list().add_1(class)?;
        }
        self.parent = Some(parent.clone());
        Ok(())
    }

    /// Pause the tech whenever the blocker is clicked
    pub fn pause_on_click(&mut self, tech: WeakTech, pump: Rc<EventPump>) {
        let Some(blocker) = &self.blocker else {
            return;
        };

        let on_click = Closure::wrap(Box::new(move || {
            pause(&tech);
            pump.flush();
        }) as Box<dyn FnMut()>);
        blocker.set_onclick(Some(on_click.as_ref().unchecked_ref()));
        self.on_click = Some(on_click);
    }

    pub fn has_blocker(&self) -> bool {
        self.blocker.is_some()
    }

    /// Take the wrapper out of the page and clear the host classes
    pub fn detach(&mut self) {
        if let Some(blocker) = &self.blocker {
            blocker.set_onclick(None);
        }
        self.on_click = None;

        let Some(parent) = self.parent.take() else {
            return;
        };
        for class in self.classes {
            if let Err(e) = parent.class_list().remove_1(class) {
                warn!(class, error = ?e, "Failed to remove player class");
            }
        }
        if let Err(e) = parent.remove_child(&self.wrapper) {
            debug!(error = ?e, "Tech element already detached");
        }
    }

    pub fn element(&self) -> &HtmlElement {
        &self.wrapper
    }
}

fn pause(tech: &WeakTech) {
    let Some(tech) = tech.upgrade() else {
        return;
    };
    match tech.try_borrow_mut() {
        Ok(mut tech) => tech.pause(),
        Err(_) => warn!("Tech busy; blocker click dropped"),
    };
}
