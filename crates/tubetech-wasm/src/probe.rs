//! Thumbnail size probing with an off-document `Image`

use crate::pump::EventPump;
use std::cell::RefCell;
use std::rc::Rc;
use tracing::debug;
use tubetech_core::{poster::ProbeCallback, ImageProbe, ImageSize, ProbeError};
use wasm_bindgen::{prelude::*, JsCast};
use web_sys::HtmlImageElement;

type Handlers = Rc<RefCell<Vec<Closure<dyn FnMut()>>>>;

pub struct JsImageProbe {
    pump: Rc<EventPump>,
}

impl JsImageProbe {
    pub fn new(pump: Rc<EventPump>) -> Self {
        Self { pump }
    }
}

/// Report the outcome once and release both handlers
fn finish(
    img: &HtmlImageElement,
    done: &RefCell<Option<ProbeCallback>>,
    handlers: &Handlers,
    outcome: Result<ImageSize, ProbeError>,
) {
    img.set_onload(None);
    img.set_onerror(None);
    let released = std::mem::take(&mut *handlers.borrow_mut());
    drop(released);

    let callback = done.borrow_mut().take();
    if let Some(callback) = callback {
        callback(outcome);
    }
}

impl ImageProbe for JsImageProbe {
    fn probe(&self, url: &str, done: ProbeCallback) {
        let img = match HtmlImageElement::new() {
            Ok(img) => img,
            Err(e) => {
                debug!(error = ?e, "Image element unavailable");
                done(Err(ProbeError::Unavailable));
                return;
            }
        };

        let done = Rc::new(RefCell::new(Some(done)));
        let handlers: Handlers = Rc::default();

        let onload = {
            let (img, done, handlers, pump) = (img.clone(), done.clone(), handlers.clone(), self.pump.clone());
            Closure::wrap(Box::new(move || {
                let size = ImageSize::new(img.natural_width(), img.natural_height());
                finish(&img, &done, &handlers, Ok(size));
                pump.flush();
            }) as Box<dyn FnMut()>)
        };

        let onerror = {
            let (img, done, handlers, pump) = (img.clone(), done.clone(), handlers.clone(), self.pump.clone());
            let url = url.to_string();
            Closure::wrap(Box::new(move || {
                finish(&img, &done, &handlers, Err(ProbeError::Load(url.clone())));
                pump.flush();
            }) as Box<dyn FnMut()>)
        };

        img.set_onload(Some(onload.as_ref().unchecked_ref()));
        img.set_onerror(Some(onerror.as_ref().unchecked_ref()));
        handlers.borrow_mut().extend([onload, onerror]);
        img.set_src(url);
    }
}
