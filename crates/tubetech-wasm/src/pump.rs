//! Delivery of tech events to the host player

use js_sys::Function;
use std::cell::RefCell;
use tracing::warn;
use tubetech_core::TechEvents;
use wasm_bindgen::JsValue;

/// Forwards queued tech events to a host `trigger(name)` function.
///
/// Every JS entry point (host call, player callback, timer, image load)
/// flushes once the tech is no longer borrowed.
pub struct EventPump {
    events: RefCell<Option<TechEvents>>,
    trigger: Function,
}

impl EventPump {
    pub fn new(trigger: Function) -> Self {
        Self {
            events: RefCell::new(None),
            trigger,
        }
    }

    /// Attach the receiver returned by mount
    pub fn attach(&self, events: TechEvents) {
        *self.events.borrow_mut() = Some(events);
    }

    pub fn flush(&self) {
        loop {
            // Not held across `trigger`: handlers may flush again
            let next = match self.events.try_borrow_mut() {
                Ok(mut slot) => slot.as_mut().and_then(|rx| rx.try_recv().ok()),
                Err(_) => None,
            };
            let Some(event) = next else {
                break;
            };
            if let Err(e) = self.trigger.call1(&JsValue::NULL, &JsValue::from_str(event.name())) {
                warn!(event = %event, error = ?e, "Host event handler threw");
            }
        }
    }
}
