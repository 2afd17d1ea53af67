//! Browser timers for seek polling and deferred volume events

use crate::pump::EventPump;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use tracing::warn;
use tubetech_core::{scheduler::TimerCallback, Scheduler, TimerKind};
use wasm_bindgen::{prelude::*, JsCast};

struct ActiveTimer {
    handle: i32,
    repeats: bool,
    _callback: Closure<dyn FnMut()>,
}

/// `setInterval`/`setTimeout` backed scheduler for one tech
pub struct JsScheduler {
    pump: Rc<EventPump>,
    timers: RefCell<HashMap<TimerKind, ActiveTimer>>,
}

impl JsScheduler {
    pub fn new(pump: Rc<EventPump>) -> Self {
        Self {
            pump,
            timers: RefCell::new(HashMap::new()),
        }
    }

    fn clear(timer: &ActiveTimer) {
        let Some(window) = web_sys::window() else {
            return;
        };
        if timer.repeats {
            window.clear_interval_with_handle(timer.handle);
        } else {
            window.clear_timeout_with_handle(timer.handle);
        }
    }
}

impl Scheduler for JsScheduler {
    fn start(&self, kind: TimerKind, mut callback: TimerCallback) {
        self.cancel(kind);

        let Some(window) = web_sys::window() else {
            warn!(timer = ?kind, "No window; timer not started");
            return;
        };

        let pump = self.pump.clone();
        let closure = Closure::wrap(Box::new(move || {
            callback();
            pump.flush();
        }) as Box<dyn FnMut()>);

        let millis = kind.period().as_millis() as i32;
        let repeats = kind.repeats();
        let started = if repeats {
            window.set_interval_with_callback_and_timeout_and_arguments_0(closure.as_ref().unchecked_ref(), millis)
        } else {
            window.set_timeout_with_callback_and_timeout_and_arguments_0(closure.as_ref().unchecked_ref(), millis)
        };

        match started {
            Ok(handle) => {
                self.timers.borrow_mut().insert(
                    kind,
                    ActiveTimer {
                        handle,
                        repeats,
                        _callback: closure,
                    },
                );
            }
            Err(e) => warn!(timer = ?kind, error = ?e, "Failed to start timer"),
        }
    }

    fn cancel(&self, kind: TimerKind) {
        // Dropped outside the borrow; the closure may be the one running
        let removed = self.timers.borrow_mut().remove(&kind);
        if let Some(timer) = removed {
            Self::clear(&timer);
        }
    }
}

impl Drop for JsScheduler {
    fn drop(&mut self) {
        for timer in self.timers.get_mut().values() {
            Self::clear(timer);
        }
    }
}
