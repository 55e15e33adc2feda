// Copyright 2026 the Tandem Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tick sources: `requestAnimationFrame` and `setInterval`.
//!
//! The synchronizer is driven by [`Synchronizer::tick`]. [`RafLoop`] ticks
//! once per animation frame, which gives smooth drift checks while the page
//! is visible. Browsers suspend animation frames in background tabs, so
//! [`IntervalLoop`] ticks on a coarse timer as well; retries and watchdogs
//! keep running while the page is hidden.
//!
//! Both convert the browser's [`DOMHighResTimeStamp`][mdn] milliseconds into
//! microsecond [`HostTime`].
//!
//! [mdn]: https://developer.mozilla.org/en-US/docs/Web/API/DOMHighResTimeStamp
//! [`Synchronizer::tick`]: tandem_core::sync::Synchronizer::tick

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use wasm_bindgen::closure::Closure;
use wasm_bindgen::prelude::*;

use tandem_core::time::HostTime;

// Direct global bindings instead of `web_sys::Window` methods, so no Window
// object has to be fetched (and checked) on every frame.
#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_namespace = performance, js_name = "now")]
    pub(crate) fn performance_now() -> f64;

    #[wasm_bindgen(js_name = "requestAnimationFrame")]
    fn request_animation_frame(callback: &JsValue) -> i32;

    #[wasm_bindgen(js_name = "cancelAnimationFrame")]
    fn cancel_animation_frame(id: i32);

    #[wasm_bindgen(js_name = "setInterval")]
    fn set_interval(callback: &JsValue, millis: i32) -> i32;

    #[wasm_bindgen(js_name = "clearInterval")]
    fn clear_interval(id: i32);
}

type TickCallback = RefCell<Box<dyn FnMut(HostTime)>>;

/// A `requestAnimationFrame` loop that emits [`HostTime`] ticks.
///
/// Create with [`RafLoop::new`], then call [`start`](Self::start). The loop
/// re-registers itself each frame until [`stop`](Self::stop) is called or
/// the `RafLoop` is dropped.
pub struct RafLoop {
    inner: Rc<RafInner>,
}

type RafClosure = Closure<dyn FnMut(f64)>;

struct RafInner {
    /// The JS closure registered with `requestAnimationFrame`.
    ///
    /// Kept in its own `RefCell` so it can reference itself without
    /// conflicting with `callback`.
    closure: RefCell<Option<RafClosure>>,
    callback: TickCallback,
    frames: Cell<u64>,
    running: Cell<bool>,
    raf_id: Cell<i32>,
}

impl RafLoop {
    /// Creates a loop that is **not yet running**.
    pub fn new(callback: impl FnMut(HostTime) + 'static) -> Self {
        Self {
            inner: Rc::new(RafInner {
                closure: RefCell::new(None),
                callback: RefCell::new(Box::new(callback)),
                frames: Cell::new(0),
                running: Cell::new(false),
                raf_id: Cell::new(0),
            }),
        }
    }

    /// Starts the loop. No-op if already running.
    pub fn start(&self) {
        if self.inner.running.get() {
            return;
        }
        self.inner.running.set(true);

        let inner = Rc::clone(&self.inner);
        let closure = Closure::wrap(Box::new(move |timestamp_ms: f64| {
            if !inner.running.get() {
                return;
            }
            inner.frames.set(inner.frames.get() + 1);

            // Scoped so it does not overlap the `closure` borrow below.
            inner.callback.borrow_mut()(HostTime::from_millis_f64(timestamp_ms));

            if inner.running.get()
                && let Some(ref closure) = *inner.closure.borrow()
            {
                let id = request_animation_frame(closure.as_ref().unchecked_ref());
                inner.raf_id.set(id);
            }
        }) as Box<dyn FnMut(f64)>);

        let id = request_animation_frame(closure.as_ref().unchecked_ref());
        self.inner.raf_id.set(id);
        *self.inner.closure.borrow_mut() = Some(closure);
    }

    /// Stops the loop and cancels the pending frame. Can be restarted.
    pub fn stop(&self) {
        if !self.inner.running.get() {
            return;
        }
        self.inner.running.set(false);
        cancel_animation_frame(self.inner.raf_id.get());
    }

    /// Returns `true` if the loop is running.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.inner.running.get()
    }
}

impl Drop for RafLoop {
    fn drop(&mut self) {
        self.stop();
        self.inner.closure.borrow_mut().take();
    }
}

impl core::fmt::Debug for RafLoop {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("RafLoop")
            .field("running", &self.inner.running.get())
            .field("frames", &self.inner.frames.get())
            .finish()
    }
}

/// A `setInterval` loop that emits [`HostTime`] ticks.
///
/// Unlike [`RafLoop`] it keeps firing (throttled) in background tabs.
pub struct IntervalLoop {
    period_ms: i32,
    callback: Rc<TickCallback>,
    closure: RefCell<Option<Closure<dyn FnMut()>>>,
    interval_id: Cell<Option<i32>>,
}

impl IntervalLoop {
    /// Creates a loop firing every `period_ms` milliseconds once started.
    pub fn new(period_ms: u32, callback: impl FnMut(HostTime) + 'static) -> Self {
        Self {
            period_ms: i32::try_from(period_ms).unwrap_or(i32::MAX),
            callback: Rc::new(RefCell::new(Box::new(callback))),
            closure: RefCell::new(None),
            interval_id: Cell::new(None),
        }
    }

    /// Starts the timer. No-op if already running.
    pub fn start(&self) {
        if self.interval_id.get().is_some() {
            return;
        }
        let callback = Rc::clone(&self.callback);
        let closure = Closure::wrap(Box::new(move || {
            callback.borrow_mut()(crate::now());
        }) as Box<dyn FnMut()>);
        let id = set_interval(closure.as_ref().unchecked_ref(), self.period_ms);
        self.interval_id.set(Some(id));
        *self.closure.borrow_mut() = Some(closure);
    }

    /// Stops the timer.
    pub fn stop(&self) {
        if let Some(id) = self.interval_id.take() {
            clear_interval(id);
        }
    }

    /// Returns `true` if the timer is running.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.interval_id.get().is_some()
    }
}

impl Drop for IntervalLoop {
    fn drop(&mut self) {
        self.stop();
        self.closure.borrow_mut().take();
    }
}

impl core::fmt::Debug for IntervalLoop {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("IntervalLoop")
            .field("period_ms", &self.period_ms)
            .field("running", &self.is_running())
            .finish_non_exhaustive()
    }
}
