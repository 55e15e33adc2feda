// Copyright 2026 the Tandem Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! `HTMLMediaElement` behind the [`MediaElement`] seam.

use std::cell::RefCell;
use std::rc::Rc;

use wasm_bindgen::JsValue;
use wasm_bindgen_futures::JsFuture;
use web_sys::HtmlMediaElement;

use tandem_core::format::Track;
use tandem_core::media::{MediaElement, ReadyState, buffered_ahead_in};

use crate::error::{describe, error_name};

/// Ranges closer than this are treated as contiguous.
const BUFFER_GAP_S: f64 = 0.1;

/// Collects `play()` promise rejections for the host to forward.
///
/// `play()` settles asynchronously, after the call that issued it has
/// returned. Rejections land here and the host drains them on its next tick
/// into [`Synchronizer::on_play_rejected`]. `AbortError` is dropped: it
/// only means a later `pause()` or source change interrupted the request.
///
/// [`Synchronizer::on_play_rejected`]: tandem_core::sync::Synchronizer::on_play_rejected
#[derive(Clone, Debug, Default)]
pub struct PlayRejections {
    queue: Rc<RefCell<Vec<(Track, String)>>>,
}

impl PlayRejections {
    /// Creates an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Takes all queued rejections.
    #[must_use]
    pub fn drain(&self) -> Vec<(Track, String)> {
        core::mem::take(&mut *self.queue.borrow_mut())
    }

    fn push(&self, track: Track, err: &JsValue) {
        if error_name(err).as_deref() == Some("AbortError") {
            return;
        }
        self.queue.borrow_mut().push((track, describe(err)));
    }
}

/// A page media element.
#[derive(Debug)]
pub struct WebMediaElement {
    element: HtmlMediaElement,
    track: Track,
    rejections: PlayRejections,
}

impl WebMediaElement {
    /// Wraps `element`, which plays `track`.
    #[must_use]
    pub fn new(element: HtmlMediaElement, track: Track, rejections: PlayRejections) -> Self {
        Self {
            element,
            track,
            rejections,
        }
    }

    /// The wrapped element.
    #[must_use]
    pub fn element(&self) -> &HtmlMediaElement {
        &self.element
    }

    fn ranges(&self) -> Vec<(f64, f64)> {
        let buffered = self.element.buffered();
        (0..buffered.length())
            .filter_map(|i| Some((buffered.start(i).ok()?, buffered.end(i).ok()?)))
            .collect()
    }
}

impl MediaElement for WebMediaElement {
    fn set_source(&mut self, url: &str) {
        self.element.set_src(url);
        self.element.load();
    }

    fn clear_source(&mut self) {
        _ = self.element.remove_attribute("src");
        self.element.load();
    }

    fn source(&self) -> Option<String> {
        let src = self.element.current_src();
        if src.is_empty() {
            self.element.get_attribute("src").filter(|s| !s.is_empty())
        } else {
            Some(src)
        }
    }

    fn play(&mut self) {
        let rejections = self.rejections.clone();
        let track = self.track;
        match self.element.play() {
            Ok(promise) => wasm_bindgen_futures::spawn_local(async move {
                if let Err(err) = JsFuture::from(promise).await {
                    rejections.push(track, &err);
                }
            }),
            Err(err) => rejections.push(track, &err),
        }
    }

    fn pause(&mut self) {
        _ = self.element.pause();
    }

    fn is_paused(&self) -> bool {
        self.element.paused()
    }

    fn is_ended(&self) -> bool {
        self.element.ended()
    }

    fn current_time(&self) -> f64 {
        self.element.current_time()
    }

    fn set_current_time(&mut self, seconds: f64) {
        self.element.set_current_time(seconds);
    }

    fn duration(&self) -> Option<f64> {
        let d = self.element.duration();
        d.is_finite().then_some(d)
    }

    fn ready_state(&self) -> ReadyState {
        ReadyState::from_u16(self.element.ready_state())
    }

    fn buffered_ahead(&self, position: f64) -> f64 {
        buffered_ahead_in(&self.ranges(), position, BUFFER_GAP_S)
    }

    fn is_muted(&self) -> bool {
        self.element.muted()
    }

    fn set_muted(&mut self, muted: bool) {
        self.element.set_muted(muted);
    }

    fn playback_rate(&self) -> f64 {
        self.element.playback_rate()
    }

    fn set_playback_rate(&mut self, rate: f64) {
        self.element.set_playback_rate(rate);
    }
}
