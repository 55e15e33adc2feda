// Copyright 2026 the Tandem Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Scriptable media elements.
//!
//! [`SimElement::new`] returns the element (handed to the controller) and a
//! [`SimHandle`] sharing its state. The handle plays the part of the
//! platform: it sets ready states and buffered ranges, advances the clock,
//! and lets tests inspect what the controller asked for.
//!
//! Assigning a source behaves like `HTMLMediaElement.load()`: the element
//! pauses, rewinds, and forgets its readiness and buffer.

use std::cell::RefCell;
use std::rc::Rc;

use tandem_core::media::{MediaElement, ReadyState, buffered_ahead_in};

/// Ranges closer than this are contiguous.
const GAP_S: f64 = 0.1;

#[derive(Debug)]
struct SimState {
    source: Option<String>,
    paused: bool,
    ended: bool,
    current_time: f64,
    duration: Option<f64>,
    ready_state: ReadyState,
    buffered: Vec<(f64, f64)>,
    muted: bool,
    rate: f64,
    sources: Vec<String>,
    plays: u32,
    pauses: u32,
    seeks: Vec<f64>,
}

impl SimState {
    fn new() -> Self {
        Self {
            source: None,
            paused: true,
            ended: false,
            current_time: 0.0,
            duration: None,
            ready_state: ReadyState::HaveNothing,
            buffered: Vec::new(),
            muted: false,
            rate: 1.0,
            sources: Vec::new(),
            plays: 0,
            pauses: 0,
            seeks: Vec::new(),
        }
    }
}

/// A simulated media element.
#[derive(Debug)]
pub struct SimElement {
    state: Rc<RefCell<SimState>>,
}

/// The platform side of a [`SimElement`].
#[derive(Clone, Debug)]
pub struct SimHandle {
    state: Rc<RefCell<SimState>>,
}

impl SimElement {
    /// Creates a paused element with no source.
    #[must_use]
    pub fn new() -> (Self, SimHandle) {
        let state = Rc::new(RefCell::new(SimState::new()));
        (
            Self {
                state: Rc::clone(&state),
            },
            SimHandle { state },
        )
    }

    /// Creates an element that already carries `url`, as a server-rendered
    /// `<source>` would.
    #[must_use]
    pub fn with_source(url: &str) -> (Self, SimHandle) {
        let (element, handle) = Self::new();
        element.state.borrow_mut().source = Some(url.to_owned());
        (element, handle)
    }
}

impl MediaElement for SimElement {
    fn set_source(&mut self, url: &str) {
        let mut s = self.state.borrow_mut();
        s.source = Some(url.to_owned());
        s.sources.push(url.to_owned());
        s.paused = true;
        s.ended = false;
        s.current_time = 0.0;
        s.ready_state = ReadyState::HaveNothing;
        s.buffered.clear();
    }

    fn clear_source(&mut self) {
        let mut s = self.state.borrow_mut();
        s.source = None;
        s.paused = true;
        s.ready_state = ReadyState::HaveNothing;
        s.buffered.clear();
    }

    fn source(&self) -> Option<String> {
        self.state.borrow().source.clone()
    }

    fn play(&mut self) {
        let mut s = self.state.borrow_mut();
        s.plays += 1;
        s.paused = false;
        s.ended = false;
    }

    fn pause(&mut self) {
        let mut s = self.state.borrow_mut();
        s.pauses += 1;
        s.paused = true;
    }

    fn is_paused(&self) -> bool {
        self.state.borrow().paused
    }

    fn is_ended(&self) -> bool {
        self.state.borrow().ended
    }

    fn current_time(&self) -> f64 {
        self.state.borrow().current_time
    }

    fn set_current_time(&mut self, seconds: f64) {
        let mut s = self.state.borrow_mut();
        s.current_time = seconds;
        s.ended = false;
        s.seeks.push(seconds);
    }

    fn duration(&self) -> Option<f64> {
        self.state.borrow().duration
    }

    fn ready_state(&self) -> ReadyState {
        self.state.borrow().ready_state
    }

    fn buffered_ahead(&self, position: f64) -> f64 {
        buffered_ahead_in(&self.state.borrow().buffered, position, GAP_S)
    }

    fn is_muted(&self) -> bool {
        self.state.borrow().muted
    }

    fn set_muted(&mut self, muted: bool) {
        self.state.borrow_mut().muted = muted;
    }

    fn playback_rate(&self) -> f64 {
        self.state.borrow().rate
    }

    fn set_playback_rate(&mut self, rate: f64) {
        self.state.borrow_mut().rate = rate;
    }
}

impl SimHandle {
    // -- scripting ----------------------------------------------------------

    /// Sets the ready state.
    pub fn set_ready(&self, ready: ReadyState) {
        self.state.borrow_mut().ready_state = ready;
    }

    /// Replaces the buffered ranges with `[0, end)`.
    pub fn buffer_to(&self, end: f64) {
        self.state.borrow_mut().buffered = vec![(0.0, end)];
    }

    /// Adds a buffered range.
    pub fn add_buffered(&self, start: f64, end: f64) {
        self.state.borrow_mut().buffered.push((start, end));
    }

    /// Marks the element fully ready with `[0, end)` buffered.
    pub fn load_ready(&self, end: f64) {
        self.set_ready(ReadyState::HaveEnoughData);
        self.buffer_to(end);
    }

    /// Sets the resource duration.
    pub fn set_duration(&self, duration: f64) {
        self.state.borrow_mut().duration = Some(duration);
    }

    /// Advances the playhead by `seconds` of wall time if playing.
    pub fn advance(&self, seconds: f64) {
        let mut s = self.state.borrow_mut();
        if !s.paused {
            s.current_time += seconds * s.rate;
        }
    }

    /// Moves the playhead without recording a seek (clock slip).
    pub fn slip_to(&self, seconds: f64) {
        self.state.borrow_mut().current_time = seconds;
    }

    /// Simulates the platform reaching the end of the resource.
    pub fn finish(&self) {
        let mut s = self.state.borrow_mut();
        s.ended = true;
        s.paused = true;
    }

    /// Simulates the user pressing the native play or pause control.
    pub fn set_paused(&self, paused: bool) {
        self.state.borrow_mut().paused = paused;
    }

    /// Simulates a native playback-rate change.
    pub fn set_rate(&self, rate: f64) {
        self.state.borrow_mut().rate = rate;
    }

    // -- inspection ---------------------------------------------------------

    /// The current source.
    #[must_use]
    pub fn source(&self) -> Option<String> {
        self.state.borrow().source.clone()
    }

    /// Every source the controller assigned, in order.
    #[must_use]
    pub fn sources(&self) -> Vec<String> {
        self.state.borrow().sources.clone()
    }

    /// Number of `play()` calls.
    #[must_use]
    pub fn play_count(&self) -> u32 {
        self.state.borrow().plays
    }

    /// Number of `pause()` calls.
    #[must_use]
    pub fn pause_count(&self) -> u32 {
        self.state.borrow().pauses
    }

    /// Every position the controller seeked to, in order.
    #[must_use]
    pub fn seeks(&self) -> Vec<f64> {
        self.state.borrow().seeks.clone()
    }

    /// Whether the element is paused.
    #[must_use]
    pub fn is_paused(&self) -> bool {
        self.state.borrow().paused
    }

    /// Whether the element is muted.
    #[must_use]
    pub fn is_muted(&self) -> bool {
        self.state.borrow().muted
    }

    /// Playhead position.
    #[must_use]
    pub fn current_time(&self) -> f64 {
        self.state.borrow().current_time
    }

    /// Playback rate.
    #[must_use]
    pub fn rate(&self) -> f64 {
        self.state.borrow().rate
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_source_resets_like_load() {
        let (mut el, h) = SimElement::new();
        h.load_ready(30.0);
        el.play();
        h.advance(2.0);
        el.set_source("https://a/1");
        assert_eq!(el.ready_state(), ReadyState::HaveNothing);
        assert!(el.is_paused());
        assert_eq!(el.current_time(), 0.0);
        assert_eq!(el.buffered_ahead(0.0), 0.0);
        assert_eq!(h.sources(), ["https://a/1"]);
    }

    #[test]
    fn advance_only_moves_when_playing() {
        let (mut el, h) = SimElement::new();
        h.advance(1.0);
        assert_eq!(h.current_time(), 0.0);
        el.play();
        el.set_playback_rate(2.0);
        h.advance(1.0);
        assert_eq!(h.current_time(), 2.0);
        assert_eq!(h.play_count(), 1);
    }

    #[test]
    fn slip_is_not_a_seek() {
        let (el, h) = SimElement::new();
        h.slip_to(4.0);
        assert_eq!(el.current_time(), 4.0);
        assert!(h.seeks().is_empty());
    }
}
