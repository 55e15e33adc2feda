// Copyright 2026 the Tandem Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! OS media controls through `navigator.mediaSession`.
//!
//! `web-sys` gates the Media Session API behind unstable flags, so the
//! members used here are bound directly.

use std::cell::RefCell;
use std::rc::Rc;

use wasm_bindgen::closure::Closure;
use wasm_bindgen::prelude::*;

use tandem_core::router::Command;

use crate::error::WebError;

/// Seek step for the OS skip buttons when the platform gives no offset.
const DEFAULT_SKIP_S: f64 = 10.0;

const ACTIONS: [&str; 5] = ["play", "pause", "seekbackward", "seekforward", "seekto"];

#[wasm_bindgen]
extern "C" {
    type MediaSession;

    #[wasm_bindgen(method, catch, js_name = "setActionHandler")]
    fn set_action_handler(
        this: &MediaSession,
        action: &str,
        handler: Option<&js_sys::Function>,
    ) -> Result<(), JsValue>;

    #[wasm_bindgen(method, setter, js_name = "playbackState")]
    fn set_playback_state(this: &MediaSession, state: &str);

    #[wasm_bindgen(method, setter, js_name = "metadata")]
    fn set_metadata(this: &MediaSession, metadata: &MediaMetadata);

    #[wasm_bindgen(method, catch, js_name = "setPositionState")]
    fn set_position_state(this: &MediaSession, state: &JsValue) -> Result<(), JsValue>;

    type MediaMetadata;

    #[wasm_bindgen(constructor, catch)]
    fn new(init: &JsValue) -> Result<MediaMetadata, JsValue>;
}

type ActionClosure = Closure<dyn FnMut(JsValue)>;

/// Routes OS media keys and lock-screen controls to controller commands.
///
/// Handlers are unregistered on drop.
pub struct MediaSessionBridge {
    session: MediaSession,
    handlers: Vec<(&'static str, ActionClosure)>,
}

impl MediaSessionBridge {
    /// Registers handlers, or returns `None` where the API is missing.
    ///
    /// Actions the platform does not support are skipped individually.
    pub fn new(on_command: impl FnMut(Command) + 'static) -> Option<Self> {
        let navigator = web_sys::window()?.navigator();
        let session = js_sys::Reflect::get(&navigator, &JsValue::from_str("mediaSession")).ok()?;
        if session.is_undefined() || session.is_null() {
            return None;
        }
        let session: MediaSession = session.unchecked_into();

        let on_command: Rc<RefCell<dyn FnMut(Command)>> = Rc::new(RefCell::new(on_command));
        let mut handlers = Vec::with_capacity(ACTIONS.len());
        for action in ACTIONS {
            let on_command = Rc::clone(&on_command);
            let closure = Closure::wrap(Box::new(move |details: JsValue| {
                if let Some(command) = command_for(action, &details) {
                    (&mut *on_command.borrow_mut())(command);
                }
            }) as Box<dyn FnMut(JsValue)>);
            if session
                .set_action_handler(action, Some(closure.as_ref().unchecked_ref()))
                .is_ok()
            {
                handlers.push((action, closure));
            }
        }
        Some(Self { session, handlers })
    }

    /// Mirrors the playing/paused state to the OS controls.
    pub fn set_playing(&self, playing: bool) {
        self.session
            .set_playback_state(if playing { "playing" } else { "paused" });
    }

    /// Publishes title and artist to the OS controls.
    ///
    /// Empty fields are left out. Fails only if `MediaMetadata` is missing.
    pub fn set_metadata(&self, title: &str, artist: &str) -> Result<(), WebError> {
        let init = js_sys::Object::new();
        for (key, value) in [("title", title), ("artist", artist)] {
            if !value.is_empty() {
                js_sys::Reflect::set(&init, &JsValue::from_str(key), &JsValue::from_str(value))?;
            }
        }
        let metadata = MediaMetadata::new(&init)?;
        self.session.set_metadata(&metadata);
        Ok(())
    }

    /// Refreshes the OS scrubber.
    ///
    /// Skipped while the duration is unknown; the platform rejects a
    /// position past the duration, which is not an error here.
    pub fn set_position(&self, position: f64, duration: Option<f64>, rate: f64) {
        let Some(duration) = duration.filter(|d| d.is_finite() && *d > 0.0) else {
            return;
        };
        let state = js_sys::Object::new();
        for (key, value) in [
            ("duration", duration),
            ("position", position.clamp(0.0, duration)),
            ("playbackRate", rate),
        ] {
            _ = js_sys::Reflect::set(&state, &JsValue::from_str(key), &JsValue::from_f64(value));
        }
        _ = self.session.set_position_state(&state);
    }
}

fn command_for(action: &str, details: &JsValue) -> Option<Command> {
    let number = |key: &str| {
        js_sys::Reflect::get(details, &JsValue::from_str(key))
            .ok()
            .and_then(|v| v.as_f64())
    };
    match action {
        "play" => Some(Command::Play),
        "pause" => Some(Command::Pause),
        "seekbackward" => Some(Command::SeekBy(
            -number("seekOffset").unwrap_or(DEFAULT_SKIP_S),
        )),
        "seekforward" => Some(Command::SeekBy(number("seekOffset").unwrap_or(DEFAULT_SKIP_S))),
        "seekto" => number("seekTime").map(Command::SeekTo),
        _ => None,
    }
}

impl Drop for MediaSessionBridge {
    fn drop(&mut self) {
        for (action, _) in &self.handlers {
            _ = self.session.set_action_handler(action, None);
        }
    }
}

impl core::fmt::Debug for MediaSessionBridge {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let actions: Vec<&str> = self.handlers.iter().map(|(a, _)| *a).collect();
        f.debug_struct("MediaSessionBridge")
            .field("actions", &actions)
            .finish_non_exhaustive()
    }
}
