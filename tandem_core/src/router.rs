// Copyright 2026 the Tandem Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Mapping user input onto controller commands.
//!
//! [`InputRouter`] turns key presses, clicks, timestamp-link activations and
//! external seek signals into [`Command`]s for
//! [`Synchronizer::dispatch`](crate::sync::Synchronizer::dispatch). It never
//! touches an element. The host applies the returned [`Routed`] value:
//! dispatch the commands in order, call `preventDefault` when `consumed` is
//! set, toggle fullscreen, and replace the address.
//!
//! Rules:
//!
//! - Keys are ignored while focus is in a text-entry control or while Ctrl,
//!   Alt or Meta is held.
//! - The first handled key or click emits [`Command::RecordGesture`] ahead
//!   of its own command. No later input emits it again.
//! - Play/pause toggles are debounced on the leading edge: the first toggle
//!   passes, toggles inside the window after it are dropped. The leading
//!   edge keeps the command inside the browser's user-activation window.
//! - Space toggles only when the video has focus or was clicked recently.

use crate::config::RouterConfig;
use crate::error::TimestampError;
use crate::format::FormatId;
use crate::time::HostTime;
use crate::timestamp::{address_with_time, parse_marker};

/// A request to the synchronizer.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// A user gesture happened; playback may start from now on.
    RecordGesture,
    /// Start or resume playback.
    Play,
    /// Pause playback.
    Pause,
    /// Play if paused, pause if playing.
    TogglePlay,
    /// Seek to an absolute position in seconds.
    SeekTo(f64),
    /// Seek relative to the current position, in seconds.
    SeekBy(f64),
    /// Switch to another video quality.
    SelectQuality(FormatId),
}

/// Where keyboard focus is when a key is pressed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Focus {
    /// An `input`, `select`, `textarea`, `button` or editable element.
    TextEntry,
    /// The video element.
    Video,
    /// Anything else.
    Other,
}

impl Focus {
    /// Classifies a DOM element from its tag name and editability.
    #[must_use]
    pub fn from_tag(tag: &str, content_editable: bool, is_video: bool) -> Self {
        if is_video {
            return Self::Video;
        }
        let text_entry = content_editable
            || ["INPUT", "SELECT", "TEXTAREA", "BUTTON"]
                .iter()
                .any(|t| t.eq_ignore_ascii_case(tag));
        if text_entry { Self::TextEntry } else { Self::Other }
    }
}

/// Modifier keys held during a key press.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Modifiers {
    /// Control.
    pub ctrl: bool,
    /// Alt / Option.
    pub alt: bool,
    /// Meta / Command.
    pub meta: bool,
    /// Shift. Does not suppress shortcuts.
    pub shift: bool,
}

impl Modifiers {
    fn suppresses_shortcuts(self) -> bool {
        self.ctrl || self.alt || self.meta
    }
}

/// A `keydown` as the router sees it.
#[derive(Clone, Copy, Debug)]
pub struct KeyPress<'a> {
    /// `KeyboardEvent.key`.
    pub key: &'a str,
    /// Held modifiers.
    pub modifiers: Modifiers,
    /// Focus at the time of the press.
    pub focus: Focus,
}

/// Action bound to a key.
#[derive(Clone, Copy, Debug, PartialEq)]
enum KeyAction {
    Toggle,
    SeekBy(f64),
    Fullscreen,
}

fn key_action(key: &str) -> Option<KeyAction> {
    Some(match key {
        "k" | "K" | "p" | "P" | "e" | "E" | " " => KeyAction::Toggle,
        "j" | "J" | "n" | "N" => KeyAction::SeekBy(-10.0),
        "l" | "L" | "o" | "O" => KeyAction::SeekBy(10.0),
        "ArrowLeft" => KeyAction::SeekBy(-5.0),
        "ArrowRight" => KeyAction::SeekBy(5.0),
        "f" | "F" => KeyAction::Fullscreen,
        _ => return None,
    })
}

/// What the host must do in response to one input.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Routed {
    /// Commands to dispatch, in order.
    pub commands: Vec<Command>,
    /// Whether the host should call `preventDefault`.
    pub consumed: bool,
    /// Whether fullscreen should be toggled.
    pub fullscreen: bool,
    /// New address to install with `history.replaceState`.
    pub address: Option<String>,
}

impl Routed {
    fn ignored() -> Self {
        Self::default()
    }
}

/// Stateful input mapper.
#[derive(Clone, Debug)]
pub struct InputRouter {
    config: RouterConfig,
    gesture_recorded: bool,
    last_toggle: Option<HostTime>,
    last_video_interaction: Option<HostTime>,
}

impl InputRouter {
    /// Creates a router.
    #[must_use]
    pub fn new(config: RouterConfig) -> Self {
        Self {
            config,
            gesture_recorded: false,
            last_toggle: None,
            last_video_interaction: None,
        }
    }

    /// Whether a gesture has been recorded.
    #[must_use]
    pub fn gesture_recorded(&self) -> bool {
        self.gesture_recorded
    }

    /// Handles a `keydown`.
    pub fn key(&mut self, press: &KeyPress<'_>, now: HostTime) -> Routed {
        if press.focus == Focus::TextEntry || press.modifiers.suppresses_shortcuts() {
            return Routed::ignored();
        }
        let Some(action) = key_action(press.key) else {
            return Routed::ignored();
        };
        if press.key == " " && !self.space_allowed(press.focus, now) {
            return Routed::ignored();
        }
        if matches!(press.key, "k" | "K") {
            self.last_video_interaction = Some(now);
        }

        let mut routed = self.gesture(Routed {
            consumed: true,
            ..Routed::default()
        });
        match action {
            KeyAction::Toggle => self.toggle(&mut routed, now),
            KeyAction::SeekBy(delta) => routed.commands.push(Command::SeekBy(delta)),
            KeyAction::Fullscreen => routed.fullscreen = true,
        }
        routed
    }

    /// Handles a click on the video element itself.
    pub fn video_click(&mut self, now: HostTime) -> Routed {
        self.last_video_interaction = Some(now);
        let mut routed = self.gesture(Routed {
            consumed: true,
            ..Routed::default()
        });
        self.toggle(&mut routed, now);
        routed
    }

    /// Handles a click or pointer press anywhere else on the page.
    pub fn page_click(&mut self) -> Routed {
        self.gesture(Routed::default())
    }

    /// Handles activation of a timestamp link.
    ///
    /// `marker` is the link's seek-time attribute, `href` its target if any,
    /// and `address` the current page address. The new address is the
    /// link's `href` when present, otherwise `address` with its `t`
    /// parameter replaced.
    pub fn timestamp_link(
        &mut self,
        marker: &str,
        href: Option<&str>,
        address: &str,
    ) -> Result<Routed, TimestampError> {
        let seconds = parse_marker(marker)?;
        let mut routed = self.gesture(Routed {
            consumed: true,
            ..Routed::default()
        });
        routed.commands.push(Command::SeekTo(seconds));
        routed.address = match href.filter(|h| !h.is_empty()) {
            Some(h) => Some(h.to_owned()),
            None => address_with_time(address, seconds),
        };
        Ok(routed)
    }

    /// Handles an external "seek to timestamp" signal carrying `{time,
    /// link}`. Not a user gesture.
    #[must_use]
    pub fn seek_signal(&self, time: f64, link: Option<&str>, address: &str) -> Routed {
        if !time.is_finite() || time < 0.0 {
            return Routed::ignored();
        }
        Routed {
            commands: vec![Command::SeekTo(time)],
            consumed: false,
            fullscreen: false,
            address: match link.filter(|l| !l.is_empty()) {
                Some(l) => Some(l.to_owned()),
                None => address_with_time(address, time),
            },
        }
    }

    fn space_allowed(&self, focus: Focus, now: HostTime) -> bool {
        focus == Focus::Video
            || self.last_video_interaction.is_some_and(|t| {
                now.saturating_duration_since(t) < self.config.space_focus_window()
            })
    }

    fn gesture(&mut self, mut routed: Routed) -> Routed {
        if !self.gesture_recorded {
            self.gesture_recorded = true;
            routed.commands.insert(0, Command::RecordGesture);
        }
        routed
    }

    fn toggle(&mut self, routed: &mut Routed, now: HostTime) {
        let debounced = self
            .last_toggle
            .is_some_and(|t| now.saturating_duration_since(t) < self.config.debounce());
        if !debounced {
            self.last_toggle = Some(now);
            routed.commands.push(Command::TogglePlay);
        }
    }
}

/// Picture-in-picture arming.
///
/// Browsers only grant picture-in-picture from a user activation, so a click
/// arms the gate and hiding the page consumes it.
#[derive(Clone, Copy, Debug, Default)]
pub struct PipGate {
    armed: bool,
}

impl PipGate {
    /// Arms the gate after a click.
    pub fn arm(&mut self) {
        self.armed = true;
    }

    /// Disarms the gate after leaving picture-in-picture.
    pub fn disarm(&mut self) {
        self.armed = false;
    }

    /// Whether to request picture-in-picture as the page becomes hidden.
    #[must_use]
    pub fn should_enter(&self, hidden: bool, playing: bool, already_in_pip: bool) -> bool {
        self.armed && hidden && playing && !already_in_pip
    }
}
