// Copyright 2026 the Tandem Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Split video/audio playback on a server-rendered watch page.
//!
//! The page provides:
//!
//! - `<video id="video">` with the initially rendered `<source>` tagged by
//!   `data-itag`, and optionally `data-player-config` and `data-author`
//! - an empty `<audio id="audio">`
//! - `<select id="quality-select">` whose option values are format ids
//! - a global `data` object with `formatStreams` and `adaptiveFormats`
//!
//! Build with: `wasm-pack build --target web demos/watch_page`

#![cfg_attr(
    not(target_arch = "wasm32"),
    allow(dead_code, reason = "this crate only runs in the browser")
)]

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use tandem_backend_web::page::{self, TIMESTAMP_ATTR};
use tandem_backend_web::{
    ConsoleSink, DomResourceHints, IntervalLoop, MediaSessionBridge, PlayRejections,
    QualityStore, RafLoop, WebError, WebMediaElement,
};
use tandem_core::config::restore_quality;
use tandem_core::format::{FormatId, Track};
use tandem_core::media::{MediaErrorKind, MediaEvent};
use tandem_core::proxy::RewriteRule;
use tandem_core::router::{Command, Focus, InputRouter, KeyPress, Modifiers, PipGate, Routed};
use tandem_core::session::SyncState;
use tandem_core::sync::Synchronizer;
use tandem_core::time::HostTime;
use tandem_core::timestamp::time_from_address;
use wasm_bindgen::JsCast as _;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::prelude::*;
use web_sys::{
    CustomEvent, Document, Element, Event, EventTarget, HtmlElement, HtmlMediaElement,
    HtmlSelectElement, KeyboardEvent, Node,
};

const VIDEO_ID: &str = "video";
const AUDIO_ID: &str = "audio";
const QUALITY_SELECT_ID: &str = "quality-select";
/// Custom event carrying `{ time, link }` in its `detail`.
const SEEK_SIGNAL: &str = "seek-to-timestamp";
const AUTHOR_ATTR: &str = "data-author";
/// Keeps ticks flowing while animation frames are throttled.
const BACKGROUND_TICK_MS: u32 = 250;

const MEDIA_EVENTS: [&str; 12] = [
    "loadedmetadata",
    "canplay",
    "canplaythrough",
    "playing",
    "waiting",
    "stalled",
    "play",
    "pause",
    "seeked",
    "ratechange",
    "ended",
    "error",
];

type Shared = Rc<RefCell<Player>>;

struct Player {
    sync: Synchronizer<WebMediaElement, DomResourceHints>,
    router: InputRouter,
    pip: PipGate,
    rejections: PlayRejections,
    store: QualityStore,
    media_session: Option<MediaSessionBridge>,
    document: Document,
    video: HtmlMediaElement,
    audio: HtmlMediaElement,
    quality_select: Option<HtmlSelectElement>,
    published: Option<SyncState>,
}

/// Entry point for the watch page.
#[cfg_attr(all(target_arch = "wasm32", not(test)), wasm_bindgen(start))]
pub fn main() -> Result<(), JsValue> {
    console_error_panic_hook::set_once();

    let window = web_sys::window().ok_or(WebError::NoWindow)?;
    let document = window.document().ok_or(WebError::NoDocument)?;
    let video: HtmlMediaElement = page::element_by_id(&document, VIDEO_ID)?;
    let audio: HtmlMediaElement = page::element_by_id(&document, AUDIO_ID)?;
    let quality_select = page::element_by_id::<HtmlSelectElement>(&document, QUALITY_SELECT_ID).ok();

    let config = page::read_player_config(&video)?;
    let (catalog, initial) = page::read_catalog(&video)?;
    let Some(initial) = initial else {
        return Err(WebError::MissingElement(format!(
            "{VIDEO_ID}[{}]",
            page::INITIAL_FORMAT_ATTR
        ))
        .into());
    };
    let origin = tandem_backend_web::page_origin().unwrap_or_default();
    let rule = RewriteRule::new(&config.rewrite, &origin).map_err(js_error)?;

    let store = QualityStore::open();
    let preferred = restore_quality(store.load().as_deref(), &initial, &catalog);

    let rejections = PlayRejections::new();
    let now = tandem_backend_web::now();
    let mut sync = Synchronizer::new(
        config.sync,
        rule,
        catalog,
        &initial,
        WebMediaElement::new(video.clone(), Track::Video, rejections.clone()),
        WebMediaElement::new(audio.clone(), Track::Audio, rejections.clone()),
        DomResourceHints::new(document.clone()),
        Box::new(ConsoleSink::default()),
        now,
    )
    .map_err(js_error)?;
    if preferred != initial {
        sync.select_quality(&preferred, now);
    }
    if let Some(start) = time_from_address(&page::current_address()) {
        sync.seek(start, now);
    }

    let player = Rc::new(RefCell::new(Player {
        sync,
        router: InputRouter::new(config.router),
        pip: PipGate::default(),
        rejections,
        store,
        media_session: None,
        document: document.clone(),
        video: video.clone(),
        audio: audio.clone(),
        quality_select,
        published: None,
    }));

    let bridge = MediaSessionBridge::new({
        let player = Rc::downgrade(&player);
        move |command| on_session_command(&player, command)
    });
    {
        let mut p = player.borrow_mut();
        p.media_session = bridge;
        p.publish_metadata();
        p.publish();
    }

    bind_media_events(&player, &video, Track::Video)?;
    bind_media_events(&player, &audio, Track::Audio)?;
    bind_input(&player, &document)?;
    bind_page(&player, &document, &video)?;

    let raf = RafLoop::new({
        let player = Rc::clone(&player);
        move |now| player.borrow_mut().tick(now)
    });
    raf.start();
    core::mem::forget(raf);

    let interval = IntervalLoop::new(BACKGROUND_TICK_MS, {
        let player = Rc::clone(&player);
        move |now| player.borrow_mut().tick(now)
    });
    interval.start();
    core::mem::forget(interval);

    Ok(())
}

impl Player {
    /// Applies routed input: commands, fullscreen, address update.
    fn apply(&mut self, routed: Routed, event: Option<&Event>) {
        if routed.consumed
            && let Some(event) = event
        {
            event.prevent_default();
        }
        let now = tandem_backend_web::now();
        for command in routed.commands {
            let switched = match &command {
                Command::SelectQuality(id) => {
                    self.store.save(id);
                    true
                }
                _ => false,
            };
            self.sync.dispatch(command, now);
            if switched {
                self.publish_metadata();
            }
        }
        if routed.fullscreen {
            self.toggle_fullscreen();
        }
        if let Some(address) = routed.address {
            _ = page::replace_address(&address);
        }
        self.publish();
    }

    fn tick(&mut self, now: HostTime) {
        for (track, reason) in self.rejections.drain() {
            self.sync.on_play_rejected(track, &reason, now);
        }
        self.sync.tick(now);
        self.publish();
    }

    fn on_media_event(&mut self, track: Track, name: &str) {
        let element = match track {
            Track::Video => &self.video,
            Track::Audio => &self.audio,
        };
        let Some(event) = media_event(name, element) else {
            return;
        };
        self.sync
            .handle_media_event(track, event, tandem_backend_web::now());
        let (metadata, position) = session_refresh(track, event);
        if metadata {
            self.publish_metadata();
        }
        if position {
            self.published = None;
        }
        self.publish();
    }

    fn on_visibility(&mut self) {
        let hidden = self.document.hidden();
        self.sync
            .set_page_visible(!hidden, tandem_backend_web::now());
        let playing = self.sync.state() == SyncState::Playing;
        if self.pip.should_enter(hidden, playing, in_picture_in_picture(&self.document)) {
            request_picture_in_picture(&self.video);
        }
    }

    /// Mirrors controller state to the OS controls and the quality picker.
    fn publish(&mut self) {
        let state = self.sync.state();
        if self.published == Some(state) {
            return;
        }
        self.published = Some(state);
        if let Some(session) = &self.media_session {
            session.set_playing(state == SyncState::Playing);
            session.set_position(
                self.video.current_time(),
                Some(self.video.duration()),
                self.video.playback_rate(),
            );
        }
        if let Some(select) = &self.quality_select {
            select.set_value(self.sync.session().active_video().as_str());
        }
    }

    fn publish_metadata(&self) {
        if let Some(session) = &self.media_session {
            let artist = self.video.get_attribute(AUTHOR_ATTR).unwrap_or_default();
            _ = session.set_metadata(&self.document.title(), &artist);
        }
    }

    fn toggle_fullscreen(&self) {
        if self.document.fullscreen_element().is_some() {
            self.document.exit_fullscreen();
        } else {
            _ = self.video.request_fullscreen();
        }
    }

    fn focus(&self) -> Focus {
        let Some(active) = self.document.active_element() else {
            return Focus::Other;
        };
        let editable = active
            .dyn_ref::<HtmlElement>()
            .is_some_and(HtmlElement::is_content_editable);
        let video: &Node = self.video.as_ref();
        Focus::from_tag(&active.tag_name(), editable, active.is_same_node(Some(video)))
    }
}

/// Which media-session fields a video event invalidates: metadata, position.
fn session_refresh(track: Track, event: MediaEvent) -> (bool, bool) {
    match (track, event) {
        (Track::Video, MediaEvent::LoadedMetadata) => (true, true),
        (Track::Video, MediaEvent::Seeked) => (false, true),
        _ => (false, false),
    }
}

fn media_event(name: &str, element: &HtmlMediaElement) -> Option<MediaEvent> {
    Some(match name {
        "loadedmetadata" => MediaEvent::LoadedMetadata,
        "canplay" | "canplaythrough" => MediaEvent::CanPlay,
        "playing" => MediaEvent::Playing,
        "waiting" | "stalled" => MediaEvent::Waiting,
        "play" => MediaEvent::Play,
        "pause" => MediaEvent::Pause,
        "seeked" => MediaEvent::Seeked,
        "ratechange" => MediaEvent::RateChange,
        "ended" => MediaEvent::Ended,
        "error" => MediaEvent::Error(
            element
                .error()
                .map_or(MediaErrorKind::Unknown, |e| MediaErrorKind::from_code(e.code())),
        ),
        _ => return None,
    })
}

fn on_session_command(player: &Weak<RefCell<Player>>, command: Command) {
    let Some(player) = player.upgrade() else {
        return;
    };
    let mut p = player.borrow_mut();
    // OS media keys and lock-screen buttons are user activations.
    let routed = Routed {
        commands: vec![Command::RecordGesture, command],
        ..Routed::default()
    };
    p.apply(routed, None);
}

fn bind_media_events(
    player: &Shared,
    element: &HtmlMediaElement,
    track: Track,
) -> Result<(), JsValue> {
    for name in MEDIA_EVENTS {
        let player = Rc::clone(player);
        listen(element, name, false, move |_event| {
            player.borrow_mut().on_media_event(track, name);
        })?;
    }
    Ok(())
}

fn bind_input(player: &Shared, document: &Document) -> Result<(), JsValue> {
    // Capture phase, so shortcuts win over focused controls' defaults.
    let keys = Rc::clone(player);
    listen(document, "keydown", true, move |event| {
        let Some(key_event) = event.dyn_ref::<KeyboardEvent>() else {
            return;
        };
        let mut p = keys.borrow_mut();
        let key = key_event.key();
        let press = KeyPress {
            key: &key,
            modifiers: Modifiers {
                ctrl: key_event.ctrl_key(),
                alt: key_event.alt_key(),
                meta: key_event.meta_key(),
                shift: key_event.shift_key(),
            },
            focus: p.focus(),
        };
        let routed = p.router.key(&press, tandem_backend_web::now());
        p.apply(routed, Some(&event));
    })?;

    let clicks = Rc::clone(player);
    listen(document, "click", false, move |event| {
        let mut p = clicks.borrow_mut();
        p.pip.arm();
        let target = event
            .target()
            .and_then(|t| t.dyn_into::<Element>().ok());

        let link = target
            .as_ref()
            .and_then(|t| t.closest(&format!("[{TIMESTAMP_ATTR}]")).ok().flatten());
        if let Some(link) = link {
            let marker = link.get_attribute(TIMESTAMP_ATTR).unwrap_or_default();
            let href = link.get_attribute("href");
            let routed = p
                .router
                .timestamp_link(&marker, href.as_deref(), &page::current_address())
                .unwrap_or_else(|_| p.router.page_click());
            p.apply(routed, Some(&event));
            return;
        }

        let video: &Node = p.video.as_ref();
        let on_video = target.as_ref().is_some_and(|t| t.is_same_node(Some(video)));
        let routed = if on_video {
            p.router.video_click(tandem_backend_web::now())
        } else {
            p.router.page_click()
        };
        p.apply(routed, Some(&event));
    })?;

    let signals = Rc::clone(player);
    listen(document, SEEK_SIGNAL, false, move |event| {
        let detail = event
            .dyn_ref::<CustomEvent>()
            .map_or(JsValue::UNDEFINED, CustomEvent::detail);
        let field = |key: &str| js_sys::Reflect::get(&detail, &JsValue::from_str(key)).ok();
        let Some(time) = field("time").and_then(|v| v.as_f64()) else {
            return;
        };
        let link = field("link").and_then(|v| v.as_string());
        let mut p = signals.borrow_mut();
        let routed = p
            .router
            .seek_signal(time, link.as_deref(), &page::current_address());
        p.apply(routed, None);
    })?;

    if let Some(select) = player.borrow().quality_select.clone() {
        let quality = Rc::clone(player);
        listen(&select.clone(), "change", false, move |_event| {
            let id = select.value();
            let mut p = quality.borrow_mut();
            let routed = Routed {
                commands: vec![Command::SelectQuality(FormatId::new(id))],
                ..Routed::default()
            };
            p.apply(routed, None);
        })?;
    }
    Ok(())
}

fn bind_page(player: &Shared, document: &Document, video: &HtmlMediaElement) -> Result<(), JsValue> {
    let visibility = Rc::clone(player);
    listen(document, "visibilitychange", false, move |_event| {
        visibility.borrow_mut().on_visibility();
    })?;

    let pip = Rc::clone(player);
    listen(video, "leavepictureinpicture", false, move |_event| {
        pip.borrow_mut().pip.disarm();
    })?;
    Ok(())
}

fn listen(
    target: &EventTarget,
    name: &str,
    capture: bool,
    mut handler: impl FnMut(Event) + 'static,
) -> Result<(), JsValue> {
    let cb = Closure::wrap(Box::new(move |event: Event| handler(event)) as Box<dyn FnMut(_)>);
    target.add_event_listener_with_callback_and_bool(name, cb.as_ref().unchecked_ref(), capture)?;
    cb.forget();
    Ok(())
}

fn in_picture_in_picture(document: &Document) -> bool {
    js_sys::Reflect::get(document, &JsValue::from_str("pictureInPictureElement"))
        .is_ok_and(|e| !e.is_null() && !e.is_undefined())
}

fn request_picture_in_picture(video: &HtmlMediaElement) {
    let request = js_sys::Reflect::get(video, &JsValue::from_str("requestPictureInPicture"))
        .ok()
        .and_then(|f| f.dyn_into::<js_sys::Function>().ok());
    let Some(request) = request else {
        return;
    };
    if let Ok(promise) = request.call0(video) {
        let promise = js_sys::Promise::resolve(&promise);
        wasm_bindgen_futures::spawn_local(async move {
            _ = wasm_bindgen_futures::JsFuture::from(promise).await;
        });
    }
}

fn js_error(err: impl core::fmt::Display) -> JsValue {
    js_sys::Error::new(&err.to_string()).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loaded_metadata_refreshes_session_metadata() {
        assert_eq!(
            session_refresh(Track::Video, MediaEvent::LoadedMetadata),
            (true, true)
        );
        assert_eq!(session_refresh(Track::Video, MediaEvent::Seeked), (false, true));
        assert_eq!(
            session_refresh(Track::Audio, MediaEvent::LoadedMetadata),
            (false, false)
        );
        assert_eq!(session_refresh(Track::Video, MediaEvent::Playing), (false, false));
    }
}
