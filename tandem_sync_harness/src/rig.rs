// Copyright 2026 the Tandem Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! A synchronizer wired to simulated elements.
//!
//! [`Rig`] owns a [`Synchronizer`] over two [`SimElement`]s and keeps the
//! platform handles and recordings next to it. Time only moves through
//! [`Rig::step`], which advances both playheads and then ticks the
//! controller, the way a browser frame would.

use std::error::Error;

use tandem_core::config::SyncConfig;
use tandem_core::format::{FormatCatalog, FormatDescriptor, FormatId, Track};
use tandem_core::media::MediaEvent;
use tandem_core::proxy::{RewriteConfig, RewriteRule};
use tandem_core::router::Command;
use tandem_core::session::SyncState;
use tandem_core::sync::Synchronizer;
use tandem_core::time::{Duration, HostTime};

use crate::recording::{RecordingHints, RecordingSink};
use crate::sim::{SimElement, SimHandle};

/// Origin the fixture page is served from; also the proxy origin.
pub const PAGE_ORIGIN: &str = "https://tube.example";

/// 1080p video-only format in [`fixture_catalog`].
pub const HD: &str = "137";
/// 720p video-only format in [`fixture_catalog`].
pub const SD: &str = "136";
/// 360p muxed format in [`fixture_catalog`].
pub const MUXED: &str = "18";
/// English original audio in [`fixture_catalog`].
pub const AUDIO_EN: &str = "140";
/// French dubbed audio in [`fixture_catalog`].
pub const AUDIO_FR: &str = "251";

fn descriptor(id: &str, mime: &str, url: &str, bitrate: u64, height: u32) -> FormatDescriptor {
    FormatDescriptor {
        id: FormatId::new(id),
        mime_type: mime.to_owned(),
        url: Some(url.to_owned()),
        bitrate: Some(bitrate),
        quality_label: (height > 0).then(|| format!("{height}p")),
        height: (height > 0).then_some(height),
        resolution: None,
    }
}

/// Upstream URL of a fixture stream.
#[must_use]
pub fn upstream_url(node: &str, id: &str, extra: &str) -> String {
    format!(
        "https://{node}.googlevideo.com/videoplayback?itag={id}{extra}&host={node}.googlevideo.com"
    )
}

/// Two video-only qualities, one muxed quality, and two audio tracks.
#[must_use]
pub fn fixture_catalog() -> FormatCatalog {
    FormatCatalog::from_page(
        [descriptor(
            MUXED,
            r#"video/mp4; codecs="avc1.42001E, mp4a.40.2""#,
            &upstream_url("rr3---sn-c", MUXED, ""),
            500_000,
            360,
        )],
        [
            descriptor(
                HD,
                r#"video/mp4; codecs="avc1.640028""#,
                &upstream_url("rr1---sn-a", HD, ""),
                4_000_000,
                1080,
            ),
            descriptor(
                SD,
                r#"video/mp4; codecs="avc1.4d401f""#,
                &upstream_url("rr2---sn-b", SD, ""),
                2_000_000,
                720,
            ),
            descriptor(
                AUDIO_EN,
                r#"audio/mp4; codecs="mp4a.40.2""#,
                &upstream_url("rr1---sn-a", AUDIO_EN, "&xtags=lang=en-US:acont=original"),
                128_000,
                0,
            ),
            descriptor(
                AUDIO_FR,
                r#"audio/webm; codecs="opus""#,
                &upstream_url("rr1---sn-a", AUDIO_FR, "&xtags=lang=fr:acont=dubbed"),
                160_000,
                0,
            ),
        ],
    )
}

/// A synchronizer over simulated elements plus its observers.
#[derive(Debug)]
pub struct Rig {
    /// The controller under test.
    pub sync: Synchronizer<SimElement, RecordingHints>,
    /// Platform side of the video element.
    pub video: SimHandle,
    /// Platform side of the audio element.
    pub audio: SimHandle,
    /// Everything the controller traced.
    pub sink: RecordingSink,
    /// Every connection hint emitted.
    pub hints: RecordingHints,
    /// Current host time.
    pub now: HostTime,
}

impl Rig {
    /// Starts the fixture catalog at format `initial` with web defaults.
    pub fn new(initial: &str) -> Result<Self, Box<dyn Error>> {
        Self::with(SyncConfig::web(), fixture_catalog(), initial)
    }

    /// Starts `catalog` at format `initial`.
    pub fn with(
        config: SyncConfig,
        catalog: FormatCatalog,
        initial: &str,
    ) -> Result<Self, Box<dyn Error>> {
        let rule = RewriteRule::new(&RewriteConfig::default(), PAGE_ORIGIN)?;
        let (video_el, video) = SimElement::new();
        let (audio_el, audio) = SimElement::new();
        let sink = RecordingSink::new();
        let hints = RecordingHints::new();
        let now = HostTime::from_millis(1_000);
        let sync = Synchronizer::new(
            config,
            rule,
            catalog,
            &FormatId::new(initial),
            video_el,
            audio_el,
            hints.clone(),
            Box::new(sink.clone()),
            now,
        )?;
        Ok(Self {
            sync,
            video,
            audio,
            sink,
            hints,
            now,
        })
    }

    /// Advances time by `ms`: playheads first, then one controller tick.
    pub fn step(&mut self, ms: u64) {
        let seconds = Duration::from_millis(ms).as_secs_f64();
        self.video.advance(seconds);
        self.audio.advance(seconds);
        self.now = self.now.saturating_add(Duration::from_millis(ms));
        self.sync.tick(self.now);
    }

    /// Steps in `frame_ms` increments until `total_ms` have passed.
    pub fn run(&mut self, total_ms: u64, frame_ms: u64) {
        let mut elapsed = 0;
        while elapsed < total_ms {
            self.step(frame_ms);
            elapsed += frame_ms;
        }
    }

    /// Forwards an element event.
    pub fn event(&mut self, track: Track, event: MediaEvent) {
        self.sync.handle_media_event(track, event, self.now);
    }

    /// Applies a command.
    pub fn dispatch(&mut self, command: Command) {
        self.sync.dispatch(command, self.now);
    }

    /// Makes both elements ready with `[0, end)` buffered.
    pub fn ready_both(&self, end: f64) {
        self.video.load_ready(end);
        self.audio.load_ready(end);
    }

    /// Loads, records a gesture and plays. Ends in `Playing`.
    pub fn start_playing(&mut self, buffered_to: f64) {
        self.dispatch(Command::RecordGesture);
        self.dispatch(Command::Play);
        self.ready_both(buffered_to);
        self.step(10);
    }

    /// Current controller state.
    #[must_use]
    pub fn state(&self) -> SyncState {
        self.sync.state()
    }
}
