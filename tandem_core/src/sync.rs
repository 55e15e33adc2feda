// Copyright 2026 the Tandem Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The dual-track synchronizer.
//!
//! [`Synchronizer`] owns the active (video, audio) format pair and is the
//! only code that mutates either element. Everything else requests
//! transitions: the host forwards element events through
//! [`handle_media_event`](Synchronizer::handle_media_event), user input
//! through [`dispatch`](Synchronizer::dispatch), and drives time forward
//! with [`tick`](Synchronizer::tick).
//!
//! ```text
//!  Idle ─► Loading ──join barrier──┐
//!                                  ▼
//!  QualitySwitching ──barrier──► Paused ◄──────► Playing
//!        ▲                        │  ▲            │  ▲
//!        │ select_quality    seek ▼  │ lookahead  ▼  │ recovered
//!        └─ (any state)          Seeking      BufferStalled
//! ```
//!
//! Video is the timing master; audio follows. While a frozen state
//! (`Seeking`, `QualitySwitching`, `BufferStalled`) holds the freeze gate,
//! play requests only record that playback should resume, and drift
//! correction does not run. Only the pending wait that owns the freeze (the
//! join barrier, the post-seek lookahead wait, or the stall watchdog) lifts
//! it.

use crate::audio::select_best_audio;
use crate::config::SyncConfig;
use crate::error::{CatalogError, SyncError};
use crate::format::{FormatCatalog, FormatId, StreamFormat, StreamKey, Track};
use crate::loader::{Attempt, ErrorOutcome, LoadCycle, RetryPolicy};
use crate::media::{MediaElement, MediaErrorKind, MediaEvent};
use crate::proxy::{ProxyTable, RewriteRule};
use crate::router::Command;
use crate::session::{PlaybackSession, PlaybackSnapshot, SyncState};
use crate::time::HostTime;
use crate::trace::{
    Condition, DriftCorrectionEvent, DriftSampleEvent, LoadAttemptEvent, MediaUnavailableEvent,
    ProxyFallbackEvent, RetryScheduledEvent, StateChangeEvent, TraceSink,
};
use crate::wait::{Await, Generation, Poll};
use crate::warmer::{ConnectionWarmer, ResourceHints};

/// Slack allowed when comparing buffered spans near the end of a resource.
const END_SLACK_S: f64 = 0.1;

/// What the single outstanding wait is waiting for.
#[derive(Clone, Copy, Debug, PartialEq)]
enum Pending {
    /// Both required elements reach the configured ready state. Then the
    /// position is restored, if one was captured.
    JoinBarrier { restore: Option<f64> },
    /// Both elements have lookahead beyond `target`.
    Lookahead { target: f64 },
    /// The stalled element resumed.
    StallRecovery {
        stalled: Track,
        muted_audio: bool,
        recovered: bool,
    },
}

/// Coordinates a video element and a subordinate audio element.
///
/// See the [module documentation](self) for the state machine.
pub struct Synchronizer<E, H> {
    config: SyncConfig,
    policy: RetryPolicy,
    rule: RewriteRule,
    catalog: FormatCatalog,
    proxies: ProxyTable,
    warmer: ConnectionWarmer<H>,
    video: E,
    audio: E,
    sink: Box<dyn TraceSink>,
    session: PlaybackSession,
    state: SyncState,
    generation: Generation,
    pending: Option<Await<Pending>>,
    video_load: Option<LoadCycle>,
    audio_load: Option<LoadCycle>,
    audio_exhausted: bool,
    page_visible: bool,
    next_drift_check: HostTime,
    last_correction: Option<HostTime>,
    corrections: u64,
    last_tick: HostTime,
}

impl<E, H> core::fmt::Debug for Synchronizer<E, H> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Synchronizer")
            .field("state", &self.state)
            .field("session", &self.session)
            .field("generation", &self.generation)
            .field("pending", &self.pending)
            .finish_non_exhaustive()
    }
}

impl<E: MediaElement, H: ResourceHints> Synchronizer<E, H> {
    /// Creates a synchronizer for the initially rendered format and starts
    /// loading it.
    ///
    /// The video element is expected to already carry the page's resolved
    /// source for `initial`; if its current source equals the catalog URL,
    /// the first attempt does not reassign it.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::InitialFormat`] if `initial` is unknown or has
    /// no URL.
    pub fn new(
        config: SyncConfig,
        rule: RewriteRule,
        catalog: FormatCatalog,
        initial: &FormatId,
        video: E,
        audio: E,
        hints: H,
        sink: Box<dyn TraceSink>,
        now: HostTime,
    ) -> Result<Self, SyncError> {
        if catalog.is_empty() {
            return Err(CatalogError::NoVideoFormats.into());
        }
        catalog.playable_video(initial)?;

        let mut sync = Self {
            policy: RetryPolicy::from_config(&config),
            config,
            rule,
            catalog,
            proxies: ProxyTable::new(),
            warmer: ConnectionWarmer::new(hints),
            video,
            audio,
            sink,
            session: PlaybackSession::new(initial.clone(), None),
            state: SyncState::Idle,
            generation: Generation::default(),
            pending: None,
            video_load: None,
            audio_load: None,
            audio_exhausted: false,
            page_visible: true,
            next_drift_check: now,
            last_correction: None,
            corrections: 0,
            last_tick: now,
        };
        sync.session.active_audio = sync.audio_for(initial, now);
        sync.load(None, now);
        Ok(sync)
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    /// Current state.
    #[must_use]
    pub fn state(&self) -> SyncState {
        self.state
    }

    /// The live session.
    #[must_use]
    pub fn session(&self) -> &PlaybackSession {
        &self.session
    }

    /// The format catalog, including any proxied URL rewrites.
    #[must_use]
    pub fn catalog(&self) -> &FormatCatalog {
        &self.catalog
    }

    /// Which streams have moved onto the proxy.
    #[must_use]
    pub fn proxies(&self) -> &ProxyTable {
        &self.proxies
    }

    /// The configuration in use.
    #[must_use]
    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// The video element.
    #[must_use]
    pub fn video(&self) -> &E {
        &self.video
    }

    /// The audio element.
    #[must_use]
    pub fn audio(&self) -> &E {
        &self.audio
    }

    /// The active video format.
    #[must_use]
    pub fn active_video_format(&self) -> Option<&StreamFormat> {
        self.catalog.video(&self.session.active_video)
    }

    /// Whether audio is required and still loadable.
    fn audio_live(&self) -> bool {
        self.session.active_audio.is_some() && !self.audio_exhausted
    }

    /// A point-in-time view of the controller.
    #[must_use]
    pub fn snapshot(&self) -> PlaybackSnapshot {
        let video_time = self.video.current_time();
        let audio_time = self
            .session
            .active_audio
            .as_ref()
            .map(|_| self.audio.current_time());
        PlaybackSnapshot {
            state: self.state,
            video: self.session.active_video.clone(),
            audio: self.session.active_audio.clone(),
            video_time,
            audio_time,
            drift: audio_time.map(|a| video_time - a),
            frozen: self.session.frozen_for_buffering,
            page_visible: self.page_visible,
            corrections: self.corrections,
            last_tick: self.last_tick,
        }
    }

    // -----------------------------------------------------------------------
    // Commands
    // -----------------------------------------------------------------------

    /// Applies a routed command.
    pub fn dispatch(&mut self, command: Command, now: HostTime) {
        match command {
            Command::RecordGesture => self.session.user_has_interacted = true,
            Command::Play => self.play(now),
            Command::Pause => self.pause(now),
            Command::TogglePlay => {
                if self.state == SyncState::Playing
                    || (self.state != SyncState::Paused && self.session.pending_resume)
                {
                    self.pause(now);
                } else {
                    self.play(now);
                }
            }
            Command::SeekTo(seconds) => self.seek(seconds, now),
            Command::SeekBy(delta) => {
                let base = self.logical_position();
                self.seek(base + delta, now);
            }
            Command::SelectQuality(id) => self.select_quality(&id, now),
        }
    }

    /// Requests playback.
    ///
    /// Before any user gesture this is a no-op. While loading or frozen it
    /// only records that playback should resume when the freeze lifts.
    pub fn play(&mut self, now: HostTime) {
        if !self.session.user_has_interacted {
            self.report(Condition::GestureRequired, now);
            return;
        }
        match self.state {
            SyncState::Playing => {}
            SyncState::Paused => {
                self.session.pending_resume = true;
                self.align_audio();
                self.start_both(now);
            }
            SyncState::Idle
            | SyncState::Loading
            | SyncState::Seeking
            | SyncState::QualitySwitching
            | SyncState::BufferStalled => self.session.pending_resume = true,
        }
    }

    /// Pauses playback and cancels any pending resume.
    pub fn pause(&mut self, now: HostTime) {
        self.session.pending_resume = false;
        match self.state {
            SyncState::Playing => {
                self.pause_both();
                self.set_state(SyncState::Paused, now);
            }
            SyncState::BufferStalled => {
                self.release_stall();
                self.generation = self.generation.next();
                self.pending = None;
                self.pause_both();
                self.set_state(SyncState::Paused, now);
            }
            SyncState::Idle
            | SyncState::Loading
            | SyncState::Paused
            | SyncState::Seeking
            | SyncState::QualitySwitching => {}
        }
    }

    /// Seeks both tracks to `seconds`.
    ///
    /// Supersedes any pending seek. During a load the target replaces the
    /// position restored after the join barrier.
    pub fn seek(&mut self, seconds: f64, now: HostTime) {
        if !seconds.is_finite() {
            return;
        }
        let target = self.clamp_position(seconds);
        self.generation = self.generation.next();

        match self.state {
            SyncState::Idle | SyncState::Loading | SyncState::QualitySwitching => {
                self.pending = Some(Await::new(
                    Pending::JoinBarrier {
                        restore: Some(target),
                    },
                    self.generation,
                    now,
                ));
            }
            SyncState::Playing
            | SyncState::Paused
            | SyncState::Seeking
            | SyncState::BufferStalled => {
                if matches!(self.state, SyncState::Playing | SyncState::BufferStalled) {
                    self.session.pending_resume = true;
                }
                self.release_stall();
                self.set_state(SyncState::Seeking, now);
                self.pause_both();
                self.video.set_current_time(target);
                if self.audio_live() {
                    self.audio.set_current_time(target);
                }
                self.pending = Some(
                    Await::new(Pending::Lookahead { target }, self.generation, now)
                        .with_timeout(self.config.seek_watchdog()),
                );
            }
        }
    }

    /// Switches to another video quality, keeping the playback position.
    ///
    /// Unknown identifiers and formats without a URL are reported and
    /// ignored.
    pub fn select_quality(&mut self, id: &FormatId, now: HostTime) {
        if let Err(err) = self.catalog.playable_video(id).map(|_| ()) {
            let condition = match err {
                CatalogError::MissingUrl(id) => Condition::MissingUrl(id),
                CatalogError::UnknownFormat(id) => Condition::UnknownFormat(id),
                CatalogError::NoVideoFormats => Condition::UnknownFormat(id.clone()),
            };
            self.report(condition, now);
            return;
        }
        if *id == self.session.active_video {
            return;
        }

        let restore = match self.pending.as_ref().map(Await::condition) {
            Some(Pending::JoinBarrier {
                restore: Some(position),
            }) => *position,
            Some(Pending::Lookahead { target }) => *target,
            _ => self.video.current_time(),
        };
        if matches!(self.state, SyncState::Playing | SyncState::BufferStalled) {
            self.session.pending_resume = true;
        }
        self.generation = self.generation.next();
        self.release_stall();
        self.session.quality_switch_in_progress = true;
        self.set_state(SyncState::QualitySwitching, now);
        self.pause_both();

        let old_video = self.video_key();
        let old_audio = self.audio_key();
        let new_audio = self.audio_for(id, now);
        self.session.active_video = id.clone();
        self.session.active_audio = new_audio;

        if self.proxies.is_proxied(&old_video) {
            self.proxies.mark(self.video_key());
        }
        if let (Some(old), Some(new)) = (old_audio, self.audio_key())
            && self.proxies.is_proxied(&old)
        {
            self.proxies.mark(new);
        }

        self.load(Some(restore), now);
    }

    /// Records whether the page is visible.
    ///
    /// Drift correction is suspended while hidden. Becoming visible during
    /// playback realigns audio onto video immediately.
    pub fn set_page_visible(&mut self, visible: bool, now: HostTime) {
        let was_visible = self.page_visible;
        self.page_visible = visible;
        if visible && !was_visible && self.state == SyncState::Playing && self.audio_live() {
            self.correct_drift(now);
            self.next_drift_check = now.saturating_add(self.config.drift_check_interval());
        }
    }

    /// Reports that an element refused a `play()` request.
    ///
    /// Playback settles in `Paused`; the next gesture retries.
    pub fn on_play_rejected(&mut self, track: Track, reason: &str, now: HostTime) {
        self.report(
            Condition::PlayRejected {
                track,
                reason: reason.to_owned(),
            },
            now,
        );
        if self.state == SyncState::Playing {
            self.session.pending_resume = false;
            self.pause_both();
            self.set_state(SyncState::Paused, now);
        }
    }

    // -----------------------------------------------------------------------
    // Element events
    // -----------------------------------------------------------------------

    /// Handles an event raised by one of the elements.
    pub fn handle_media_event(&mut self, track: Track, event: MediaEvent, now: HostTime) {
        if track == Track::Audio && self.session.active_audio.is_none() {
            return;
        }
        match event {
            MediaEvent::CanPlay => self.lock_cycle(track),
            MediaEvent::Playing => {
                self.lock_cycle(track);
                if let Some(Pending::StallRecovery {
                    stalled, recovered, ..
                }) = self.pending.as_mut().map(Await::condition_mut)
                    && *stalled == track
                {
                    *recovered = true;
                }
            }
            MediaEvent::Waiting => self.on_waiting(track, now),
            MediaEvent::Error(kind) => self.on_load_error(track, kind, now),
            MediaEvent::Play if track == Track::Video => self.on_native_play(now),
            MediaEvent::Pause if track == Track::Video => self.on_native_pause(now),
            MediaEvent::Seeked if track == Track::Video => self.on_native_seeked(now),
            MediaEvent::RateChange if track == Track::Video => {
                let rate = self.video.playback_rate();
                if self.audio_live() && self.audio.playback_rate() != rate {
                    self.audio.set_playback_rate(rate);
                }
            }
            MediaEvent::Ended if track == Track::Video => {
                self.session.pending_resume = false;
                if self.audio_live() {
                    self.audio.pause();
                }
                if self.state == SyncState::Playing {
                    self.set_state(SyncState::Paused, now);
                }
            }
            MediaEvent::LoadedMetadata
            | MediaEvent::Play
            | MediaEvent::Pause
            | MediaEvent::Seeked
            | MediaEvent::RateChange
            | MediaEvent::Ended => {}
        }
    }

    fn on_native_play(&mut self, now: HostTime) {
        if self.video.is_paused() {
            return;
        }
        match self.state {
            SyncState::Playing => {}
            SyncState::Paused => {
                // Native controls count as a gesture.
                self.session.user_has_interacted = true;
                self.play(now);
            }
            SyncState::Idle
            | SyncState::Loading
            | SyncState::Seeking
            | SyncState::QualitySwitching
            | SyncState::BufferStalled => {
                self.video.pause();
                self.session.pending_resume = true;
            }
        }
    }

    fn on_native_pause(&mut self, now: HostTime) {
        if self.state == SyncState::Playing && self.video.is_paused() && !self.video.is_ended() {
            self.pause(now);
        }
    }

    fn on_native_seeked(&mut self, now: HostTime) {
        if !matches!(self.state, SyncState::Playing | SyncState::Paused) || !self.audio_live() {
            return;
        }
        let position = self.video.current_time();
        if (position - self.audio.current_time()).abs() > self.config.drift_threshold_s {
            self.seek(position, now);
        }
    }

    fn on_waiting(&mut self, track: Track, now: HostTime) {
        if self.state != SyncState::Playing {
            return;
        }
        if track == Track::Audio && !self.audio_live() {
            return;
        }
        let mut muted_audio = false;
        match track {
            Track::Video => {
                if self.audio_live() && !self.audio.is_muted() {
                    self.audio.set_muted(true);
                    muted_audio = true;
                }
            }
            Track::Audio => self.video.pause(),
        }
        self.generation = self.generation.next();
        self.session.pending_resume = true;
        self.set_state(SyncState::BufferStalled, now);
        self.pending = Some(
            Await::new(
                Pending::StallRecovery {
                    stalled: track,
                    muted_audio,
                    recovered: false,
                },
                self.generation,
                now,
            )
            .with_timeout(self.config.stall_watchdog()),
        );
    }

    fn on_load_error(&mut self, track: Track, kind: MediaErrorKind, now: HostTime) {
        let cycle = match track {
            Track::Video => self.video_load.as_mut(),
            Track::Audio => self.audio_load.as_mut(),
        };
        let Some(cycle) = cycle else {
            return;
        };
        let key = cycle.key().clone();
        match cycle.on_error(kind, now, &self.policy, &mut self.proxies, &self.rule) {
            ErrorOutcome::Ignored => {}
            ErrorOutcome::ProxyRetry { original, attempt } => {
                self.catalog.rewrite_url(&key, attempt.url.clone());
                self.sink.on_proxy_fallback(&ProxyFallbackEvent {
                    track,
                    format: key.id.clone(),
                    original,
                    proxied: attempt.url.clone(),
                });
                self.perform(&key, &attempt, now);
            }
            ErrorOutcome::RetryScheduled { next, delay, .. } => {
                self.sink.on_retry_scheduled(&RetryScheduledEvent {
                    track,
                    format: key.id,
                    error: kind,
                    next_attempt: next,
                    delay,
                });
            }
            ErrorOutcome::Exhausted { attempts } => {
                self.sink.on_media_unavailable(&MediaUnavailableEvent {
                    track,
                    format: key.id,
                    attempts,
                });
                if track == Track::Audio {
                    self.audio_exhausted = true;
                    self.report(Condition::AudioDegraded, now);
                }
            }
        }
    }

    fn lock_cycle(&mut self, track: Track) {
        let cycle = match track {
            Track::Video => self.video_load.as_mut(),
            Track::Audio => self.audio_load.as_mut(),
        };
        if let Some(cycle) = cycle {
            cycle.on_ready();
        }
    }

    // -----------------------------------------------------------------------
    // Tick
    // -----------------------------------------------------------------------

    /// Advances deadlines: due retries, the pending wait, and drift checks.
    pub fn tick(&mut self, now: HostTime) {
        self.last_tick = now;
        self.poll_retries(now);
        self.poll_pending(now);
        self.check_drift(now);
    }

    fn poll_retries(&mut self, now: HostTime) {
        let ready = self.config.ready_state;
        if self.video.ready_state() >= ready {
            self.lock_cycle(Track::Video);
        }
        if self.audio.ready_state() >= ready {
            self.lock_cycle(Track::Audio);
        }

        if let Some(attempt) = self.video_load.as_mut().and_then(|c| c.poll(now)) {
            let key = self.video_key();
            self.perform(&key, &attempt, now);
        }
        if let Some(attempt) = self.audio_load.as_mut().and_then(|c| c.poll(now))
            && let Some(key) = self.audio_key()
        {
            self.perform(&key, &attempt, now);
        }
    }

    fn poll_pending(&mut self, now: HostTime) {
        let Some(wait) = self.pending.take() else {
            return;
        };
        let poll = wait.poll(self.generation, now, |c| self.condition_holds(c));
        match poll {
            Poll::Pending => self.pending = Some(wait),
            Poll::Stale => {}
            Poll::Ready | Poll::TimedOut => {
                if poll == Poll::TimedOut {
                    self.report(Condition::WatchdogFired(self.state), now);
                }
                self.complete(*wait.condition(), now);
            }
        }
    }

    fn condition_holds(&self, pending: &Pending) -> bool {
        let ready = self.config.ready_state;
        match *pending {
            Pending::JoinBarrier { .. } => {
                self.video.ready_state() >= ready
                    && (!self.audio_live() || self.audio.ready_state() >= ready)
            }
            Pending::Lookahead { target } => {
                self.has_lookahead(&self.video, target)
                    && (!self.audio_live() || self.has_lookahead(&self.audio, target))
            }
            Pending::StallRecovery {
                stalled, recovered, ..
            } => {
                recovered
                    || match stalled {
                        Track::Video => self.video.ready_state() >= ready,
                        Track::Audio => self.audio.ready_state() >= ready,
                    }
            }
        }
    }

    fn complete(&mut self, pending: Pending, now: HostTime) {
        match pending {
            Pending::JoinBarrier { restore } => {
                if let Some(position) = restore {
                    self.video.set_current_time(position);
                    if self.audio_live() {
                        self.audio.set_current_time(position);
                    }
                } else {
                    self.align_audio();
                }
                self.session.quality_switch_in_progress = false;
                self.settle(now);
            }
            Pending::Lookahead { .. } => {
                self.align_audio();
                self.settle(now);
            }
            Pending::StallRecovery { muted_audio, .. } => {
                if muted_audio {
                    self.audio.set_muted(false);
                }
                if self.audio_live() {
                    self.audio.set_current_time(self.video.current_time());
                }
                self.settle(now);
            }
        }
    }

    /// Lifts the freeze and either resumes or rests in `Paused`.
    fn settle(&mut self, now: HostTime) {
        if self.session.pending_resume && self.session.user_has_interacted {
            self.start_both(now);
        } else {
            self.session.pending_resume = false;
            self.pause_both();
            self.set_state(SyncState::Paused, now);
        }
    }

    fn check_drift(&mut self, now: HostTime) {
        if self.state != SyncState::Playing
            || self.session.frozen_for_buffering
            || !self.audio_live()
            || !self.page_visible
            || now < self.next_drift_check
        {
            return;
        }
        self.next_drift_check = now.saturating_add(self.config.drift_check_interval());

        let video_time = self.video.current_time();
        let audio_time = self.audio.current_time();
        self.sink.on_drift_sample(&DriftSampleEvent {
            video_time,
            audio_time,
            at: now,
        });

        if self
            .video
            .duration()
            .is_some_and(|d| d - video_time < self.config.end_tolerance_s)
        {
            return;
        }
        if (video_time - audio_time).abs() <= self.config.drift_threshold_s {
            return;
        }
        if self.audio.buffered_ahead(video_time) < self.config.min_lookahead_s {
            return;
        }
        let throttled = self.last_correction.is_some_and(|t| {
            now.saturating_duration_since(t) < self.config.min_correction_interval()
        });
        if !throttled {
            self.correct_drift(now);
        }
    }

    fn correct_drift(&mut self, now: HostTime) {
        let video_time = self.video.current_time();
        let audio_time = self.audio.current_time();
        let audio_ahead = self.audio.buffered_ahead(video_time);
        self.audio.set_current_time(video_time);
        self.corrections += 1;
        self.last_correction = Some(now);
        self.sink.on_drift_correction(&DriftCorrectionEvent {
            video_time,
            audio_time,
            audio_ahead,
            at: now,
        });
    }

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    /// Assigns sources for the active pair and arms the join barrier.
    fn load(&mut self, restore: Option<f64>, now: HostTime) {
        self.audio_exhausted = false;
        self.video_load = None;
        self.audio_load = None;

        let video_key = self.video_key();
        if let Some(url) = self.catalog.stream(&video_key).and_then(StreamFormat::url) {
            let (cycle, attempt) = LoadCycle::begin(video_key.clone(), url, &self.proxies, &self.rule);
            self.video_load = Some(cycle);
            self.perform(&video_key, &attempt, now);
        }

        match self.audio_key() {
            Some(audio_key) => {
                if let Some(url) = self.catalog.stream(&audio_key).and_then(StreamFormat::url) {
                    let (cycle, attempt) =
                        LoadCycle::begin(audio_key.clone(), url, &self.proxies, &self.rule);
                    self.audio_load = Some(cycle);
                    self.perform(&audio_key, &attempt, now);
                }
            }
            None => {
                self.audio.pause();
                if self.audio.source().is_some() {
                    self.audio.clear_source();
                }
            }
        }

        let state = if self.session.quality_switch_in_progress {
            SyncState::QualitySwitching
        } else {
            SyncState::Loading
        };
        self.set_state(state, now);
        self.pending = Some(Await::new(
            Pending::JoinBarrier { restore },
            self.generation,
            now,
        ));
    }

    /// Performs one load attempt: warm the origin, then assign the source.
    fn perform(&mut self, key: &StreamKey, attempt: &Attempt, now: HostTime) {
        if let Some(origin) = self.warmer.warm(&attempt.url) {
            self.sink.on_origin_warmed(&origin);
        }
        let element = match key.track {
            Track::Video => &mut self.video,
            Track::Audio => &mut self.audio,
        };
        let already_assigned = attempt.number == 1
            && self.state == SyncState::Idle
            && element.source().as_deref() == Some(attempt.url.as_str());
        if !already_assigned {
            element.set_source(&attempt.url);
        }
        self.sink.on_load_attempt(&LoadAttemptEvent {
            track: key.track,
            format: key.id.clone(),
            url: attempt.url.clone(),
            attempt: attempt.number,
            at: now,
        });
    }

    /// Picks the audio track the video format `id` needs.
    fn audio_for(&mut self, id: &FormatId, now: HostTime) -> Option<FormatId> {
        let video = self.catalog.video(id)?;
        if video.is_self_contained() {
            return None;
        }
        let Some(audio) = select_best_audio(self.catalog.audio_pool()) else {
            self.report(Condition::NoAudioTrack(id.clone()), now);
            return None;
        };
        if audio.url().is_some() && audio.url() == video.url() {
            let audio_id = audio.id().clone();
            self.report(Condition::SameUrlAudio(audio_id), now);
            return None;
        }
        Some(audio.id().clone())
    }

    fn video_key(&self) -> StreamKey {
        StreamKey {
            track: Track::Video,
            id: self.session.active_video.clone(),
        }
    }

    fn audio_key(&self) -> Option<StreamKey> {
        self.session.active_audio.clone().map(|id| StreamKey {
            track: Track::Audio,
            id,
        })
    }

    fn start_both(&mut self, now: HostTime) {
        self.set_state(SyncState::Playing, now);
        self.next_drift_check = now.saturating_add(self.config.drift_check_interval());
        self.video.play();
        if self.audio_live() {
            self.audio.play();
        }
    }

    fn pause_both(&mut self) {
        if !self.video.is_paused() {
            self.video.pause();
        }
        if self.session.active_audio.is_some() && !self.audio.is_paused() {
            self.audio.pause();
        }
    }

    /// Moves audio onto video when they differ by more than the threshold.
    fn align_audio(&mut self) {
        if !self.audio_live() {
            return;
        }
        let video_time = self.video.current_time();
        if (video_time - self.audio.current_time()).abs() > self.config.drift_threshold_s {
            self.audio.set_current_time(video_time);
        }
    }

    /// Undoes the stall-time mute, if one is in effect.
    fn release_stall(&mut self) {
        if let Some(wait) = &self.pending
            && let Pending::StallRecovery {
                muted_audio: true, ..
            } = wait.condition()
        {
            self.audio.set_muted(false);
        }
    }

    fn has_lookahead(&self, element: &E, position: f64) -> bool {
        let needed = match element.duration() {
            Some(d) => self.config.min_lookahead_s.min((d - position - END_SLACK_S).max(0.0)),
            None => self.config.min_lookahead_s,
        };
        element.buffered_ahead(position) >= needed
    }

    fn clamp_position(&self, seconds: f64) -> f64 {
        let upper = self.video.duration().unwrap_or(f64::INFINITY);
        seconds.clamp(0.0, upper.max(0.0))
    }

    /// The position the user perceives: a pending seek target if one exists.
    fn logical_position(&self) -> f64 {
        match self.pending.as_ref().map(Await::condition) {
            Some(Pending::Lookahead { target }) => *target,
            Some(Pending::JoinBarrier {
                restore: Some(position),
            }) => *position,
            _ => self.video.current_time(),
        }
    }

    fn set_state(&mut self, to: SyncState, now: HostTime) {
        self.session.frozen_for_buffering = to.is_frozen();
        if to == self.state {
            return;
        }
        let from = core::mem::replace(&mut self.state, to);
        self.sink.on_state_change(&StateChangeEvent { from, to, at: now });
    }

    fn report(&mut self, condition: Condition, now: HostTime) {
        self.sink.on_condition(&condition, now);
    }
}
