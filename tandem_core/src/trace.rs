// Copyright 2026 the Tandem Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Diagnostics for the playback controller.
//!
//! The [`Synchronizer`](crate::sync::Synchronizer) reports everything it
//! does, and every runtime failure it absorbs, to a [`TraceSink`]. All sink
//! methods default to no-ops, so a sink implements only the events it cares
//! about. [`NoopSink`] discards everything.
//!
//! Runtime failures are never returned to the caller. They arrive here as
//! [`Condition`]s carrying a [`Severity`].

use core::fmt;

use crate::format::{FormatId, Track};
use crate::media::MediaErrorKind;
use crate::session::SyncState;
use crate::time::{Duration, HostTime};

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

/// The synchronizer moved between states.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StateChangeEvent {
    /// State before the transition.
    pub from: SyncState,
    /// State after the transition.
    pub to: SyncState,
    /// When it happened.
    pub at: HostTime,
}

/// A source was assigned to an element.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LoadAttemptEvent {
    /// Element receiving the source.
    pub track: Track,
    /// Format being loaded.
    pub format: FormatId,
    /// URL assigned.
    pub url: String,
    /// 1-based attempt number.
    pub attempt: u32,
    /// When it happened.
    pub at: HostTime,
}

/// A failed attempt will be retried after a backoff.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RetryScheduledEvent {
    /// Affected element.
    pub track: Track,
    /// Format being loaded.
    pub format: FormatId,
    /// Error that caused the retry.
    pub error: MediaErrorKind,
    /// Number the next attempt will carry.
    pub next_attempt: u32,
    /// Backoff before the next attempt.
    pub delay: Duration,
}

/// A stream moved onto the proxy origin.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProxyFallbackEvent {
    /// Affected element.
    pub track: Track,
    /// Format being loaded.
    pub format: FormatId,
    /// URL before the rewrite.
    pub original: String,
    /// URL after the rewrite.
    pub proxied: String,
}

/// A stream exhausted its attempts.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MediaUnavailableEvent {
    /// Affected element.
    pub track: Track,
    /// Format that could not be loaded.
    pub format: FormatId,
    /// Attempts made.
    pub attempts: u32,
}

/// A periodic drift measurement.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DriftSampleEvent {
    /// Video position in seconds.
    pub video_time: f64,
    /// Audio position in seconds.
    pub audio_time: f64,
    /// When it was taken.
    pub at: HostTime,
}

impl DriftSampleEvent {
    /// `video_time − audio_time`.
    #[must_use]
    pub fn drift(&self) -> f64 {
        self.video_time - self.audio_time
    }
}

/// Audio was repositioned onto video.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DriftCorrectionEvent {
    /// Video position in seconds (the new audio position).
    pub video_time: f64,
    /// Audio position before the correction.
    pub audio_time: f64,
    /// Audio lookahead at the time of correction, in seconds.
    pub audio_ahead: f64,
    /// When it happened.
    pub at: HostTime,
}

/// How serious a [`Condition`] is.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    /// Expected, only interesting while debugging.
    Debug,
    /// Worth noting.
    Info,
    /// Degraded but recoverable.
    Warn,
    /// A track will not play.
    Error,
}

impl Severity {
    /// Lowercase name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

/// A runtime failure or notable decision the controller absorbed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Condition {
    /// A playback command arrived before any user gesture.
    GestureRequired,
    /// A quality selection named no known video format.
    UnknownFormat(FormatId),
    /// A quality selection named a video format with no URL.
    MissingUrl(FormatId),
    /// The platform refused a `play()` request.
    PlayRejected {
        /// Element that refused.
        track: Track,
        /// Platform-provided reason.
        reason: String,
    },
    /// The selected audio track is the video stream itself.
    SameUrlAudio(FormatId),
    /// The video needs separate audio but no audio track is usable.
    NoAudioTrack(FormatId),
    /// A watchdog lifted a freeze before the tracks were ready.
    WatchdogFired(SyncState),
    /// Audio is unavailable; video continues alone.
    AudioDegraded,
}

impl Condition {
    /// Severity of the condition.
    #[must_use]
    pub const fn severity(&self) -> Severity {
        match self {
            Self::GestureRequired | Self::SameUrlAudio(_) => Severity::Debug,
            Self::WatchdogFired(_) => Severity::Info,
            Self::UnknownFormat(_)
            | Self::MissingUrl(_)
            | Self::PlayRejected { .. }
            | Self::NoAudioTrack(_)
            | Self::AudioDegraded => Severity::Warn,
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::GestureRequired => f.write_str("playback requires a user gesture"),
            Self::UnknownFormat(id) => write!(f, "unknown quality `{id}`"),
            Self::MissingUrl(id) => write!(f, "quality `{id}` has no url"),
            Self::PlayRejected { track, reason } => {
                write!(f, "{} play() rejected: {reason}", track.as_str())
            }
            Self::SameUrlAudio(id) => write!(f, "audio `{id}` shares the video url; ignored"),
            Self::NoAudioTrack(id) => write!(f, "video `{id}` has no usable audio track"),
            Self::WatchdogFired(state) => write!(f, "watchdog released {state}"),
            Self::AudioDegraded => f.write_str("audio unavailable; continuing video-only"),
        }
    }
}

// ---------------------------------------------------------------------------
// TraceSink trait
// ---------------------------------------------------------------------------

/// Receives controller events.
///
/// All methods have default no-op implementations.
pub trait TraceSink {
    /// Called on every state transition.
    fn on_state_change(&mut self, e: &StateChangeEvent) {
        _ = e;
    }

    /// Called before each source assignment.
    fn on_load_attempt(&mut self, e: &LoadAttemptEvent) {
        _ = e;
    }

    /// Called when a failed attempt is scheduled for retry.
    fn on_retry_scheduled(&mut self, e: &RetryScheduledEvent) {
        _ = e;
    }

    /// Called when a stream moves onto the proxy.
    fn on_proxy_fallback(&mut self, e: &ProxyFallbackEvent) {
        _ = e;
    }

    /// Called when a stream exhausts its attempts.
    fn on_media_unavailable(&mut self, e: &MediaUnavailableEvent) {
        _ = e;
    }

    /// Called on each periodic drift check.
    fn on_drift_sample(&mut self, e: &DriftSampleEvent) {
        _ = e;
    }

    /// Called when audio is repositioned onto video.
    fn on_drift_correction(&mut self, e: &DriftCorrectionEvent) {
        _ = e;
    }

    /// Called when connection hints are emitted for a new origin.
    fn on_origin_warmed(&mut self, origin: &str) {
        _ = origin;
    }

    /// Called for every absorbed failure or notable decision.
    fn on_condition(&mut self, condition: &Condition, at: HostTime) {
        _ = (condition, at);
    }
}

/// A [`TraceSink`] that discards all events.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopSink;

impl TraceSink for NoopSink {}

impl<T: TraceSink + ?Sized> TraceSink for Box<T> {
    fn on_state_change(&mut self, e: &StateChangeEvent) {
        (**self).on_state_change(e);
    }

    fn on_load_attempt(&mut self, e: &LoadAttemptEvent) {
        (**self).on_load_attempt(e);
    }

    fn on_retry_scheduled(&mut self, e: &RetryScheduledEvent) {
        (**self).on_retry_scheduled(e);
    }

    fn on_proxy_fallback(&mut self, e: &ProxyFallbackEvent) {
        (**self).on_proxy_fallback(e);
    }

    fn on_media_unavailable(&mut self, e: &MediaUnavailableEvent) {
        (**self).on_media_unavailable(e);
    }

    fn on_drift_sample(&mut self, e: &DriftSampleEvent) {
        (**self).on_drift_sample(e);
    }

    fn on_drift_correction(&mut self, e: &DriftCorrectionEvent) {
        (**self).on_drift_correction(e);
    }

    fn on_origin_warmed(&mut self, origin: &str) {
        (**self).on_origin_warmed(origin);
    }

    fn on_condition(&mut self, condition: &Condition, at: HostTime) {
        (**self).on_condition(condition, at);
    }
}

/// Forwards every event to two sinks.
#[derive(Debug, Default)]
pub struct Tee<A, B>(pub A, pub B);

impl<A: TraceSink, B: TraceSink> TraceSink for Tee<A, B> {
    fn on_state_change(&mut self, e: &StateChangeEvent) {
        self.0.on_state_change(e);
        self.1.on_state_change(e);
    }

    fn on_load_attempt(&mut self, e: &LoadAttemptEvent) {
        self.0.on_load_attempt(e);
        self.1.on_load_attempt(e);
    }

    fn on_retry_scheduled(&mut self, e: &RetryScheduledEvent) {
        self.0.on_retry_scheduled(e);
        self.1.on_retry_scheduled(e);
    }

    fn on_proxy_fallback(&mut self, e: &ProxyFallbackEvent) {
        self.0.on_proxy_fallback(e);
        self.1.on_proxy_fallback(e);
    }

    fn on_media_unavailable(&mut self, e: &MediaUnavailableEvent) {
        self.0.on_media_unavailable(e);
        self.1.on_media_unavailable(e);
    }

    fn on_drift_sample(&mut self, e: &DriftSampleEvent) {
        self.0.on_drift_sample(e);
        self.1.on_drift_sample(e);
    }

    fn on_drift_correction(&mut self, e: &DriftCorrectionEvent) {
        self.0.on_drift_correction(e);
        self.1.on_drift_correction(e);
    }

    fn on_origin_warmed(&mut self, origin: &str) {
        self.0.on_origin_warmed(origin);
        self.1.on_origin_warmed(origin);
    }

    fn on_condition(&mut self, condition: &Condition, at: HostTime) {
        self.0.on_condition(condition, at);
        self.1.on_condition(condition, at);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Count(u32);

    impl TraceSink for Count {
        fn on_condition(&mut self, _: &Condition, _: HostTime) {
            self.0 += 1;
        }
    }

    #[test]
    fn tee_reaches_both_sinks() {
        let mut tee = Tee(Count::default(), Box::new(Count::default()));
        tee.on_condition(&Condition::GestureRequired, HostTime(0));
        tee.on_origin_warmed("https://a.example");
        assert_eq!((tee.0).0, 1);
        assert_eq!((tee.1).0, 1);
    }

    #[test]
    fn severities() {
        assert_eq!(Condition::AudioDegraded.severity(), Severity::Warn);
        assert_eq!(Condition::GestureRequired.severity(), Severity::Debug);
        assert!(Severity::Error > Severity::Warn);
        assert_eq!(
            Condition::UnknownFormat(FormatId::new("999")).to_string(),
            "unknown quality `999`"
        );
    }
}
