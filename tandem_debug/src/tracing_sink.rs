// Copyright 2026 the Tandem Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Bridge into the `tracing` ecosystem.
//!
//! [`TracingSink`] emits each controller event as a `tracing` event under
//! the `tandem` target, with the event's fields as structured fields.
//! Conditions map their [`Severity`] onto `tracing` levels. Drift samples are
//! emitted at `TRACE`.

use tandem_core::time::HostTime;
use tandem_core::trace::{
    Condition, DriftCorrectionEvent, DriftSampleEvent, LoadAttemptEvent, MediaUnavailableEvent,
    ProxyFallbackEvent, RetryScheduledEvent, Severity, StateChangeEvent, TraceSink,
};

/// Forwards controller events to the current `tracing` subscriber.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingSink;

impl TracingSink {
    /// Creates the sink.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl TraceSink for TracingSink {
    fn on_state_change(&mut self, e: &StateChangeEvent) {
        tracing::debug!(
            target: "tandem",
            from = e.from.as_str(),
            to = e.to.as_str(),
            at_us = e.at.micros(),
            "state change"
        );
    }

    fn on_load_attempt(&mut self, e: &LoadAttemptEvent) {
        tracing::debug!(
            target: "tandem",
            track = e.track.as_str(),
            format = e.format.as_str(),
            attempt = e.attempt,
            url = %e.url,
            "load attempt"
        );
    }

    fn on_retry_scheduled(&mut self, e: &RetryScheduledEvent) {
        tracing::info!(
            target: "tandem",
            track = e.track.as_str(),
            format = e.format.as_str(),
            error = e.error.as_str(),
            next_attempt = e.next_attempt,
            delay_ms = e.delay.as_millis(),
            "retry scheduled"
        );
    }

    fn on_proxy_fallback(&mut self, e: &ProxyFallbackEvent) {
        tracing::info!(
            target: "tandem",
            track = e.track.as_str(),
            format = e.format.as_str(),
            original = %e.original,
            proxied = %e.proxied,
            "proxy fallback"
        );
    }

    fn on_media_unavailable(&mut self, e: &MediaUnavailableEvent) {
        tracing::error!(
            target: "tandem",
            track = e.track.as_str(),
            format = e.format.as_str(),
            attempts = e.attempts,
            "media unavailable"
        );
    }

    fn on_drift_sample(&mut self, e: &DriftSampleEvent) {
        tracing::trace!(
            target: "tandem",
            video_time = e.video_time,
            audio_time = e.audio_time,
            drift = e.drift(),
            "drift sample"
        );
    }

    fn on_drift_correction(&mut self, e: &DriftCorrectionEvent) {
        tracing::debug!(
            target: "tandem",
            video_time = e.video_time,
            audio_time = e.audio_time,
            audio_ahead = e.audio_ahead,
            "drift correction"
        );
    }

    fn on_origin_warmed(&mut self, origin: &str) {
        tracing::debug!(target: "tandem", origin, "origin warmed");
    }

    fn on_condition(&mut self, condition: &Condition, at: HostTime) {
        let at_us = at.micros();
        match condition.severity() {
            Severity::Debug => tracing::debug!(target: "tandem", at_us, "{condition}"),
            Severity::Info => tracing::info!(target: "tandem", at_us, "{condition}"),
            Severity::Warn => tracing::warn!(target: "tandem", at_us, "{condition}"),
            Severity::Error => tracing::error!(target: "tandem", at_us, "{condition}"),
        }
    }
}
