// Copyright 2026 the Tandem Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Human-readable trace output.
//!
//! [`PrettyPrintSink`] implements [`TraceSink`] and writes one line per event
//! to a [`Write`](std::io::Write) destination (default: stderr). Timestamps
//! are printed in milliseconds.

use std::io::Write;

use tandem_core::time::HostTime;
use tandem_core::trace::{
    Condition, DriftCorrectionEvent, DriftSampleEvent, LoadAttemptEvent, MediaUnavailableEvent,
    ProxyFallbackEvent, RetryScheduledEvent, StateChangeEvent, TraceSink,
};

/// Writes human-readable trace lines to a [`Write`](std::io::Write) destination.
pub struct PrettyPrintSink<W: Write = Box<dyn Write>> {
    writer: W,
    drift_samples: bool,
}

impl<W: Write> std::fmt::Debug for PrettyPrintSink<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrettyPrintSink")
            .field("drift_samples", &self.drift_samples)
            .finish_non_exhaustive()
    }
}

impl PrettyPrintSink {
    /// Creates a sink that writes to stderr.
    #[must_use]
    pub fn stderr() -> Self {
        Self::new(Box::new(std::io::stderr()))
    }

    /// Creates a sink that writes to a boxed writer.
    #[must_use]
    pub fn new(writer: Box<dyn Write>) -> Self {
        Self {
            writer,
            drift_samples: false,
        }
    }
}

impl<W: Write> PrettyPrintSink<W> {
    /// Creates a sink that writes to the given destination.
    #[must_use]
    pub fn with_writer(writer: W) -> Self {
        Self {
            writer,
            drift_samples: false,
        }
    }

    /// Also prints every periodic drift sample. Off by default; samples
    /// arrive several times a second.
    #[must_use]
    pub fn with_drift_samples(mut self, enabled: bool) -> Self {
        self.drift_samples = enabled;
        self
    }

    /// Consumes the sink and returns the writer.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

fn ms(t: HostTime) -> f64 {
    t.micros() as f64 / 1000.0
}

impl<W: Write> TraceSink for PrettyPrintSink<W> {
    fn on_state_change(&mut self, e: &StateChangeEvent) {
        let _ = writeln!(
            self.writer,
            "[state] {} -> {} at {:.1}ms",
            e.from,
            e.to,
            ms(e.at),
        );
    }

    fn on_load_attempt(&mut self, e: &LoadAttemptEvent) {
        let _ = writeln!(
            self.writer,
            "[load] {} format={} attempt={} at {:.1}ms url={}",
            e.track.as_str(),
            e.format,
            e.attempt,
            ms(e.at),
            e.url,
        );
    }

    fn on_retry_scheduled(&mut self, e: &RetryScheduledEvent) {
        let _ = writeln!(
            self.writer,
            "[retry] {} format={} error={} next={} in {}ms",
            e.track.as_str(),
            e.format,
            e.error.as_str(),
            e.next_attempt,
            e.delay.as_millis(),
        );
    }

    fn on_proxy_fallback(&mut self, e: &ProxyFallbackEvent) {
        let _ = writeln!(
            self.writer,
            "[proxy] {} format={} {} -> {}",
            e.track.as_str(),
            e.format,
            e.original,
            e.proxied,
        );
    }

    fn on_media_unavailable(&mut self, e: &MediaUnavailableEvent) {
        let _ = writeln!(
            self.writer,
            "[unavailable] {} format={} attempts={}",
            e.track.as_str(),
            e.format,
            e.attempts,
        );
    }

    fn on_drift_sample(&mut self, e: &DriftSampleEvent) {
        if !self.drift_samples {
            return;
        }
        let _ = writeln!(
            self.writer,
            "[drift] video={:.3}s audio={:.3}s drift={:+.3}s",
            e.video_time,
            e.audio_time,
            e.drift(),
        );
    }

    fn on_drift_correction(&mut self, e: &DriftCorrectionEvent) {
        let _ = writeln!(
            self.writer,
            "[realign] audio {:.3}s -> {:.3}s ahead={:.2}s at {:.1}ms",
            e.audio_time,
            e.video_time,
            e.audio_ahead,
            ms(e.at),
        );
    }

    fn on_origin_warmed(&mut self, origin: &str) {
        let _ = writeln!(self.writer, "[warm] {origin}");
    }

    fn on_condition(&mut self, condition: &Condition, at: HostTime) {
        let _ = writeln!(
            self.writer,
            "[{}] {condition} at {:.1}ms",
            condition.severity().as_str(),
            ms(at),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tandem_core::format::{FormatId, Track};
    use tandem_core::session::SyncState;

    #[test]
    fn pretty_print_state_change() {
        let mut sink = PrettyPrintSink::with_writer(Vec::<u8>::new());
        sink.on_state_change(&StateChangeEvent {
            from: SyncState::Loading,
            to: SyncState::Playing,
            at: HostTime::from_millis(1500),
        });
        let output = String::from_utf8(sink.into_inner()).unwrap();
        assert!(output.contains("[state]"), "got: {output}");
        assert!(output.contains("1500.0ms"), "got: {output}");
    }

    #[test]
    fn drift_samples_are_opt_in() {
        let sample = DriftSampleEvent {
            video_time: 10.0,
            audio_time: 9.75,
            at: HostTime(0),
        };
        let mut quiet = PrettyPrintSink::with_writer(Vec::<u8>::new());
        quiet.on_drift_sample(&sample);
        assert!(quiet.into_inner().is_empty(), "samples printed by default");

        let mut loud = PrettyPrintSink::with_writer(Vec::<u8>::new()).with_drift_samples(true);
        loud.on_drift_sample(&sample);
        let output = String::from_utf8(loud.into_inner()).unwrap();
        assert!(output.contains("drift=+0.250s"), "got: {output}");
    }

    #[test]
    fn conditions_carry_severity() {
        let mut sink = PrettyPrintSink::with_writer(Vec::<u8>::new());
        sink.on_condition(
            &Condition::PlayRejected {
                track: Track::Audio,
                reason: "NotAllowedError".into(),
            },
            HostTime(0),
        );
        sink.on_condition(&Condition::UnknownFormat(FormatId::new("999")), HostTime(0));
        let output = String::from_utf8(sink.into_inner()).unwrap();
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines.len(), 2, "got: {output}");
        assert!(lines[0].starts_with("[warn] audio play() rejected"), "got: {output}");
        assert!(lines[1].contains("`999`"), "got: {output}");
    }
}
