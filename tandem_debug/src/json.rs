// Copyright 2026 the Tandem Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! JSON-lines trace output.
//!
//! [`JsonLinesSink`] writes one JSON object per event, each on its own line.
//! Every object carries an `"event"` discriminant; timestamps are `"at_us"`
//! in host microseconds.

use std::io::Write;

use serde_json::{Value, json};

use tandem_core::time::HostTime;
use tandem_core::trace::{
    Condition, DriftCorrectionEvent, DriftSampleEvent, LoadAttemptEvent, MediaUnavailableEvent,
    ProxyFallbackEvent, RetryScheduledEvent, StateChangeEvent, TraceSink,
};

/// Writes one JSON object per event to a [`Write`] destination.
pub struct JsonLinesSink<W: Write> {
    writer: W,
    lines: u64,
}

impl<W: Write> std::fmt::Debug for JsonLinesSink<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JsonLinesSink")
            .field("lines", &self.lines)
            .finish_non_exhaustive()
    }
}

impl<W: Write> JsonLinesSink<W> {
    /// Creates a sink that writes to `writer`.
    #[must_use]
    pub fn new(writer: W) -> Self {
        Self { writer, lines: 0 }
    }

    /// Number of lines written.
    #[must_use]
    pub fn lines(&self) -> u64 {
        self.lines
    }

    /// Consumes the sink and returns the writer.
    pub fn into_inner(self) -> W {
        self.writer
    }

    fn emit(&mut self, value: &Value) {
        if serde_json::to_writer(&mut self.writer, value).is_ok()
            && self.writer.write_all(b"\n").is_ok()
        {
            self.lines += 1;
        }
    }
}

impl<W: Write> TraceSink for JsonLinesSink<W> {
    fn on_state_change(&mut self, e: &StateChangeEvent) {
        self.emit(&json!({
            "event": "state_change",
            "from": e.from.as_str(),
            "to": e.to.as_str(),
            "at_us": e.at.micros(),
        }));
    }

    fn on_load_attempt(&mut self, e: &LoadAttemptEvent) {
        self.emit(&json!({
            "event": "load_attempt",
            "track": e.track.as_str(),
            "format": e.format.as_str(),
            "url": e.url,
            "attempt": e.attempt,
            "at_us": e.at.micros(),
        }));
    }

    fn on_retry_scheduled(&mut self, e: &RetryScheduledEvent) {
        self.emit(&json!({
            "event": "retry_scheduled",
            "track": e.track.as_str(),
            "format": e.format.as_str(),
            "error": e.error.as_str(),
            "next_attempt": e.next_attempt,
            "delay_ms": e.delay.as_millis(),
        }));
    }

    fn on_proxy_fallback(&mut self, e: &ProxyFallbackEvent) {
        self.emit(&json!({
            "event": "proxy_fallback",
            "track": e.track.as_str(),
            "format": e.format.as_str(),
            "original": e.original,
            "proxied": e.proxied,
        }));
    }

    fn on_media_unavailable(&mut self, e: &MediaUnavailableEvent) {
        self.emit(&json!({
            "event": "media_unavailable",
            "track": e.track.as_str(),
            "format": e.format.as_str(),
            "attempts": e.attempts,
        }));
    }

    fn on_drift_sample(&mut self, e: &DriftSampleEvent) {
        self.emit(&json!({
            "event": "drift_sample",
            "video_time": e.video_time,
            "audio_time": e.audio_time,
            "drift": e.drift(),
            "at_us": e.at.micros(),
        }));
    }

    fn on_drift_correction(&mut self, e: &DriftCorrectionEvent) {
        self.emit(&json!({
            "event": "drift_correction",
            "video_time": e.video_time,
            "audio_time": e.audio_time,
            "audio_ahead": e.audio_ahead,
            "at_us": e.at.micros(),
        }));
    }

    fn on_origin_warmed(&mut self, origin: &str) {
        self.emit(&json!({
            "event": "origin_warmed",
            "origin": origin,
        }));
    }

    fn on_condition(&mut self, condition: &Condition, at: HostTime) {
        self.emit(&json!({
            "event": "condition",
            "severity": condition.severity().as_str(),
            "message": condition.to_string(),
            "at_us": at.micros(),
        }));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tandem_core::format::{FormatId, Track};
    use tandem_core::media::MediaErrorKind;
    use tandem_core::time::Duration;

    fn parse(bytes: Vec<u8>) -> Vec<Value> {
        String::from_utf8(bytes)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect()
    }

    #[test]
    fn each_event_is_one_line() {
        let mut sink = JsonLinesSink::new(Vec::<u8>::new());
        sink.on_retry_scheduled(&RetryScheduledEvent {
            track: Track::Video,
            format: FormatId::new("137"),
            error: MediaErrorKind::Network,
            next_attempt: 2,
            delay: Duration::from_millis(2000),
        });
        sink.on_origin_warmed("https://r1.example");
        assert_eq!(sink.lines(), 2);

        let values = parse(sink.into_inner());
        assert_eq!(values[0]["event"], "retry_scheduled");
        assert_eq!(values[0]["format"], "137");
        assert_eq!(values[0]["delay_ms"], 2000);
        assert_eq!(values[1]["origin"], "https://r1.example");
    }

    #[test]
    fn drift_sample_includes_signed_drift() {
        let mut sink = JsonLinesSink::new(Vec::<u8>::new());
        sink.on_drift_sample(&DriftSampleEvent {
            video_time: 4.0,
            audio_time: 4.5,
            at: HostTime(250_000),
        });
        let values = parse(sink.into_inner());
        assert_eq!(values[0]["drift"], -0.5);
        assert_eq!(values[0]["at_us"], 250_000);
    }

    #[test]
    fn condition_severity_is_named() {
        let mut sink = JsonLinesSink::new(Vec::<u8>::new());
        sink.on_condition(&Condition::AudioDegraded, HostTime(0));
        let values = parse(sink.into_inner());
        assert_eq!(values[0]["severity"], "warn");
    }
}
