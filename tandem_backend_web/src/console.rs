// Copyright 2026 the Tandem Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use web_sys::console;

use tandem_core::time::HostTime;
use tandem_core::trace::{
    Condition, DriftCorrectionEvent, LoadAttemptEvent, MediaUnavailableEvent, ProxyFallbackEvent,
    RetryScheduledEvent, Severity, StateChangeEvent, TraceSink,
};

/// A [`TraceSink`] that writes to the browser console.
///
/// Conditions go to the console method matching their severity; conditions
/// below `min_severity` are dropped. Drift samples are never logged.
#[derive(Clone, Copy, Debug)]
pub struct ConsoleSink {
    min_severity: Severity,
}

impl ConsoleSink {
    /// Logs conditions at or above `min_severity`.
    #[must_use]
    pub const fn new(min_severity: Severity) -> Self {
        Self { min_severity }
    }
}

impl Default for ConsoleSink {
    fn default() -> Self {
        Self::new(Severity::Info)
    }
}

fn log(severity: Severity, message: &str) {
    let message = format!("[tandem] {message}");
    match severity {
        Severity::Debug => console::debug_1(&message.into()),
        Severity::Info => console::info_1(&message.into()),
        Severity::Warn => console::warn_1(&message.into()),
        Severity::Error => console::error_1(&message.into()),
    }
}

impl TraceSink for ConsoleSink {
    fn on_state_change(&mut self, e: &StateChangeEvent) {
        if self.min_severity <= Severity::Debug {
            log(Severity::Debug, &format!("state {} -> {}", e.from, e.to));
        }
    }

    fn on_load_attempt(&mut self, e: &LoadAttemptEvent) {
        if self.min_severity <= Severity::Debug {
            log(
                Severity::Debug,
                &format!(
                    "{} `{}` attempt {}: {}",
                    e.track.as_str(),
                    e.format,
                    e.attempt,
                    e.url
                ),
            );
        }
    }

    fn on_retry_scheduled(&mut self, e: &RetryScheduledEvent) {
        if self.min_severity <= Severity::Info {
            log(
                Severity::Info,
                &format!(
                    "{} `{}` failed ({}); attempt {} in {} ms",
                    e.track.as_str(),
                    e.format,
                    e.error.as_str(),
                    e.next_attempt,
                    e.delay.as_millis()
                ),
            );
        }
    }

    fn on_proxy_fallback(&mut self, e: &ProxyFallbackEvent) {
        if self.min_severity <= Severity::Info {
            log(
                Severity::Info,
                &format!("{} `{}` moved to proxy", e.track.as_str(), e.format),
            );
        }
    }

    fn on_media_unavailable(&mut self, e: &MediaUnavailableEvent) {
        log(
            Severity::Error,
            &format!(
                "{} `{}` unavailable after {} attempts",
                e.track.as_str(),
                e.format,
                e.attempts
            ),
        );
    }

    fn on_drift_correction(&mut self, e: &DriftCorrectionEvent) {
        if self.min_severity <= Severity::Debug {
            log(
                Severity::Debug,
                &format!(
                    "realigned audio {:.3} -> {:.3}",
                    e.audio_time, e.video_time
                ),
            );
        }
    }

    fn on_condition(&mut self, condition: &Condition, _at: HostTime) {
        let severity = condition.severity();
        if severity >= self.min_severity {
            log(severity, &condition.to_string());
        }
    }
}
