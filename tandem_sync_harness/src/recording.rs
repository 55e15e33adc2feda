// Copyright 2026 the Tandem Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Recording doubles.
//!
//! Both types are cheap clones over shared storage: box one clone into the
//! controller and keep another to inspect.

use std::cell::RefCell;
use std::rc::Rc;

use tandem_core::session::SyncState;
use tandem_core::time::HostTime;
use tandem_core::trace::{
    Condition, DriftCorrectionEvent, DriftSampleEvent, LoadAttemptEvent, MediaUnavailableEvent,
    ProxyFallbackEvent, RetryScheduledEvent, StateChangeEvent, TraceSink,
};
use tandem_core::warmer::ResourceHints;

/// One event received by a [`RecordingSink`].
#[derive(Clone, Debug, PartialEq)]
pub enum Recorded {
    /// [`TraceSink::on_state_change`].
    StateChange(StateChangeEvent),
    /// [`TraceSink::on_load_attempt`].
    LoadAttempt(LoadAttemptEvent),
    /// [`TraceSink::on_retry_scheduled`].
    RetryScheduled(RetryScheduledEvent),
    /// [`TraceSink::on_proxy_fallback`].
    ProxyFallback(ProxyFallbackEvent),
    /// [`TraceSink::on_media_unavailable`].
    MediaUnavailable(MediaUnavailableEvent),
    /// [`TraceSink::on_drift_sample`].
    DriftSample(DriftSampleEvent),
    /// [`TraceSink::on_drift_correction`].
    DriftCorrection(DriftCorrectionEvent),
    /// [`TraceSink::on_origin_warmed`].
    OriginWarmed(String),
    /// [`TraceSink::on_condition`].
    Condition(Condition, HostTime),
}

/// A [`TraceSink`] that keeps every event.
#[derive(Clone, Debug, Default)]
pub struct RecordingSink {
    events: Rc<RefCell<Vec<Recorded>>>,
}

impl RecordingSink {
    /// Creates an empty recording.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// All events so far.
    #[must_use]
    pub fn events(&self) -> Vec<Recorded> {
        self.events.borrow().clone()
    }

    /// Forgets everything recorded so far.
    pub fn clear(&self) {
        self.events.borrow_mut().clear();
    }

    /// Target states of every transition, in order.
    #[must_use]
    pub fn states(&self) -> Vec<SyncState> {
        self.collect(|e| match e {
            Recorded::StateChange(s) => Some(s.to),
            _ => None,
        })
    }

    /// Every load attempt.
    #[must_use]
    pub fn load_attempts(&self) -> Vec<LoadAttemptEvent> {
        self.collect(|e| match e {
            Recorded::LoadAttempt(a) => Some(a.clone()),
            _ => None,
        })
    }

    /// Every scheduled retry.
    #[must_use]
    pub fn retries(&self) -> Vec<RetryScheduledEvent> {
        self.collect(|e| match e {
            Recorded::RetryScheduled(r) => Some(r.clone()),
            _ => None,
        })
    }

    /// Every proxy fallback.
    #[must_use]
    pub fn proxy_fallbacks(&self) -> Vec<ProxyFallbackEvent> {
        self.collect(|e| match e {
            Recorded::ProxyFallback(p) => Some(p.clone()),
            _ => None,
        })
    }

    /// Every exhausted stream.
    #[must_use]
    pub fn unavailable(&self) -> Vec<MediaUnavailableEvent> {
        self.collect(|e| match e {
            Recorded::MediaUnavailable(u) => Some(u.clone()),
            _ => None,
        })
    }

    /// Every drift sample.
    #[must_use]
    pub fn drift_samples(&self) -> Vec<DriftSampleEvent> {
        self.collect(|e| match e {
            Recorded::DriftSample(s) => Some(*s),
            _ => None,
        })
    }

    /// Every drift correction.
    #[must_use]
    pub fn corrections(&self) -> Vec<DriftCorrectionEvent> {
        self.collect(|e| match e {
            Recorded::DriftCorrection(c) => Some(*c),
            _ => None,
        })
    }

    /// Every reported condition.
    #[must_use]
    pub fn conditions(&self) -> Vec<Condition> {
        self.collect(|e| match e {
            Recorded::Condition(c, _) => Some(c.clone()),
            _ => None,
        })
    }

    fn collect<T>(&self, f: impl FnMut(&Recorded) -> Option<T>) -> Vec<T> {
        self.events.borrow().iter().filter_map(f).collect()
    }

    fn push(&self, event: Recorded) {
        self.events.borrow_mut().push(event);
    }
}

impl TraceSink for RecordingSink {
    fn on_state_change(&mut self, e: &StateChangeEvent) {
        self.push(Recorded::StateChange(*e));
    }

    fn on_load_attempt(&mut self, e: &LoadAttemptEvent) {
        self.push(Recorded::LoadAttempt(e.clone()));
    }

    fn on_retry_scheduled(&mut self, e: &RetryScheduledEvent) {
        self.push(Recorded::RetryScheduled(e.clone()));
    }

    fn on_proxy_fallback(&mut self, e: &ProxyFallbackEvent) {
        self.push(Recorded::ProxyFallback(e.clone()));
    }

    fn on_media_unavailable(&mut self, e: &MediaUnavailableEvent) {
        self.push(Recorded::MediaUnavailable(e.clone()));
    }

    fn on_drift_sample(&mut self, e: &DriftSampleEvent) {
        self.push(Recorded::DriftSample(*e));
    }

    fn on_drift_correction(&mut self, e: &DriftCorrectionEvent) {
        self.push(Recorded::DriftCorrection(*e));
    }

    fn on_origin_warmed(&mut self, origin: &str) {
        self.push(Recorded::OriginWarmed(origin.to_owned()));
    }

    fn on_condition(&mut self, condition: &Condition, at: HostTime) {
        self.push(Recorded::Condition(condition.clone(), at));
    }
}

/// A connection hint.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Hint {
    /// `preconnect` for an origin.
    Preconnect(String),
    /// `dns-prefetch` for an origin.
    DnsPrefetch(String),
}

/// [`ResourceHints`] that records every hint.
#[derive(Clone, Debug, Default)]
pub struct RecordingHints {
    hints: Rc<RefCell<Vec<Hint>>>,
}

impl RecordingHints {
    /// Creates an empty recording.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// All hints so far.
    #[must_use]
    pub fn hints(&self) -> Vec<Hint> {
        self.hints.borrow().clone()
    }

    /// Origins that received a `preconnect`, in order.
    #[must_use]
    pub fn preconnected(&self) -> Vec<String> {
        self.hints
            .borrow()
            .iter()
            .filter_map(|h| match h {
                Hint::Preconnect(o) => Some(o.clone()),
                Hint::DnsPrefetch(_) => None,
            })
            .collect()
    }
}

impl ResourceHints for RecordingHints {
    fn preconnect(&mut self, origin: &str) {
        self.hints.borrow_mut().push(Hint::Preconnect(origin.to_owned()));
    }

    fn dns_prefetch(&mut self, origin: &str) {
        self.hints.borrow_mut().push(Hint::DnsPrefetch(origin.to_owned()));
    }
}
