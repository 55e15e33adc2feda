// Copyright 2026 the Tandem Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Resilient source attachment.
//!
//! A [`LoadCycle`] tracks one attempt sequence for one element: the URL in
//! use, how many attempts have been made, whether buffering has been
//! observed, and when the next retry is due. It does not touch elements;
//! the [`Synchronizer`](crate::sync::Synchronizer) performs each
//! [`Attempt`] it hands out and feeds element signals back.
//!
//! Policy:
//!
//! - The first `canplay`/`playing` signal locks the cycle. Later errors are
//!   ignored.
//! - The first error of a cycle, if classified as unsupported or aborted
//!   and the URL is on the upstream CDN, rewrites the URL through the proxy
//!   and retries immediately with the attempt counter reset.
//! - Any other error schedules a retry after `backoff_base × attempt`, until
//!   `max_retries` attempts have been made. Then the cycle is exhausted and
//!   stays silent.

use crate::config::SyncConfig;
use crate::format::StreamKey;
use crate::media::MediaErrorKind;
use crate::proxy::{ProxyTable, RewriteRule};
use crate::time::{Duration, HostTime};

/// One source assignment the caller must perform.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Attempt {
    /// URL to assign to the element.
    pub url: String,
    /// 1-based attempt number within the current counting window.
    pub number: u32,
}

/// Where a cycle stands.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CyclePhase {
    /// A source is assigned and no signal has arrived yet.
    Attaching,
    /// Buffering was observed; no more retries for this cycle.
    Locked,
    /// Waiting for a backoff deadline.
    RetryPending {
        /// When the next attempt may start.
        due: HostTime,
    },
    /// The attempt budget is spent.
    Exhausted,
}

/// What the loader decided after an element error.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ErrorOutcome {
    /// The cycle is locked or exhausted; nothing to do.
    Ignored,
    /// The stream moved onto the proxy. Perform `attempt` now and rewrite
    /// the catalog entry to `attempt.url`.
    ProxyRetry {
        /// URL before the rewrite.
        original: String,
        /// The immediate retry.
        attempt: Attempt,
    },
    /// A retry is scheduled.
    RetryScheduled {
        /// Number the next attempt will carry.
        next: u32,
        /// Backoff applied.
        delay: Duration,
        /// Deadline of the next attempt.
        due: HostTime,
    },
    /// No attempts remain.
    Exhausted {
        /// Attempts made in the final counting window.
        attempts: u32,
    },
}

/// Retry limits, taken from [`SyncConfig`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Attempts per counting window, including the first.
    pub max_retries: u32,
    /// Unit of the linear backoff.
    pub backoff_base: Duration,
}

impl RetryPolicy {
    /// Extracts the retry policy from a controller configuration.
    #[must_use]
    pub fn from_config(config: &SyncConfig) -> Self {
        Self {
            max_retries: config.max_retries.max(1),
            backoff_base: config.backoff_base(),
        }
    }

    /// Backoff before the attempt following attempt `number`.
    #[must_use]
    pub const fn delay_after(&self, number: u32) -> Duration {
        self.backoff_base.saturating_mul(number)
    }
}

/// Attempt bookkeeping for one element and one logical stream.
#[derive(Clone, Debug)]
pub struct LoadCycle {
    key: StreamKey,
    url: String,
    attempts: u32,
    errored: bool,
    phase: CyclePhase,
}

impl LoadCycle {
    /// Starts a cycle for `key`. The returned [`Attempt`] must be performed
    /// immediately.
    ///
    /// If the stream was proxied earlier in the session, the first attempt
    /// already uses the proxied URL.
    #[must_use]
    pub fn begin(
        key: StreamKey,
        url: &str,
        proxies: &ProxyTable,
        rule: &RewriteRule,
    ) -> (Self, Attempt) {
        let url = proxies.resolve(&key, url, rule);
        let cycle = Self {
            key,
            url: url.clone(),
            attempts: 1,
            errored: false,
            phase: CyclePhase::Attaching,
        };
        (cycle, Attempt { url, number: 1 })
    }

    /// The stream this cycle loads.
    #[must_use]
    pub fn key(&self) -> &StreamKey {
        &self.key
    }

    /// The URL currently in use.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Current phase.
    #[must_use]
    pub fn phase(&self) -> CyclePhase {
        self.phase
    }

    /// Attempts made in the current counting window.
    #[must_use]
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Whether the attempt budget is spent.
    #[must_use]
    pub fn is_exhausted(&self) -> bool {
        self.phase == CyclePhase::Exhausted
    }

    /// Records a buffering signal. Returns `true` the first time the cycle
    /// locks.
    pub fn on_ready(&mut self) -> bool {
        match self.phase {
            CyclePhase::Attaching => {
                self.phase = CyclePhase::Locked;
                true
            }
            CyclePhase::Locked | CyclePhase::RetryPending { .. } | CyclePhase::Exhausted => false,
        }
    }

    /// Records an element error and decides what happens next.
    pub fn on_error(
        &mut self,
        kind: MediaErrorKind,
        now: HostTime,
        policy: &RetryPolicy,
        proxies: &mut ProxyTable,
        rule: &RewriteRule,
    ) -> ErrorOutcome {
        if self.phase != CyclePhase::Attaching {
            return ErrorOutcome::Ignored;
        }
        let first_error = !self.errored;
        self.errored = true;

        if first_error && kind.suggests_rejected_origin() && rule.applies_to(&self.url) {
            let rewritten = rule.rewrite(&self.url);
            let original = core::mem::replace(&mut self.url, rewritten);
            proxies.mark(self.key.clone());
            self.attempts = 1;
            return ErrorOutcome::ProxyRetry {
                original,
                attempt: Attempt {
                    url: self.url.clone(),
                    number: 1,
                },
            };
        }

        if self.attempts >= policy.max_retries {
            self.phase = CyclePhase::Exhausted;
            return ErrorOutcome::Exhausted {
                attempts: self.attempts,
            };
        }

        let delay = policy.delay_after(self.attempts);
        let due = now.saturating_add(delay);
        self.phase = CyclePhase::RetryPending { due };
        ErrorOutcome::RetryScheduled {
            next: self.attempts + 1,
            delay,
            due,
        }
    }

    /// Returns the next attempt once its backoff deadline has passed.
    pub fn poll(&mut self, now: HostTime) -> Option<Attempt> {
        let CyclePhase::RetryPending { due } = self.phase else {
            return None;
        };
        if now < due {
            return None;
        }
        self.attempts += 1;
        self.phase = CyclePhase::Attaching;
        Some(Attempt {
            url: self.url.clone(),
            number: self.attempts,
        })
    }
}
