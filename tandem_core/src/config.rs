// Copyright 2026 the Tandem Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Controller configuration.
//!
//! Every threshold the controller uses is a field here. The page may supply
//! a JSON [`PlayerConfig`] (the video element's `data-player-config`
//! attribute); missing keys fall back to the [`SyncConfig::web`] and
//! [`RouterConfig::web`] presets.

use serde::Deserialize;

use crate::format::{FormatCatalog, FormatId};
use crate::media::ReadyState;
use crate::proxy::RewriteConfig;
use crate::time::Duration;

/// Local-storage key holding the last chosen quality identifier.
pub const QUALITY_STORAGE_KEY: &str = "lastQuality";

/// Configuration for the [`Synchronizer`](crate::sync::Synchronizer).
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Largest tolerated |video − audio| position difference, in seconds.
    pub drift_threshold_s: f64,
    /// Buffered media required beyond the position before a seek resumes or
    /// a drift correction repositions audio, in seconds.
    pub min_lookahead_s: f64,
    /// Cadence of drift checks while playing.
    pub drift_check_interval_ms: u64,
    /// Minimum spacing between two drift corrections.
    pub min_correction_interval_ms: u64,
    /// Load attempts per stream before it is declared unavailable.
    pub max_retries: u32,
    /// Unit of the linear retry backoff.
    pub backoff_base_ms: u64,
    /// Ready state an element must reach to pass the join barrier.
    pub ready_state: ReadyState,
    /// Longest wait for post-seek lookahead before resuming anyway.
    pub seek_watchdog_ms: u64,
    /// Longest wait for a stalled element before forcing a resume.
    pub stall_watchdog_ms: u64,
    /// Distance from the end within which drift is not corrected, in
    /// seconds.
    pub end_tolerance_s: f64,
}

impl SyncConfig {
    /// Defaults for browser playback of proxied adaptive streams.
    #[must_use]
    pub const fn web() -> Self {
        Self {
            drift_threshold_s: 0.2,
            min_lookahead_s: 2.0,
            drift_check_interval_ms: 250,
            min_correction_interval_ms: 1500,
            max_retries: 6,
            backoff_base_ms: 2000,
            ready_state: ReadyState::HaveFutureData,
            seek_watchdog_ms: 8000,
            stall_watchdog_ms: 10_000,
            end_tolerance_s: 0.25,
        }
    }

    /// Drift-check cadence as a [`Duration`].
    #[must_use]
    pub const fn drift_check_interval(&self) -> Duration {
        Duration::from_millis(self.drift_check_interval_ms)
    }

    /// Correction throttle as a [`Duration`].
    #[must_use]
    pub const fn min_correction_interval(&self) -> Duration {
        Duration::from_millis(self.min_correction_interval_ms)
    }

    /// Backoff unit as a [`Duration`].
    #[must_use]
    pub const fn backoff_base(&self) -> Duration {
        Duration::from_millis(self.backoff_base_ms)
    }

    /// Seek watchdog as a [`Duration`].
    #[must_use]
    pub const fn seek_watchdog(&self) -> Duration {
        Duration::from_millis(self.seek_watchdog_ms)
    }

    /// Stall watchdog as a [`Duration`].
    #[must_use]
    pub const fn stall_watchdog(&self) -> Duration {
        Duration::from_millis(self.stall_watchdog_ms)
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self::web()
    }
}

/// Configuration for the [`InputRouter`](crate::router::InputRouter).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RouterConfig {
    /// Window in which repeated play/pause triggers collapse into one.
    pub debounce_ms: u64,
    /// How long after a click on the video the space key still toggles
    /// playback.
    pub space_focus_window_ms: u64,
}

impl RouterConfig {
    /// Defaults for keyboard and pointer input in the browser.
    #[must_use]
    pub const fn web() -> Self {
        Self {
            debounce_ms: 100,
            space_focus_window_ms: 15_000,
        }
    }

    /// Debounce window as a [`Duration`].
    #[must_use]
    pub const fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    /// Space-key focus window as a [`Duration`].
    #[must_use]
    pub const fn space_focus_window(&self) -> Duration {
        Duration::from_millis(self.space_focus_window_ms)
    }
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self::web()
    }
}

/// Everything the page can configure, as one JSON object.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    /// Synchronizer thresholds.
    pub sync: SyncConfig,
    /// Input handling.
    pub router: RouterConfig,
    /// Origin rewriting.
    pub rewrite: RewriteConfig,
}

/// Returns the saved quality if it still names a video format, otherwise
/// the initially rendered one.
#[must_use]
pub fn restore_quality(
    saved: Option<&str>,
    initial: &FormatId,
    catalog: &FormatCatalog,
) -> FormatId {
    saved
        .map(FormatId::new)
        .filter(|id| catalog.playable_video(id).is_ok())
        .unwrap_or_else(|| initial.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::FormatDescriptor;

    #[test]
    fn partial_json_keeps_defaults() {
        let cfg: PlayerConfig = serde_json::from_str(
            r#"{ "sync": { "drift_threshold_s": 0.1, "ready_state": "have_enough_data" },
                 "rewrite": { "proxy_origin": "https://p.example" } }"#,
        )
        .unwrap();
        assert_eq!(cfg.sync.drift_threshold_s, 0.1);
        assert_eq!(cfg.sync.ready_state, ReadyState::HaveEnoughData);
        assert_eq!(cfg.sync.max_retries, 6);
        assert_eq!(cfg.router, RouterConfig::web());
        assert_eq!(cfg.rewrite.upstream_domain, "googlevideo.com");
        assert_eq!(cfg.rewrite.proxy_origin.as_deref(), Some("https://p.example"));
    }

    #[test]
    fn empty_object_is_default() {
        let cfg: PlayerConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(cfg, PlayerConfig::default());
        assert_eq!(cfg.sync.backoff_base(), Duration::from_millis(2000));
    }

    #[test]
    fn saved_quality_must_still_exist() {
        let catalog = FormatCatalog::classify([FormatDescriptor {
            id: FormatId::new("22"),
            mime_type: "video/mp4".into(),
            url: Some("https://h/22".into()),
            bitrate: None,
            quality_label: Some("720p".into()),
            height: None,
            resolution: None,
        }]);
        let initial = FormatId::new("18");
        assert_eq!(restore_quality(Some("22"), &initial, &catalog), FormatId::new("22"));
        assert_eq!(restore_quality(Some("137"), &initial, &catalog), initial);
        assert_eq!(restore_quality(None, &initial, &catalog), initial);
    }
}
