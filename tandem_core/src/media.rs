// Copyright 2026 the Tandem Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The platform seam for media elements.
//!
//! The controller drives two elements (video and subordinate audio) through
//! the [`MediaElement`] trait. Implementations wrap a real
//! `HTMLMediaElement` (see `tandem_backend_web`) or a scripted double (see
//! `tandem_sync_harness`). Element clocks are `f64` seconds, as the
//! platform reports them.
//!
//! Elements never call back into the controller directly. The host forwards
//! element events as [`MediaEvent`] values through
//! [`Synchronizer::handle_media_event`](crate::sync::Synchronizer::handle_media_event).

use serde::Deserialize;

/// `HTMLMediaElement.readyState`, ordered.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReadyState {
    /// No information about the resource.
    #[default]
    HaveNothing,
    /// Duration and dimensions are known.
    HaveMetadata,
    /// Data for the current position is available.
    HaveCurrentData,
    /// Data beyond the current position is available.
    HaveFutureData,
    /// Enough data to play through at the current rate.
    HaveEnoughData,
}

impl ReadyState {
    /// Maps the numeric DOM value. Values above 4 saturate.
    #[must_use]
    pub const fn from_u16(value: u16) -> Self {
        match value {
            0 => Self::HaveNothing,
            1 => Self::HaveMetadata,
            2 => Self::HaveCurrentData,
            3 => Self::HaveFutureData,
            _ => Self::HaveEnoughData,
        }
    }
}

/// Classification of a `MediaError`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MediaErrorKind {
    /// `MEDIA_ERR_ABORTED`.
    Aborted,
    /// `MEDIA_ERR_NETWORK`.
    Network,
    /// `MEDIA_ERR_DECODE`.
    Decode,
    /// `MEDIA_ERR_SRC_NOT_SUPPORTED`.
    SourceNotSupported,
    /// No code was available.
    Unknown,
}

impl MediaErrorKind {
    /// Maps a `MediaError.code`.
    #[must_use]
    pub const fn from_code(code: u16) -> Self {
        match code {
            1 => Self::Aborted,
            2 => Self::Network,
            3 => Self::Decode,
            4 => Self::SourceNotSupported,
            _ => Self::Unknown,
        }
    }

    /// Whether the failure looks like the origin refusing the request, which
    /// is what the proxy fallback addresses.
    #[must_use]
    pub const fn suggests_rejected_origin(self) -> bool {
        matches!(self, Self::Aborted | Self::SourceNotSupported)
    }

    /// Short lowercase name used in trace output.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Aborted => "aborted",
            Self::Network => "network",
            Self::Decode => "decode",
            Self::SourceNotSupported => "src_not_supported",
            Self::Unknown => "unknown",
        }
    }
}

/// An element event forwarded by the host.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MediaEvent {
    /// `loadedmetadata`.
    LoadedMetadata,
    /// `canplay` or `canplaythrough`.
    CanPlay,
    /// `playing`: playback actually advanced.
    Playing,
    /// `waiting` or `stalled`.
    Waiting,
    /// `play`.
    Play,
    /// `pause`.
    Pause,
    /// `seeked`.
    Seeked,
    /// `ratechange`.
    RateChange,
    /// `ended`.
    Ended,
    /// `error`, with the element's error classification.
    Error(MediaErrorKind),
}

/// A playable media element.
///
/// Commands are fire-and-forget. In particular [`play`](Self::play) only
/// *requests* playback; if the platform rejects the request, the host
/// reports it through
/// [`Synchronizer::on_play_rejected`](crate::sync::Synchronizer::on_play_rejected).
pub trait MediaElement {
    /// Assigns `url` as the element's only source and starts loading it.
    fn set_source(&mut self, url: &str);

    /// Removes the source and releases the resource.
    fn clear_source(&mut self);

    /// The URL currently assigned, if any.
    fn source(&self) -> Option<String>;

    /// Requests playback.
    fn play(&mut self);

    /// Pauses playback.
    fn pause(&mut self);

    /// Whether the element is paused.
    fn is_paused(&self) -> bool;

    /// Whether playback reached the end of the resource.
    fn is_ended(&self) -> bool;

    /// Current playback position in seconds.
    fn current_time(&self) -> f64;

    /// Moves the playback position.
    fn set_current_time(&mut self, seconds: f64);

    /// Resource duration in seconds, if known and finite.
    fn duration(&self) -> Option<f64>;

    /// The element's ready state.
    fn ready_state(&self) -> ReadyState;

    /// Seconds of contiguous buffered media beyond `position`. Zero if
    /// `position` is not inside a buffered range.
    fn buffered_ahead(&self, position: f64) -> f64;

    /// Whether audio output is muted.
    fn is_muted(&self) -> bool;

    /// Mutes or unmutes audio output.
    fn set_muted(&mut self, muted: bool);

    /// Current playback rate.
    fn playback_rate(&self) -> f64;

    /// Sets the playback rate.
    fn set_playback_rate(&mut self, rate: f64);
}

/// Computes the contiguous buffered span after `position` from a list of
/// `(start, end)` ranges.
///
/// Adjacent ranges separated by less than `gap` seconds are treated as one.
#[must_use]
pub fn buffered_ahead_in(ranges: &[(f64, f64)], position: f64, gap: f64) -> f64 {
    let mut sorted: Vec<(f64, f64)> = ranges.iter().copied().filter(|(s, e)| e > s).collect();
    sorted.sort_by(|a, b| a.0.total_cmp(&b.0));

    let mut end: Option<f64> = None;
    for (start, stop) in sorted {
        match end {
            None if start <= position && position <= stop => end = Some(stop),
            Some(e) if start <= e + gap => end = Some(e.max(stop)),
            Some(_) => break,
            None => {}
        }
    }
    end.map_or(0.0, |e| (e - position).max(0.0))
}
