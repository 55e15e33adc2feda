// Copyright 2026 the Tandem Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Live playback state owned by the synchronizer.

use core::fmt;

use crate::format::FormatId;
use crate::time::HostTime;

/// Top-level synchronizer state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SyncState {
    /// Constructed, no source assigned.
    Idle,
    /// Sources assigned; waiting for the join barrier.
    Loading,
    /// Both tracks advancing.
    Playing,
    /// Both tracks paused and aligned.
    Paused,
    /// Frozen while both tracks buffer around a new position.
    Seeking,
    /// Frozen while a new format pair replaces the old one.
    QualitySwitching,
    /// Frozen because one track ran out of data.
    BufferStalled,
}

impl SyncState {
    /// Whether the state holds the freeze gate.
    #[must_use]
    pub const fn is_frozen(self) -> bool {
        matches!(
            self,
            Self::Seeking | Self::QualitySwitching | Self::BufferStalled
        )
    }

    /// Short lowercase name used in trace output.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Loading => "loading",
            Self::Playing => "playing",
            Self::Paused => "paused",
            Self::Seeking => "seeking",
            Self::QualitySwitching => "quality_switching",
            Self::BufferStalled => "buffer_stalled",
        }
    }
}

impl fmt::Display for SyncState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The active format pair and the controller's flags.
///
/// `active_audio` is `Some` exactly when the active video format carries no
/// muxed audio and a usable audio track was found.
#[derive(Clone, Debug)]
pub struct PlaybackSession {
    pub(crate) active_video: FormatId,
    pub(crate) active_audio: Option<FormatId>,
    pub(crate) quality_switch_in_progress: bool,
    pub(crate) frozen_for_buffering: bool,
    pub(crate) pending_resume: bool,
    pub(crate) user_has_interacted: bool,
}

impl PlaybackSession {
    pub(crate) fn new(active_video: FormatId, active_audio: Option<FormatId>) -> Self {
        Self {
            active_video,
            active_audio,
            quality_switch_in_progress: false,
            frozen_for_buffering: false,
            pending_resume: false,
            user_has_interacted: false,
        }
    }

    /// The active video format.
    #[must_use]
    pub fn active_video(&self) -> &FormatId {
        &self.active_video
    }

    /// The active independent audio format, if any.
    #[must_use]
    pub fn active_audio(&self) -> Option<&FormatId> {
        self.active_audio.as_ref()
    }

    /// Whether a quality switch has not yet passed its join barrier.
    #[must_use]
    pub fn is_quality_switch_in_progress(&self) -> bool {
        self.quality_switch_in_progress
    }

    /// Whether the freeze gate is held.
    #[must_use]
    pub fn is_frozen_for_buffering(&self) -> bool {
        self.frozen_for_buffering
    }

    /// Whether playback should resume once the current freeze lifts.
    #[must_use]
    pub fn pending_resume(&self) -> bool {
        self.pending_resume
    }

    /// Whether a user gesture has been recorded.
    #[must_use]
    pub fn user_has_interacted(&self) -> bool {
        self.user_has_interacted
    }
}

/// A point-in-time view of the controller, for diagnostics and tests.
#[derive(Clone, Debug, PartialEq)]
pub struct PlaybackSnapshot {
    /// Current state.
    pub state: SyncState,
    /// Active video format.
    pub video: FormatId,
    /// Active audio format.
    pub audio: Option<FormatId>,
    /// Video position in seconds.
    pub video_time: f64,
    /// Audio position in seconds, if an audio track is active.
    pub audio_time: Option<f64>,
    /// `video_time − audio_time`, if an audio track is active.
    pub drift: Option<f64>,
    /// Whether the freeze gate is held.
    pub frozen: bool,
    /// Whether the page is visible.
    pub page_visible: bool,
    /// Drift corrections applied so far.
    pub corrections: u64,
    /// Time of the snapshot's last tick.
    pub last_tick: HostTime,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frozen_states() {
        let frozen: Vec<_> = [
            SyncState::Idle,
            SyncState::Loading,
            SyncState::Playing,
            SyncState::Paused,
            SyncState::Seeking,
            SyncState::QualitySwitching,
            SyncState::BufferStalled,
        ]
        .into_iter()
        .filter(|s| s.is_frozen())
        .map(SyncState::as_str)
        .collect();
        assert_eq!(frozen, ["seeking", "quality_switching", "buffer_stalled"]);
    }
}
