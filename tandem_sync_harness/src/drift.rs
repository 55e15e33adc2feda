// Copyright 2026 the Tandem Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Rolling A/V drift grading.

use tandem_core::trace::DriftSampleEvent;

/// Letter grade for audio/video alignment.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum DriftGrade {
    /// Lip-sync tight.
    A,
    /// Noticeable to attentive viewers.
    B,
    /// Noticeable.
    C,
    /// Out of sync.
    D,
}

impl DriftGrade {
    /// Returns a short label for HUD rendering.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::A => "A",
            Self::B => "B",
            Self::C => "C",
            Self::D => "D",
        }
    }
}

/// Aggregated report returned by [`DriftTracker::observe`].
#[derive(Clone, Copy, Debug)]
pub struct DriftReport {
    /// Grade over the current window.
    pub grade: DriftGrade,
    /// Largest absolute drift in the window, in ms.
    pub worst_ms: f64,
    /// Mean absolute drift in the window, in ms.
    pub mean_ms: f64,
    /// This sample's signed drift (`video − audio`), in ms.
    pub drift_ms: f64,
    /// Total samples observed.
    pub samples: u64,
}

/// Rolling drift tracker with a fixed-size sample ring.
#[derive(Debug)]
pub struct DriftTracker<const N: usize> {
    drift_ms: [f64; N],
    cursor: usize,
    samples: u64,
}

impl<const N: usize> Default for DriftTracker<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> DriftTracker<N> {
    /// Creates a tracker with a zeroed window.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            drift_ms: [0.0; N],
            cursor: 0,
            samples: 0,
        }
    }

    /// Observes one drift sample and returns an updated report.
    #[must_use]
    pub fn observe(&mut self, sample: &DriftSampleEvent) -> DriftReport {
        let drift_ms = sample.drift() * 1000.0;
        self.samples = self.samples.saturating_add(1);
        self.drift_ms[self.cursor % N] = drift_ms;
        self.cursor = (self.cursor + 1) % N;

        let filled = self.window();
        let worst_ms = filled.iter().fold(0.0_f64, |w, d| w.max(d.abs()));
        let mean_ms = if filled.is_empty() {
            0.0
        } else {
            filled.iter().map(|d| d.abs()).sum::<f64>() / filled.len() as f64
        };

        DriftReport {
            grade: grade_for(worst_ms),
            worst_ms,
            mean_ms,
            drift_ms,
            samples: self.samples,
        }
    }

    /// The samples currently in the window, oldest first.
    #[must_use]
    pub fn window(&self) -> Vec<f64> {
        let filled = usize::try_from(self.samples).map_or(N, |s| s.min(N));
        let start = (self.cursor + N - filled) % N;
        (0..filled).map(|i| self.drift_ms[(start + i) % N]).collect()
    }

    /// Returns an ASCII sparkline of absolute drift over the window.
    #[must_use]
    pub fn sparkline_ascii(&self, max_ms: f64) -> String {
        const LEVELS: &[u8] = b" .:-=+*#%@";
        self.window()
            .iter()
            .map(|d| {
                let t = (d.abs() / max_ms).clamp(0.0, 1.0);
                #[expect(
                    clippy::cast_possible_truncation,
                    clippy::cast_sign_loss,
                    reason = "index is clamped to ASCII level count"
                )]
                let level = (t * (LEVELS.len() as f64 - 1.0) + 0.5) as usize;
                LEVELS[level] as char
            })
            .collect()
    }
}

fn grade_for(worst_ms: f64) -> DriftGrade {
    if worst_ms < 45.0 {
        DriftGrade::A
    } else if worst_ms < 125.0 {
        DriftGrade::B
    } else if worst_ms < 250.0 {
        DriftGrade::C
    } else {
        DriftGrade::D
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tandem_core::time::HostTime;

    fn sample(video: f64, audio: f64) -> DriftSampleEvent {
        DriftSampleEvent {
            video_time: video,
            audio_time: audio,
            at: HostTime(0),
        }
    }

    #[test]
    fn worst_sample_sets_grade() {
        let mut t = DriftTracker::<4>::new();
        assert_eq!(t.observe(&sample(1.0, 1.01)).grade, DriftGrade::A);
        let r = t.observe(&sample(2.0, 1.7));
        assert_eq!(r.grade, DriftGrade::D);
        assert!((r.worst_ms - 300.0).abs() < 1e-6);
    }

    #[test]
    fn old_samples_leave_the_window() {
        let mut t = DriftTracker::<2>::new();
        let _ = t.observe(&sample(0.0, 0.2));
        let _ = t.observe(&sample(0.0, 0.0));
        let r = t.observe(&sample(0.0, 0.0));
        assert_eq!(r.grade, DriftGrade::A);
        assert_eq!(r.samples, 3);
        assert_eq!(t.window().len(), 2);
    }

    #[test]
    fn sparkline_has_one_cell_per_sample() {
        let mut t = DriftTracker::<8>::new();
        let _ = t.observe(&sample(0.0, 0.0));
        let _ = t.observe(&sample(0.5, 0.0));
        assert_eq!(t.sparkline_ascii(200.0), " @");
    }
}
