//! Sliding-window angular-acceleration estimator.

use std::collections::VecDeque;

use crate::config::defaults::MIN_SLOPE_SPAN_S;
use crate::types::KinematicSample;

/// Estimates angular acceleration as the slope between the oldest and newest
/// angular-velocity sample inside a trailing wall-clock window.
///
/// A two-point slope over a time window (rather than an instantaneous
/// derivative) keeps single encoder-period jitter from dominating the
/// estimate: the filter's effective bandwidth depends on the window duration,
/// not on the data rate.
pub struct AccelerationEstimator {
    window_s: f64,
    samples: VecDeque<KinematicSample>,
}

impl AccelerationEstimator {
    pub fn new(window_s: f64) -> Self {
        Self {
            window_s,
            samples: VecDeque::new(),
        }
    }

    /// Append a new angular-velocity sample and evict everything older than
    /// the trailing window.
    pub fn push(&mut self, time_s: f64, omega: f64) {
        self.samples.push_back(KinematicSample { time_s, omega });
        let cutoff = time_s - self.window_s;
        while self
            .samples
            .front()
            .is_some_and(|s| s.time_s < cutoff)
        {
            self.samples.pop_front();
        }
    }

    /// Current angular-acceleration estimate (rad/s²).
    ///
    /// `None` when fewer than two samples remain in the window, or when the
    /// window span is too short to divide by safely — the caller holds the
    /// previous torque in either case.
    pub fn alpha(&self) -> Option<f64> {
        let oldest = self.samples.front()?;
        let newest = self.samples.back()?;
        let span = newest.time_s - oldest.time_s;
        if self.samples.len() < 2 || span < MIN_SLOPE_SPAN_S {
            return None;
        }
        Some((newest.omega - oldest.omega) / span)
    }

    /// Number of samples currently in the window.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Discard all windowed samples. Called on the Stalled transition — a
    /// data gap invalidates any time-windowed estimate.
    pub fn reset(&mut self) {
        self.samples.clear();
    }
}
