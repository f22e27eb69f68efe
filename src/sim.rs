//! Synthetic sensor for demos and pipeline exercise.
//!
//! Generates the frame stream a real bench produces over one pull: idle,
//! spin-up, steady load, coast-down, back to idle — with Gaussian period
//! jitter and occasional injected glitches so the outlier filter has
//! something to do.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};

use crate::acquisition::SensorFrame;
use crate::config::defaults::{SYNTHETIC_FRAME_INTERVAL_MS, SYNTHETIC_GLITCH_PROBABILITY};

/// Relative standard deviation of the period jitter.
const PERIOD_JITTER_REL: f64 = 0.01;

/// Peak rotational speed of the profile (rev/min).
const PEAK_RPM: f64 = 6000.0;

// Profile phase boundaries, seconds into one cycle.
const IDLE_END_S: f64 = 2.0;
const SPIN_UP_END_S: f64 = 10.0;
const STEADY_END_S: f64 = 16.0;
const COAST_END_S: f64 = 24.0;
const CYCLE_S: f64 = 28.0;

/// Stateful synthetic sensor. Each call to [`next_frame`](Self::next_frame)
/// advances the profile clock by one frame interval.
pub struct SyntheticSensor {
    rng: StdRng,
    jitter: Option<Normal<f64>>,
    elapsed_s: f64,
    ts_us: u64,
}

impl SyntheticSensor {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            jitter: Normal::new(0.0, PERIOD_JITTER_REL).ok(),
            elapsed_s: 0.0,
            ts_us: 0,
        }
    }

    /// Non-deterministic sensor for live demos.
    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
            jitter: Normal::new(0.0, PERIOD_JITTER_REL).ok(),
            elapsed_s: 0.0,
            ts_us: 0,
        }
    }

    /// Target rotational speed at a point in the cycle.
    fn target_rpm(cycle_s: f64) -> f64 {
        if cycle_s < IDLE_END_S {
            0.0
        } else if cycle_s < SPIN_UP_END_S {
            PEAK_RPM * (cycle_s - IDLE_END_S) / (SPIN_UP_END_S - IDLE_END_S)
        } else if cycle_s < STEADY_END_S {
            PEAK_RPM
        } else if cycle_s < COAST_END_S {
            PEAK_RPM * (1.0 - (cycle_s - STEADY_END_S) / (COAST_END_S - STEADY_END_S))
        } else {
            0.0
        }
    }

    /// Produce the next sensor frame and advance the profile clock.
    pub fn next_frame(&mut self) -> SensorFrame {
        let step_s = SYNTHETIC_FRAME_INTERVAL_MS as f64 / 1e3;
        let cycle_s = self.elapsed_s % CYCLE_S;
        self.elapsed_s += step_s;
        self.ts_us = self.ts_us.saturating_add(SYNTHETIC_FRAME_INTERVAL_MS * 1000);

        let rpm = Self::target_rpm(cycle_s);
        // Below ~30 rpm a real sensor stops seeing revolutions within its
        // reporting interval and prints a zero period.
        if rpm < 30.0 {
            return SensorFrame {
                ts_us: self.ts_us,
                period_us: None,
            };
        }

        let mut period_us = 60_000_000.0 / rpm;
        if let Some(jitter) = self.jitter {
            period_us *= 1.0 + jitter.sample(&mut self.rng);
        }
        if self.rng.gen_bool(SYNTHETIC_GLITCH_PROBABILITY) {
            // Missed-then-double-counted magnet pass: half the true period.
            period_us /= 2.0;
        }

        let period_us = period_us.max(1.0) as u64;
        SensorFrame {
            ts_us: self.ts_us,
            period_us: Some(period_us),
        }
    }
}
