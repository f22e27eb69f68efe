//! Dynamic zero-floor gate for low-speed sensor jitter.

use std::collections::VecDeque;

/// Forces speed/RPM output to exactly zero while recent readings show the
/// roller is effectively stationary.
///
/// Entry is debounced: the gate sets only after the trailing window spans the
/// full configured duration with every speed below the threshold and the
/// spread below the variation limit. Exit is immediate: one sample of real
/// motion clears the gate, keeping the dashboard responsive.
pub struct ZeroFloorDetector {
    speed_thresh_kmh: f64,
    duration_s: f64,
    variation_thresh_kmh: f64,
    window: VecDeque<(f64, f64)>,
    gated: bool,
}

impl ZeroFloorDetector {
    pub fn new(speed_thresh_kmh: f64, duration_s: f64, variation_thresh_kmh: f64) -> Self {
        Self {
            speed_thresh_kmh,
            duration_s,
            variation_thresh_kmh,
            window: VecDeque::new(),
            gated: false,
        }
    }

    /// Record a computed speed and return whether the output is gated to zero.
    ///
    /// The window stores computed (pre-gate) speeds, so a gated stretch does
    /// not feed zeros back into its own variation check.
    pub fn update(&mut self, time_s: f64, speed_kmh: f64) -> bool {
        let cutoff = time_s - self.duration_s;
        while self.window.front().is_some_and(|&(t, _)| t < cutoff) {
            self.window.pop_front();
        }
        self.window.push_back((time_s, speed_kmh));

        let mut max = f64::NEG_INFINITY;
        let mut min = f64::INFINITY;
        for &(_, s) in &self.window {
            max = max.max(s);
            min = min.min(s);
        }

        if max > self.speed_thresh_kmh || max - min > self.variation_thresh_kmh {
            // Real motion or unstable readings: clear instantly, no debounce.
            self.gated = false;
        } else if self.window_span() + 1e-9 >= self.duration_s {
            self.gated = true;
        }
        // Conditions hold but the window is still filling: state unchanged.

        self.gated
    }

    pub fn is_gated(&self) -> bool {
        self.gated
    }

    fn window_span(&self) -> f64 {
        match (self.window.front(), self.window.back()) {
            (Some(&(oldest, _)), Some(&(newest, _))) => newest - oldest,
            _ => 0.0,
        }
    }

    /// Drop the window and open the gate. Called on the Stalled transition.
    pub fn reset(&mut self) {
        self.window.clear();
        self.gated = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detector() -> ZeroFloorDetector {
        ZeroFloorDetector::new(0.5, 2.0, 0.5)
    }

    #[test]
    fn test_gate_sets_after_sustained_low_speed() {
        let mut det = detector();
        let speeds = [0.2, 0.3, 0.1, 0.2];
        let mut t = 0.0;
        let mut gated = false;
        // Feed the cycle steadily for duration + a little extra.
        for i in 0..10 {
            t = i as f64 * 0.25;
            gated = det.update(t, speeds[i % speeds.len()]);
        }
        assert!(t > 2.0);
        assert!(gated, "sustained low flat speed must gate to zero");
    }

    #[test]
    fn test_gate_entry_is_debounced() {
        let mut det = detector();
        // Low speeds, but the window has not yet spanned the duration.
        assert!(!det.update(0.0, 0.1));
        assert!(!det.update(0.5, 0.2));
        assert!(!det.update(1.0, 0.1));
        assert!(!det.is_gated());
    }

    #[test]
    fn test_single_fast_sample_clears_instantly() {
        let mut det = detector();
        for i in 0..10 {
            det.update(i as f64 * 0.25, 0.2);
        }
        assert!(det.is_gated());
        assert!(!det.update(2.5, 5.0), "one real-motion sample must ungate");
        assert!(!det.is_gated());
    }

    #[test]
    fn test_variation_violation_clears() {
        // Speed threshold high enough that only the spread condition trips.
        let mut det = ZeroFloorDetector::new(2.0, 2.0, 0.5);
        for i in 0..10 {
            det.update(i as f64 * 0.25, 0.2);
        }
        assert!(det.is_gated());
        // 1.0 km/h is under the 2.0 threshold, but spread 0.8 > 0.5.
        assert!(!det.update(2.5, 1.0), "spread violation must ungate");
    }

    #[test]
    fn test_reset_opens_gate_and_clears_window() {
        let mut det = detector();
        for i in 0..10 {
            det.update(i as f64 * 0.25, 0.2);
        }
        assert!(det.is_gated());
        det.reset();
        assert!(!det.is_gated());
        // One low sample after reset must not re-gate (debounce restarts).
        assert!(!det.update(10.0, 0.1));
    }
}
