//! Spike suppression for torque and power.

use tracing::debug;

/// Rejects values inconsistent with recent history or the physical full
/// scale, holding the previous accepted value instead.
///
/// The acceptance reference only advances on acceptance — a rejected spike
/// never becomes the baseline that validates the next spike.
pub struct OutlierFilter {
    label: &'static str,
    full_scale: f64,
    jump_factor: f64,
    last_accepted: Option<f64>,
    rejected: u64,
}

impl OutlierFilter {
    /// `full_scale` is the configured maximum plausible magnitude for this
    /// quantity; `jump_factor` is the fraction of full scale allowed as a
    /// per-cycle change.
    pub fn new(label: &'static str, full_scale: f64, jump_factor: f64) -> Self {
        Self {
            label,
            full_scale,
            jump_factor,
            last_accepted: None,
            rejected: 0,
        }
    }

    /// Filter one candidate value, returning the value to publish.
    ///
    /// The very first candidate seeds the reference unconditionally.
    pub fn accept(&mut self, candidate: f64) -> f64 {
        let Some(prev) = self.last_accepted else {
            self.last_accepted = Some(candidate);
            return candidate;
        };

        if candidate.abs() > self.full_scale {
            self.rejected += 1;
            debug!(
                filter = self.label,
                candidate,
                full_scale = self.full_scale,
                "rejected over-scale value, holding previous"
            );
            return prev;
        }

        if (candidate - prev).abs() > self.jump_factor * self.full_scale {
            self.rejected += 1;
            debug!(
                filter = self.label,
                candidate,
                previous = prev,
                "rejected jump, holding previous"
            );
            return prev;
        }

        self.last_accepted = Some(candidate);
        candidate
    }

    /// Total rejections since creation or the last reset.
    pub fn rejected(&self) -> u64 {
        self.rejected
    }

    /// Drop the acceptance reference; the next candidate re-seeds it.
    /// Called on the Stalled transition.
    pub fn reset(&mut self) {
        self.last_accepted = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_candidate_seeds_unconditionally() {
        let mut f = OutlierFilter::new("torque", 2.0, 0.3);
        // Even an over-scale first value is accepted to seed the reference.
        assert_eq!(f.accept(5.0), 5.0);
        assert_eq!(f.rejected(), 0);
    }

    #[test]
    fn test_jump_rejected_and_reference_frozen() {
        let mut f = OutlierFilter::new("torque", 2.0, 0.3);
        assert_eq!(f.accept(0.5), 0.5);
        // Jump 1.4 > 0.3 * 2.0 = 0.6: rejected, output stays 0.5.
        assert_eq!(f.accept(1.9), 0.5);
        assert_eq!(f.rejected(), 1);
        // The reference did not advance to 1.9 — a second 1.9 is still a
        // 1.4 jump from 0.5, rejected again.
        assert_eq!(f.accept(1.9), 0.5);
        assert_eq!(f.rejected(), 2);
        // Jump 0.2 <= 0.6: accepted.
        assert_eq!(f.accept(0.7), 0.7);
        assert_eq!(f.rejected(), 2);
    }

    #[test]
    fn test_hard_clamp_rejects_over_scale() {
        let mut f = OutlierFilter::new("power", 50.0, 0.8);
        assert_eq!(f.accept(30.0), 30.0);
        // Within the jump allowance (0.8 * 50 = 40) but beyond full scale.
        assert_eq!(f.accept(60.0), 30.0);
        assert_eq!(f.rejected(), 1);
        assert_eq!(f.accept(-60.0), 30.0);
        assert_eq!(f.rejected(), 2);
    }

    #[test]
    fn test_negative_values_within_scale_accepted() {
        let mut f = OutlierFilter::new("torque", 2.0, 0.8);
        assert_eq!(f.accept(0.5), 0.5);
        // Braking: -0.9 is a 1.4 jump, within 0.8 * 2.0 = 1.6.
        assert_eq!(f.accept(-0.9), -0.9);
    }

    #[test]
    fn test_reset_reseeds() {
        let mut f = OutlierFilter::new("torque", 2.0, 0.3);
        assert_eq!(f.accept(0.5), 0.5);
        f.reset();
        // After reset the next candidate seeds again, however large the jump.
        assert_eq!(f.accept(1.9), 1.9);
    }
}
