//! Kinematic conversions for the roller dynamometer.
//!
//! Deterministic calculations only — no filter state lives here.
//!
//! - `period_to_rpm()` - revolution period to rotational speed
//! - `rpm_to_speed_kmh()` - rotational speed to linear roller-surface speed
//! - `rpm_to_omega()` - rotational speed to angular velocity
//! - `torque_from_alpha()` - angular acceleration to torque via inertia
//! - `power_w()` - angular velocity and torque to mechanical power

use std::f64::consts::PI;

/// Microseconds per minute — the period→RPM conversion constant.
const US_PER_MINUTE: f64 = 60_000_000.0;

/// Convert a revolution period (µs) to rotational speed (rev/min).
///
/// Returns `None` for non-positive or non-finite periods — a zero-duration
/// revolution is a sensor artifact, not infinite speed. Strictly decreasing
/// in `period_us`; tends to 0 as the period grows without bound.
pub fn period_to_rpm(period_us: f64) -> Option<f64> {
    if !period_us.is_finite() || period_us <= 0.0 {
        return None;
    }
    Some(US_PER_MINUTE / period_us)
}

/// Convert rotational speed (rev/min) to linear speed (km/h) for a roller of
/// the given circumference (m).
pub fn rpm_to_speed_kmh(rpm: f64, circumference_m: f64) -> f64 {
    // rev/min -> rev/s -> m/s -> km/h
    (rpm / 60.0) * circumference_m * 3.6
}

/// Convert rotational speed (rev/min) to angular velocity (rad/s).
pub fn rpm_to_omega(rpm: f64) -> f64 {
    rpm * 2.0 * PI / 60.0
}

/// Torque (Nm) from angular acceleration (rad/s²) and rotational inertia
/// (kg·m²). Sign is preserved: deceleration yields negative torque.
pub fn torque_from_alpha(alpha: f64, inertia: f64) -> f64 {
    inertia * alpha
}

/// Mechanical power (W) from angular velocity (rad/s) and torque (Nm).
/// Sign follows the torque's sign (negative under braking).
pub fn power_w(omega: f64, torque_nm: f64) -> f64 {
    omega * torque_nm
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_period_to_rpm_formula() {
        // 20 ms per revolution = 3000 rev/min
        assert_eq!(period_to_rpm(20_000.0), Some(3000.0));
        // 1 s per revolution = 60 rev/min
        assert_eq!(period_to_rpm(1_000_000.0), Some(60.0));
    }

    #[test]
    fn test_period_to_rpm_rejects_non_positive() {
        assert_eq!(period_to_rpm(0.0), None);
        assert_eq!(period_to_rpm(-5.0), None);
        assert_eq!(period_to_rpm(f64::NAN), None);
        assert_eq!(period_to_rpm(f64::INFINITY), None);
    }

    #[test]
    fn test_period_to_rpm_strictly_decreasing() {
        let periods = [100.0, 1_000.0, 10_000.0, 100_000.0, 1_000_000.0];
        let rpms: Vec<f64> = periods
            .iter()
            .filter_map(|&p| period_to_rpm(p))
            .collect();
        assert_eq!(rpms.len(), periods.len());
        for pair in rpms.windows(2) {
            assert!(
                pair[0] > pair[1],
                "rpm must strictly decrease with period: {:?}",
                pair
            );
        }
    }

    #[test]
    fn test_period_to_rpm_tends_to_zero() {
        let rpm = period_to_rpm(1e12).unwrap();
        assert!(rpm < 1e-4, "huge periods must map near zero, got {}", rpm);
    }

    #[test]
    fn test_rpm_to_speed_kmh() {
        // 60 mm roller: circumference = 0.06π m.
        let circ = 0.060 * PI;
        // 1000 rpm -> (1000/60) rev/s * circ m * 3.6
        let expected = 1000.0 / 60.0 * circ * 3.6;
        assert!((rpm_to_speed_kmh(1000.0, circ) - expected).abs() < 1e-12);
        assert_eq!(rpm_to_speed_kmh(0.0, circ), 0.0);
    }

    #[test]
    fn test_rpm_to_omega() {
        // 60 rpm = 1 rev/s = 2π rad/s
        assert!((rpm_to_omega(60.0) - 2.0 * PI).abs() < 1e-12);
    }

    #[test]
    fn test_torque_sign_preserved() {
        assert!(torque_from_alpha(100.0, 0.002572) > 0.0);
        assert!(torque_from_alpha(-100.0, 0.002572) < 0.0);
        assert_eq!(torque_from_alpha(0.0, 0.002572), 0.0);
    }

    #[test]
    fn test_power_sign_follows_torque() {
        let omega = rpm_to_omega(3000.0);
        assert!(power_w(omega, 0.5) > 0.0);
        assert!(power_w(omega, -0.5) < 0.0);
        assert_eq!(power_w(omega, 0.0), 0.0);
    }
}
