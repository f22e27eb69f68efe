//! Core pipeline types: raw sensor samples, windowed kinematic samples, and
//! the published reading.

use serde::{Deserialize, Serialize};

/// One timing event from the revolution sensor.
///
/// `time_s` is the pipeline-relative arrival time in seconds (monotonic, from
/// the ingestion epoch). `period_us` is the measured revolution period, or
/// `None` when no revolution was observed — the sensor reports a zero or
/// negative period at standstill, and parsing maps both to `None`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawSample {
    pub time_s: f64,
    pub period_us: Option<f64>,
}

/// Angular-velocity sample retained inside the acceleration window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KinematicSample {
    pub time_s: f64,
    /// Angular velocity (rad/s)
    pub omega: f64,
}

/// The latest externally-visible output of the pipeline.
///
/// Exactly one current instance exists; it is overwritten atomically on each
/// computation cycle and read as a snapshot — consumers never observe a mix
/// of old and new fields.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    /// Roller rotational speed (rev/min)
    pub rpm: f64,
    /// Linear speed at the roller surface (km/h)
    pub speed_kmh: f64,
    /// Estimated torque (Nm); negative under braking
    pub torque_nm: f64,
    /// Estimated power (W); sign follows torque
    pub power_w: f64,
}

impl Reading {
    /// The all-zero reading published before any sample and while Stalled.
    pub const ZERO: Self = Self {
        rpm: 0.0,
        speed_kmh: 0.0,
        torque_nm: 0.0,
        power_w: 0.0,
    };
}

impl Default for Reading {
    fn default() -> Self {
        Self::ZERO
    }
}

/// Sensor link state.
///
/// `Stalled` means no sample has been observed for longer than the configured
/// stop timeout (sensor disconnected, or the car stopped sending data) — the
/// published reading is forced to all-zero until the next valid sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LinkState {
    /// Samples arriving within the stop timeout
    Live,
    /// No sample observed for longer than the stop timeout
    Stalled,
}

impl std::fmt::Display for LinkState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LinkState::Live => write!(f, "Live"),
            LinkState::Stalled => write!(f, "Stalled"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reading_zero() {
        let r = Reading::default();
        assert_eq!(r, Reading::ZERO);
        assert_eq!(r.rpm, 0.0);
        assert_eq!(r.power_w, 0.0);
    }

    #[test]
    fn test_link_state_display() {
        assert_eq!(format!("{}", LinkState::Live), "Live");
        assert_eq!(format!("{}", LinkState::Stalled), "Stalled");
    }
}
