//! Pipeline Controller - per-sample orchestration and the Live/Stalled link
//! state machine.
//!
//! Owns every piece of mutable filter state. One controller instance lives
//! inside the ingestion task; nothing here is shared — the only outward
//! channel is the atomic publish into [`ReadingStore`].

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::config::DynoConfig;
use crate::kinematics;
use crate::processing::{AccelerationEstimator, OutlierFilter, ZeroFloorDetector};
use crate::types::{LinkState, RawSample, Reading};

use super::ReadingStore;

/// Counters exposed to the dashboard.
#[derive(Debug, Clone, Copy, Default)]
pub struct ControllerStats {
    pub samples_processed: u64,
    pub samples_discarded: u64,
    pub outliers_rejected: u64,
    pub stalls: u64,
}

/// Orchestrates one processing cycle per incoming sample, plus the watchdog
/// stall check between samples.
pub struct PipelineController {
    circumference_m: f64,
    inertia: f64,
    stop_timeout_s: f64,

    estimator: AccelerationEstimator,
    zero_floor: ZeroFloorDetector,
    torque_filter: OutlierFilter,
    power_filter: OutlierFilter,

    link: LinkState,
    last_sample_time: Option<f64>,
    /// Previous published torque, held when the acceleration slope is
    /// undefined (window still filling, or degenerate time span).
    last_torque: f64,

    samples_processed: u64,
    samples_discarded: u64,
    stalls: u64,

    store: Arc<ReadingStore>,
}

impl PipelineController {
    pub fn new(config: &DynoConfig, store: Arc<ReadingStore>) -> Self {
        info!(
            window_s = config.physics.window_s,
            stop_timeout_s = config.pipeline.stop_timeout_s,
            inertia = config.physics.rotational_inertia,
            "Initializing pipeline controller"
        );
        Self {
            circumference_m: config.roller.circumference_m,
            inertia: config.physics.rotational_inertia,
            stop_timeout_s: config.pipeline.stop_timeout_s,
            estimator: AccelerationEstimator::new(config.physics.window_s),
            zero_floor: ZeroFloorDetector::new(
                config.zero_floor.speed_thresh_kmh,
                config.zero_floor.duration_s,
                config.zero_floor.variation_thresh_kmh,
            ),
            torque_filter: OutlierFilter::new(
                "torque",
                config.outlier.max_torque_nm,
                config.outlier.factor,
            ),
            power_filter: OutlierFilter::new(
                "power",
                config.outlier.max_power_w,
                config.outlier.factor,
            ),
            link: LinkState::Stalled,
            last_sample_time: None,
            last_torque: 0.0,
            samples_processed: 0,
            samples_discarded: 0,
            stalls: 0,
            store,
        }
    }

    /// Process one raw sample. Returns the published reading, or `None` when
    /// the sample carried no usable period (the previous reading holds).
    pub fn ingest(&mut self, sample: RawSample) -> Option<Reading> {
        let rpm = sample.period_us.and_then(kinematics::period_to_rpm);
        let Some(rpm) = rpm else {
            self.samples_discarded += 1;
            return None;
        };

        if self.link == LinkState::Stalled {
            self.link = LinkState::Live;
            info!(time_s = sample.time_s, "Sensor link resumed — Live");
        }
        self.last_sample_time = Some(sample.time_s);

        let speed_kmh = kinematics::rpm_to_speed_kmh(rpm, self.circumference_m);
        let omega = kinematics::rpm_to_omega(rpm);

        self.estimator.push(sample.time_s, omega);
        let torque = match self.estimator.alpha() {
            Some(alpha) => kinematics::torque_from_alpha(alpha, self.inertia),
            None => {
                debug!(
                    time_s = sample.time_s,
                    window = self.estimator.len(),
                    "acceleration undefined, holding torque"
                );
                self.last_torque
            }
        };
        let power = kinematics::power_w(omega, torque);

        let torque = self.torque_filter.accept(torque);
        let power = self.power_filter.accept(power);
        self.last_torque = torque;

        // The gate records the computed speed, then decides whether the
        // published speed/rpm are forced to zero.
        let gated = self.zero_floor.update(sample.time_s, speed_kmh);
        let (rpm, speed_kmh) = if gated { (0.0, 0.0) } else { (rpm, speed_kmh) };

        let reading = Reading {
            rpm,
            speed_kmh,
            torque_nm: torque,
            power_w: power,
        };
        self.store.publish(reading);
        self.samples_processed += 1;
        Some(reading)
    }

    /// Watchdog check, driven by a fixed tick independent of sample arrival.
    ///
    /// Flips Live→Stalled when no sample has arrived within the stop timeout,
    /// publishing the all-zero reading and resetting every windowed estimate
    /// (a data gap invalidates them). Returns true when a stall occurred.
    pub fn tick(&mut self, now_s: f64) -> bool {
        if self.link != LinkState::Live {
            return false;
        }
        let stalled = match self.last_sample_time {
            Some(t) => now_s - t > self.stop_timeout_s,
            None => now_s > self.stop_timeout_s,
        };
        if stalled {
            self.stall(now_s);
        }
        stalled
    }

    fn stall(&mut self, now_s: f64) {
        warn!(
            time_s = now_s,
            timeout_s = self.stop_timeout_s,
            "No samples within stop timeout — Stalled, zeroing outputs"
        );
        self.link = LinkState::Stalled;
        self.stalls += 1;
        self.estimator.reset();
        self.zero_floor.reset();
        self.torque_filter.reset();
        self.power_filter.reset();
        self.last_torque = 0.0;
        self.store.publish(Reading::ZERO);
    }

    pub fn link_state(&self) -> LinkState {
        self.link
    }

    pub fn stats(&self) -> ControllerStats {
        ControllerStats {
            samples_processed: self.samples_processed,
            samples_discarded: self.samples_discarded,
            outliers_rejected: self.torque_filter.rejected() + self.power_filter.rejected(),
            stalls: self.stalls,
        }
    }
}
