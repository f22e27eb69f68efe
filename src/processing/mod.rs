//! Signal conditioning for the dyno pipeline.
//!
//! Three stateful filters sit between the raw kinematic conversions and the
//! published reading:
//!
//! - [`AccelerationEstimator`] - sliding-window angular-acceleration slope
//! - [`ZeroFloorDetector`] - forced-zero gate for sustained low-speed jitter
//! - [`OutlierFilter`] - torque/power spike suppression

mod acceleration;
mod outlier;
mod zero_floor;

pub use acceleration::AccelerationEstimator;
pub use outlier::OutlierFilter;
pub use zero_floor::ZeroFloorDetector;
