//! rollerdyno: real-time roller dynamometer telemetry.
//!
//! Turns noisy, irregularly-timed revolution periods from a Hall-effect
//! sensor into stable RPM, speed, torque, and power readings.
//!
//! ## Architecture
//!
//! - **Acquisition**: sensor CSV wire-format parsing
//! - **Kinematics**: pure period/RPM/speed/torque/power conversions
//! - **Processing**: acceleration window, zero-floor gate, outlier filters
//! - **Pipeline**: per-sample orchestration, stall watchdog, atomic publish
//! - **API**: axum dashboard endpoints (poll + WebSocket push)

pub mod acquisition;
pub mod api;
pub mod config;
pub mod kinematics;
pub mod pipeline;
pub mod processing;
pub mod sim;
pub mod types;

// Re-export run configuration
pub use config::DynoConfig;

// Re-export commonly used types
pub use types::{KinematicSample, LinkState, RawSample, Reading};

// Re-export pipeline components
pub use pipeline::{AppState, PipelineController, ProcessingLoop, ReadingStore};

// Re-export processing filters
pub use processing::{AccelerationEstimator, OutlierFilter, ZeroFloorDetector};
