//! Processing Pipeline Module
//!
//! ```text
//! SampleSource ──▶ ProcessingLoop ──▶ PipelineController
//!                     │                    │
//!                     │ watchdog tick      ├─ kinematics (period → rpm/speed/ω)
//!                     └─ stall check       ├─ AccelerationEstimator (α → torque)
//!                                          ├─ OutlierFilter (torque, power)
//!                                          ├─ ZeroFloorDetector (speed/rpm)
//!                                          └─ ReadingStore (atomic publish)
//! ```
//!
//! One ingestion task owns all mutable filter state; readers take lock-free
//! snapshots of the latest [`Reading`](crate::types::Reading) or subscribe to
//! the push channel.

mod controller;
pub mod processing_loop;
pub mod source;
mod state;

pub use controller::{ControllerStats, PipelineController};
pub use processing_loop::{PipelineStats, ProcessingLoop};
pub use state::{AppState, ReadingStore};
