//! System-wide default constants.
//!
//! Centralises the non-tunable magic numbers. Operator-tunable values live in
//! [`DynoConfig`](super::DynoConfig) instead.

// ============================================================================
// Pipeline
// ============================================================================

/// Minimum time span (seconds) between the oldest and newest window sample
/// before the acceleration slope is considered defined.
pub const MIN_SLOPE_SPAN_S: f64 = 1e-3;

/// Watchdog tick interval (ms) for stall detection.
///
/// Runs independently of sample arrival — the absence of samples is itself
/// the signal. Four ticks fit inside the default 1 s stop timeout.
pub const WATCHDOG_TICK_MS: u64 = 250;

// ============================================================================
// Synthetic Sensor
// ============================================================================

/// Frame emission interval (ms) for the synthetic sensor (~20 Hz, matching a
/// typical bench data rate).
pub const SYNTHETIC_FRAME_INTERVAL_MS: u64 = 50;

/// Probability that a synthetic frame carries an injected period glitch,
/// used to exercise the outlier filter in demos.
pub const SYNTHETIC_GLITCH_PROBABILITY: f64 = 0.01;

// ============================================================================
// Replay
// ============================================================================

/// Upper bound (seconds) on a single replay inter-frame delay, so a capture
/// with a clock jump does not hang the replay.
pub const REPLAY_MAX_DELAY_S: f64 = 5.0;
