//! Dyno Configuration Module
//!
//! Provides run configuration loaded from TOML files, replacing all
//! hardcoded physical constants and thresholds with operator-tunable values.
//!
//! ## Loading Order
//!
//! 1. `ROLLERDYNO_CONFIG` environment variable (path to TOML file)
//! 2. `rollerdyno.toml` in the current working directory
//! 3. Built-in defaults (matching the original bench constants)
//!
//! ## Usage
//!
//! Call `config::init()` once at startup, then `config::get()` anywhere:
//!
//! ```ignore
//! // In main():
//! config::init(DynoConfig::load());
//!
//! // Anywhere in the codebase:
//! let window = config::get().physics.window_s;
//! ```

pub mod defaults;
mod dyno_config;

pub use dyno_config::*;

use std::sync::OnceLock;

/// Global dyno configuration, initialized once at startup.
static DYNO_CONFIG: OnceLock<DynoConfig> = OnceLock::new();

/// Initialize the global dyno configuration.
///
/// Must be called exactly once before any calls to `get()`.
pub fn init(config: DynoConfig) {
    if DYNO_CONFIG.set(config).is_err() {
        tracing::warn!("config::init() called more than once — ignoring");
    }
}

/// Get a reference to the global dyno configuration.
///
/// Panics if `init()` has not been called. A missing config is a fatal
/// startup error, not a recoverable condition.
pub fn get() -> &'static DynoConfig {
    DYNO_CONFIG
        .get()
        .expect("config::get() called before config::init() — this is a startup bug")
}

/// Check whether the config has been initialized.
///
/// Useful for tests and optional config paths.
pub fn is_initialized() -> bool {
    DYNO_CONFIG.get().is_some()
}
