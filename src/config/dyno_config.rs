//! Dyno Configuration - bench constants and filter thresholds as
//! operator-tunable TOML values.
//!
//! Every struct implements `Default` with values matching the original bench
//! constants, ensuring zero-change behavior when no config file is present.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

// ============================================================================
// Top-Level Config
// ============================================================================

/// Root configuration for a bench run.
///
/// Load with `DynoConfig::load()` which searches:
/// 1. `$ROLLERDYNO_CONFIG` env var
/// 2. `./rollerdyno.toml`
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DynoConfig {
    /// Roller geometry
    #[serde(default)]
    pub roller: RollerConfig,

    /// Physical constants for torque estimation
    #[serde(default)]
    pub physics: PhysicsConfig,

    /// Pipeline timing
    #[serde(default)]
    pub pipeline: PipelineConfig,

    /// Dynamic zeroing thresholds
    #[serde(default)]
    pub zero_floor: ZeroFloorConfig,

    /// Torque/power spike rejection
    #[serde(default)]
    pub outlier: OutlierConfig,

    /// HTTP server configuration
    #[serde(default)]
    pub server: ServerConfig,
}

impl Default for DynoConfig {
    fn default() -> Self {
        Self {
            roller: RollerConfig::default(),
            physics: PhysicsConfig::default(),
            pipeline: PipelineConfig::default(),
            zero_floor: ZeroFloorConfig::default(),
            outlier: OutlierConfig::default(),
            server: ServerConfig::default(),
        }
    }
}

impl DynoConfig {
    /// Load configuration using the standard search order:
    /// 1. `$ROLLERDYNO_CONFIG` environment variable
    /// 2. `./rollerdyno.toml` in the current working directory
    /// 3. Built-in defaults (original bench constants)
    pub fn load() -> Self {
        if let Ok(path) = std::env::var("ROLLERDYNO_CONFIG") {
            let p = PathBuf::from(&path);
            if p.exists() {
                match Self::load_from_file(&p) {
                    Ok(config) => {
                        info!(path = %p.display(), "Loaded dyno config from ROLLERDYNO_CONFIG");
                        return config;
                    }
                    Err(e) => {
                        warn!(path = %p.display(), error = %e, "Failed to load config from ROLLERDYNO_CONFIG, falling back");
                    }
                }
            } else {
                warn!(path = %path, "ROLLERDYNO_CONFIG points to non-existent file, falling back");
            }
        }

        let local = PathBuf::from("rollerdyno.toml");
        if local.exists() {
            match Self::load_from_file(&local) {
                Ok(config) => {
                    info!("Loaded dyno config from ./rollerdyno.toml");
                    return config;
                }
                Err(e) => {
                    warn!(error = %e, "Failed to load ./rollerdyno.toml, using defaults");
                }
            }
        }

        info!("No rollerdyno.toml found — using built-in defaults");
        Self::default()
    }

    /// Load from a specific TOML file path.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
        let config: Self = toml::from_str(&contents)
            .map_err(|e| ConfigError::Parse(path.to_path_buf(), e))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject configurations that would make the pipeline produce garbage
    /// (non-positive physical constants, inverted thresholds).
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut problems = Vec::new();

        if self.roller.circumference_m <= 0.0 {
            problems.push("roller.circumference_m must be > 0".to_string());
        }
        if self.physics.rotational_inertia <= 0.0 {
            problems.push("physics.rotational_inertia must be > 0".to_string());
        }
        if self.physics.window_s <= 0.0 {
            problems.push("physics.window_s must be > 0".to_string());
        }
        if self.pipeline.stop_timeout_s <= 0.0 {
            problems.push("pipeline.stop_timeout_s must be > 0".to_string());
        }
        if self.zero_floor.speed_thresh_kmh < 0.0 {
            problems.push("zero_floor.speed_thresh_kmh must be >= 0".to_string());
        }
        if self.zero_floor.duration_s <= 0.0 {
            problems.push("zero_floor.duration_s must be > 0".to_string());
        }
        if self.zero_floor.variation_thresh_kmh < 0.0 {
            problems.push("zero_floor.variation_thresh_kmh must be >= 0".to_string());
        }
        if self.outlier.max_torque_nm <= 0.0 {
            problems.push("outlier.max_torque_nm must be > 0".to_string());
        }
        if self.outlier.max_power_w <= 0.0 {
            problems.push("outlier.max_power_w must be > 0".to_string());
        }
        if self.outlier.factor <= 0.0 || self.outlier.factor > 1.0 {
            problems.push("outlier.factor must be in (0, 1]".to_string());
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Invalid(problems.join("; ")))
        }
    }
}

/// Configuration loading/validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {0}: {1}")]
    Io(PathBuf, #[source] std::io::Error),
    #[error("failed to parse config file {0}: {1}")]
    Parse(PathBuf, #[source] toml::de::Error),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

// ============================================================================
// Sections
// ============================================================================

/// Roller geometry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RollerConfig {
    /// Roller circumference in meters. Default matches a 60 mm roller.
    #[serde(default = "default_circumference_m")]
    pub circumference_m: f64,
}

fn default_circumference_m() -> f64 {
    // 60 mm diameter roller
    0.060 * std::f64::consts::PI
}

impl Default for RollerConfig {
    fn default() -> Self {
        Self {
            circumference_m: default_circumference_m(),
        }
    }
}

/// Physical constants for the torque estimate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhysicsConfig {
    /// Rotor moment of inertia J (kg·m²)
    #[serde(default = "default_inertia")]
    pub rotational_inertia: f64,
    /// Time window (s) for the angular-acceleration slope
    #[serde(default = "default_window_s")]
    pub window_s: f64,
}

fn default_inertia() -> f64 {
    0.002572
}

fn default_window_s() -> f64 {
    5.0
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            rotational_inertia: default_inertia(),
            window_s: default_window_s(),
        }
    }
}

/// Pipeline timing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// If no new sample for this many seconds, force all outputs to zero
    #[serde(default = "default_stop_timeout_s")]
    pub stop_timeout_s: f64,
}

fn default_stop_timeout_s() -> f64 {
    1.0
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            stop_timeout_s: default_stop_timeout_s(),
        }
    }
}

/// Dynamic zeroing thresholds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ZeroFloorConfig {
    /// Speeds below this (km/h) may be forced to zero
    #[serde(default = "default_zero_speed_thresh")]
    pub speed_thresh_kmh: f64,
    /// Duration (s) over which speed must stay low to zero
    #[serde(default = "default_zero_duration")]
    pub duration_s: f64,
    /// Allowed speed variation (km/h) to consider the roller stationary
    #[serde(default = "default_zero_variation")]
    pub variation_thresh_kmh: f64,
}

fn default_zero_speed_thresh() -> f64 {
    5.0
}

fn default_zero_duration() -> f64 {
    2.0
}

fn default_zero_variation() -> f64 {
    0.2
}

impl Default for ZeroFloorConfig {
    fn default() -> Self {
        Self {
            speed_thresh_kmh: default_zero_speed_thresh(),
            duration_s: default_zero_duration(),
            variation_thresh_kmh: default_zero_variation(),
        }
    }
}

/// Torque/power spike rejection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutlierConfig {
    /// Full-scale torque (Nm) for spike detection
    #[serde(default = "default_max_torque")]
    pub max_torque_nm: f64,
    /// Full-scale power (W) for spike detection
    #[serde(default = "default_max_power")]
    pub max_power_w: f64,
    /// Fraction of full scale allowed as a per-cycle jump
    #[serde(default = "default_outlier_factor")]
    pub factor: f64,
}

fn default_max_torque() -> f64 {
    2.0
}

fn default_max_power() -> f64 {
    50.0
}

fn default_outlier_factor() -> f64 {
    0.8
}

impl Default for OutlierConfig {
    fn default() -> Self {
        Self {
            max_torque_nm: default_max_torque(),
            max_power_w: default_max_power(),
            factor: default_outlier_factor(),
        }
    }
}

/// HTTP server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Bind address for the dashboard API
    #[serde(default = "default_server_addr")]
    pub addr: String,
}

fn default_server_addr() -> String {
    "0.0.0.0:8080".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: default_server_addr(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_match_bench_constants() {
        let cfg = DynoConfig::default();
        assert!((cfg.roller.circumference_m - 0.060 * std::f64::consts::PI).abs() < 1e-12);
        assert!((cfg.physics.rotational_inertia - 0.002572).abs() < 1e-12);
        assert_eq!(cfg.physics.window_s, 5.0);
        assert_eq!(cfg.pipeline.stop_timeout_s, 1.0);
        assert_eq!(cfg.zero_floor.speed_thresh_kmh, 5.0);
        assert_eq!(cfg.zero_floor.duration_s, 2.0);
        assert_eq!(cfg.zero_floor.variation_thresh_kmh, 0.2);
        assert_eq!(cfg.outlier.max_torque_nm, 2.0);
        assert_eq!(cfg.outlier.max_power_w, 50.0);
        assert_eq!(cfg.outlier.factor, 0.8);
        assert_eq!(cfg.server.addr, "0.0.0.0:8080");
    }

    #[test]
    fn test_defaults_validate() {
        assert!(DynoConfig::default().validate().is_ok());
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let toml_str = r#"
            [physics]
            rotational_inertia = 0.004

            [zero_floor]
            speed_thresh_kmh = 2.5
        "#;
        let cfg: DynoConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(cfg.physics.rotational_inertia, 0.004);
        // Unset key in a present section still defaults.
        assert_eq!(cfg.physics.window_s, 5.0);
        assert_eq!(cfg.zero_floor.speed_thresh_kmh, 2.5);
        // Absent sections default entirely.
        assert_eq!(cfg.outlier.max_power_w, 50.0);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[roller]").unwrap();
        writeln!(file, "circumference_m = 0.25").unwrap();
        writeln!(file, "[server]").unwrap();
        writeln!(file, "addr = \"127.0.0.1:9000\"").unwrap();
        file.flush().unwrap();

        let cfg = DynoConfig::load_from_file(file.path()).unwrap();
        assert_eq!(cfg.roller.circumference_m, 0.25);
        assert_eq!(cfg.server.addr, "127.0.0.1:9000");
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut cfg = DynoConfig::default();
        cfg.physics.rotational_inertia = 0.0;
        assert!(matches!(cfg.validate(), Err(ConfigError::Invalid(_))));

        let mut cfg = DynoConfig::default();
        cfg.outlier.factor = 1.5;
        assert!(cfg.validate().is_err());

        let mut cfg = DynoConfig::default();
        cfg.roller.circumference_m = -1.0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_load_from_file_rejects_invalid() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[pipeline]").unwrap();
        writeln!(file, "stop_timeout_s = 0.0").unwrap();
        file.flush().unwrap();

        assert!(DynoConfig::load_from_file(file.path()).is_err());
    }
}
