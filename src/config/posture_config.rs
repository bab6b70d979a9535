//! Posture Configuration - TOML-backed session settings
//!
//! Every section and field is optional in the file; anything missing takes
//! the value from `defaults.rs`.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

use super::defaults;
use crate::classifier::Hysteresis;
use crate::types::Thresholds;
use crate::warning::WarningSchedule;

/// Root configuration.
///
/// Load with `PostureConfig::load()` which searches:
/// 1. `$POSTURE_CONFIG` env var
/// 2. `./posture_config.toml`
/// 3. Built-in defaults
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PostureConfig {
    /// Classification thresholds applied to baseline-adjusted measurements
    #[serde(default)]
    pub thresholds: ThresholdConfig,

    /// Relaxed exit thresholds for issues that are already active
    #[serde(default)]
    pub hysteresis: HysteresisConfig,

    /// Warning schedule within a bad run
    #[serde(default)]
    pub warning: WarningConfig,

    /// Smoothing and debouncing between frames
    #[serde(default)]
    pub stability: StabilityConfig,

    /// Landmark confidence requirements
    #[serde(default)]
    pub detection: DetectionConfig,

    /// Websocket server
    #[serde(default)]
    pub server: ServerConfig,
}

impl PostureConfig {
    /// Load configuration using the standard search order:
    /// 1. `$POSTURE_CONFIG` environment variable
    /// 2. `./posture_config.toml` in the current working directory
    /// 3. Built-in defaults
    pub fn load() -> Self {
        if let Ok(path) = std::env::var(defaults::CONFIG_ENV_VAR) {
            let p = PathBuf::from(&path);
            if p.exists() {
                match Self::load_from_file(&p) {
                    Ok(config) => {
                        info!(path = %p.display(), "Loaded posture config from {}", defaults::CONFIG_ENV_VAR);
                        return config;
                    }
                    Err(e) => {
                        warn!(path = %p.display(), error = %e, "Failed to load config from {}, falling back", defaults::CONFIG_ENV_VAR);
                    }
                }
            } else {
                warn!(path = %path, "{} points to non-existent file, falling back", defaults::CONFIG_ENV_VAR);
            }
        }

        let local = PathBuf::from(defaults::LOCAL_CONFIG_FILE);
        if local.exists() {
            match Self::load_from_file(&local) {
                Ok(config) => {
                    info!("Loaded posture config from ./{}", defaults::LOCAL_CONFIG_FILE);
                    return config;
                }
                Err(e) => {
                    warn!(error = %e, "Failed to load ./{}, using defaults", defaults::LOCAL_CONFIG_FILE);
                }
            }
        }

        info!("No {} found, using built-in defaults", defaults::LOCAL_CONFIG_FILE);
        Self::default()
    }

    /// Load from a specific TOML file path.
    ///
    /// Unknown keys are logged as warnings (with a suggested correction when
    /// one is close) and never fail the load.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;

        for w in super::validation::validate_unknown_keys(&contents) {
            warn!("{}", w);
        }

        let config: Self =
            toml::from_str(&contents).map_err(|e| ConfigError::Parse(path.to_path_buf(), e))?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(ConfigError::Serialize)
    }

    /// Hard errors fail validation; suspicious values are only logged.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let (errors, warnings) = super::validation::validate_ranges(self);
        for w in &warnings {
            warn!("{}", w);
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(errors))
        }
    }
}

// ============================================================================
// Error Type
// ============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Config I/O error ({}): {}", .0.display(), .1)]
    Io(PathBuf, std::io::Error),

    #[error("Config parse error ({}): {}", .0.display(), .1)]
    Parse(PathBuf, toml::de::Error),

    #[error("Config serialization error: {0}")]
    Serialize(toml::ser::Error),

    #[error("Config validation failed:\n  - {}", .0.join("\n  - "))]
    Validation(Vec<String>),
}

// ============================================================================
// [thresholds]
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThresholdConfig {
    /// Adjusted pitch below this is "head tilted down" (deg, <= 0)
    #[serde(default = "default_pitch_deg")]
    pub pitch_deg: f64,
    /// Moving this much closer than baseline is "leaning forward" (cm)
    #[serde(default = "default_distance_cm")]
    pub distance_cm: f64,
    /// Absolute adjusted roll above this is "head tilted sideways" (deg)
    #[serde(default = "default_roll_deg")]
    pub roll_deg: f64,
    /// Absolute adjusted shoulder tilt above this is "shoulders uneven" (deg)
    #[serde(default = "default_shoulder_tilt_deg")]
    pub shoulder_tilt_deg: f64,
}

fn default_pitch_deg() -> f64 { defaults::PITCH_THRESHOLD_DEG }
fn default_distance_cm() -> f64 { defaults::DISTANCE_THRESHOLD_CM }
fn default_roll_deg() -> f64 { defaults::ROLL_THRESHOLD_DEG }
fn default_shoulder_tilt_deg() -> f64 { defaults::SHOULDER_TILT_THRESHOLD_DEG }

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self {
            pitch_deg: default_pitch_deg(),
            distance_cm: default_distance_cm(),
            roll_deg: default_roll_deg(),
            shoulder_tilt_deg: default_shoulder_tilt_deg(),
        }
    }
}

impl ThresholdConfig {
    pub fn to_thresholds(&self) -> Thresholds {
        Thresholds {
            pitch: self.pitch_deg,
            distance: self.distance_cm,
            roll: self.roll_deg,
            shoulder_tilt: self.shoulder_tilt_deg,
        }
    }
}

// ============================================================================
// [hysteresis]
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HysteresisConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_hysteresis_pitch")]
    pub pitch_deg: f64,
    #[serde(default = "default_hysteresis_distance")]
    pub distance_cm: f64,
    #[serde(default = "default_hysteresis_roll")]
    pub roll_deg: f64,
    #[serde(default = "default_hysteresis_shoulder")]
    pub shoulder_tilt_deg: f64,
}

fn default_hysteresis_pitch() -> f64 { defaults::HYSTERESIS_PITCH_DEG }
fn default_hysteresis_distance() -> f64 { defaults::HYSTERESIS_DISTANCE_CM }
fn default_hysteresis_roll() -> f64 { defaults::HYSTERESIS_ROLL_DEG }
fn default_hysteresis_shoulder() -> f64 { defaults::HYSTERESIS_SHOULDER_TILT_DEG }

impl Default for HysteresisConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            pitch_deg: default_hysteresis_pitch(),
            distance_cm: default_hysteresis_distance(),
            roll_deg: default_hysteresis_roll(),
            shoulder_tilt_deg: default_hysteresis_shoulder(),
        }
    }
}

impl HysteresisConfig {
    /// `None` when disabled.
    pub fn to_hysteresis(&self) -> Option<Hysteresis> {
        self.enabled.then_some(Hysteresis {
            pitch: self.pitch_deg,
            distance: self.distance_cm,
            roll: self.roll_deg,
            shoulder_tilt: self.shoulder_tilt_deg,
        })
    }
}

// ============================================================================
// [warning]
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WarningConfig {
    #[serde(default = "default_initial_warning")]
    pub initial_warning_secs: u64,
    #[serde(default = "default_repeat_interval")]
    pub repeat_interval_secs: u64,
}

fn default_initial_warning() -> u64 { defaults::INITIAL_WARNING_SECS }
fn default_repeat_interval() -> u64 { defaults::REPEAT_INTERVAL_SECS }

impl Default for WarningConfig {
    fn default() -> Self {
        Self {
            initial_warning_secs: default_initial_warning(),
            repeat_interval_secs: default_repeat_interval(),
        }
    }
}

impl WarningConfig {
    pub fn schedule(&self) -> WarningSchedule {
        WarningSchedule {
            initial_secs: self.initial_warning_secs,
            repeat_secs: self.repeat_interval_secs,
        }
    }
}

// ============================================================================
// [stability]
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StabilityConfig {
    /// Frames in the rolling median (1 = off)
    #[serde(default = "default_smoothing_window")]
    pub smoothing_window: usize,
    /// Consecutive bad frames needed to enter bad
    #[serde(default = "default_good_to_bad")]
    pub good_to_bad_frames: u32,
    /// Consecutive good frames needed to leave bad
    #[serde(default = "default_bad_to_good")]
    pub bad_to_good_frames: u32,
    /// Gap between frames after which debounce counters restart
    #[serde(default = "default_stale_gap")]
    pub stale_gap_secs: f64,
}

fn default_smoothing_window() -> usize { defaults::SMOOTHING_WINDOW }
fn default_good_to_bad() -> u32 { defaults::GOOD_TO_BAD_FRAMES }
fn default_bad_to_good() -> u32 { defaults::BAD_TO_GOOD_FRAMES }
fn default_stale_gap() -> f64 { defaults::STALE_GAP_SECS }

impl Default for StabilityConfig {
    fn default() -> Self {
        Self {
            smoothing_window: default_smoothing_window(),
            good_to_bad_frames: default_good_to_bad(),
            bad_to_good_frames: default_bad_to_good(),
            stale_gap_secs: default_stale_gap(),
        }
    }
}

// ============================================================================
// [detection]
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DetectionConfig {
    /// Shoulder landmarks below this visibility are ignored (0.0-1.0)
    #[serde(default = "default_min_shoulder_visibility")]
    pub min_shoulder_visibility: f64,
}

fn default_min_shoulder_visibility() -> f64 { defaults::MIN_SHOULDER_VISIBILITY }

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            min_shoulder_visibility: default_min_shoulder_visibility(),
        }
    }
}

// ============================================================================
// [server]
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_server_addr")]
    pub addr: String,
}

fn default_server_addr() -> String { defaults::SERVER_ADDR.to_string() }

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

    #[test]
    fn test_empty_file_is_all_defaults() {
        let config: PostureConfig = toml::from_str("").unwrap();
        assert_eq!(config, PostureConfig::default());
        assert_eq!(config.thresholds.to_thresholds(), Thresholds::default());
        assert!(config.hysteresis.to_hysteresis().is_none());
        assert_eq!(config.warning.schedule(), WarningSchedule::default());
        assert_eq!(config.server.addr, "127.0.0.1:8765");
    }

    #[test]
    fn test_partial_section_keeps_other_defaults() {
        let config: PostureConfig = toml::from_str(
            r#"
            [thresholds]
            roll_deg = 20.0

            [hysteresis]
            enabled = true
            "#,
        )
        .unwrap();
        assert_eq!(config.thresholds.roll_deg, 20.0);
        assert_eq!(config.thresholds.pitch_deg, -10.0);
        assert_eq!(
            config.hysteresis.to_hysteresis(),
            Some(Hysteresis::default())
        );
    }

    #[test]
    fn test_toml_round_trip() {
        let config = PostureConfig::default();
        let text = config.to_toml().unwrap();
        let back: PostureConfig = toml::from_str(&text).unwrap();
        assert_eq!(back, config);
    }

    #[test]
    fn test_defaults_validate() {
        assert!(PostureConfig::default().validate().is_ok());
    }
}
