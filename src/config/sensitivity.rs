//! 1-5 sensitivity scale per posture dimension.
//!
//! Level 3 is the default threshold set. Higher levels flag smaller
//! deviations. Out-of-range levels are clamped into 1-5.

use serde::{Deserialize, Serialize};

use crate::types::Thresholds;

pub const MIN_LEVEL: u8 = 1;
pub const MAX_LEVEL: u8 = 5;
pub const DEFAULT_LEVEL: u8 = 3;

const PITCH_BY_LEVEL: [f64; 5] = [-20.0, -15.0, -10.0, -7.0, -5.0];
const DISTANCE_BY_LEVEL: [f64; 5] = [20.0, 15.0, 10.0, 7.0, 5.0];
const ROLL_BY_LEVEL: [f64; 5] = [25.0, 20.0, 15.0, 10.0, 7.0];
const SHOULDER_TILT_BY_LEVEL: [f64; 5] = [20.0, 15.0, 10.0, 7.0, 5.0];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SensitivityLevels {
    #[serde(default = "default_level")]
    pub pitch: u8,
    #[serde(default = "default_level")]
    pub distance: u8,
    #[serde(default = "default_level")]
    pub roll: u8,
    #[serde(default = "default_level")]
    pub shoulder_tilt: u8,
}

fn default_level() -> u8 {
    DEFAULT_LEVEL
}

impl Default for SensitivityLevels {
    fn default() -> Self {
        Self::uniform(DEFAULT_LEVEL)
    }
}

fn lookup(table: &[f64; 5], level: u8) -> f64 {
    table[usize::from(level.clamp(MIN_LEVEL, MAX_LEVEL) - MIN_LEVEL)]
}

impl SensitivityLevels {
    pub fn uniform(level: u8) -> Self {
        Self {
            pitch: level,
            distance: level,
            roll: level,
            shoulder_tilt: level,
        }
    }

    pub fn to_thresholds(&self) -> Thresholds {
        Thresholds {
            pitch: lookup(&PITCH_BY_LEVEL, self.pitch),
            distance: lookup(&DISTANCE_BY_LEVEL, self.distance),
            roll: lookup(&ROLL_BY_LEVEL, self.roll),
            shoulder_tilt: lookup(&SHOULDER_TILT_BY_LEVEL, self.shoulder_tilt),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_three_is_default_thresholds() {
        assert_eq!(
            SensitivityLevels::default().to_thresholds(),
            Thresholds::default()
        );
    }

    #[test]
    fn test_out_of_range_levels_clamp() {
        assert_eq!(
            SensitivityLevels::uniform(0).to_thresholds(),
            SensitivityLevels::uniform(1).to_thresholds()
        );
        assert_eq!(
            SensitivityLevels::uniform(9).to_thresholds(),
            SensitivityLevels::uniform(5).to_thresholds()
        );
    }

    #[test]
    fn test_higher_level_is_stricter() {
        for level in MIN_LEVEL..MAX_LEVEL {
            let loose = SensitivityLevels::uniform(level).to_thresholds();
            let strict = SensitivityLevels::uniform(level + 1).to_thresholds();
            assert!(strict.pitch > loose.pitch);
            assert!(strict.distance < loose.distance);
            assert!(strict.roll < loose.roll);
            assert!(strict.shoulder_tilt < loose.shoulder_tilt);
        }
    }

    #[test]
    fn test_partial_json_uses_default_level() {
        let levels: SensitivityLevels = serde_json::from_str(r#"{"pitch": 5}"#).unwrap();
        assert_eq!(levels.pitch, 5);
        assert_eq!(levels.roll, DEFAULT_LEVEL);
    }
}
