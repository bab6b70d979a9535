//! Built-in default values.
//!
//! Grouped by config section. These are what a missing key or a missing
//! config file resolves to.

// ============================================================================
// Config file discovery
// ============================================================================

/// Environment variable naming a config file.
pub const CONFIG_ENV_VAR: &str = "POSTURE_CONFIG";

/// Config file looked up in the working directory.
pub const LOCAL_CONFIG_FILE: &str = "posture_config.toml";

// ============================================================================
// [thresholds]
// ============================================================================

pub const PITCH_THRESHOLD_DEG: f64 = -10.0;
pub const DISTANCE_THRESHOLD_CM: f64 = 10.0;
pub const ROLL_THRESHOLD_DEG: f64 = 15.0;
pub const SHOULDER_TILT_THRESHOLD_DEG: f64 = 10.0;

// ============================================================================
// [hysteresis]
// ============================================================================

/// Exit margins: enter at -10° / 10 cm / 15° / 10°, exit at -8° / 8 cm / 12° / 8°.
pub const HYSTERESIS_PITCH_DEG: f64 = 2.0;
pub const HYSTERESIS_DISTANCE_CM: f64 = 2.0;
pub const HYSTERESIS_ROLL_DEG: f64 = 3.0;
pub const HYSTERESIS_SHOULDER_TILT_DEG: f64 = 2.0;

// ============================================================================
// [warning]
// ============================================================================

/// Seconds into a bad run before the first warning.
pub const INITIAL_WARNING_SECS: u64 = 5;

/// Seconds between repeated warnings after the first.
pub const REPEAT_INTERVAL_SECS: u64 = 20;

// ============================================================================
// [stability]
// ============================================================================

/// 1 = no smoothing. Deployed desktop clients ran with 5.
pub const SMOOTHING_WINDOW: usize = 1;

/// 1 = no debouncing. Deployed desktop clients ran with 2 / 3.
pub const GOOD_TO_BAD_FRAMES: u32 = 1;
pub const BAD_TO_GOOD_FRAMES: u32 = 1;

/// Debounce counters restart after a gap this long between frames.
pub const STALE_GAP_SECS: f64 = 1.0;

// ============================================================================
// [detection] / [server]
// ============================================================================

pub const MIN_SHOULDER_VISIBILITY: f64 = 0.4;

pub const SERVER_ADDR: &str = "127.0.0.1:8765";

/// Outbound websocket message queue per connection.
pub const WS_OUTBOUND_BUFFER: usize = 64;
