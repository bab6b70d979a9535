//! Posture Configuration Module
//!
//! Session settings loaded from TOML: thresholds, hysteresis, warning
//! schedule, stabilization, detection confidence and the server address.
//!
//! ## Loading Order
//!
//! 1. `POSTURE_CONFIG` environment variable (path to TOML file)
//! 2. `posture_config.toml` in the current working directory
//! 3. Built-in defaults
//!
//! ## Usage
//!
//! Call `config::init()` once at startup, then `config::get()` anywhere:
//!
//! ```ignore
//! // In main():
//! config::init(PostureConfig::load());
//!
//! // Anywhere in the codebase:
//! let roll = config::get().thresholds.roll_deg;
//! ```

pub mod defaults;
mod posture_config;
pub mod sensitivity;
pub mod validation;

pub use posture_config::*;
pub use sensitivity::SensitivityLevels;

use std::sync::OnceLock;

/// Global posture configuration, initialized once at startup.
static POSTURE_CONFIG: OnceLock<PostureConfig> = OnceLock::new();

/// Initialize the global configuration. Later calls are ignored.
pub fn init(config: PostureConfig) {
    if POSTURE_CONFIG.set(config).is_err() {
        tracing::warn!("config::init() called more than once, ignoring");
    }
}

/// The global configuration.
///
/// Panics if `init()` has not been called: a missing config is a startup
/// bug, not a recoverable condition.
#[allow(clippy::expect_used)]
pub fn get() -> &'static PostureConfig {
    POSTURE_CONFIG
        .get()
        .expect("config::get() called before config::init(), this is a startup bug")
}

pub fn is_initialized() -> bool {
    POSTURE_CONFIG.get().is_some()
}
