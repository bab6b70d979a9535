//! Config validation: unknown-key detection with Levenshtein suggestions
//! and range checks.
//!
//! Unknown keys are found by walking the raw `toml::Value` tree before serde
//! sees it and comparing every dotted path against the known set. They only
//! ever produce warnings, so an older or hand-edited file still loads.

use std::collections::HashSet;

use super::PostureConfig;

/// Largest edit distance for which a correction is suggested.
const MAX_SUGGESTION_DISTANCE: usize = 3;

/// A non-fatal config warning (typo, suspicious value).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationWarning {
    pub field: String,
    pub message: String,
    pub suggestion: Option<String>,
}

impl std::fmt::Display for ValidationWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)?;
        if let Some(ref s) = self.suggestion {
            write!(f, " (did you mean '{s}'?)")?;
        }
        Ok(())
    }
}

// ============================================================================
// Known Config Keys
// ============================================================================

/// Every valid dotted key path in `PostureConfig`.
///
/// Kept by hand in step with `posture_config.rs`.
pub fn known_config_keys() -> HashSet<&'static str> {
    [
        "thresholds",
        "thresholds.pitch_deg",
        "thresholds.distance_cm",
        "thresholds.roll_deg",
        "thresholds.shoulder_tilt_deg",
        "hysteresis",
        "hysteresis.enabled",
        "hysteresis.pitch_deg",
        "hysteresis.distance_cm",
        "hysteresis.roll_deg",
        "hysteresis.shoulder_tilt_deg",
        "warning",
        "warning.initial_warning_secs",
        "warning.repeat_interval_secs",
        "stability",
        "stability.smoothing_window",
        "stability.good_to_bad_frames",
        "stability.bad_to_good_frames",
        "stability.stale_gap_secs",
        "detection",
        "detection.min_shoulder_visibility",
        "server",
        "server.addr",
    ]
    .into_iter()
    .collect()
}

// ============================================================================
// TOML Key Walking
// ============================================================================

/// All dotted key paths in a TOML tree, tables included.
///
/// `{ a = { b = 1, c = 2 } }` yields `["a", "a.b", "a.c"]`.
pub fn walk_toml_keys(value: &toml::Value, prefix: &str) -> Vec<String> {
    let Some(table) = value.as_table() else {
        return Vec::new();
    };
    let mut keys = Vec::with_capacity(table.len());
    for (k, v) in table {
        let path = if prefix.is_empty() {
            k.clone()
        } else {
            format!("{prefix}.{k}")
        };
        if v.is_table() {
            let nested = walk_toml_keys(v, &path);
            keys.push(path);
            keys.extend(nested);
        } else {
            keys.push(path);
        }
    }
    keys
}

// ============================================================================
// Suggestions
// ============================================================================

/// Levenshtein edit distance, two-row form.
fn levenshtein(a: &str, b: &str) -> usize {
    let b_chars: Vec<char> = b.chars().collect();
    let mut prev: Vec<usize> = (0..=b_chars.len()).collect();
    let mut curr = vec![0; b_chars.len() + 1];

    for (i, ca) in a.chars().enumerate() {
        curr[0] = i + 1;
        for (j, &cb) in b_chars.iter().enumerate() {
            let substitution = prev[j] + usize::from(ca != cb);
            curr[j + 1] = substitution.min(prev[j + 1] + 1).min(curr[j] + 1);
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b_chars.len()]
}

/// Closest known key within `MAX_SUGGESTION_DISTANCE` edits, ties broken
/// alphabetically so the suggestion is stable.
pub fn suggest_correction(unknown: &str, known: &HashSet<&str>) -> Option<String> {
    known
        .iter()
        .map(|&k| (levenshtein(unknown, k), k))
        .filter(|&(d, _)| d <= MAX_SUGGESTION_DISTANCE)
        .min()
        .map(|(_, k)| k.to_string())
}

// ============================================================================
// Unknown Key Validation
// ============================================================================

/// Warnings for keys in `raw_toml` that no config field reads.
///
/// Unparseable input yields no warnings; serde reports the parse error.
pub fn validate_unknown_keys(raw_toml: &str) -> Vec<ValidationWarning> {
    let Ok(value) = raw_toml.parse::<toml::Value>() else {
        return Vec::new();
    };

    let known = known_config_keys();
    walk_toml_keys(&value, "")
        .into_iter()
        .filter(|key| !known.contains(key.as_str()))
        .map(|key| ValidationWarning {
            suggestion: suggest_correction(&key, &known),
            message: format!("Unknown config key '{key}'"),
            field: key,
        })
        .collect()
}

// ============================================================================
// Range Validation
// ============================================================================

/// Range checks on a parsed config.
///
/// Returns (errors, warnings): errors are values the pipeline cannot run
/// with; warnings are legal but probably not what the user meant.
pub fn validate_ranges(config: &PostureConfig) -> (Vec<String>, Vec<ValidationWarning>) {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    let t = &config.thresholds;
    let h = &config.hysteresis;
    let floats = [
        ("thresholds.pitch_deg", t.pitch_deg),
        ("thresholds.distance_cm", t.distance_cm),
        ("thresholds.roll_deg", t.roll_deg),
        ("thresholds.shoulder_tilt_deg", t.shoulder_tilt_deg),
        ("hysteresis.pitch_deg", h.pitch_deg),
        ("hysteresis.distance_cm", h.distance_cm),
        ("hysteresis.roll_deg", h.roll_deg),
        ("hysteresis.shoulder_tilt_deg", h.shoulder_tilt_deg),
        ("stability.stale_gap_secs", config.stability.stale_gap_secs),
        (
            "detection.min_shoulder_visibility",
            config.detection.min_shoulder_visibility,
        ),
    ];
    // NaN/Inf slip through every comparison below, so reject them first
    let non_finite: Vec<&str> = floats
        .iter()
        .filter(|(_, v)| !v.is_finite())
        .map(|(name, _)| *name)
        .collect();
    for name in &non_finite {
        errors.push(format!("{name}: value must be finite"));
    }
    if !non_finite.is_empty() {
        return (errors, warnings);
    }

    // One-sided: only looking down counts, so the threshold sits below baseline
    if t.pitch_deg > 0.0 {
        errors.push(format!(
            "thresholds.pitch_deg = {:.1} must be <= 0 (degrees below baseline)",
            t.pitch_deg
        ));
    }
    for (name, value) in [
        ("thresholds.distance_cm", t.distance_cm),
        ("thresholds.roll_deg", t.roll_deg),
        ("thresholds.shoulder_tilt_deg", t.shoulder_tilt_deg),
        ("hysteresis.pitch_deg", h.pitch_deg),
        ("hysteresis.distance_cm", h.distance_cm),
        ("hysteresis.roll_deg", h.roll_deg),
        ("hysteresis.shoulder_tilt_deg", h.shoulder_tilt_deg),
    ] {
        if value < 0.0 {
            errors.push(format!("{name} = {value:.1} cannot be negative"));
        }
    }

    if config.warning.repeat_interval_secs == 0 {
        errors.push("warning.repeat_interval_secs must be > 0".to_string());
    }
    let s = &config.stability;
    if s.smoothing_window == 0 {
        errors.push("stability.smoothing_window must be > 0".to_string());
    }
    if s.good_to_bad_frames == 0 {
        errors.push("stability.good_to_bad_frames must be > 0".to_string());
    }
    if s.bad_to_good_frames == 0 {
        errors.push("stability.bad_to_good_frames must be > 0".to_string());
    }
    if s.stale_gap_secs <= 0.0 {
        errors.push(format!(
            "stability.stale_gap_secs = {:.2} must be > 0",
            s.stale_gap_secs
        ));
    }

    let vis = config.detection.min_shoulder_visibility;
    if !(0.0..=1.0).contains(&vis) {
        errors.push(format!(
            "detection.min_shoulder_visibility = {vis:.2} must be within 0.0-1.0"
        ));
    }

    if config.server.addr.parse::<std::net::SocketAddr>().is_err() {
        errors.push(format!(
            "server.addr = '{}' is not a valid socket address",
            config.server.addr
        ));
    }

    // Hysteresis margins at or past the threshold would never let an issue clear
    if h.enabled {
        for (name, margin, threshold) in [
            ("pitch_deg", h.pitch_deg, t.pitch_deg.abs()),
            ("distance_cm", h.distance_cm, t.distance_cm),
            ("roll_deg", h.roll_deg, t.roll_deg),
            ("shoulder_tilt_deg", h.shoulder_tilt_deg, t.shoulder_tilt_deg),
        ] {
            if margin >= threshold && threshold > 0.0 {
                warnings.push(ValidationWarning {
                    field: format!("hysteresis.{name}"),
                    message: format!(
                        "hysteresis.{name} = {margin:.1} is not smaller than its threshold ({threshold:.1})"
                    ),
                    suggestion: None,
                });
            }
        }
    }

    if s.smoothing_window > 30 {
        warnings.push(ValidationWarning {
            field: "stability.smoothing_window".to_string(),
            message: format!(
                "stability.smoothing_window = {} adds about a second of lag at 30 fps",
                s.smoothing_window
            ),
            suggestion: None,
        });
    }

    if config.warning.initial_warning_secs == 0 {
        warnings.push(ValidationWarning {
            field: "warning.initial_warning_secs".to_string(),
            message: "warning.initial_warning_secs = 0 warns on the first bad frame".to_string(),
            suggestion: None,
        });
    }

    (errors, warnings)
}
