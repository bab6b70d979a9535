//! Posture Classifier - measurements minus baseline versus thresholds
//!
//! `classify()` is the pure rule set. `PostureClassifier` wraps it with the
//! per-session state: the owned `Baseline`, the shared `ThresholdHandle`, and
//! the issues active on the previous frame (for hysteresis).
//!
//! | Issue | Bad when | Direction |
//! |---|---|---|
//! | `HeadPitchDown` | `pitch - base.pitch < t.pitch` | one-sided (down only) |
//! | `LeaningForward` | `base.distance - distance > t.distance` | one-sided (closer only) |
//! | `HeadRollSideways` | `abs(roll - base.roll) > t.roll` | symmetric |
//! | `ShoulderTiltUneven` | `abs(tilt - base.tilt) > t.shoulder_tilt` | symmetric |

use arc_swap::ArcSwap;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::info;

use crate::baseline::{Baseline, BaselineCalibrator, BaselineError};
use crate::types::{
    IssueKind, PoseMeasurement, PostureError, PostureVerdict, ThresholdError, Thresholds,
};

// ============================================================================
// Shared thresholds
// ============================================================================

/// Thresholds published by an external configuration call and read once per
/// classification. Writers swap in a fresh value; readers never block.
#[derive(Debug, Clone)]
pub struct ThresholdHandle {
    inner: Arc<ArcSwap<Thresholds>>,
}

impl Default for ThresholdHandle {
    fn default() -> Self {
        Self::new(Thresholds::default())
    }
}

impl ThresholdHandle {
    pub fn new(thresholds: Thresholds) -> Self {
        Self {
            inner: Arc::new(ArcSwap::from_pointee(thresholds)),
        }
    }

    pub fn load(&self) -> Thresholds {
        **self.inner.load()
    }

    /// Replace the thresholds. Any finite values are accepted.
    pub fn store(&self, thresholds: Thresholds) -> Result<(), ThresholdError> {
        thresholds.validate()?;
        self.inner.store(Arc::new(thresholds));
        Ok(())
    }
}

// ============================================================================
// Hysteresis
// ============================================================================

/// Exit margins. While an issue is active its threshold is moved toward the
/// baseline by the margin, so a reading hovering at the threshold does not
/// flicker between good and bad.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Hysteresis {
    pub pitch: f64,
    pub distance: f64,
    pub roll: f64,
    pub shoulder_tilt: f64,
}

impl Default for Hysteresis {
    fn default() -> Self {
        Self {
            pitch: 2.0,
            distance: 2.0,
            roll: 3.0,
            shoulder_tilt: 2.0,
        }
    }
}

impl Hysteresis {
    /// Thresholds to use given the issues active on the previous frame.
    ///
    /// A margin never carries a threshold past the baseline, so a reading
    /// equal to the baseline always clears the issue.
    pub fn relax(&self, t: &Thresholds, active: &BTreeSet<IssueKind>) -> Thresholds {
        let mut relaxed = *t;
        if active.contains(&IssueKind::HeadPitchDown) {
            relaxed.pitch = (t.pitch + self.pitch).min(t.pitch.max(0.0));
        }
        if active.contains(&IssueKind::LeaningForward) {
            relaxed.distance = toward_zero(t.distance, self.distance);
        }
        if active.contains(&IssueKind::HeadRollSideways) {
            relaxed.roll = toward_zero(t.roll, self.roll);
        }
        if active.contains(&IssueKind::ShoulderTiltUneven) {
            relaxed.shoulder_tilt = toward_zero(t.shoulder_tilt, self.shoulder_tilt);
        }
        relaxed
    }
}

/// Lower `threshold` by `margin`, stopping at zero. A threshold already at
/// or below zero is left as is.
fn toward_zero(threshold: f64, margin: f64) -> f64 {
    (threshold - margin).max(threshold.min(0.0))
}

// ============================================================================
// Rules
// ============================================================================

/// Classify one measurement.
///
/// Unknown without a baseline or without any face measurement. A dimension
/// missing this frame is skipped rather than counted good or bad.
pub fn classify(
    m: &PoseMeasurement,
    baseline: Option<&Baseline>,
    t: &Thresholds,
) -> PostureVerdict {
    let Some(base) = baseline else {
        return PostureVerdict::unknown();
    };
    if !m.has_face() {
        return PostureVerdict::unknown();
    }

    let mut issues = BTreeSet::new();
    if let Some(pitch) = m.pitch {
        if pitch - base.pitch < t.pitch {
            issues.insert(IssueKind::HeadPitchDown);
        }
    }
    if let Some(distance) = m.distance {
        if base.distance - distance > t.distance {
            issues.insert(IssueKind::LeaningForward);
        }
    }
    if let Some(roll) = m.roll {
        if (roll - base.roll).abs() > t.roll {
            issues.insert(IssueKind::HeadRollSideways);
        }
    }
    if let Some(tilt) = m.shoulder_tilt {
        if (tilt - base.shoulder_tilt).abs() > t.shoulder_tilt {
            issues.insert(IssueKind::ShoulderTiltUneven);
        }
    }
    PostureVerdict::from_issues(issues)
}

// ============================================================================
// Stateful classifier
// ============================================================================

#[derive(Debug, Clone, Default)]
pub struct PostureClassifier {
    baseline: Option<Baseline>,
    thresholds: ThresholdHandle,
    hysteresis: Option<Hysteresis>,
    active: BTreeSet<IssueKind>,
}

impl PostureClassifier {
    pub fn new(thresholds: ThresholdHandle) -> Self {
        Self {
            thresholds,
            ..Self::default()
        }
    }

    pub fn with_hysteresis(mut self, hysteresis: Hysteresis) -> Self {
        self.hysteresis = Some(hysteresis);
        self
    }

    pub fn baseline(&self) -> Option<&Baseline> {
        self.baseline.as_ref()
    }

    pub fn require_baseline(&self) -> Result<&Baseline, PostureError> {
        self.baseline.as_ref().ok_or(PostureError::NoBaseline)
    }

    pub fn thresholds(&self) -> &ThresholdHandle {
        &self.thresholds
    }

    /// Replace the baseline from `m`, or leave it untouched on failure.
    pub fn try_calibrate(
        &mut self,
        m: &PoseMeasurement,
        at: DateTime<Utc>,
    ) -> Result<&Baseline, BaselineError> {
        let baseline = BaselineCalibrator::capture(m, at)?;
        info!(
            pitch = baseline.pitch,
            roll = baseline.roll,
            distance = baseline.distance,
            shoulder_tilt = baseline.shoulder_tilt,
            "Baseline calibrated"
        );
        self.active.clear();
        let stored: &Baseline = self.baseline.insert(baseline);
        Ok(stored)
    }

    pub fn calibrate(&mut self, m: &PoseMeasurement, at: DateTime<Utc>) -> bool {
        self.try_calibrate(m, at).is_ok()
    }

    pub fn clear_baseline(&mut self) {
        self.baseline = None;
        self.active.clear();
    }

    /// Classify against the current thresholds snapshot.
    pub fn classify(&mut self, m: &PoseMeasurement) -> PostureVerdict {
        let snapshot = self.thresholds.load();
        let thresholds = match &self.hysteresis {
            Some(h) => h.relax(&snapshot, &self.active),
            None => snapshot,
        };
        let verdict = classify(m, self.baseline.as_ref(), &thresholds);
        self.active.clone_from(&verdict.issues);
        verdict
    }
}
