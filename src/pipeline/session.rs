//! One monitoring session: the full per-frame pipeline plus its state.
//!
//! ```text
//! FrameInput ─▶ PoseEstimator ─▶ SmoothingFilter ─▶ PostureClassifier
//!                                                        │ (verdict)
//!                                    StateDebouncer ◀────┘
//!                                        │ (stable status)
//!                                        ▼
//!                              WarningStateMachine ─▶ FrameResult
//! ```
//!
//! Mutating methods take `&mut self`; frames for one session are processed
//! strictly in order by its owner (one `ProcessingLoop` task per connection).

use chrono::{DateTime, Utc};
use std::collections::BTreeSet;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::baseline::{Baseline, BaselineError};
use crate::classifier::{Hysteresis, PostureClassifier, ThresholdHandle};
use crate::config::{self, PostureConfig, SensitivityLevels};
use crate::estimation::PoseEstimator;
use crate::protocol::{ClientMessage, ServerMessage};
use crate::stability::{SmoothingFilter, StateDebouncer, TransitionProgress};
use crate::types::{
    FrameInput, FrameResult, IssueKind, PoseMeasurement, PostureError, PostureStatistics,
    PostureStatus, ThresholdError, Thresholds,
};
use crate::warning::{WarningSchedule, WarningStateMachine};

// ============================================================================
// Settings
// ============================================================================

/// Everything a session needs from configuration, resolved once at creation.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSettings {
    pub thresholds: Thresholds,
    pub hysteresis: Option<Hysteresis>,
    pub schedule: WarningSchedule,
    pub smoothing_window: usize,
    pub good_to_bad_frames: u32,
    pub bad_to_good_frames: u32,
    pub stale_gap_secs: f64,
    pub min_shoulder_visibility: f64,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self::from_config(&PostureConfig::default())
    }
}

impl SessionSettings {
    pub fn from_config(config: &PostureConfig) -> Self {
        Self {
            thresholds: config.thresholds.to_thresholds(),
            hysteresis: config.hysteresis.to_hysteresis(),
            schedule: config.warning.schedule(),
            smoothing_window: config.stability.smoothing_window,
            good_to_bad_frames: config.stability.good_to_bad_frames,
            bad_to_good_frames: config.stability.bad_to_good_frames,
            stale_gap_secs: config.stability.stale_gap_secs,
            min_shoulder_visibility: config.detection.min_shoulder_visibility,
        }
    }

    /// From the global config when initialized, built-in defaults otherwise.
    pub fn current() -> Self {
        if config::is_initialized() {
            Self::from_config(config::get())
        } else {
            Self::default()
        }
    }
}

// ============================================================================
// Session
// ============================================================================

pub struct PostureSession {
    id: Uuid,
    estimator: PoseEstimator,
    smoothing: SmoothingFilter,
    classifier: PostureClassifier,
    debouncer: StateDebouncer,
    warnings: WarningStateMachine,
    /// Smoothed measurement of the most recent frame, for frameless calibration
    last_measurement: Option<PoseMeasurement>,
    /// Issues of the most recent raw-bad frame, for debounced-bad frames
    /// whose own raw verdict is already good
    last_bad_issues: BTreeSet<IssueKind>,
    frames_processed: u64,
}

impl Default for PostureSession {
    fn default() -> Self {
        Self::new(SessionSettings::default())
    }
}

impl PostureSession {
    pub fn new(settings: SessionSettings) -> Self {
        let mut classifier = PostureClassifier::new(ThresholdHandle::new(settings.thresholds));
        if let Some(h) = settings.hysteresis {
            classifier = classifier.with_hysteresis(h);
        }
        Self {
            id: Uuid::new_v4(),
            estimator: PoseEstimator::new(settings.min_shoulder_visibility),
            smoothing: SmoothingFilter::new(settings.smoothing_window),
            classifier,
            debouncer: StateDebouncer::new(
                settings.good_to_bad_frames,
                settings.bad_to_good_frames,
                settings.stale_gap_secs,
            ),
            warnings: WarningStateMachine::new(settings.schedule),
            last_measurement: None,
            last_bad_issues: BTreeSet::new(),
            frames_processed: 0,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn frames_processed(&self) -> u64 {
        self.frames_processed
    }

    pub fn baseline(&self) -> Option<&Baseline> {
        self.classifier.baseline()
    }

    pub fn thresholds(&self) -> Thresholds {
        self.classifier.thresholds().load()
    }

    /// Run the whole pipeline on one frame observed at `now`.
    pub fn process_frame(&mut self, frame: &FrameInput, now: DateTime<Utc>) -> FrameResult {
        self.frames_processed += 1;

        let estimate = self.estimator.estimate(frame);
        let measurement = self.smoothing.smooth(&estimate.measurement);
        self.last_measurement = Some(measurement);

        let verdict = self.classifier.classify(&measurement);
        let status = if verdict.is_unknown() {
            PostureStatus::Unknown
        } else if self.debouncer.update(verdict.is_bad(), now) {
            PostureStatus::Bad
        } else {
            PostureStatus::Good
        };

        if verdict.is_bad() {
            self.last_bad_issues.clone_from(&verdict.issues);
        }
        let message_issues = if verdict.issues.is_empty() {
            &self.last_bad_issues
        } else {
            &verdict.issues
        };
        let decision = self.warnings.observe(status, message_issues, now);

        let error = match (&estimate.face_error, self.classifier.require_baseline()) {
            (Some(e), _) => Some(e.to_string()),
            (None, Err(e)) => Some(e.to_string()),
            (None, Ok(_)) => None,
        };
        let adjusted = self
            .classifier
            .baseline()
            .map(|b| b.adjust(&measurement))
            .unwrap_or_default();

        debug!(
            session = %self.id,
            frame = self.frames_processed,
            status = %status,
            bad_duration = decision.bad_duration,
            "Frame processed"
        );

        FrameResult {
            timestamp: now,
            status,
            is_bad: status == PostureStatus::Bad,
            error,
            pitch: measurement.pitch,
            yaw: measurement.yaw,
            roll: measurement.roll,
            distance: measurement.distance,
            shoulder_tilt: measurement.shoulder_tilt,
            adjusted_pitch: adjusted.pitch,
            adjusted_roll: adjusted.roll,
            adjusted_distance: adjusted.distance,
            adjusted_shoulder_tilt: adjusted.shoulder_tilt,
            bad_duration: decision.bad_duration,
            should_warn: decision.should_warn,
            message: decision.message,
            issues: verdict.issues.into_iter().collect(),
        }
    }

    /// Capture a new baseline from `frame`, or from the last processed frame.
    ///
    /// On failure the previous baseline stays in force.
    pub fn calibrate(
        &mut self,
        frame: Option<&FrameInput>,
        now: DateTime<Utc>,
    ) -> Result<Baseline, BaselineError> {
        let measurement = match frame {
            Some(frame) => self.estimator.estimate(frame).measurement,
            None => self.last_measurement.ok_or(BaselineError::NoMeasurement)?,
        };
        let baseline = *self.classifier.try_calibrate(&measurement, now)?;
        self.smoothing.reset();
        self.debouncer.force_state(false);
        self.last_bad_issues.clear();
        Ok(baseline)
    }

    /// Apply new thresholds from the next frame on.
    pub fn set_thresholds(&self, thresholds: Thresholds) -> Result<Thresholds, ThresholdError> {
        self.classifier.thresholds().store(thresholds)?;
        info!(
            session = %self.id,
            pitch = thresholds.pitch,
            distance = thresholds.distance,
            roll = thresholds.roll,
            shoulder_tilt = thresholds.shoulder_tilt,
            "Thresholds updated"
        );
        Ok(thresholds)
    }

    pub fn set_sensitivity(&self, levels: SensitivityLevels) -> Result<Thresholds, ThresholdError> {
        self.set_thresholds(levels.to_thresholds())
    }

    pub fn statistics(&self) -> PostureStatistics {
        self.warnings.statistics()
    }

    /// Debouncer state, for UIs showing a pending good/bad flip.
    pub fn transition_progress(&self) -> TransitionProgress {
        self.debouncer.transition_progress()
    }

    /// Restart timing, statistics and stabilization. Baseline and thresholds
    /// are kept.
    pub fn reset(&mut self) {
        self.warnings.reset();
        self.debouncer.reset();
        self.smoothing.reset();
        self.last_bad_issues.clear();
        info!(session = %self.id, "Session reset");
    }

    /// Dispatch one client message. Frame messages use the frame's own
    /// timestamp when present, `now` otherwise.
    pub fn handle(&mut self, message: ClientMessage, now: DateTime<Utc>) -> ServerMessage {
        match message {
            ClientMessage::Frame { frame } => {
                let at = frame.timestamp().unwrap_or(now);
                ServerMessage::Result(self.process_frame(&frame, at))
            }
            ClientMessage::Calibrate { frame } => {
                let at = frame.as_ref().and_then(FrameInput::timestamp).unwrap_or(now);
                match self.calibrate(frame.as_ref(), at) {
                    Ok(baseline) => ServerMessage::Calibrated {
                        success: true,
                        baseline: Some(baseline),
                        error: None,
                    },
                    Err(e) => {
                        warn!(session = %self.id, error = %e, "Calibration refused");
                        ServerMessage::Calibrated {
                            success: false,
                            baseline: None,
                            error: Some(e.to_string()),
                        }
                    }
                }
            }
            ClientMessage::SetThresholds { thresholds } => {
                self.thresholds_reply(self.set_thresholds(thresholds))
            }
            ClientMessage::SetSensitivity { levels } => {
                self.thresholds_reply(self.set_sensitivity(levels))
            }
            ClientMessage::GetStatistics => ServerMessage::Statistics(self.statistics()),
            ClientMessage::Reset => {
                self.reset();
                ServerMessage::ResetDone
            }
        }
    }

    fn thresholds_reply(&self, result: Result<Thresholds, ThresholdError>) -> ServerMessage {
        match result {
            Ok(thresholds) => ServerMessage::ThresholdsUpdated { thresholds },
            Err(e) => {
                warn!(session = %self.id, error = %e, "Threshold update rejected");
                ServerMessage::error(e.to_string())
            }
        }
    }

    /// `NoBaseline` until the first successful calibration.
    pub fn require_baseline(&self) -> Result<&Baseline, PostureError> {
        self.classifier.require_baseline()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::synthetic::{SyntheticFrameBuilder, SyntheticPose};
    use chrono::Duration;

    fn t0() -> DateTime<Utc> {
        DateTime::<Utc>::from_timestamp(1_700_000_000, 0).unwrap()
    }

    fn frame(pose: SyntheticPose) -> FrameInput {
        SyntheticFrameBuilder::new(640, 480).build(&pose)
    }

    #[test]
    fn test_uncalibrated_frame_is_unknown_with_error() {
        let mut session = PostureSession::default();
        let result = session.process_frame(&frame(SyntheticPose::upright(60.0)), t0());
        assert_eq!(result.status, PostureStatus::Unknown);
        assert!(!result.is_bad);
        assert_eq!(result.error.as_deref(), Some(PostureError::NoBaseline.to_string().as_str()));
        assert!(result.pitch.is_some());
        assert!(result.adjusted_pitch.is_none());
    }

    #[test]
    fn test_calibrated_good_frame() {
        let mut session = PostureSession::default();
        let upright = frame(SyntheticPose::upright(60.0));
        session.calibrate(Some(&upright), t0()).unwrap();

        let result = session.process_frame(&upright, t0() + Duration::seconds(1));
        assert_eq!(result.status, PostureStatus::Good);
        assert!(result.error.is_none());
        assert!(result.adjusted_pitch.unwrap().abs() < 0.01);
        assert!(result.adjusted_distance.unwrap().abs() < 1e-6);
    }

    #[test]
    fn test_frameless_calibration_needs_a_prior_frame() {
        let mut session = PostureSession::default();
        assert_eq!(
            session.calibrate(None, t0()),
            Err(BaselineError::NoMeasurement)
        );
        session.process_frame(&frame(SyntheticPose::upright(60.0)), t0());
        assert!(session.calibrate(None, t0()).is_ok());
    }

    #[test]
    fn test_handle_dispatch() {
        let mut session = PostureSession::default();
        let reply = session.handle(ClientMessage::Calibrate { frame: None }, t0());
        assert!(matches!(reply, ServerMessage::Calibrated { success: false, .. }));

        let reply = session.handle(
            ClientMessage::SetSensitivity {
                levels: SensitivityLevels::uniform(5),
            },
            t0(),
        );
        assert!(matches!(
            reply,
            ServerMessage::ThresholdsUpdated { thresholds } if thresholds.pitch == -5.0
        ));
        assert_eq!(session.thresholds().pitch, -5.0);

        let reply = session.handle(
            ClientMessage::SetThresholds {
                thresholds: Thresholds {
                    roll: f64::NAN,
                    ..Thresholds::default()
                },
            },
            t0(),
        );
        assert!(matches!(reply, ServerMessage::Error { .. }));
        assert_eq!(session.thresholds().pitch, -5.0);

        assert_eq!(
            session.handle(ClientMessage::Reset, t0()),
            ServerMessage::ResetDone
        );
        assert!(matches!(
            session.handle(ClientMessage::GetStatistics, t0()),
            ServerMessage::Statistics(_)
        ));
    }

    #[test]
    fn test_debounced_bad_keeps_last_issues_in_message() {
        let settings = SessionSettings {
            smoothing_window: 1,
            good_to_bad_frames: 1,
            bad_to_good_frames: 3,
            stale_gap_secs: 10.0,
            ..SessionSettings::default()
        };
        let mut session = PostureSession::new(settings);
        let upright = frame(SyntheticPose::upright(60.0));
        session.calibrate(Some(&upright), t0()).unwrap();

        let slouch = frame(SyntheticPose {
            pitch: -20.0,
            ..SyntheticPose::upright(60.0)
        });
        for s in 0..5 {
            session.process_frame(&slouch, t0() + Duration::seconds(s));
        }
        assert!(!session.transition_progress().is_transitioning());
        // Raw verdict is good, debounced status still bad, warning due at 5 s
        let result = session.process_frame(&upright, t0() + Duration::seconds(5));
        assert_eq!(result.status, PostureStatus::Bad);
        assert!(result.issues.is_empty());
        assert!(result.should_warn);
        assert!(result.message.unwrap().contains("head tilted down"));

        let progress = session.transition_progress();
        assert!(progress.is_bad);
        assert_eq!((progress.progress, progress.required), (1, 3));
    }
}
