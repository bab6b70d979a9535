//! Posture Scenario Tests
//!
//! Whole-session scenarios driven through `PostureSession` with synthetic
//! landmark frames one second apart. Default settings: no smoothing, no
//! debouncing, warnings at 5 s then every 20 s.

use std::collections::BTreeSet;

use chrono::{DateTime, Duration, Utc};
use posture_guard::classifier::classify;
use posture_guard::synthetic::{SyntheticFrameBuilder, SyntheticPose};
use posture_guard::{
    Baseline, BaselineError, FrameInput, FrameResult, IssueKind, LandmarkSet, PoseMeasurement,
    PostureSession, PostureStatus, Thresholds,
};

// ============================================================================
// Helpers
// ============================================================================

const BASE_DISTANCE: f64 = 60.0;

fn t(secs: i64) -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp(1_700_000_000, 0).unwrap() + Duration::seconds(secs)
}

fn builder() -> SyntheticFrameBuilder {
    SyntheticFrameBuilder::new(640, 480)
}

fn upright() -> SyntheticPose {
    SyntheticPose::upright(BASE_DISTANCE)
}

fn slouch() -> SyntheticPose {
    SyntheticPose {
        pitch: -15.0,
        ..upright()
    }
}

fn slouch_and_lean() -> SyntheticPose {
    SyntheticPose {
        pitch: -15.0,
        distance_cm: 45.0,
        ..upright()
    }
}

fn calibrated_session() -> PostureSession {
    let mut session = PostureSession::default();
    session
        .calibrate(Some(&builder().build(&upright())), t(-1))
        .expect("upright frame calibrates");
    session
}

/// Feed `pose` for seconds `from..=to`, returning every result.
fn hold(session: &mut PostureSession, pose: &SyntheticPose, from: i64, to: i64) -> Vec<FrameResult> {
    let frame = builder().build(pose);
    (from..=to)
        .map(|s| session.process_frame(&frame, t(s)))
        .collect()
}

fn warned_at(results: &[FrameResult]) -> Vec<u64> {
    results
        .iter()
        .filter(|r| r.should_warn)
        .map(|r| r.bad_duration)
        .collect()
}

// ============================================================================
// Warning scenarios
// ============================================================================

#[test]
fn first_warning_fires_at_second_five() {
    let mut session = calibrated_session();
    let results = hold(&mut session, &slouch(), 0, 5);

    for r in &results[..5] {
        assert!(!r.should_warn, "warned early at {}", r.bad_duration);
        assert_eq!(r.status, PostureStatus::Bad);
    }
    let fifth = &results[5];
    assert_eq!(fifth.bad_duration, 5);
    assert!(fifth.should_warn);
    assert!(fifth.message.as_deref().unwrap().contains("head tilted down"));
    assert_eq!(fifth.issues, vec![IssueKind::HeadPitchDown]);
}

#[test]
fn repeat_cadence_is_five_twenty_five_forty_five() {
    let mut session = calibrated_session();
    let results = hold(&mut session, &slouch(), 0, 45);
    assert_eq!(warned_at(&results), vec![5, 25, 45]);
}

#[test]
fn repeated_frame_within_a_second_warns_once() {
    let mut session = calibrated_session();
    hold(&mut session, &slouch(), 0, 4);
    let frame = builder().build(&slouch());
    let first = session.process_frame(&frame, t(5));
    let again = session.process_frame(&frame, t(5) + Duration::milliseconds(400));
    assert!(first.should_warn);
    assert_eq!(again.bad_duration, 5);
    assert!(!again.should_warn);
}

#[test]
fn multi_issue_message_joins_phrases() {
    let mut session = calibrated_session();
    let results = hold(&mut session, &slouch_and_lean(), 0, 5);
    let fifth = &results[5];
    assert!(fifth.should_warn);
    assert_eq!(
        fifth.issues,
        vec![IssueKind::HeadPitchDown, IssueKind::LeaningForward]
    );
    let message = fifth.message.as_deref().unwrap();
    assert!(message.contains(&format!(
        "{} and {}",
        IssueKind::HeadPitchDown.phrase(),
        IssueKind::LeaningForward.phrase()
    )));
}

#[test]
fn recovery_restarts_the_schedule() {
    let mut session = calibrated_session();
    let first_run = hold(&mut session, &slouch(), 0, 12);
    assert_eq!(warned_at(&first_run), vec![5]);

    let good = hold(&mut session, &upright(), 13, 13);
    assert_eq!(good[0].status, PostureStatus::Good);
    assert_eq!(good[0].bad_duration, 0);

    let second_run = hold(&mut session, &slouch(), 14, 40);
    let fired: Vec<i64> = second_run
        .iter()
        .zip(14..)
        .filter(|(r, _)| r.should_warn)
        .map(|(_, s)| s)
        .collect();
    assert_eq!(fired, vec![19, 39]);
}

#[test]
fn missing_shoulders_never_report_shoulder_issue() {
    let mut session = calibrated_session();
    let mut results = hold(&mut session, &slouch(), 0, 10);
    results.extend(hold(&mut session, &upright(), 11, 15));

    for r in &results {
        assert!(r.shoulder_tilt.is_none());
        assert!(!r.issues.contains(&IssueKind::ShoulderTiltUneven));
    }
    assert!(results[..11]
        .iter()
        .all(|r| r.issues.contains(&IssueKind::HeadPitchDown)));
}

#[test]
fn shoulder_tilt_is_reported_when_visible() {
    let mut session = PostureSession::default();
    let level = upright().with_shoulders(0.0);
    session
        .calibrate(Some(&builder().build(&level)), t(-1))
        .unwrap();

    let tilted = upright().with_shoulders(18.0);
    let results = hold(&mut session, &tilted, 0, 2);
    assert!(results
        .iter()
        .all(|r| r.issues == vec![IssueKind::ShoulderTiltUneven]));
    assert!((results[0].adjusted_shoulder_tilt.unwrap() - 18.0).abs() < 0.5);
}

// ============================================================================
// Statistics
// ============================================================================

#[test]
fn streak_lengths_are_exact() {
    let mut session = calibrated_session();
    // 4 good, 7 bad, 3 good
    hold(&mut session, &upright(), 0, 3);
    hold(&mut session, &slouch(), 4, 10);
    hold(&mut session, &upright(), 11, 13);

    let stats = session.statistics();
    assert_eq!(stats.longest_bad_streak, 7.0);
    assert_eq!(stats.total_bad_duration, 7.0);
    assert_eq!(stats.longest_good_streak, 4.0);
    assert_eq!(stats.current_bad_duration, 0);
}

#[test]
fn reset_clears_timing_but_keeps_baseline() {
    let mut session = calibrated_session();
    hold(&mut session, &slouch(), 0, 8);
    session.reset();

    assert_eq!(session.statistics().current_bad_duration, 0);
    assert!(session.baseline().is_some());
    let results = hold(&mut session, &slouch(), 20, 25);
    assert_eq!(warned_at(&results), vec![5]);
}

// ============================================================================
// Baseline and thresholds
// ============================================================================

#[test]
fn calibration_without_distance_leaves_baseline_untouched() {
    let mut session = calibrated_session();
    let before: Baseline = *session.baseline().unwrap();

    // Drop the iris points so only head pose is measurable
    let mut frame: FrameInput = builder().build(&slouch());
    let face = frame.face.take().unwrap();
    frame.face = Some(LandmarkSet::new(face.points()[..468].to_vec()));

    assert_eq!(
        session.calibrate(Some(&frame), t(0)),
        Err(BaselineError::MissingDistance)
    );
    assert_eq!(session.baseline(), Some(&before));
}

#[test]
fn no_face_is_unknown_not_good() {
    let mut session = calibrated_session();
    let frame = FrameInput {
        width: 640,
        height: 480,
        ..FrameInput::default()
    };
    let result = session.process_frame(&frame, t(0));
    assert_eq!(result.status, PostureStatus::Unknown);
    assert!(!result.is_bad);
    assert!(result.error.is_some());
    assert!(result.pitch.is_none());
}

#[test]
fn raising_a_threshold_never_turns_good_into_bad() {
    let baseline = Baseline {
        pitch: 0.0,
        roll: 0.0,
        distance: 60.0,
        shoulder_tilt: 0.0,
        calibrated_at: t(0),
    };
    let measurements = [
        (-5.0, 58.0, 3.0, Some(2.0)),
        (-12.0, 55.0, 10.0, None),
        (-9.9, 50.5, -14.0, Some(-9.0)),
    ];
    for (pitch, distance, roll, shoulder_tilt) in measurements {
        let m = PoseMeasurement {
            pitch: Some(pitch),
            yaw: Some(0.0),
            roll: Some(roll),
            distance: Some(distance),
            shoulder_tilt,
        };
        let mut previous: BTreeSet<IssueKind> = BTreeSet::new();
        let mut first = true;
        // Loosen every threshold step by step
        for step in 0..6 {
            let k = f64::from(step) * 2.0;
            let thresholds = Thresholds {
                pitch: -5.0 - k,
                distance: 5.0 + k,
                roll: 5.0 + k,
                shoulder_tilt: 5.0 + k,
            };
            let verdict = classify(&m, Some(&baseline), &thresholds);
            if !first {
                assert!(
                    verdict.issues.is_subset(&previous),
                    "loosening thresholds added issues: {:?} -> {:?}",
                    previous,
                    verdict.issues
                );
            }
            first = false;
            previous = verdict.issues;
        }
    }
}

#[test]
fn threshold_change_applies_on_next_frame() {
    let mut session = calibrated_session();
    let frame = builder().build(&slouch());
    assert!(session.process_frame(&frame, t(0)).is_bad);

    session
        .set_thresholds(Thresholds {
            pitch: -20.0,
            ..Thresholds::default()
        })
        .unwrap();
    let result = session.process_frame(&frame, t(1));
    assert_eq!(result.status, PostureStatus::Good);
    assert!(result.issues.is_empty());
}
