//! Warning State Machine - bad-run timing, warning schedule, statistics
//!
//! Tracks how long the (debounced) verdict has been bad or good and decides
//! on which whole second of a bad run to warn:
//!
//! ```text
//!   Unknown ──▶ Good ◀──▶ Bad
//!
//!   bad run:  0s ... 5s ........ 25s ........ 45s
//!                    ▲ initial   ▲ +repeat    ▲ +repeat
//! ```
//!
//! `Unknown` counts as good for streak bookkeeping but never warns. Every
//! good/bad edge clears the set of second-marks already warned, so a new bad
//! run restarts the schedule from its own start.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::{debug, info};

use crate::types::{IssueKind, PostureStatistics, PostureStatus};

// ============================================================================
// Schedule
// ============================================================================

/// Seconds into a bad run at which warnings fire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WarningSchedule {
    pub initial_secs: u64,
    pub repeat_secs: u64,
}

impl Default for WarningSchedule {
    fn default() -> Self {
        Self {
            initial_secs: 5,
            repeat_secs: 20,
        }
    }
}

impl WarningSchedule {
    /// True at `initial`, then every `repeat` seconds after it.
    pub fn fires_at(&self, bad_duration: u64) -> bool {
        if bad_duration == self.initial_secs {
            return true;
        }
        bad_duration > self.initial_secs
            && self.repeat_secs > 0
            && (bad_duration - self.initial_secs) % self.repeat_secs == 0
    }
}

// ============================================================================
// Messages
// ============================================================================

/// "X", "X and Y", "X, Y, and Z".
pub fn join_phrases(phrases: &[&str]) -> String {
    match phrases {
        [] => String::new(),
        [one] => (*one).to_string(),
        [first, second] => format!("{} and {}", first, second),
        [init @ .., last] => format!("{}, and {}", init.join(", "), last),
    }
}

/// Warning text for a bad run of `bad_duration` seconds.
pub fn render_message(bad_duration: u64, issues: &BTreeSet<IssueKind>) -> String {
    let phrases: Vec<&str> = issues.iter().map(|i| i.phrase()).collect();
    if phrases.is_empty() {
        format!("Poor posture for {} seconds.", bad_duration)
    } else {
        format!(
            "Poor posture for {} seconds: {}.",
            bad_duration,
            join_phrases(&phrases)
        )
    }
}

// ============================================================================
// State machine
// ============================================================================

/// Outcome of one observed frame.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct WarningDecision {
    pub bad_duration: u64,
    pub should_warn: bool,
    pub message: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct WarningStateMachine {
    schedule: WarningSchedule,
    status: PostureStatus,
    bad_since: Option<DateTime<Utc>>,
    bad_duration: u64,
    warned_at: BTreeSet<u64>,
    good_since: Option<DateTime<Utc>>,
    total_bad_duration: f64,
    longest_bad_streak: f64,
    longest_good_streak: f64,
}

fn seconds_between(start: DateTime<Utc>, end: DateTime<Utc>) -> f64 {
    ((end - start).num_milliseconds() as f64 / 1000.0).max(0.0)
}

impl WarningStateMachine {
    pub fn new(schedule: WarningSchedule) -> Self {
        Self {
            schedule,
            ..Self::default()
        }
    }

    pub fn schedule(&self) -> WarningSchedule {
        self.schedule
    }

    pub fn status(&self) -> PostureStatus {
        self.status
    }

    pub fn bad_since(&self) -> Option<DateTime<Utc>> {
        self.bad_since
    }

    /// Advance on one frame's status. `issues` feeds the warning text.
    pub fn observe(
        &mut self,
        status: PostureStatus,
        issues: &BTreeSet<IssueKind>,
        now: DateTime<Utc>,
    ) -> WarningDecision {
        if status == PostureStatus::Bad {
            self.observe_bad(issues, now)
        } else {
            self.observe_not_bad(status, now);
            WarningDecision::default()
        }
    }

    fn observe_bad(&mut self, issues: &BTreeSet<IssueKind>, now: DateTime<Utc>) -> WarningDecision {
        match self.bad_since {
            Some(since) => {
                // Truncation toward zero; a frame older than `since` reads 0.
                self.bad_duration = (now - since).num_seconds().max(0) as u64;
            }
            None => {
                if let Some(good_since) = self.good_since.take() {
                    self.longest_good_streak = self
                        .longest_good_streak
                        .max(seconds_between(good_since, now));
                }
                self.bad_since = Some(now);
                self.bad_duration = 0;
                self.warned_at.clear();
                info!(issues = ?issues, "Posture turned bad");
            }
        }
        self.status = PostureStatus::Bad;

        let d = self.bad_duration;
        let should_warn = self.schedule.fires_at(d) && self.warned_at.insert(d);
        let message = should_warn.then(|| render_message(d, issues));
        if let Some(text) = &message {
            info!(bad_duration = d, "Posture warning: {}", text);
        }

        WarningDecision {
            bad_duration: d,
            should_warn,
            message,
        }
    }

    fn observe_not_bad(&mut self, status: PostureStatus, now: DateTime<Utc>) {
        if let Some(since) = self.bad_since.take() {
            let run = seconds_between(since, now);
            self.total_bad_duration += run;
            self.longest_bad_streak = self.longest_bad_streak.max(run);
            self.bad_duration = 0;
            self.warned_at.clear();
            self.good_since = Some(now);
            info!(bad_run_secs = run, "Posture recovered");
        } else if self.good_since.is_none() {
            self.good_since = Some(now);
        }
        if status != self.status {
            debug!(from = %self.status, to = %status, "Posture status changed");
        }
        self.status = status;
    }

    pub fn statistics(&self) -> PostureStatistics {
        PostureStatistics {
            total_bad_duration: self.total_bad_duration,
            longest_bad_streak: self.longest_bad_streak,
            longest_good_streak: self.longest_good_streak,
            current_bad_duration: self.bad_duration,
        }
    }

    /// Back to the startup state; keeps the schedule.
    pub fn reset(&mut self) {
        *self = Self::new(self.schedule);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(secs: i64) -> DateTime<Utc> {
        DateTime::<Utc>::from_timestamp(1_700_000_000 + secs, 0).unwrap()
    }

    fn pitch_down() -> BTreeSet<IssueKind> {
        BTreeSet::from([IssueKind::HeadPitchDown])
    }

    fn warn_seconds(machine: &mut WarningStateMachine, from: i64, to: i64) -> Vec<u64> {
        (from..=to)
            .filter_map(|t| {
                let d = machine.observe(PostureStatus::Bad, &pitch_down(), at(t));
                d.should_warn.then_some(d.bad_duration)
            })
            .collect()
    }

    #[test]
    fn test_schedule() {
        let s = WarningSchedule::default();
        let fired: Vec<u64> = (0..=70).filter(|&d| s.fires_at(d)).collect();
        assert_eq!(fired, vec![5, 25, 45, 65]);
    }

    #[test]
    fn test_join_phrases() {
        assert_eq!(join_phrases(&["a"]), "a");
        assert_eq!(join_phrases(&["a", "b"]), "a and b");
        assert_eq!(join_phrases(&["a", "b", "c"]), "a, b, and c");
        assert_eq!(join_phrases(&["a", "b", "c", "d"]), "a, b, c, and d");
    }

    #[test]
    fn test_message_mentions_every_issue() {
        let all = BTreeSet::from([
            IssueKind::HeadPitchDown,
            IssueKind::LeaningForward,
            IssueKind::HeadRollSideways,
            IssueKind::ShoulderTiltUneven,
        ]);
        let text = render_message(15, &all);
        for word in ["down", "close", "sideways", "uneven"] {
            assert!(text.contains(word), "{} missing from {}", word, text);
        }
        assert!(text.contains("15 seconds"));
    }

    #[test]
    fn test_first_warning_at_five_seconds() {
        let mut m = WarningStateMachine::default();
        assert_eq!(warn_seconds(&mut m, 0, 10), vec![5]);
    }

    #[test]
    fn test_repeat_cadence() {
        let mut m = WarningStateMachine::default();
        assert_eq!(warn_seconds(&mut m, 0, 45), vec![5, 25, 45]);
    }

    #[test]
    fn test_same_second_fires_once() {
        let mut m = WarningStateMachine::default();
        m.observe(PostureStatus::Bad, &pitch_down(), at(0));
        let first = m.observe(PostureStatus::Bad, &pitch_down(), at(5));
        let again = m.observe(PostureStatus::Bad, &pitch_down(), at(5));
        assert!(first.should_warn);
        assert!(!again.should_warn);
        assert_eq!(again.bad_duration, 5);
        assert!(again.message.is_none());
    }

    #[test]
    fn test_unknown_never_warns_and_ends_bad_run() {
        let mut m = WarningStateMachine::default();
        m.observe(PostureStatus::Bad, &pitch_down(), at(0));
        let d = m.observe(PostureStatus::Unknown, &BTreeSet::new(), at(5));
        assert!(!d.should_warn);
        assert!(m.bad_since().is_none());
        assert_eq!(m.statistics().total_bad_duration, 5.0);
    }

    #[test]
    fn test_streak_bookkeeping() {
        let mut m = WarningStateMachine::default();
        // 3 good frames, 7 bad frames, 2 good frames at 1 s spacing
        for t in 0..3 {
            m.observe(PostureStatus::Good, &BTreeSet::new(), at(t));
        }
        for t in 3..10 {
            m.observe(PostureStatus::Bad, &pitch_down(), at(t));
        }
        assert_eq!(m.statistics().current_bad_duration, 6);
        for t in 10..12 {
            m.observe(PostureStatus::Good, &BTreeSet::new(), at(t));
        }

        let stats = m.statistics();
        assert_eq!(stats.longest_bad_streak, 7.0);
        assert_eq!(stats.total_bad_duration, 7.0);
        assert_eq!(stats.longest_good_streak, 3.0);
        assert_eq!(stats.current_bad_duration, 0);
    }

    #[test]
    fn test_statistics_has_no_side_effects() {
        let mut m = WarningStateMachine::default();
        m.observe(PostureStatus::Bad, &pitch_down(), at(0));
        m.observe(PostureStatus::Bad, &pitch_down(), at(3));
        assert_eq!(m.statistics(), m.statistics());
    }

    #[test]
    fn test_reset() {
        let mut m = WarningStateMachine::new(WarningSchedule {
            initial_secs: 2,
            repeat_secs: 4,
        });
        m.observe(PostureStatus::Bad, &pitch_down(), at(0));
        m.observe(PostureStatus::Bad, &pitch_down(), at(3));
        m.reset();
        assert_eq!(m.statistics(), PostureStatistics::default());
        assert_eq!(m.schedule().initial_secs, 2);
        assert_eq!(m.status(), PostureStatus::Unknown);
    }
}
