use chrono::{DateTime, Utc};
use serde::Serialize;

/// How far the debouncer is toward flipping its stable state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TransitionProgress {
    pub is_bad: bool,
    /// Consecutive frames seen against the current state.
    pub progress: u32,
    /// Frames needed to flip.
    pub required: u32,
}

impl TransitionProgress {
    pub fn is_transitioning(&self) -> bool {
        self.progress > 0
    }
}

/// Requires a run of consistent raw verdicts before the stable state flips.
///
/// Consecutive counters restart when updates are further apart than
/// `stale_gap`, so a burst of frames after a pause cannot flip the state on
/// history that is no longer current.
#[derive(Debug, Clone)]
pub struct StateDebouncer {
    good_to_bad_frames: u32,
    bad_to_good_frames: u32,
    stale_gap_secs: f64,
    is_bad: bool,
    consecutive_bad: u32,
    consecutive_good: u32,
    last_update: Option<DateTime<Utc>>,
}

impl StateDebouncer {
    pub fn new(good_to_bad_frames: u32, bad_to_good_frames: u32, stale_gap_secs: f64) -> Self {
        Self {
            good_to_bad_frames: good_to_bad_frames.max(1),
            bad_to_good_frames: bad_to_good_frames.max(1),
            stale_gap_secs,
            is_bad: false,
            consecutive_bad: 0,
            consecutive_good: 0,
            last_update: None,
        }
    }

    /// Feed one raw verdict, returning the stable (debounced) state.
    pub fn update(&mut self, raw_is_bad: bool, now: DateTime<Utc>) -> bool {
        if let Some(last) = self.last_update {
            let gap = (now - last).num_milliseconds() as f64 / 1000.0;
            if gap > self.stale_gap_secs {
                self.consecutive_bad = 0;
                self.consecutive_good = 0;
            }
        }
        self.last_update = Some(now);

        if raw_is_bad {
            self.consecutive_bad += 1;
            self.consecutive_good = 0;
        } else {
            self.consecutive_good += 1;
            self.consecutive_bad = 0;
        }

        if self.is_bad {
            if self.consecutive_good >= self.bad_to_good_frames {
                self.is_bad = false;
            }
        } else if self.consecutive_bad >= self.good_to_bad_frames {
            self.is_bad = true;
        }
        self.is_bad
    }

    pub fn is_bad(&self) -> bool {
        self.is_bad
    }

    pub fn transition_progress(&self) -> TransitionProgress {
        if self.is_bad {
            TransitionProgress {
                is_bad: true,
                progress: self.consecutive_good,
                required: self.bad_to_good_frames,
            }
        } else {
            TransitionProgress {
                is_bad: false,
                progress: self.consecutive_bad,
                required: self.good_to_bad_frames,
            }
        }
    }

    /// Set the stable state directly, e.g. right after calibration.
    pub fn force_state(&mut self, is_bad: bool) {
        self.is_bad = is_bad;
        self.consecutive_bad = 0;
        self.consecutive_good = 0;
    }

    pub fn reset(&mut self) {
        self.force_state(false);
        self.last_update = None;
    }
}
