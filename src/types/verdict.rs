use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A posture dimension that is outside its threshold.
///
/// Ordering is the order issues are listed in warning messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    HeadPitchDown,
    LeaningForward,
    HeadRollSideways,
    ShoulderTiltUneven,
}

impl IssueKind {
    /// Human phrase used when rendering warnings.
    pub fn phrase(self) -> &'static str {
        match self {
            IssueKind::HeadPitchDown => "head tilted down",
            IssueKind::LeaningForward => "leaning too close to the screen",
            IssueKind::HeadRollSideways => "head tilted sideways",
            IssueKind::ShoulderTiltUneven => "shoulders uneven",
        }
    }
}

impl std::fmt::Display for IssueKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IssueKind::HeadPitchDown => write!(f, "HEAD_PITCH_DOWN"),
            IssueKind::LeaningForward => write!(f, "LEANING_FORWARD"),
            IssueKind::HeadRollSideways => write!(f, "HEAD_ROLL_SIDEWAYS"),
            IssueKind::ShoulderTiltUneven => write!(f, "SHOULDER_TILT_UNEVEN"),
        }
    }
}

/// Three-valued posture status. `Unknown` means "can't tell right now" and
/// is never the same as `Good`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostureStatus {
    #[default]
    Unknown,
    Good,
    Bad,
}

impl std::fmt::Display for PostureStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PostureStatus::Unknown => write!(f, "UNKNOWN"),
            PostureStatus::Good => write!(f, "GOOD"),
            PostureStatus::Bad => write!(f, "BAD"),
        }
    }
}

/// One frame's classification.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PostureVerdict {
    pub status: PostureStatus,
    pub issues: BTreeSet<IssueKind>,
}

impl PostureVerdict {
    pub fn unknown() -> Self {
        Self::default()
    }

    /// Good when `issues` is empty, bad otherwise.
    pub fn from_issues(issues: BTreeSet<IssueKind>) -> Self {
        let status = if issues.is_empty() {
            PostureStatus::Good
        } else {
            PostureStatus::Bad
        };
        Self { status, issues }
    }

    pub fn is_bad(&self) -> bool {
        self.status == PostureStatus::Bad
    }

    pub fn is_unknown(&self) -> bool {
        self.status == PostureStatus::Unknown
    }
}
