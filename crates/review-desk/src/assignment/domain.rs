use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier wrapper for reviewers.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReviewerId(pub String);

/// Identifier wrapper for submitted task work.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubmissionId(pub String);

/// Identifier wrapper for enrolled students.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StudentId(pub String);

impl fmt::Display for ReviewerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for SubmissionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A person allowed to grade submissions.
///
/// The church and district are the two organizational units used to keep
/// reviewers away from work submitted by their own congregation or district.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reviewer {
    pub id: ReviewerId,
    pub name: String,
    #[serde(default = "default_active")]
    pub active: bool,
    #[serde(default)]
    pub church_id: Option<String>,
    #[serde(default)]
    pub district_id: Option<String>,
}

fn default_active() -> bool {
    true
}

/// Student owning a submission, carrying the same two organizational units.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Student {
    pub id: StudentId,
    pub name: String,
    #[serde(default)]
    pub church_id: Option<String>,
    #[serde(default)]
    pub district_id: Option<String>,
}

/// A piece of student work awaiting or undergoing review.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Submission {
    pub id: SubmissionId,
    #[serde(default)]
    pub task: Option<String>,
    #[serde(default)]
    pub student: Option<Student>,
    pub status: SubmissionStatus,
}

/// Review lifecycle of a submission. Only `PendingReview -> UnderReview` is
/// performed by the assignment engine; the remaining transitions belong to
/// the human review decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionStatus {
    PendingReview,
    UnderReview,
    NeedsRevision,
    Completed,
    Flagged,
}

impl SubmissionStatus {
    pub const fn label(self) -> &'static str {
        match self {
            SubmissionStatus::PendingReview => "pending_review",
            SubmissionStatus::UnderReview => "under_review",
            SubmissionStatus::NeedsRevision => "needs_revision",
            SubmissionStatus::Completed => "completed",
            SubmissionStatus::Flagged => "flagged",
        }
    }

    /// Statuses that count towards a reviewer's open workload.
    pub const fn is_open(self) -> bool {
        matches!(
            self,
            SubmissionStatus::PendingReview | SubmissionStatus::UnderReview
        )
    }
}

/// Ledger entry linking one submission to its reviewer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewEntry {
    pub submission_id: SubmissionId,
    pub reviewer_id: ReviewerId,
    pub assigned_at: DateTime<Utc>,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
}

/// Per-reviewer counts read from the ledger when a snapshot is built.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadCounts {
    pub pending: u32,
    pub completed: u32,
}

/// Two unit ids match only when both are present and equal.
pub(crate) fn same_unit(left: Option<&str>, right: Option<&str>) -> bool {
    matches!((left, right), (Some(a), Some(b)) if a == b)
}
