use chrono::{DateTime, Utc};

use super::domain::{LoadCounts, ReviewEntry, Reviewer, ReviewerId, Submission, SubmissionId};

/// Read access to the reviewer pool maintained by the surrounding application.
pub trait ReviewerPool: Send + Sync {
    fn reviewers(&self, only_active: bool) -> Result<Vec<Reviewer>, LedgerError>;
}

/// Storage abstraction over the review ledger so the assignment service can be
/// exercised in isolation.
pub trait ReviewLedger: Send + Sync {
    /// Counts of open (pending or under review) and completed entries for a reviewer.
    fn load_counts(&self, reviewer_id: &ReviewerId) -> Result<LoadCounts, LedgerError>;

    /// Reviewer currently linked to the submission, if any.
    fn assigned_reviewer(
        &self,
        submission_id: &SubmissionId,
    ) -> Result<Option<ReviewerId>, LedgerError>;

    fn submissions(&self, query: &SubmissionQuery) -> Result<Vec<Submission>, LedgerError>;

    /// Upsert the ledger entry for the submission and move it to under review.
    fn assign(
        &self,
        submission_id: &SubmissionId,
        reviewer_id: &ReviewerId,
        assigned_at: DateTime<Utc>,
    ) -> Result<ReviewEntry, LedgerError>;
}

/// Submission selection understood by [`ReviewLedger::submissions`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionQuery {
    PendingReview { limit: Option<usize> },
    ByIds(Vec<SubmissionId>),
}

/// Error enumeration for collaborator failures.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("record not found")]
    NotFound,
    #[error("record already exists")]
    Conflict,
    #[error("ledger unavailable: {0}")]
    Unavailable(String),
}
