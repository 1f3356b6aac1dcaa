//! Reviewer assignment and workload balancing.
//!
//! A batch call builds one workload snapshot, narrows the reviewer pool per
//! submission by organizational unit, picks a reviewer with the configured
//! strategy, and writes the link through the [`ReviewLedger`] collaborator.
//! The snapshot is updated after every successful write so later submissions
//! in the same batch see the new load.

pub mod domain;
pub mod eligibility;
pub mod repository;
pub mod router;
pub mod service;
pub mod statistics;
pub mod strategy;
pub mod workload;

#[cfg(test)]
mod tests;

pub use domain::{
    LoadCounts, ReviewEntry, Reviewer, ReviewerId, Student, StudentId, Submission, SubmissionId,
    SubmissionStatus,
};
pub use eligibility::eligible_reviewers;
pub use repository::{LedgerError, ReviewLedger, ReviewerPool, SubmissionQuery};
pub use router::{assignment_router, AssignmentRequest, OptionOverrides, RecommendationRequest};
pub use service::{
    AssignmentRecord, BatchAssignmentResult, BatchOptions, ReviewAssignmentService,
    NO_AVAILABLE_REVIEWERS,
};
pub use statistics::WorkloadStatistics;
pub use strategy::{
    select_reviewer, AssignmentStrategy, RoundRobinCounter, SelectionError, UnknownStrategy,
};
pub use workload::{WorkloadEntry, WorkloadEntryView, WorkloadSnapshot};
