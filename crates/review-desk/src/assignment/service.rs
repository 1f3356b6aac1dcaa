use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::domain::{ReviewerId, Submission, SubmissionId, SubmissionStatus};
use super::eligibility::eligible_reviewers;
use super::repository::{LedgerError, ReviewLedger, ReviewerPool, SubmissionQuery};
use super::statistics::WorkloadStatistics;
use super::strategy::{select_reviewer, AssignmentStrategy, RoundRobinCounter};
use super::workload::{WorkloadEntry, WorkloadSnapshot};
use crate::config::AssignmentConfig;

pub const NO_AVAILABLE_REVIEWERS: &str = "No available reviewers found";

/// Per-call knobs for a batch assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchOptions {
    pub strategy: AssignmentStrategy,
    pub exclude_same_unit: bool,
    pub only_active_reviewers: bool,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            strategy: AssignmentStrategy::Balanced,
            exclude_same_unit: true,
            only_active_reviewers: true,
        }
    }
}

/// One successful submission to reviewer link made during a batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssignmentRecord {
    pub submission_id: SubmissionId,
    pub reviewer_id: ReviewerId,
    pub reviewer_name: String,
}

/// Outcome of a batch. Failures are carried as messages, never raised.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchAssignmentResult {
    pub assigned_count: usize,
    pub errors: Vec<String>,
    pub assignments: Vec<AssignmentRecord>,
}

impl BatchAssignmentResult {
    fn hard_stop(message: String) -> Self {
        Self {
            errors: vec![message],
            ..Self::default()
        }
    }
}

/// Service distributing pending submissions across the reviewer pool.
///
/// The round-robin counter lives as long as the service so rotation carries
/// over between batches.
pub struct ReviewAssignmentService<P, L> {
    pool: Arc<P>,
    ledger: Arc<L>,
    counter: RoundRobinCounter,
    defaults: BatchOptions,
}

impl<P, L> ReviewAssignmentService<P, L>
where
    P: ReviewerPool + 'static,
    L: ReviewLedger + 'static,
{
    pub fn new(pool: Arc<P>, ledger: Arc<L>) -> Self {
        Self::with_counter(pool, ledger, RoundRobinCounter::from_clock())
    }

    pub fn with_counter(pool: Arc<P>, ledger: Arc<L>, counter: RoundRobinCounter) -> Self {
        Self {
            pool,
            ledger,
            counter,
            defaults: BatchOptions::default(),
        }
    }

    pub fn from_config(pool: Arc<P>, ledger: Arc<L>, config: &AssignmentConfig) -> Self {
        Self::with_counter(pool, ledger, config.counter()).with_defaults(config.batch_options())
    }

    pub fn with_defaults(mut self, defaults: BatchOptions) -> Self {
        self.defaults = defaults;
        self
    }

    pub fn defaults(&self) -> BatchOptions {
        self.defaults
    }

    pub fn round_robin_position(&self) -> u64 {
        self.counter.current()
    }

    /// Assign every unassigned pending submission in `submissions`.
    pub fn assign_batch(
        &self,
        submissions: &[Submission],
        options: &BatchOptions,
    ) -> BatchAssignmentResult {
        self.assign_batch_with_rng(submissions, options, &mut rand::thread_rng())
    }

    /// Same as [`Self::assign_batch`] with a caller supplied RNG for the random strategy.
    pub fn assign_batch_with_rng<R>(
        &self,
        submissions: &[Submission],
        options: &BatchOptions,
        rng: &mut R,
    ) -> BatchAssignmentResult
    where
        R: Rng + ?Sized,
    {
        let mut result = BatchAssignmentResult::default();

        let candidates = self.unassigned_pending(submissions, &mut result.errors);
        if candidates.is_empty() {
            return result;
        }

        let mut snapshot = match WorkloadSnapshot::build(
            self.pool.as_ref(),
            self.ledger.as_ref(),
            options.only_active_reviewers,
        ) {
            Ok(snapshot) => snapshot,
            Err(error) => {
                warn!(%error, "unable to build reviewer workload snapshot");
                return BatchAssignmentResult::hard_stop(format!(
                    "Failed to load reviewer workload: {error}"
                ));
            }
        };

        if snapshot.is_empty() {
            warn!(
                pending = candidates.len(),
                "no reviewers available for assignment"
            );
            return BatchAssignmentResult::hard_stop(NO_AVAILABLE_REVIEWERS.to_string());
        }

        for submission in candidates {
            let (reviewer_id, reviewer_name) = {
                let eligible =
                    eligible_reviewers(&snapshot, submission, options.exclude_same_unit);
                if eligible.is_empty() {
                    warn!(submission_id = %submission.id, "no eligible reviewer");
                    result.errors.push(format!(
                        "No eligible reviewer found for submission {}",
                        submission.id
                    ));
                    continue;
                }

                match select_reviewer(options.strategy, &eligible, &self.counter, &mut *rng) {
                    Ok(entry) => (entry.reviewer.id.clone(), entry.reviewer.name.clone()),
                    Err(error) => {
                        result.errors.push(format!(
                            "Failed to assign submission {}: {error}",
                            submission.id
                        ));
                        continue;
                    }
                }
            };

            match self.ledger.assign(&submission.id, &reviewer_id, Utc::now()) {
                Ok(_) => {
                    snapshot.record_assignment(&reviewer_id);
                    debug!(
                        submission_id = %submission.id,
                        reviewer_id = %reviewer_id,
                        strategy = options.strategy.label(),
                        "submission assigned"
                    );
                    result.assigned_count += 1;
                    result.assignments.push(AssignmentRecord {
                        submission_id: submission.id.clone(),
                        reviewer_id,
                        reviewer_name,
                    });
                }
                Err(error) => {
                    warn!(submission_id = %submission.id, %error, "ledger write failed");
                    result.errors.push(format!(
                        "Failed to assign submission {}: {error}",
                        submission.id
                    ));
                }
            }
        }

        info!(
            assigned = result.assigned_count,
            errors = result.errors.len(),
            strategy = options.strategy.label(),
            "batch assignment finished"
        );
        result
    }

    /// Assign every submission the ledger reports as pending review.
    pub fn assign_pending(
        &self,
        options: &BatchOptions,
        limit: Option<usize>,
    ) -> Result<BatchAssignmentResult, LedgerError> {
        let submissions = self
            .ledger
            .submissions(&SubmissionQuery::PendingReview { limit })?;
        Ok(self.assign_batch(&submissions, options))
    }

    /// Assign an explicit selection of submissions.
    pub fn assign_submissions(
        &self,
        ids: &[SubmissionId],
        options: &BatchOptions,
    ) -> Result<BatchAssignmentResult, LedgerError> {
        let submissions = self
            .ledger
            .submissions(&SubmissionQuery::ByIds(ids.to_vec()))?;
        Ok(self.assign_batch(&submissions, options))
    }

    /// Preview the reviewer a batch would pick for `submission` without writing.
    ///
    /// Round-robin previews read the counter but do not advance it.
    pub fn recommend_reviewer(
        &self,
        submission: &Submission,
        options: &BatchOptions,
    ) -> Result<Option<WorkloadEntry>, LedgerError> {
        let snapshot = WorkloadSnapshot::build(
            self.pool.as_ref(),
            self.ledger.as_ref(),
            options.only_active_reviewers,
        )?;
        let eligible = eligible_reviewers(&snapshot, submission, options.exclude_same_unit);
        let preview_counter = RoundRobinCounter::new(self.counter.current());
        let selected = select_reviewer(
            options.strategy,
            &eligible,
            &preview_counter,
            &mut rand::thread_rng(),
        )
        .ok()
        .cloned();
        Ok(selected)
    }

    pub fn workload_statistics(
        &self,
        only_active: bool,
    ) -> Result<WorkloadStatistics, LedgerError> {
        let snapshot =
            WorkloadSnapshot::build(self.pool.as_ref(), self.ledger.as_ref(), only_active)?;
        Ok(WorkloadStatistics::from_snapshot(&snapshot))
    }

    fn unassigned_pending<'a>(
        &self,
        submissions: &'a [Submission],
        errors: &mut Vec<String>,
    ) -> Vec<&'a Submission> {
        let mut seen = HashSet::new();
        submissions
            .iter()
            .filter(|submission| submission.status == SubmissionStatus::PendingReview)
            .filter(|submission| seen.insert(submission.id.clone()))
            .filter(|submission| match self.ledger.assigned_reviewer(&submission.id) {
                Ok(existing) => existing.is_none(),
                Err(error) => {
                    warn!(submission_id = %submission.id, %error, "unable to read review link");
                    errors.push(format!(
                        "Failed to check existing review for submission {}: {error}",
                        submission.id
                    ));
                    false
                }
            })
            .collect()
    }
}
