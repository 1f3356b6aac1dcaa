use chrono::{DateTime, Utc};
use metrics_exporter_prometheus::PrometheusHandle;
use review_desk::assignment::{
    LedgerError, LoadCounts, ReviewEntry, ReviewLedger, Reviewer, ReviewerId, ReviewerPool,
    Submission, SubmissionId, SubmissionQuery, SubmissionStatus,
};
use review_desk::error::AppError;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// JSON snapshot of the reviewer pool, submissions, and review ledger.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub(crate) struct DeskFixture {
    #[serde(default)]
    pub(crate) reviewers: Vec<Reviewer>,
    #[serde(default)]
    pub(crate) submissions: Vec<Submission>,
    #[serde(default)]
    pub(crate) reviews: Vec<ReviewEntry>,
}

impl DeskFixture {
    pub(crate) fn load(path: &Path) -> Result<Self, AppError> {
        let raw = std::fs::read_to_string(path)?;
        serde_json::from_str(&raw).map_err(|source| AppError::Fixture {
            path: path.to_path_buf(),
            source,
        })
    }

    pub(crate) fn save(&self, path: &Path) -> Result<(), AppError> {
        let raw = serde_json::to_string_pretty(self).map_err(|source| AppError::Fixture {
            path: path.to_path_buf(),
            source,
        })?;
        std::fs::write(path, raw)?;
        Ok(())
    }
}

#[derive(Default)]
struct DeskState {
    reviewers: Vec<Reviewer>,
    submissions: Vec<Submission>,
    reviews: BTreeMap<SubmissionId, ReviewEntry>,
}

/// Process-local stand-in for the surrounding application's database.
#[derive(Default, Clone)]
pub(crate) struct InMemoryReviewDesk {
    state: Arc<Mutex<DeskState>>,
}

impl InMemoryReviewDesk {
    pub(crate) fn from_fixture(fixture: DeskFixture) -> Self {
        let reviews = fixture
            .reviews
            .into_iter()
            .map(|entry| (entry.submission_id.clone(), entry))
            .collect();
        Self {
            state: Arc::new(Mutex::new(DeskState {
                reviewers: fixture.reviewers,
                submissions: fixture.submissions,
                reviews,
            })),
        }
    }

    pub(crate) fn to_fixture(&self) -> Result<DeskFixture, LedgerError> {
        let guard = self.lock()?;
        Ok(DeskFixture {
            reviewers: guard.reviewers.clone(),
            submissions: guard.submissions.clone(),
            reviews: guard.reviews.values().cloned().collect(),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, DeskState>, LedgerError> {
        self.state
            .lock()
            .map_err(|_| LedgerError::Unavailable("desk state poisoned".to_string()))
    }
}

impl ReviewerPool for InMemoryReviewDesk {
    fn reviewers(&self, only_active: bool) -> Result<Vec<Reviewer>, LedgerError> {
        let guard = self.lock()?;
        Ok(guard
            .reviewers
            .iter()
            .filter(|reviewer| !only_active || reviewer.active)
            .cloned()
            .collect())
    }
}

impl ReviewLedger for InMemoryReviewDesk {
    fn load_counts(&self, reviewer_id: &ReviewerId) -> Result<LoadCounts, LedgerError> {
        let guard = self.lock()?;
        let mut counts = LoadCounts::default();
        for entry in guard
            .reviews
            .values()
            .filter(|entry| &entry.reviewer_id == reviewer_id)
        {
            if entry.completed {
                counts.completed += 1;
            } else if guard
                .submissions
                .iter()
                .find(|submission| submission.id == entry.submission_id)
                .is_some_and(|submission| submission.status.is_open())
            {
                counts.pending += 1;
            }
        }
        Ok(counts)
    }

    fn assigned_reviewer(
        &self,
        submission_id: &SubmissionId,
    ) -> Result<Option<ReviewerId>, LedgerError> {
        let guard = self.lock()?;
        Ok(guard
            .reviews
            .get(submission_id)
            .map(|entry| entry.reviewer_id.clone()))
    }

    fn submissions(&self, query: &SubmissionQuery) -> Result<Vec<Submission>, LedgerError> {
        let guard = self.lock()?;
        let selected = match query {
            SubmissionQuery::PendingReview { limit } => guard
                .submissions
                .iter()
                .filter(|submission| submission.status == SubmissionStatus::PendingReview)
                .filter(|submission| !guard.reviews.contains_key(&submission.id))
                .take(limit.unwrap_or(usize::MAX))
                .cloned()
                .collect(),
            SubmissionQuery::ByIds(ids) => {
                let mut seen = HashSet::new();
                ids.iter()
                    .filter(|id| seen.insert(*id))
                    .filter_map(|id| {
                        guard
                            .submissions
                            .iter()
                            .find(|submission| &submission.id == id)
                            .cloned()
                    })
                    .collect()
            }
        };
        Ok(selected)
    }

    fn assign(
        &self,
        submission_id: &SubmissionId,
        reviewer_id: &ReviewerId,
        assigned_at: DateTime<Utc>,
    ) -> Result<ReviewEntry, LedgerError> {
        let mut guard = self.lock()?;
        let submission = guard
            .submissions
            .iter_mut()
            .find(|submission| &submission.id == submission_id)
            .ok_or(LedgerError::NotFound)?;
        submission.status = SubmissionStatus::UnderReview;

        let entry = ReviewEntry {
            submission_id: submission_id.clone(),
            reviewer_id: reviewer_id.clone(),
            assigned_at,
            completed: false,
            completed_at: None,
        };
        guard.reviews.insert(submission_id.clone(), entry.clone());
        Ok(entry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIXTURE: &str = r#"{
        "reviewers": [
            { "id": "rev-1", "name": "Ada", "church_id": "c1", "district_id": "d1" },
            { "id": "rev-2", "name": "Ben", "active": false }
        ],
        "submissions": [
            { "id": "sub-1", "status": "pending_review" },
            { "id": "sub-2", "status": "under_review" },
            { "id": "sub-3", "status": "completed" }
        ],
        "reviews": [
            { "submission_id": "sub-2", "reviewer_id": "rev-1", "assigned_at": "2025-09-01T09:00:00Z" },
            { "submission_id": "sub-3", "reviewer_id": "rev-1", "assigned_at": "2025-08-01T09:00:00Z",
              "completed": true, "completed_at": "2025-08-03T09:00:00Z" }
        ]
    }"#;

    fn desk() -> InMemoryReviewDesk {
        let fixture: DeskFixture = serde_json::from_str(FIXTURE).expect("fixture parses");
        InMemoryReviewDesk::from_fixture(fixture)
    }

    #[test]
    fn counts_open_and_completed_reviews() {
        let counts = desk()
            .load_counts(&ReviewerId("rev-1".to_string()))
            .expect("counts load");
        assert_eq!(
            counts,
            LoadCounts {
                pending: 1,
                completed: 1
            }
        );
    }

    #[test]
    fn filters_inactive_reviewers() {
        let desk = desk();
        assert_eq!(desk.reviewers(true).expect("pool loads").len(), 1);
        assert_eq!(desk.reviewers(false).expect("pool loads").len(), 2);
    }

    #[test]
    fn assign_moves_submission_under_review() {
        let desk = desk();
        let id = SubmissionId("sub-1".to_string());
        desk.assign(&id, &ReviewerId("rev-1".to_string()), Utc::now())
            .expect("assignment stored");

        let fixture = desk.to_fixture().expect("fixture exports");
        let stored = fixture
            .submissions
            .iter()
            .find(|submission| submission.id == id)
            .expect("submission present");
        assert_eq!(stored.status, SubmissionStatus::UnderReview);
        assert_eq!(fixture.reviews.len(), 3);
        assert!(desk
            .submissions(&SubmissionQuery::PendingReview { limit: None })
            .expect("query runs")
            .is_empty());
    }

    #[test]
    fn assign_rejects_unknown_submissions() {
        let result = desk().assign(
            &SubmissionId("missing".to_string()),
            &ReviewerId("rev-1".to_string()),
            Utc::now(),
        );
        assert!(matches!(result, Err(LedgerError::NotFound)));
    }

    #[test]
    fn pending_limit_skips_linked_submissions() {
        let desk = desk();
        desk.assign(
            &SubmissionId("sub-1".to_string()),
            &ReviewerId("rev-1".to_string()),
            Utc::now(),
        )
        .expect("assignment stored");
        {
            let mut guard = desk.lock().expect("state locks");
            guard.submissions.push(Submission {
                id: SubmissionId("sub-4".to_string()),
                task: None,
                student: None,
                status: SubmissionStatus::PendingReview,
            });
            // linked, yet still flagged pending
            guard.submissions[0].status = SubmissionStatus::PendingReview;
        }

        let selected = desk
            .submissions(&SubmissionQuery::PendingReview { limit: Some(1) })
            .expect("query runs");
        let ids: Vec<&str> = selected.iter().map(|s| s.id.0.as_str()).collect();
        assert_eq!(ids, vec!["sub-4"]);
    }

    #[test]
    fn selection_drops_repeated_ids() {
        let id = SubmissionId("sub-1".to_string());
        let selected = desk()
            .submissions(&SubmissionQuery::ByIds(vec![id.clone(), id.clone()]))
            .expect("query runs");
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].id, id);
    }

    #[test]
    fn selection_preserves_requested_order() {
        let selected = desk()
            .submissions(&SubmissionQuery::ByIds(vec![
                SubmissionId("sub-3".to_string()),
                SubmissionId("sub-1".to_string()),
            ]))
            .expect("query runs");
        let ids: Vec<&str> = selected.iter().map(|s| s.id.0.as_str()).collect();
        assert_eq!(ids, vec!["sub-3", "sub-1"]);
    }
}
