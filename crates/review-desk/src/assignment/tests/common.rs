use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use axum::response::Response;
use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::assignment::domain::{
    LoadCounts, ReviewEntry, Reviewer, ReviewerId, Student, StudentId, Submission, SubmissionId,
    SubmissionStatus,
};
use crate::assignment::repository::{LedgerError, ReviewLedger, ReviewerPool, SubmissionQuery};
use crate::assignment::{BatchOptions, ReviewAssignmentService, RoundRobinCounter};

pub(super) fn reviewer(id: &str, church: &str, district: &str) -> Reviewer {
    Reviewer {
        id: ReviewerId(id.to_string()),
        name: format!("Reviewer {id}"),
        active: true,
        church_id: Some(church.to_string()),
        district_id: Some(district.to_string()),
    }
}

pub(super) fn student(church: &str, district: &str) -> Student {
    Student {
        id: StudentId(format!("stu-{church}-{district}")),
        name: "Student".to_string(),
        church_id: Some(church.to_string()),
        district_id: Some(district.to_string()),
    }
}

pub(super) fn submission(id: &str, student: Option<Student>) -> Submission {
    Submission {
        id: SubmissionId(id.to_string()),
        task: Some("Week 1 reflection".to_string()),
        student,
        status: SubmissionStatus::PendingReview,
    }
}

pub(super) fn sid(id: &str) -> SubmissionId {
    SubmissionId(id.to_string())
}

pub(super) fn rid(id: &str) -> ReviewerId {
    ReviewerId(id.to_string())
}

pub(super) fn options(strategy: crate::assignment::AssignmentStrategy) -> BatchOptions {
    BatchOptions {
        strategy,
        ..BatchOptions::default()
    }
}

fn assigned_at() -> DateTime<Utc> {
    DateTime::parse_from_rfc3339("2025-09-01T09:00:00Z")
        .expect("valid timestamp")
        .with_timezone(&Utc)
}

#[derive(Default)]
pub(super) struct DeskState {
    pub(super) reviewers: Vec<Reviewer>,
    pub(super) submissions: Vec<Submission>,
    pub(super) reviews: HashMap<SubmissionId, ReviewEntry>,
    pub(super) failing_writes: HashSet<SubmissionId>,
}

#[derive(Default, Clone)]
pub(super) struct MemoryDesk {
    pub(super) state: Arc<Mutex<DeskState>>,
}

impl MemoryDesk {
    pub(super) fn with_reviewers(reviewers: Vec<Reviewer>) -> Self {
        let desk = Self::default();
        desk.state.lock().expect("desk mutex poisoned").reviewers = reviewers;
        desk
    }

    pub(super) fn add_submission(&self, submission: Submission) {
        self.state
            .lock()
            .expect("desk mutex poisoned")
            .submissions
            .push(submission);
    }

    /// Seed open reviews so the reviewer starts the batch with `count` load.
    pub(super) fn seed_open_reviews(&self, reviewer_id: &str, count: usize) {
        for n in 0..count {
            let id = format!("seed-{reviewer_id}-{n}");
            let mut open = submission(&id, None);
            open.status = SubmissionStatus::UnderReview;
            self.add_submission(open);
            self.link(&id, reviewer_id, false);
        }
    }

    pub(super) fn seed_completed_reviews(&self, reviewer_id: &str, count: usize) {
        for n in 0..count {
            let id = format!("done-{reviewer_id}-{n}");
            let mut done = submission(&id, None);
            done.status = SubmissionStatus::Completed;
            self.add_submission(done);
            self.link(&id, reviewer_id, true);
        }
    }

    pub(super) fn link(&self, submission_id: &str, reviewer_id: &str, completed: bool) {
        let mut guard = self.state.lock().expect("desk mutex poisoned");
        guard.reviews.insert(
            sid(submission_id),
            ReviewEntry {
                submission_id: sid(submission_id),
                reviewer_id: rid(reviewer_id),
                assigned_at: assigned_at(),
                completed,
                completed_at: completed.then(assigned_at),
            },
        );
    }

    pub(super) fn fail_writes_for(&self, submission_id: &str) {
        self.state
            .lock()
            .expect("desk mutex poisoned")
            .failing_writes
            .insert(sid(submission_id));
    }

    pub(super) fn reviewer_of(&self, submission_id: &str) -> Option<ReviewerId> {
        self.state
            .lock()
            .expect("desk mutex poisoned")
            .reviews
            .get(&sid(submission_id))
            .map(|entry| entry.reviewer_id.clone())
    }

    pub(super) fn status_of(&self, submission_id: &str) -> Option<SubmissionStatus> {
        self.state
            .lock()
            .expect("desk mutex poisoned")
            .submissions
            .iter()
            .find(|submission| submission.id == sid(submission_id))
            .map(|submission| submission.status)
    }

    pub(super) fn submissions_snapshot(&self) -> Vec<Submission> {
        self.state
            .lock()
            .expect("desk mutex poisoned")
            .submissions
            .clone()
    }
}

impl ReviewerPool for MemoryDesk {
    fn reviewers(&self, only_active: bool) -> Result<Vec<Reviewer>, LedgerError> {
        let guard = self.state.lock().expect("desk mutex poisoned");
        Ok(guard
            .reviewers
            .iter()
            .filter(|reviewer| !only_active || reviewer.active)
            .cloned()
            .collect())
    }
}

impl ReviewLedger for MemoryDesk {
    fn load_counts(&self, reviewer_id: &ReviewerId) -> Result<LoadCounts, LedgerError> {
        let guard = self.state.lock().expect("desk mutex poisoned");
        let mut counts = LoadCounts::default();
        for entry in guard.reviews.values() {
            if &entry.reviewer_id != reviewer_id {
                continue;
            }
            if entry.completed {
                counts.completed += 1;
                continue;
            }
            let open = guard
                .submissions
                .iter()
                .find(|submission| submission.id == entry.submission_id)
                .is_some_and(|submission| submission.status.is_open());
            if open {
                counts.pending += 1;
            }
        }
        Ok(counts)
    }

    fn assigned_reviewer(
        &self,
        submission_id: &SubmissionId,
    ) -> Result<Option<ReviewerId>, LedgerError> {
        let guard = self.state.lock().expect("desk mutex poisoned");
        Ok(guard
            .reviews
            .get(submission_id)
            .map(|entry| entry.reviewer_id.clone()))
    }

    fn submissions(&self, query: &SubmissionQuery) -> Result<Vec<Submission>, LedgerError> {
        let guard = self.state.lock().expect("desk mutex poisoned");
        let selected = match query {
            SubmissionQuery::PendingReview { limit } => guard
                .submissions
                .iter()
                .filter(|submission| submission.status == SubmissionStatus::PendingReview)
                .take(limit.unwrap_or(usize::MAX))
                .cloned()
                .collect(),
            SubmissionQuery::ByIds(ids) => guard
                .submissions
                .iter()
                .filter(|submission| ids.contains(&submission.id))
                .cloned()
                .collect(),
        };
        Ok(selected)
    }

    fn assign(
        &self,
        submission_id: &SubmissionId,
        reviewer_id: &ReviewerId,
        assigned_at: DateTime<Utc>,
    ) -> Result<ReviewEntry, LedgerError> {
        let mut guard = self.state.lock().expect("desk mutex poisoned");
        if guard.failing_writes.contains(submission_id) {
            return Err(LedgerError::Unavailable("write rejected".to_string()));
        }
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

pub(super) struct UnavailableDesk;

impl ReviewerPool for UnavailableDesk {
    fn reviewers(&self, _only_active: bool) -> Result<Vec<Reviewer>, LedgerError> {
        Err(LedgerError::Unavailable("database offline".to_string()))
    }
}

impl ReviewLedger for UnavailableDesk {
    fn load_counts(&self, _reviewer_id: &ReviewerId) -> Result<LoadCounts, LedgerError> {
        Err(LedgerError::Unavailable("database offline".to_string()))
    }

    fn assigned_reviewer(
        &self,
        _submission_id: &SubmissionId,
    ) -> Result<Option<ReviewerId>, LedgerError> {
        Ok(None)
    }

    fn submissions(&self, _query: &SubmissionQuery) -> Result<Vec<Submission>, LedgerError> {
        Err(LedgerError::Unavailable("database offline".to_string()))
    }

    fn assign(
        &self,
        _submission_id: &SubmissionId,
        _reviewer_id: &ReviewerId,
        _assigned_at: DateTime<Utc>,
    ) -> Result<ReviewEntry, LedgerError> {
        Err(LedgerError::Unavailable("database offline".to_string()))
    }
}

pub(super) fn build_service(desk: &MemoryDesk) -> ReviewAssignmentService<MemoryDesk, MemoryDesk> {
    let desk = Arc::new(desk.clone());
    ReviewAssignmentService::with_counter(desk.clone(), desk, RoundRobinCounter::new(0))
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
