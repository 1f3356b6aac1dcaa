use super::domain::{same_unit, Reviewer, Submission};
use super::workload::{WorkloadEntry, WorkloadSnapshot};

/// Narrow the snapshot to reviewers allowed to grade the submission.
///
/// With `exclude_same_unit` set, reviewers sharing the student's church or
/// district are removed. A submission without a student passes every
/// reviewer through unfiltered.
pub fn eligible_reviewers<'a>(
    snapshot: &'a WorkloadSnapshot,
    submission: &Submission,
    exclude_same_unit: bool,
) -> Vec<&'a WorkloadEntry> {
    let student = match (&submission.student, exclude_same_unit) {
        (Some(student), true) => student,
        _ => return snapshot.entries().iter().collect(),
    };

    snapshot
        .entries()
        .iter()
        .filter(|entry| {
            !shares_unit(
                &entry.reviewer,
                student.church_id.as_deref(),
                student.district_id.as_deref(),
            )
        })
        .collect()
}

fn shares_unit(reviewer: &Reviewer, church_id: Option<&str>, district_id: Option<&str>) -> bool {
    same_unit(reviewer.church_id.as_deref(), church_id)
        || same_unit(reviewer.district_id.as_deref(), district_id)
}
