use serde::Serialize;

use super::workload::{WorkloadEntryView, WorkloadSnapshot};

/// Summary of reviewer workload across the pool.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorkloadStatistics {
    pub total_reviewers: usize,
    pub active_reviewers: usize,
    pub total_pending: u32,
    pub total_completed: u32,
    pub average_load: f64,
    pub max_load: u32,
    pub min_load: u32,
    /// Sorted ascending by workload score.
    pub per_reviewer_details: Vec<WorkloadEntryView>,
}

impl WorkloadStatistics {
    /// Aggregate a freshly built snapshot. The snapshot is only read.
    pub fn from_snapshot(snapshot: &WorkloadSnapshot) -> Self {
        let entries = snapshot.entries();
        let active_reviewers = entries.iter().filter(|entry| entry.reviewer.active).count();
        let total_pending: u32 = entries.iter().map(|entry| entry.current_load).sum();
        let total_completed: u32 = entries.iter().map(|entry| entry.completed_count).sum();

        let average_load = if active_reviewers > 0 {
            round_to_cents(f64::from(total_pending) / active_reviewers as f64)
        } else {
            0.0
        };

        let max_load = entries
            .iter()
            .map(|entry| entry.current_load)
            .max()
            .unwrap_or(0);
        let min_load = entries
            .iter()
            .map(|entry| entry.current_load)
            .min()
            .unwrap_or(0);

        let mut per_reviewer_details: Vec<WorkloadEntryView> =
            entries.iter().map(|entry| entry.view()).collect();
        per_reviewer_details.sort_by_key(|view| view.workload_score);

        Self {
            total_reviewers: entries.len(),
            active_reviewers,
            total_pending,
            total_completed,
            average_load,
            max_load,
            min_load,
            per_reviewer_details,
        }
    }
}

fn round_to_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
