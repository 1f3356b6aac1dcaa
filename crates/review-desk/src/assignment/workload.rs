use std::collections::HashMap;

use serde::Serialize;

use super::domain::{Reviewer, ReviewerId};
use super::repository::{LedgerError, ReviewLedger, ReviewerPool};

/// Derived per-reviewer aggregate used while distributing a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkloadEntry {
    pub reviewer: Reviewer,
    pub current_load: u32,
    pub completed_count: u32,
}

impl WorkloadEntry {
    pub fn total_assigned(&self) -> u32 {
        self.current_load + self.completed_count
    }

    /// Open work is weighted double so it dominates historical volume.
    pub fn workload_score(&self) -> u32 {
        self.current_load * 2 + self.completed_count
    }

    pub fn view(&self) -> WorkloadEntryView {
        WorkloadEntryView {
            reviewer_id: self.reviewer.id.clone(),
            reviewer_name: self.reviewer.name.clone(),
            active: self.reviewer.active,
            current_load: self.current_load,
            completed_count: self.completed_count,
            total_assigned: self.total_assigned(),
            workload_score: self.workload_score(),
        }
    }
}

/// Serializable projection of a [`WorkloadEntry`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WorkloadEntryView {
    pub reviewer_id: ReviewerId,
    pub reviewer_name: String,
    pub active: bool,
    pub current_load: u32,
    pub completed_count: u32,
    pub total_assigned: u32,
    pub workload_score: u32,
}

/// Batch-scoped workload view keyed by reviewer id.
///
/// Entries keep the order in which the pool returned reviewers; strategies
/// break ties on that order.
#[derive(Debug, Clone, Default)]
pub struct WorkloadSnapshot {
    entries: Vec<WorkloadEntry>,
    index: HashMap<ReviewerId, usize>,
}

impl WorkloadSnapshot {
    /// Read the reviewer pool and each reviewer's ledger counts.
    ///
    /// An empty pool produces an empty snapshot rather than an error.
    pub fn build<P, L>(pool: &P, ledger: &L, only_active: bool) -> Result<Self, LedgerError>
    where
        P: ReviewerPool + ?Sized,
        L: ReviewLedger + ?Sized,
    {
        let reviewers = pool.reviewers(only_active)?;
        let mut snapshot = Self::default();
        for reviewer in reviewers {
            let counts = ledger.load_counts(&reviewer.id)?;
            snapshot.insert(WorkloadEntry {
                reviewer,
                current_load: counts.pending,
                completed_count: counts.completed,
            });
        }
        Ok(snapshot)
    }

    pub fn from_entries(entries: impl IntoIterator<Item = WorkloadEntry>) -> Self {
        let mut snapshot = Self::default();
        for entry in entries {
            snapshot.insert(entry);
        }
        snapshot
    }

    fn insert(&mut self, entry: WorkloadEntry) {
        match self.index.get(&entry.reviewer.id) {
            Some(&slot) => self.entries[slot] = entry,
            None => {
                self.index.insert(entry.reviewer.id.clone(), self.entries.len());
                self.entries.push(entry);
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn entries(&self) -> &[WorkloadEntry] {
        &self.entries
    }

    pub fn get(&self, reviewer_id: &ReviewerId) -> Option<&WorkloadEntry> {
        self.index.get(reviewer_id).map(|&slot| &self.entries[slot])
    }

    /// Count one more open review against the reviewer for the rest of the batch.
    pub fn record_assignment(&mut self, reviewer_id: &ReviewerId) -> bool {
        match self.index.get(reviewer_id) {
            Some(&slot) => {
                self.entries[slot].current_load += 1;
                true
            }
            None => false,
        }
    }
}
