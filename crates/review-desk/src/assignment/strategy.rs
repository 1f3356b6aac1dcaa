use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{Timelike, Utc};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::workload::WorkloadEntry;

/// Reviewer selection algorithm applied to an eligible set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssignmentStrategy {
    /// First reviewer with the minimum open load.
    #[default]
    Balanced,
    /// Rotate through the minimum-load cohort using a shared counter.
    RoundRobin,
    /// Uniform pick within the minimum-load cohort.
    Random,
}

impl AssignmentStrategy {
    pub const fn label(self) -> &'static str {
        match self {
            AssignmentStrategy::Balanced => "balanced",
            AssignmentStrategy::RoundRobin => "round_robin",
            AssignmentStrategy::Random => "random",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown assignment strategy '{0}' (expected balanced, round_robin, or random)")]
pub struct UnknownStrategy(pub String);

impl FromStr for AssignmentStrategy {
    type Err = UnknownStrategy;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "balanced" => Ok(Self::Balanced),
            "round_robin" | "round-robin" | "roundrobin" => Ok(Self::RoundRobin),
            "random" => Ok(Self::Random),
            _ => Err(UnknownStrategy(value.to_string())),
        }
    }
}

/// Monotonic counter driving round-robin picks for the lifetime of a service.
#[derive(Debug, Default)]
pub struct RoundRobinCounter {
    next: AtomicU64,
}

impl RoundRobinCounter {
    pub fn new(seed: u64) -> Self {
        Self {
            next: AtomicU64::new(seed),
        }
    }

    /// Seed from the wall-clock minute modulo 10 so separate processes start
    /// at different offsets. This lowers, but does not remove, collisions.
    pub fn from_clock() -> Self {
        Self::new(u64::from(Utc::now().minute() % 10))
    }

    pub fn current(&self) -> u64 {
        self.next.load(Ordering::Relaxed)
    }

    /// Return the current value and move the counter forward.
    pub fn advance(&self) -> u64 {
        self.next.fetch_add(1, Ordering::Relaxed)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SelectionError {
    #[error("no eligible reviewers to select from")]
    NoEligibleReviewers,
}

/// Pick one reviewer from a non-empty eligible set.
///
/// Every strategy first narrows to the reviewers sharing the minimum
/// `current_load`, so no pick ever carries more open work than another
/// eligible reviewer.
pub fn select_reviewer<'a, R>(
    strategy: AssignmentStrategy,
    eligible: &[&'a WorkloadEntry],
    counter: &RoundRobinCounter,
    rng: &mut R,
) -> Result<&'a WorkloadEntry, SelectionError>
where
    R: Rng + ?Sized,
{
    let cohort = minimum_load_cohort(eligible);
    if cohort.is_empty() {
        return Err(SelectionError::NoEligibleReviewers);
    }

    let selected = match strategy {
        AssignmentStrategy::Balanced => cohort[0],
        AssignmentStrategy::RoundRobin => {
            let slot = counter.advance() % cohort.len() as u64;
            cohort[slot as usize]
        }
        AssignmentStrategy::Random => *cohort
            .choose(rng)
            .ok_or(SelectionError::NoEligibleReviewers)?,
    };
    Ok(selected)
}

/// Reviewers sharing the lowest open load, in their original order.
pub(crate) fn minimum_load_cohort<'a>(eligible: &[&'a WorkloadEntry]) -> Vec<&'a WorkloadEntry> {
    let Some(minimum) = eligible.iter().map(|entry| entry.current_load).min() else {
        return Vec::new();
    };
    eligible
        .iter()
        .copied()
        .filter(|entry| entry.current_load == minimum)
        .collect()
}
