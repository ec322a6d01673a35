//! The merged candidate pool produced by fan-out retrieval.

use serde::{Deserialize, Serialize};

use super::Candidate;
use crate::error::StrategyFailure;

/// Concatenation of every successful strategy's results.
///
/// Candidates appear in selection order, then in each strategy's own order.
/// Nothing is deduplicated: a passage found by two strategies appears twice,
/// once per originating strategy.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MergedPool {
    candidates: Vec<Candidate>,
    #[serde(default)]
    counts: Vec<(String, usize)>,
    failures: Vec<StrategyFailure>,
}

fn count_runs(candidates: &[Candidate]) -> Vec<(String, usize)> {
    let mut counts: Vec<(String, usize)> = Vec::new();
    for candidate in candidates {
        match counts.last_mut() {
            Some((id, count)) if *id == candidate.strategy_id => *count += 1,
            _ => counts.push((candidate.strategy_id.clone(), 1)),
        }
    }
    counts
}

impl MergedPool {
    /// Build a pool from already merged candidates and the excluded strategies.
    ///
    /// Per-strategy counts are derived from the candidates, so strategies
    /// that contributed nothing are not listed; use
    /// [`MergedPool::with_counts`] when they are known.
    #[must_use]
    pub fn new(candidates: Vec<Candidate>, failures: Vec<StrategyFailure>) -> Self {
        let counts = count_runs(&candidates);
        Self {
            candidates,
            counts,
            failures,
        }
    }

    /// Build a pool with an explicit count for every successful strategy,
    /// including those that returned no passages.
    #[must_use]
    pub fn with_counts(
        candidates: Vec<Candidate>,
        counts: Vec<(String, usize)>,
        failures: Vec<StrategyFailure>,
    ) -> Self {
        Self {
            candidates,
            counts,
            failures,
        }
    }

    /// All candidates in merge order.
    #[must_use]
    pub fn candidates(&self) -> &[Candidate] {
        &self.candidates
    }

    /// Strategies that were selected but excluded because their call failed.
    #[must_use]
    pub fn failures(&self) -> &[StrategyFailure] {
        &self.failures
    }

    /// Number of candidates.
    #[must_use]
    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    /// Whether the pool holds no candidates.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    /// Iterate candidates in merge order.
    pub fn iter(&self) -> std::slice::Iter<'_, Candidate> {
        self.candidates.iter()
    }

    /// Candidate count per successful strategy, in merge order.
    #[must_use]
    pub fn per_strategy_counts(&self) -> Vec<(String, usize)> {
        self.counts.clone()
    }

    /// Split into candidates and failures.
    #[must_use]
    pub fn into_parts(self) -> (Vec<Candidate>, Vec<StrategyFailure>) {
        (self.candidates, self.failures)
    }
}

impl<'a> IntoIterator for &'a MergedPool {
    type Item = &'a Candidate;
    type IntoIter = std::slice::Iter<'a, Candidate>;

    fn into_iter(self) -> Self::IntoIter {
        self.candidates.iter()
    }
}
