//! Reranked, size-capped result set.

use serde::{Deserialize, Serialize};

use super::Candidate;

/// A candidate with the score assigned by the reranker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedCandidate {
    /// The candidate as it appeared in the merged pool.
    pub candidate: Candidate,
    /// Reranker score; only comparable within one result.
    pub score: f32,
    /// Position of the candidate in the merged pool.
    pub pool_index: usize,
    /// Judge rationale, when one was given.
    pub rationale: Option<String>,
}

/// Final ranked context for a query.
///
/// Scores are non-increasing in list order. `degraded` is set when the
/// judge failed and the result is the head of the merged pool instead.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RankedResult {
    candidates: Vec<RankedCandidate>,
    degraded: bool,
}

impl RankedResult {
    /// Build a result from already ordered candidates.
    #[must_use]
    pub fn new(candidates: Vec<RankedCandidate>, degraded: bool) -> Self {
        Self {
            candidates,
            degraded,
        }
    }

    /// Ranked candidates, best first.
    #[must_use]
    pub fn candidates(&self) -> &[RankedCandidate] {
        &self.candidates
    }

    /// Whether the judge was bypassed.
    #[must_use]
    pub fn is_degraded(&self) -> bool {
        self.degraded
    }

    /// Reranker scores in list order.
    #[must_use]
    pub fn scores(&self) -> Vec<f32> {
        self.candidates.iter().map(|c| c.score).collect()
    }

    /// Number of ranked candidates.
    #[must_use]
    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    /// Whether nothing was ranked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    /// Iterate ranked candidates, best first.
    pub fn iter(&self) -> std::slice::Iter<'_, RankedCandidate> {
        self.candidates.iter()
    }

    /// Consume into the bare candidates, best first.
    #[must_use]
    pub fn into_candidates(self) -> Vec<Candidate> {
        self.candidates.into_iter().map(|r| r.candidate).collect()
    }
}

impl<'a> IntoIterator for &'a RankedResult {
    type Item = &'a RankedCandidate;
    type IntoIter = std::slice::Iter<'a, RankedCandidate>;

    fn into_iter(self) -> Self::IntoIter {
        self.candidates.iter()
    }
}
