//! Rerank-driven truncation of the merged pool.
//!
//! The judge sees the whole pool at once and returns either the chosen
//! candidates best first or a fresh score for every candidate. Anything it
//! gets wrong (call failure, timeout, wrong number of choices, unknown or
//! repeated ids, non-finite scores) makes the stage fall back to the head of
//! the pool, flagged as degraded.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use ensemble_core::{
    Candidate, EnsembleError, JudgeCandidate, JudgeRequest, JudgeResponse, MergedPool,
    RankedCandidate, RankedResult, RelevanceJudge, Result,
};

use crate::utils::bounded;

/// Reorders and caps a merged pool.
#[async_trait]
pub trait Reranker: Send + Sync + std::fmt::Debug {
    /// Produce at most `top_n` candidates from `pool`, best first.
    async fn rerank(
        &self,
        query: &str,
        pool: &MergedPool,
        top_n: usize,
        cancel: &CancellationToken,
    ) -> Result<RankedResult>;

    /// Get a human-readable name for this reranker.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

/// Score for rank position `position` out of `len`: `1.0` down to `1/len`.
#[allow(clippy::cast_precision_loss)]
fn positional_score(position: usize, len: usize) -> f32 {
    (len - position) as f32 / len as f32
}

/// Relevance-judge backed reranker.
///
/// Duplicates (the same passage found by several strategies) are kept by
/// default so multi-strategy recall stays visible to the metric stage.
#[derive(Debug)]
pub struct JudgeReranker {
    judge: Arc<dyn RelevanceJudge>,
    timeout: Duration,
    dedup: bool,
}

impl JudgeReranker {
    /// Create a reranker around a judge.
    pub fn new(judge: Arc<dyn RelevanceJudge>) -> Self {
        Self {
            judge,
            timeout: Duration::from_secs(30),
            dedup: false,
        }
    }

    /// Set the judge call timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Collapse candidates with equal content and source before judging.
    #[must_use]
    pub fn with_dedup(mut self, dedup: bool) -> Self {
        self.dedup = dedup;
        self
    }

    /// Pool entries offered to the judge, as `(pool_index, candidate)`.
    fn entries<'a>(&self, pool: &'a MergedPool) -> Vec<(usize, &'a Candidate)> {
        if !self.dedup {
            return pool.iter().enumerate().collect();
        }

        let mut seen = HashSet::new();
        pool.iter()
            .enumerate()
            .filter(|&(_, candidate)| seen.insert(candidate.identity()))
            .collect()
    }

    /// Turn a judge response into ranked candidates, or say why it is unusable.
    fn validate(
        response: JudgeResponse,
        entries: &[(usize, &Candidate)],
        expected: usize,
    ) -> std::result::Result<Vec<RankedCandidate>, String> {
        let returned = response.choices.len();
        let scored = response.choices.iter().filter(|c| c.score.is_some()).count();
        if scored != 0 && scored != returned {
            return Err(format!("{scored} of {returned} choices carry a score"));
        }

        // A scored reply may cover more than `expected` entries, up to the
        // whole offer; it is cut after sorting.
        let cardinality_ok = if scored == 0 {
            returned == expected
        } else {
            (expected..=entries.len()).contains(&returned)
        };
        if !cardinality_ok {
            return Err(format!("expected {expected} choices, got {returned}"));
        }

        let offered: HashSet<usize> = entries.iter().map(|(index, _)| *index).collect();
        let mut used = HashSet::new();
        let mut ranked = Vec::with_capacity(returned);

        for (position, choice) in response.choices.into_iter().enumerate() {
            let pool_index = choice
                .id
                .trim()
                .parse::<usize>()
                .ok()
                .filter(|index| offered.contains(index))
                .ok_or_else(|| format!("unknown candidate reference '{}'", choice.id))?;
            if !used.insert(pool_index) {
                return Err(format!("candidate {pool_index} chosen twice"));
            }

            let score = match choice.score {
                Some(score) if score.is_finite() => score,
                Some(score) => return Err(format!("non-finite score {score}")),
                None => positional_score(position, expected),
            };
            let candidate = entries
                .iter()
                .find(|(index, _)| *index == pool_index)
                .map(|(_, candidate)| (*candidate).clone())
                .ok_or_else(|| format!("unknown candidate reference '{pool_index}'"))?;

            ranked.push(RankedCandidate {
                candidate,
                score,
                pool_index,
                rationale: Some(choice.rationale).filter(|r| !r.trim().is_empty()),
            });
        }

        ranked.sort_by(|a, b| {
            b.score
                .total_cmp(&a.score)
                .then(a.pool_index.cmp(&b.pool_index))
        });
        ranked.truncate(expected);
        Ok(ranked)
    }

    /// The first `top_n` offered entries, in pool order.
    fn fallback(entries: &[(usize, &Candidate)], top_n: usize) -> RankedResult {
        let len = top_n.min(entries.len());
        let candidates = entries
            .iter()
            .take(len)
            .enumerate()
            .map(|(position, (pool_index, candidate))| RankedCandidate {
                candidate: (*candidate).clone(),
                score: positional_score(position, len),
                pool_index: *pool_index,
                rationale: None,
            })
            .collect();
        RankedResult::new(candidates, true)
    }
}

#[async_trait]
impl Reranker for JudgeReranker {
    #[instrument(skip(self, pool, cancel), fields(pool = pool.len(), judge = self.judge.name()))]
    async fn rerank(
        &self,
        query: &str,
        pool: &MergedPool,
        top_n: usize,
        cancel: &CancellationToken,
    ) -> Result<RankedResult> {
        if top_n == 0 {
            return Err(EnsembleError::validation("top_n must be greater than 0"));
        }

        let entries = self.entries(pool);
        if entries.is_empty() {
            return Ok(RankedResult::default());
        }
        if entries.len() < pool.len() {
            debug!(
                removed = pool.len() - entries.len(),
                "Deduplicated pool before reranking"
            );
        }

        let expected = top_n.min(entries.len());
        let request = JudgeRequest {
            query: query.to_string(),
            candidates: entries
                .iter()
                .map(|(index, candidate)| JudgeCandidate::new(index.to_string(), candidate.content.clone()))
                .collect(),
            max_outputs: expected,
        };

        let response = match bounded("rerank", self.timeout, cancel, self.judge.judge(&request)).await {
            Ok(response) => response,
            Err(e) if e.is_cancelled() => return Err(e),
            Err(e) => {
                warn!(error = %e, "Rerank judge failed, returning pool order");
                return Ok(Self::fallback(&entries, top_n));
            }
        };

        match Self::validate(response, &entries, expected) {
            Ok(ranked) => {
                info!("Reranked {} candidates down to {}", entries.len(), ranked.len());
                Ok(RankedResult::new(ranked, false))
            }
            Err(reason) => {
                warn!(%reason, "Rerank judge returned malformed output, returning pool order");
                Ok(Self::fallback(&entries, top_n))
            }
        }
    }
}
