//! Concurrent fan-out over the selected strategies.
//!
//! Every selected strategy is called concurrently under its own timeout.
//! Calls are isolated: one failing or timing out neither cancels nor delays
//! the others. Results are merged by plain concatenation in selection order,
//! with no cross-strategy score normalization; the reranker is responsible
//! for any cross-strategy ordering.

use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::future::join_all;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use ensemble_core::{
    Candidate, EnsembleError, MergedPool, Passage, Result, SelectionDecision, StrategyFailure,
};

use crate::registry::StrategyRegistry;
use crate::utils::bounded;

/// Fans a query out to the strategies of a [`SelectionDecision`].
///
/// # Examples
///
/// ```rust,no_run
/// use std::sync::Arc;
/// use std::time::Duration;
/// use ensemble_query::retriever::EnsembleRetriever;
/// use ensemble_query::registry::StrategyRegistry;
/// use ensemble_core::SelectionDecision;
/// use tokio_util::sync::CancellationToken;
///
/// # async fn example(registry: Arc<StrategyRegistry>, decision: SelectionDecision) -> ensemble_core::Result<()> {
/// let retriever = EnsembleRetriever::new(registry).with_strategy_timeout(Duration::from_secs(5));
/// let pool = retriever
///     .retrieve("who maintains the index?", &decision, 4, &CancellationToken::new())
///     .await?;
/// println!("{} candidates, {} strategies excluded", pool.len(), pool.failures().len());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct EnsembleRetriever {
    registry: Arc<StrategyRegistry>,
    strategy_timeout: Duration,
}

impl EnsembleRetriever {
    /// Create a retriever over `registry`.
    pub fn new(registry: Arc<StrategyRegistry>) -> Self {
        Self {
            registry,
            strategy_timeout: Duration::from_secs(10),
        }
    }

    /// Set the per-strategy call timeout.
    #[must_use]
    pub fn with_strategy_timeout(mut self, timeout: Duration) -> Self {
        self.strategy_timeout = timeout;
        self
    }

    /// The registry this retriever draws strategies from.
    #[must_use]
    pub fn registry(&self) -> &Arc<StrategyRegistry> {
        &self.registry
    }

    async fn call_strategy(
        &self,
        strategy_id: &str,
        query: &str,
        per_strategy_k: usize,
        cancel: &CancellationToken,
    ) -> Result<Vec<Passage>> {
        let strategy = self.registry.get(strategy_id)?;
        let started = Instant::now();
        let operation = format!("strategy '{strategy_id}'");

        let mut passages = bounded(
            &operation,
            self.strategy_timeout,
            cancel,
            strategy.retrieve(query, per_strategy_k),
        )
        .await?;

        if passages.len() > per_strategy_k {
            debug!(
                strategy_id,
                returned = passages.len(),
                per_strategy_k,
                "Strategy returned more passages than requested, truncating"
            );
            passages.truncate(per_strategy_k);
        }
        debug!(
            strategy_id,
            count = passages.len(),
            elapsed = ?started.elapsed(),
            "Strategy call finished"
        );
        Ok(passages)
    }

    /// Retrieve from every chosen strategy and merge the results.
    ///
    /// Succeeds as long as at least one strategy call succeeds; the excluded
    /// strategies are listed in [`MergedPool::failures`]. Fails with
    /// [`EnsembleError::AllStrategiesFailed`] when none does, and with
    /// [`EnsembleError::Cancelled`] when `cancel` fires.
    #[instrument(skip(self, decision, cancel), fields(strategies = decision.len()))]
    pub async fn retrieve(
        &self,
        query: &str,
        decision: &SelectionDecision,
        per_strategy_k: usize,
        cancel: &CancellationToken,
    ) -> Result<MergedPool> {
        if per_strategy_k == 0 {
            return Err(EnsembleError::validation(
                "per_strategy_k must be greater than 0",
            ));
        }
        if decision.is_empty() {
            return Err(EnsembleError::validation(
                "Selection decision names no strategies",
            ));
        }

        let calls = decision.chosen_strategy_ids().iter().map(|id| async move {
            let outcome = self.call_strategy(id, query, per_strategy_k, cancel).await;
            (id.as_str(), outcome)
        });
        let outcomes = join_all(calls).await;

        if cancel.is_cancelled() {
            return Err(EnsembleError::cancelled("ensemble retrieval"));
        }

        let mut candidates = Vec::new();
        let mut counts = Vec::new();
        let mut failures = Vec::new();

        for (strategy_id, outcome) in outcomes {
            match outcome {
                Ok(passages) => {
                    counts.push((strategy_id.to_string(), passages.len()));
                    candidates.extend(
                        passages
                            .into_iter()
                            .map(|passage| Candidate::from_passage(passage, strategy_id)),
                    );
                }
                Err(e) => {
                    warn!(strategy_id, error = %e, "Strategy call failed, excluding it from the pool");
                    failures.push(StrategyFailure::new(strategy_id, e.to_string()));
                }
            }
        }

        if counts.is_empty() {
            return Err(EnsembleError::AllStrategiesFailed { failures });
        }

        info!(
            "Merged {} candidates from {} strategies ({} excluded)",
            candidates.len(),
            counts.len(),
            failures.len()
        );
        Ok(MergedPool::with_counts(candidates, counts, failures))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::StrategyMetadata;
    use async_trait::async_trait;
    use ensemble_core::RetrievalStrategy;

    #[derive(Debug)]
    struct Slow(Duration);

    #[async_trait]
    impl RetrievalStrategy for Slow {
        async fn retrieve(&self, query: &str, k: usize) -> Result<Vec<Passage>> {
            tokio::time::sleep(self.0).await;
            Ok((0..k + 2)
                .map(|n| Passage::new(format!("{query} {n}"), format!("slow#{n}"), 1.0))
                .collect())
        }
    }

    #[derive(Debug)]
    struct Empty;

    #[async_trait]
    impl RetrievalStrategy for Empty {
        async fn retrieve(&self, _query: &str, _k: usize) -> Result<Vec<Passage>> {
            Ok(vec![])
        }
    }

    fn decision(ids: &[&str]) -> SelectionDecision {
        let mut decision = SelectionDecision::new();
        for id in ids {
            decision.push(*id, "test");
        }
        decision
    }

    fn retriever() -> EnsembleRetriever {
        let mut registry = StrategyRegistry::new();
        registry
            .register_with_id("fast", Arc::new(Slow(Duration::ZERO)), StrategyMetadata::new("fast", 128))
            .unwrap();
        registry
            .register_with_id("empty", Arc::new(Empty), StrategyMetadata::new("empty", 256))
            .unwrap();
        registry
            .register_with_id("stuck", Arc::new(Slow(Duration::from_secs(30))), StrategyMetadata::new("stuck", 512))
            .unwrap();
        EnsembleRetriever::new(Arc::new(registry)).with_strategy_timeout(Duration::from_millis(50))
    }

    #[tokio::test]
    async fn test_timeout_excludes_strategy() {
        let pool = retriever()
            .retrieve("q", &decision(&["stuck", "fast"]), 2, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(pool.len(), 2);
        assert!(pool.iter().all(|c| c.strategy_id == "fast"));
        assert_eq!(pool.failures().len(), 1);
        assert_eq!(pool.failures()[0].strategy_id, "stuck");
        assert!(pool.failures()[0].cause.starts_with("Timeout"));
    }

    #[tokio::test]
    async fn test_unregistered_id_is_a_failure_not_an_abort() {
        let pool = retriever()
            .retrieve("q", &decision(&["ghost", "fast"]), 1, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(pool.len(), 1);
        assert_eq!(pool.failures()[0].strategy_id, "ghost");
    }

    #[tokio::test]
    async fn test_cancellation_discards_everything() {
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            trigger.cancel();
        });

        let err = retriever()
            .with_strategy_timeout(Duration::from_secs(60))
            .retrieve("q", &decision(&["fast", "stuck"]), 1, &cancel)
            .await
            .unwrap_err();

        assert!(err.is_cancelled());
    }

    #[tokio::test]
    async fn test_empty_success_is_counted() {
        let pool = retriever()
            .retrieve("q", &decision(&["empty", "fast"]), 2, &CancellationToken::new())
            .await
            .unwrap();

        assert!(pool.failures().is_empty());
        assert_eq!(
            pool.per_strategy_counts(),
            vec![("empty".to_string(), 0), ("fast".to_string(), 2)]
        );
    }

    #[tokio::test]
    async fn test_rejects_zero_k() {
        let err = retriever()
            .retrieve("q", &decision(&["fast"]), 0, &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, EnsembleError::Validation { .. }));
    }
}
