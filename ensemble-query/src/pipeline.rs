//! End-to-end ensemble query: select, fan out, merge, rerank.
//!
//! ```text
//! query → SelectionPolicy → EnsembleRetriever (concurrent) → MergedPool
//!       → Reranker → RankedResult → (evaluation) MetricTable
//! ```

use std::sync::Arc;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument, warn};

use ensemble_core::config::EnsembleConfig;
use ensemble_core::{
    EnsembleError, MetricTable, RankedResult, RelevanceJudge, Result, SelectionDecision,
    StrategyFailure,
};

use crate::metric;
use crate::registry::StrategyRegistry;
use crate::reranker::{JudgeReranker, Reranker};
use crate::retriever::EnsembleRetriever;
use crate::selector::{JudgeSelector, SelectionPolicy, select_or_fallback};

/// Everything produced for one query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnsembleResponse {
    /// The query text.
    pub query: String,
    /// Strategies invoked, in priority order.
    pub decision: SelectionDecision,
    /// Whether selection failed and every registered strategy was invoked.
    pub selection_fallback: bool,
    /// Size of the merged pool before reranking.
    pub pool_size: usize,
    /// Candidates contributed per strategy, in merge order.
    pub per_strategy_counts: Vec<(String, usize)>,
    /// Strategies excluded because their call failed or timed out.
    pub failures: Vec<StrategyFailure>,
    /// Final ranked context.
    pub ranked: RankedResult,
}

impl EnsembleResponse {
    /// Whether any stage fell back to degraded behaviour.
    #[must_use]
    pub fn is_degraded(&self) -> bool {
        self.selection_fallback || self.ranked.is_degraded() || !self.failures.is_empty()
    }
}

/// Ensemble retrieval over a fixed strategy registry.
///
/// # Examples
///
/// ```rust,no_run
/// use std::sync::Arc;
/// use ensemble_core::config::EnsembleConfig;
/// use ensemble_query::pipeline::EnsemblePipeline;
/// use ensemble_query::registry::StrategyRegistry;
///
/// # async fn example(
/// #     registry: StrategyRegistry,
/// #     judge: Arc<dyn ensemble_core::RelevanceJudge>,
/// # ) -> ensemble_core::Result<()> {
/// let pipeline = EnsemblePipeline::builder()
///     .registry(registry)
///     .judge(judge)
///     .config(EnsembleConfig::default().with_top_n(4))
///     .build()?;
///
/// let response = pipeline.query("What changed in the 2021 edition?").await?;
/// for (strategy, score) in pipeline.evaluate(&response).iter() {
///     println!("{strategy}: {score:.3}");
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct EnsemblePipeline {
    registry: Arc<StrategyRegistry>,
    selector: Arc<dyn SelectionPolicy>,
    retriever: EnsembleRetriever,
    reranker: Arc<dyn Reranker>,
    config: EnsembleConfig,
}

impl EnsemblePipeline {
    /// Create a builder for configuring the pipeline.
    #[must_use]
    pub fn builder() -> EnsemblePipelineBuilder {
        EnsemblePipelineBuilder::new()
    }

    /// The strategy registry.
    #[must_use]
    pub fn registry(&self) -> &StrategyRegistry {
        &self.registry
    }

    /// The active configuration.
    #[must_use]
    pub fn config(&self) -> &EnsembleConfig {
        &self.config
    }

    /// Run a query that cannot be cancelled from outside.
    pub async fn query(&self, query: &str) -> Result<EnsembleResponse> {
        self.query_with_cancel(query, &CancellationToken::new()).await
    }

    /// Run a query; cancelling `cancel` aborts every in-flight call and
    /// discards the partial result.
    #[instrument(skip(self, cancel), fields(strategies = self.registry.len()))]
    pub async fn query_with_cancel(
        &self,
        query: &str,
        cancel: &CancellationToken,
    ) -> Result<EnsembleResponse> {
        if query.trim().is_empty() {
            return Err(EnsembleError::validation("Query text must not be empty"));
        }
        let started = Instant::now();

        // 1. Select strategies
        let (decision, selection_fallback) = if self.config.fallback_to_all_on_empty_selection {
            select_or_fallback(
                self.selector.as_ref(),
                query,
                &self.registry,
                self.config.max_selections,
                cancel,
            )
            .await?
        } else {
            let decision = self
                .selector
                .select(query, &self.registry, self.config.max_selections, cancel)
                .await?;
            (decision, false)
        };

        // 2. Fan out and merge
        let pool = self
            .retriever
            .retrieve(query, &decision, self.config.per_strategy_k, cancel)
            .await?;

        // 3. Rerank and truncate
        let ranked = self
            .reranker
            .rerank(query, &pool, self.config.top_n, cancel)
            .await?;

        if cancel.is_cancelled() {
            return Err(EnsembleError::cancelled("ensemble query"));
        }

        let response = EnsembleResponse {
            query: query.to_string(),
            selection_fallback,
            pool_size: pool.len(),
            per_strategy_counts: pool.per_strategy_counts(),
            failures: pool.failures().to_vec(),
            decision,
            ranked,
        };

        if response.is_degraded() {
            warn!(
                selection_fallback = response.selection_fallback,
                rerank_degraded = response.ranked.is_degraded(),
                excluded = response.failures.len(),
                "Ensemble query completed in degraded mode"
            );
        }
        info!(
            "Ensemble query finished in {:?}: {} strategies, {} candidates, {} ranked",
            started.elapsed(),
            response.decision.len(),
            response.pool_size,
            response.ranked.len()
        );

        Ok(response)
    }

    /// Reciprocal-rank table of a response, grouped per the configuration.
    #[must_use]
    pub fn evaluate(&self, response: &EnsembleResponse) -> MetricTable<String> {
        metric::evaluate(&self.registry, &response.ranked, self.config.group_by)
    }
}

/// Builder for [`EnsemblePipeline`].
///
/// A single judge can back both selection and reranking; either stage can be
/// replaced with a custom implementation.
#[derive(Debug, Default)]
pub struct EnsemblePipelineBuilder {
    registry: Option<Arc<StrategyRegistry>>,
    judge: Option<Arc<dyn RelevanceJudge>>,
    selector: Option<Arc<dyn SelectionPolicy>>,
    reranker: Option<Arc<dyn Reranker>>,
    config: EnsembleConfig,
}

impl EnsemblePipelineBuilder {
    /// Create a new builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the strategy registry.
    #[must_use]
    pub fn registry(mut self, registry: StrategyRegistry) -> Self {
        self.registry = Some(Arc::new(registry));
        self
    }

    /// Set a registry shared with other components.
    #[must_use]
    pub fn shared_registry(mut self, registry: Arc<StrategyRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Set the judge used by the default selector and reranker.
    #[must_use]
    pub fn judge(mut self, judge: Arc<dyn RelevanceJudge>) -> Self {
        self.judge = Some(judge);
        self
    }

    /// Replace the default judge-backed selector.
    #[must_use]
    pub fn selector(mut self, selector: Arc<dyn SelectionPolicy>) -> Self {
        self.selector = Some(selector);
        self
    }

    /// Replace the default judge-backed reranker.
    #[must_use]
    pub fn reranker(mut self, reranker: Arc<dyn Reranker>) -> Self {
        self.reranker = Some(reranker);
        self
    }

    /// Set the configuration.
    #[must_use]
    pub fn config(mut self, config: EnsembleConfig) -> Self {
        self.config = config;
        self
    }

    /// Build the pipeline.
    pub fn build(self) -> Result<EnsemblePipeline> {
        self.config.validate()?;

        let registry = self
            .registry
            .ok_or_else(|| EnsembleError::configuration("Strategy registry is required"))?;
        if registry.is_empty() {
            return Err(EnsembleError::configuration(
                "At least one strategy must be registered",
            ));
        }

        let selector = match (self.selector, &self.judge) {
            (Some(selector), _) => selector,
            (None, Some(judge)) => Arc::new(
                JudgeSelector::new(judge.clone()).with_timeout(self.config.selection_timeout()),
            ),
            (None, None) => {
                return Err(EnsembleError::configuration(
                    "A selector or a judge is required",
                ));
            }
        };

        let reranker = match (self.reranker, &self.judge) {
            (Some(reranker), _) => reranker,
            (None, Some(judge)) => Arc::new(
                JudgeReranker::new(judge.clone())
                    .with_timeout(self.config.rerank_timeout())
                    .with_dedup(self.config.dedup_before_rerank),
            ),
            (None, None) => {
                return Err(EnsembleError::configuration(
                    "A reranker or a judge is required",
                ));
            }
        };

        let retriever = EnsembleRetriever::new(registry.clone())
            .with_strategy_timeout(self.config.strategy_timeout());

        Ok(EnsemblePipeline {
            registry,
            selector,
            retriever,
            reranker,
            config: self.config,
        })
    }
}
