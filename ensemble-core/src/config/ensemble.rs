//! Configuration for the selection, fan-out and rerank stages.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{EnsembleError, GroupBy, Result};

/// Caps and timeouts for one ensemble query.
///
/// # Examples
///
/// ```rust
/// use ensemble_core::config::EnsembleConfig;
///
/// let config = EnsembleConfig::default()
///     .with_max_selections(2)
///     .with_per_strategy_k(4)
///     .with_top_n(4);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnsembleConfig {
    /// Upper bound on strategies invoked per query.
    pub max_selections: usize,

    /// Passages requested from each selected strategy.
    pub per_strategy_k: usize,

    /// Size cap of the reranked result.
    pub top_n: usize,

    /// Timeout for each strategy call, in milliseconds.
    pub strategy_timeout_ms: u64,

    /// Timeout for the selection judge call, in milliseconds.
    pub selection_timeout_ms: u64,

    /// Timeout for the rerank judge call, in milliseconds.
    pub rerank_timeout_ms: u64,

    /// Collapse candidates with identical content and source before reranking.
    pub dedup_before_rerank: bool,

    /// Invoke every registered strategy when selection yields nothing usable.
    pub fallback_to_all_on_empty_selection: bool,

    /// Grouping used when evaluating a response.
    pub group_by: GroupBy,
}

impl Default for EnsembleConfig {
    fn default() -> Self {
        Self {
            max_selections: 3,
            per_strategy_k: 5,
            top_n: 5,
            strategy_timeout_ms: 10_000,
            selection_timeout_ms: 30_000,
            rerank_timeout_ms: 30_000,
            dedup_before_rerank: false,
            fallback_to_all_on_empty_selection: true,
            group_by: GroupBy::Strategy,
        }
    }
}

impl EnsembleConfig {
    /// Set the selection cap.
    #[must_use]
    pub fn with_max_selections(mut self, max_selections: usize) -> Self {
        self.max_selections = max_selections;
        self
    }

    /// Set passages per strategy.
    #[must_use]
    pub fn with_per_strategy_k(mut self, per_strategy_k: usize) -> Self {
        self.per_strategy_k = per_strategy_k;
        self
    }

    /// Set the rerank cap.
    #[must_use]
    pub fn with_top_n(mut self, top_n: usize) -> Self {
        self.top_n = top_n;
        self
    }

    /// Set the per-strategy timeout.
    #[must_use]
    pub fn with_strategy_timeout(mut self, timeout: Duration) -> Self {
        self.strategy_timeout_ms = duration_ms(timeout);
        self
    }

    /// Set the selection judge timeout.
    #[must_use]
    pub fn with_selection_timeout(mut self, timeout: Duration) -> Self {
        self.selection_timeout_ms = duration_ms(timeout);
        self
    }

    /// Set the rerank judge timeout.
    #[must_use]
    pub fn with_rerank_timeout(mut self, timeout: Duration) -> Self {
        self.rerank_timeout_ms = duration_ms(timeout);
        self
    }

    /// Enable or disable dedup before reranking.
    #[must_use]
    pub fn with_dedup_before_rerank(mut self, dedup: bool) -> Self {
        self.dedup_before_rerank = dedup;
        self
    }

    /// Enable or disable the select-all fallback.
    #[must_use]
    pub fn with_fallback_to_all(mut self, fallback: bool) -> Self {
        self.fallback_to_all_on_empty_selection = fallback;
        self
    }

    /// Set the evaluation grouping.
    #[must_use]
    pub fn with_group_by(mut self, group_by: GroupBy) -> Self {
        self.group_by = group_by;
        self
    }

    /// Per-strategy timeout.
    #[must_use]
    pub fn strategy_timeout(&self) -> Duration {
        Duration::from_millis(self.strategy_timeout_ms)
    }

    /// Selection judge timeout.
    #[must_use]
    pub fn selection_timeout(&self) -> Duration {
        Duration::from_millis(self.selection_timeout_ms)
    }

    /// Rerank judge timeout.
    #[must_use]
    pub fn rerank_timeout(&self) -> Duration {
        Duration::from_millis(self.rerank_timeout_ms)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        let checks = [
            (self.max_selections == 0, "max_selections must be greater than 0"),
            (self.per_strategy_k == 0, "per_strategy_k must be greater than 0"),
            (self.top_n == 0, "top_n must be greater than 0"),
            (self.strategy_timeout_ms == 0, "strategy_timeout_ms must be greater than 0"),
            (self.selection_timeout_ms == 0, "selection_timeout_ms must be greater than 0"),
            (self.rerank_timeout_ms == 0, "rerank_timeout_ms must be greater than 0"),
        ];

        match checks.iter().find(|(failed, _)| *failed) {
            Some((_, message)) => Err(EnsembleError::configuration(*message)),
            None => Ok(()),
        }
    }
}

fn duration_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
