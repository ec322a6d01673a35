//! Per-query strategy selection.
//!
//! A [`SelectionPolicy`] decides which registered strategies are worth
//! invoking for a query. [`JudgeSelector`] asks a relevance judge;
//! [`AllStrategiesSelector`] takes strategies in registration order.
//! [`select_or_fallback`] wraps any policy with the degraded behaviour of
//! invoking the full registry when selection yields nothing usable.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use ensemble_core::{
    EnsembleError, JudgeRequest, RelevanceJudge, Result, SelectionDecision,
};

use crate::registry::StrategyRegistry;
use crate::utils::bounded;

const FALLBACK_RATIONALE: &str = "Fallback: selection produced no usable strategy";

/// Chooses which strategies to invoke for a query.
///
/// Implementations return between 1 and `max_selections` unique ids, all of
/// which are registered.
#[async_trait]
pub trait SelectionPolicy: Send + Sync + std::fmt::Debug {
    /// Select strategies for `query`.
    async fn select(
        &self,
        query: &str,
        registry: &StrategyRegistry,
        max_selections: usize,
        cancel: &CancellationToken,
    ) -> Result<SelectionDecision>;

    /// Get a human-readable name for this policy.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

fn check_preconditions(registry: &StrategyRegistry, max_selections: usize) -> Result<()> {
    if max_selections == 0 {
        return Err(EnsembleError::validation(
            "max_selections must be greater than 0",
        ));
    }
    if registry.is_empty() {
        return Err(EnsembleError::configuration("No strategies registered"));
    }
    Ok(())
}

/// Relevance-judge backed selection.
///
/// The judge sees every registered strategy's description and returns an
/// ordered list of ids, or scores for them, in which case the highest
/// scores are taken first. Ids the registry does not know are dropped with a
/// warning; repeated ids keep their first position; anything beyond
/// `max_selections` is ignored.
#[derive(Debug)]
pub struct JudgeSelector {
    judge: Arc<dyn RelevanceJudge>,
    timeout: Duration,
}

impl JudgeSelector {
    /// Create a selector around a judge.
    pub fn new(judge: Arc<dyn RelevanceJudge>) -> Self {
        Self {
            judge,
            timeout: Duration::from_secs(30),
        }
    }

    /// Set the judge call timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn build_decision(
        response: ensemble_core::JudgeResponse,
        registry: &StrategyRegistry,
        max_selections: usize,
    ) -> Result<SelectionDecision> {
        let mut decision = SelectionDecision::new();
        let mut rejected = Vec::new();

        let mut choices = response.choices;
        if !choices.is_empty() && choices.iter().all(|c| c.score.is_some()) {
            choices.sort_by(|a, b| {
                b.score
                    .unwrap_or_default()
                    .total_cmp(&a.score.unwrap_or_default())
            });
        }

        for choice in choices {
            let id = choice.id.trim();
            if !registry.contains(id) {
                warn!(strategy_id = %id, "Judge selected an unknown strategy, dropping it");
                rejected.push(id.to_string());
                continue;
            }
            if decision.len() == max_selections {
                warn!(
                    strategy_id = %id,
                    max_selections,
                    "Judge selected more strategies than allowed, ignoring the rest"
                );
                break;
            }

            let rationale = if choice.rationale.trim().is_empty() {
                "Selected by relevance judge".to_string()
            } else {
                choice.rationale
            };
            if !decision.push(id, rationale) {
                debug!(strategy_id = %id, "Judge repeated a strategy id");
            }
        }

        if decision.is_empty() {
            return Err(EnsembleError::SelectionEmpty { rejected });
        }
        Ok(decision)
    }
}

#[async_trait]
impl SelectionPolicy for JudgeSelector {
    #[instrument(skip(self, registry, cancel), fields(judge = self.judge.name()))]
    async fn select(
        &self,
        query: &str,
        registry: &StrategyRegistry,
        max_selections: usize,
        cancel: &CancellationToken,
    ) -> Result<SelectionDecision> {
        check_preconditions(registry, max_selections)?;

        if registry.len() == 1 {
            let mut decision = SelectionDecision::new();
            if let Some(only) = registry.all().next() {
                decision.push(only.id(), "Only strategy available");
            }
            return Ok(decision);
        }

        let request = JudgeRequest {
            query: query.to_string(),
            candidates: registry.judge_candidates(),
            max_outputs: max_selections.min(registry.len()),
        };

        let response = bounded(
            "strategy selection",
            self.timeout,
            cancel,
            self.judge.judge(&request),
        )
        .await?;

        let decision = Self::build_decision(response, registry, max_selections)?;
        info!(
            "Selected {} strategies: {:?}",
            decision.len(),
            decision.chosen_strategy_ids()
        );
        Ok(decision)
    }
}

/// Takes strategies in registration order, up to the cap.
#[derive(Debug, Default, Clone, Copy)]
pub struct AllStrategiesSelector;

impl AllStrategiesSelector {
    /// Create the selector.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl SelectionPolicy for AllStrategiesSelector {
    async fn select(
        &self,
        _query: &str,
        registry: &StrategyRegistry,
        max_selections: usize,
        _cancel: &CancellationToken,
    ) -> Result<SelectionDecision> {
        check_preconditions(registry, max_selections)?;

        let mut decision = SelectionDecision::new();
        for strategy in registry.all().take(max_selections) {
            decision.push(strategy.id(), "Selected in registration order");
        }
        Ok(decision)
    }
}

/// Every registered strategy, in registration order.
#[must_use]
pub fn full_registry_decision(registry: &StrategyRegistry) -> SelectionDecision {
    let mut decision = SelectionDecision::new();
    for strategy in registry.all() {
        decision.push(strategy.id(), FALLBACK_RATIONALE);
    }
    decision
}

/// Run `policy`, falling back to the full registry when it cannot decide.
///
/// Returns the decision and whether the fallback was taken. Selection
/// failures that are not the caller's fault (empty selection, judge error,
/// timeout) trigger the fallback; cancellation and misuse are returned as-is.
pub async fn select_or_fallback(
    policy: &dyn SelectionPolicy,
    query: &str,
    registry: &StrategyRegistry,
    max_selections: usize,
    cancel: &CancellationToken,
) -> Result<(SelectionDecision, bool)> {
    match policy.select(query, registry, max_selections, cancel).await {
        Ok(decision) => Ok((decision, false)),
        Err(e) if e.is_cancelled() || e.is_client_error() => Err(e),
        Err(e) => {
            warn!(
                policy = policy.name(),
                error = %e,
                "Selection failed, falling back to all {} registered strategies",
                registry.len()
            );
            Ok((full_registry_decision(registry), true))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::StrategyMetadata;
    use ensemble_core::{JudgeChoice, JudgeResponse, Passage, RetrievalStrategy};
    use std::sync::Mutex;

    #[derive(Debug)]
    struct Noop;

    #[async_trait]
    impl RetrievalStrategy for Noop {
        async fn retrieve(&self, _query: &str, _k: usize) -> Result<Vec<Passage>> {
            Ok(vec![])
        }
    }

    #[derive(Debug)]
    struct ScriptedJudge {
        response: Result<JudgeResponse>,
        seen: Mutex<Option<JudgeRequest>>,
    }

    impl ScriptedJudge {
        fn choosing(ids: &[&str]) -> Self {
            Self {
                response: Ok(JudgeResponse::new(
                    ids.iter().map(|id| JudgeChoice::new(*id, format!("because {id}"))).collect(),
                )),
                seen: Mutex::new(None),
            }
        }

        fn failing() -> Self {
            Self {
                response: Err(EnsembleError::judge("model unavailable")),
                seen: Mutex::new(None),
            }
        }
    }

    #[async_trait]
    impl RelevanceJudge for ScriptedJudge {
        async fn judge(&self, request: &JudgeRequest) -> Result<JudgeResponse> {
            *self.seen.lock().unwrap() = Some(request.clone());
            match &self.response {
                Ok(response) => Ok(response.clone()),
                Err(e) => Err(EnsembleError::judge(e.to_string())),
            }
        }
    }

    #[derive(Debug)]
    struct SlowJudge(Duration);

    #[async_trait]
    impl RelevanceJudge for SlowJudge {
        async fn judge(&self, request: &JudgeRequest) -> Result<JudgeResponse> {
            tokio::time::sleep(self.0).await;
            Ok(JudgeResponse::new(
                request
                    .candidates
                    .iter()
                    .map(|c| JudgeChoice::new(c.id.clone(), ""))
                    .collect(),
            ))
        }
    }

    fn registry(ids: &[&str]) -> StrategyRegistry {
        let mut registry = StrategyRegistry::new();
        for (n, id) in ids.iter().enumerate() {
            let size = 128 << n;
            registry
                .register_with_id(*id, Arc::new(Noop), StrategyMetadata::new(format!("{size}-token chunks"), size))
                .unwrap();
        }
        registry
    }

    #[tokio::test]
    async fn test_unknown_ids_dropped() {
        let registry = registry(&["g128", "g256", "g512"]);
        let judge = Arc::new(ScriptedJudge::choosing(&["g512", "g9999", "g128"]));
        let selector = JudgeSelector::new(judge.clone());

        let decision = selector
            .select("when was it founded?", &registry, 3, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(decision.chosen_strategy_ids(), ["g512", "g128"]);
        assert_eq!(decision.rationale_for("g512"), Some("because g512"));

        let seen = judge.seen.lock().unwrap().clone().unwrap();
        assert_eq!(seen.candidates.len(), 3);
        assert_eq!(seen.max_outputs, 3);
    }

    #[tokio::test]
    async fn test_cap_and_duplicates() {
        let registry = registry(&["a", "b", "c", "d"]);
        let selector = JudgeSelector::new(Arc::new(ScriptedJudge::choosing(&["c", "c", "a", "b"])));

        let decision = selector
            .select("q", &registry, 2, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(decision.chosen_strategy_ids(), ["c", "a"]);
    }

    #[tokio::test]
    async fn test_all_invalid_is_selection_empty() {
        let registry = registry(&["a", "b"]);
        let selector = JudgeSelector::new(Arc::new(ScriptedJudge::choosing(&["x", "y"])));

        let err = selector
            .select("q", &registry, 2, &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err, EnsembleError::SelectionEmpty { ref rejected } if rejected.len() == 2));
    }

    #[tokio::test]
    async fn test_fallback_selects_full_registry() {
        let registry = registry(&["a", "b", "c"]);
        let selector = JudgeSelector::new(Arc::new(ScriptedJudge::choosing(&[])));

        let (decision, fallback) =
            select_or_fallback(&selector, "q", &registry, 1, &CancellationToken::new())
                .await
                .unwrap();

        assert!(fallback);
        assert_eq!(decision.chosen_strategy_ids(), ["a", "b", "c"]);
    }

    #[tokio::test]
    async fn test_judge_failure_falls_back() {
        let registry = registry(&["a", "b"]);
        let selector = JudgeSelector::new(Arc::new(ScriptedJudge::failing()));

        let (decision, fallback) =
            select_or_fallback(&selector, "q", &registry, 2, &CancellationToken::new())
                .await
                .unwrap();

        assert!(fallback);
        assert_eq!(decision.len(), 2);
    }

    #[tokio::test]
    async fn test_judge_timeout_falls_back() {
        let registry = registry(&["a", "b", "c"]);
        let selector = JudgeSelector::new(Arc::new(SlowJudge(Duration::from_secs(5))))
            .with_timeout(Duration::from_millis(20));

        let (decision, fallback) =
            select_or_fallback(&selector, "q", &registry, 1, &CancellationToken::new())
                .await
                .unwrap();

        assert!(fallback);
        assert_eq!(decision.chosen_strategy_ids(), ["a", "b", "c"]);
    }

    #[tokio::test]
    async fn test_scored_choices_taken_best_first() {
        let registry = registry(&["a", "b", "c"]);
        let judge = ScriptedJudge {
            response: Ok(JudgeResponse::new(vec![
                JudgeChoice::new("a", "").with_score(0.2),
                JudgeChoice::new("b", "").with_score(0.7),
                JudgeChoice::new("c", "").with_score(0.9),
            ])),
            seen: Mutex::new(None),
        };

        let decision = JudgeSelector::new(Arc::new(judge))
            .select("q", &registry, 2, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(decision.chosen_strategy_ids(), ["c", "b"]);
    }

    #[tokio::test]
    async fn test_zero_cap_is_not_recovered() {
        let registry = registry(&["a", "b"]);
        let err = select_or_fallback(
            &AllStrategiesSelector::new(),
            "q",
            &registry,
            0,
            &CancellationToken::new(),
        )
        .await
        .unwrap_err();

        assert!(err.is_client_error());
    }

    #[tokio::test]
    async fn test_single_strategy_skips_judge() {
        let registry = registry(&["only"]);
        let judge = Arc::new(ScriptedJudge::failing());
        let selector = JudgeSelector::new(judge.clone());

        let decision = selector
            .select("q", &registry, 3, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(decision.chosen_strategy_ids(), ["only"]);
        assert!(judge.seen.lock().unwrap().is_none());
    }

    #[tokio::test]
    async fn test_all_strategies_selector_caps() {
        let registry = registry(&["a", "b", "c"]);
        let decision = AllStrategiesSelector::new()
            .select("q", &registry, 2, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(decision.chosen_strategy_ids(), ["a", "b"]);
    }
}
