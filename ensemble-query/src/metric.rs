//! Reciprocal-rank attribution of a ranked result to groups.
//!
//! A group's score is `1 / (1 + i)` where `i` is the index of the group's
//! first candidate in the ranked result, or `0` when the group does not
//! appear at all. The reranked order is treated as ground truth, so the
//! table says which strategies (or granularities) put the best context in
//! front of the judge for this one query. Averaging over a query set is left
//! to the caller.
//!
//! A score of `0` does not distinguish a strategy that was never selected
//! from one that was selected but whose candidates were all cut by the
//! reranker.

use std::collections::HashMap;
use std::hash::Hash;

use ensemble_core::{Candidate, GroupBy, MetricTable, RankedResult};

use crate::registry::StrategyRegistry;

#[allow(clippy::cast_precision_loss)]
fn reciprocal(index: usize) -> f64 {
    1.0 / (1.0 + index as f64)
}

/// Core scan shared by the public forms: candidates whose key is `None`
/// belong to no group.
fn score_groups<K, I, F>(group_keys: I, group_key_of: F, ranked: &RankedResult) -> MetricTable<K>
where
    K: Eq + Hash + Clone,
    I: IntoIterator<Item = K>,
    F: Fn(&Candidate) -> Option<K>,
{
    let mut first_seen: HashMap<K, usize> = HashMap::new();
    for (index, ranked_candidate) in ranked.iter().enumerate() {
        if let Some(key) = group_key_of(&ranked_candidate.candidate) {
            first_seen.entry(key).or_insert(index);
        }
    }

    let mut columns: Vec<(K, f64)> = Vec::new();
    for key in group_keys {
        if columns.iter().any(|(existing, _)| *existing == key) {
            continue;
        }
        let score = first_seen.get(&key).map_or(0.0, |&index| reciprocal(index));
        columns.push((key, score));
    }
    MetricTable::new(columns)
}

/// Reciprocal rank of each group's first appearance in `ranked`.
///
/// Columns follow the order of `group_keys`; repeated keys are ignored.
/// Pure function of its inputs.
///
/// # Examples
///
/// ```rust
/// use ensemble_core::{Candidate, Passage, RankedCandidate, RankedResult};
/// use ensemble_query::metric::reciprocal_rank;
///
/// let ranked = RankedResult::new(
///     ["b", "a", "b"]
///         .iter()
///         .enumerate()
///         .map(|(i, id)| RankedCandidate {
///             candidate: Candidate::from_passage(Passage::new("text", "src", 0.0), *id),
///             score: 1.0 - i as f32 * 0.1,
///             pool_index: i,
///             rationale: None,
///         })
///         .collect(),
///     false,
/// );
///
/// let groups = ["a", "b", "c"].map(String::from);
/// let table = reciprocal_rank(groups, |c: &Candidate| c.strategy_id.clone(), &ranked);
/// assert_eq!(table.get(&"a".to_string()), Some(0.5));
/// assert_eq!(table.get(&"b".to_string()), Some(1.0));
/// assert_eq!(table.get(&"c".to_string()), Some(0.0));
/// ```
pub fn reciprocal_rank<K, I, F>(group_keys: I, group_key_of: F, ranked: &RankedResult) -> MetricTable<K>
where
    K: Eq + Hash + Clone,
    I: IntoIterator<Item = K>,
    F: Fn(&Candidate) -> K,
{
    score_groups(group_keys, |candidate| Some(group_key_of(candidate)), ranked)
}

/// One column per registered strategy, in registration order.
pub fn by_strategy(registry: &StrategyRegistry, ranked: &RankedResult) -> MetricTable<String> {
    reciprocal_rank(
        registry.ids().map(str::to_string),
        |candidate| candidate.strategy_id.clone(),
        ranked,
    )
}

/// One column per registered granularity, in order of first registration.
///
/// Candidates from strategies the registry does not know count for no group.
pub fn by_granularity(registry: &StrategyRegistry, ranked: &RankedResult) -> MetricTable<u32> {
    score_groups(
        registry.granularities(),
        |candidate| {
            registry
                .get(&candidate.strategy_id)
                .ok()
                .map(crate::registry::Strategy::granularity)
        },
        ranked,
    )
}

/// Score `ranked` with the grouping named by `group_by`, keyed by string.
pub fn evaluate(registry: &StrategyRegistry, ranked: &RankedResult, group_by: GroupBy) -> MetricTable<String> {
    match group_by {
        GroupBy::Strategy => by_strategy(registry, ranked),
        GroupBy::Granularity => MetricTable::new(
            by_granularity(registry, ranked)
                .iter()
                .map(|(granularity, score)| (granularity.to_string(), score))
                .collect(),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ensemble_core::{Passage, RankedCandidate};
    use test_case::test_case;

    fn ranked(strategies: &[&str]) -> RankedResult {
        RankedResult::new(
            strategies
                .iter()
                .enumerate()
                .map(|(i, id)| RankedCandidate {
                    candidate: Candidate::from_passage(Passage::new(format!("p{i}"), format!("s{i}"), 0.0), *id),
                    score: 1.0,
                    pool_index: i,
                    rationale: None,
                })
                .collect(),
            false,
        )
    }

    fn strategy_of(candidate: &Candidate) -> String {
        candidate.strategy_id.clone()
    }

    #[test_case(&["a", "b"], "a", 1.0 ; "first position scores one")]
    #[test_case(&["b", "a"], "a", 0.5 ; "second position scores half")]
    #[test_case(&["b", "b", "b", "a"], "a", 0.25 ; "fourth position")]
    #[test_case(&["b", "a", "a"], "a", 0.5 ; "only first appearance counts")]
    #[test_case(&["b", "b"], "a", 0.0 ; "absent group scores zero")]
    #[test_case(&[], "a", 0.0 ; "empty result")]
    fn test_reciprocal_rank(order: &[&str], group: &str, expected: f64) {
        let table = reciprocal_rank(["a".to_string(), "b".to_string()], strategy_of, &ranked(order));
        assert_eq!(table.get(&group.to_string()), Some(expected));
    }

    #[test]
    fn test_columns_cover_every_key_once() {
        let table = reciprocal_rank(
            ["c", "a", "c", "b"].map(str::to_string),
            strategy_of,
            &ranked(&["a"]),
        );
        let keys: Vec<_> = table.keys().cloned().collect();
        assert_eq!(keys, ["c", "a", "b"]);
        assert!(table.iter().all(|(_, score)| (0.0..=1.0).contains(&score)));
    }

    #[test]
    fn test_idempotent() {
        let result = ranked(&["b", "a", "c", "a"]);
        let keys = ["a", "b", "c", "d"].map(str::to_string);
        let first = reciprocal_rank(keys.clone(), strategy_of, &result);
        let second = reciprocal_rank(keys, strategy_of, &result);
        assert_eq!(first, second);
    }
}
