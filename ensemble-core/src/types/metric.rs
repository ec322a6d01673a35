//! Per-group reciprocal-rank table.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Key used to group ranked candidates when evaluating.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum GroupBy {
    /// Group by originating strategy id.
    #[default]
    Strategy,
    /// Group by the granularity tag of the originating strategy.
    Granularity,
}

/// One row of scores, one column per group key.
///
/// Columns keep the order in which group keys were supplied. Every score is
/// in `[0, 1]`; `0` means the group is absent from the ranked result, which
/// also covers groups that were never selected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricTable<K> {
    entries: Vec<(K, f64)>,
}

impl<K> Default for MetricTable<K> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<K: PartialEq> MetricTable<K> {
    /// Build a table from `(key, score)` pairs.
    #[must_use]
    pub fn new(entries: Vec<(K, f64)>) -> Self {
        Self { entries }
    }

    /// Score of `key`, if the key is a column of this table.
    pub fn get(&self, key: &K) -> Option<f64> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, score)| *score)
    }

    /// Iterate columns in order.
    pub fn iter(&self) -> impl Iterator<Item = (&K, f64)> {
        self.entries.iter().map(|(k, score)| (k, *score))
    }

    /// Column keys in order.
    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.entries.iter().map(|(k, _)| k)
    }

    /// The highest-scoring column; the earliest column wins ties.
    pub fn best(&self) -> Option<(&K, f64)> {
        self.iter().fold(None, |best, (k, score)| match best {
            Some((_, top)) if top >= score => best,
            _ => Some((k, score)),
        })
    }

    /// Number of columns.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the table has no columns.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_best_prefers_earliest_on_tie() {
        let table = MetricTable::new(vec![("a", 0.5), ("b", 1.0), ("c", 1.0), ("d", 0.0)]);
        assert_eq!(table.best(), Some((&"b", 1.0)));
        assert_eq!(table.get(&"d"), Some(0.0));
        assert_eq!(table.get(&"z"), None);
    }

    #[test]
    fn test_group_by_parses() {
        assert_eq!(GroupBy::from_str("granularity").unwrap(), GroupBy::Granularity);
        assert_eq!(GroupBy::Strategy.to_string(), "strategy");
    }
}
