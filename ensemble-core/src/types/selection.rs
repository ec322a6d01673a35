//! Per-query strategy selection outcome.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Which strategies to invoke for one query, in priority order, and why.
///
/// Ids are unique; pushing an id twice keeps the first entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionDecision {
    chosen_strategy_ids: Vec<String>,
    rationale: HashMap<String, String>,
}

impl SelectionDecision {
    /// Create an empty decision.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a strategy id with its justification.
    ///
    /// Returns `false` when the id was already chosen.
    pub fn push<I: Into<String>, R: Into<String>>(&mut self, id: I, rationale: R) -> bool {
        let id = id.into();
        if self.rationale.contains_key(&id) {
            return false;
        }
        self.rationale.insert(id.clone(), rationale.into());
        self.chosen_strategy_ids.push(id);
        true
    }

    /// Chosen ids in priority order.
    #[must_use]
    pub fn chosen_strategy_ids(&self) -> &[String] {
        &self.chosen_strategy_ids
    }

    /// Justification recorded for `id`.
    #[must_use]
    pub fn rationale_for(&self, id: &str) -> Option<&str> {
        self.rationale.get(id).map(String::as_str)
    }

    /// Whether `id` was chosen.
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.rationale.contains_key(id)
    }

    /// Number of chosen strategies.
    #[must_use]
    pub fn len(&self) -> usize {
        self.chosen_strategy_ids.len()
    }

    /// Whether nothing was chosen.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.chosen_strategy_ids.is_empty()
    }

    /// Keep only the first `max` chosen ids.
    pub fn truncate(&mut self, max: usize) {
        let keep = max.min(self.chosen_strategy_ids.len());
        for dropped in self.chosen_strategy_ids.drain(keep..) {
            self.rationale.remove(&dropped);
        }
    }
}
