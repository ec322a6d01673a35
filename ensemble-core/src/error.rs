//! Error types for ensemble retrieval.
//!
//! The taxonomy separates registry misuse (always surfaced to the caller),
//! locally recoverable conditions (empty selection, single strategy failure,
//! degraded rerank) and the one hard failure of a query: every selected
//! strategy failing.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Why a single strategy call did not contribute to the merged pool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrategyFailure {
    /// Registry id of the strategy that failed.
    pub strategy_id: String,
    /// Rendered cause of the failure.
    pub cause: String,
}

impl StrategyFailure {
    /// Create a failure record.
    pub fn new<S: Into<String>, C: Into<String>>(strategy_id: S, cause: C) -> Self {
        Self {
            strategy_id: strategy_id.into(),
            cause: cause.into(),
        }
    }
}

impl fmt::Display for StrategyFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.strategy_id, self.cause)
    }
}

fn render_failures(failures: &[StrategyFailure]) -> String {
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Core error type for ensemble retrieval.
#[derive(Error, Debug)]
pub enum EnsembleError {
    /// A strategy with this id is already registered.
    #[error("Duplicate strategy id: {id}")]
    DuplicateId {
        /// The conflicting id
        id: String,
    },

    /// Resource not found errors
    #[error("Not found: {resource}")]
    NotFound {
        /// Name of the missing resource
        resource: String,
    },

    /// The selection judge produced no usable strategy id.
    #[error("Selection returned no usable strategy ids (rejected: {rejected:?})")]
    SelectionEmpty {
        /// Ids the judge returned that were dropped
        rejected: Vec<String>,
    },

    /// Every strategy call of a query failed.
    #[error("All {} strategies failed: {}", .failures.len(), render_failures(.failures))]
    AllStrategiesFailed {
        /// One entry per attempted strategy
        failures: Vec<StrategyFailure>,
    },

    /// A single strategy call failed.
    #[error("Strategy '{strategy_id}' failed: {message}")]
    Strategy {
        /// Registry id of the strategy
        strategy_id: String,
        /// Detailed error message
        message: String,
    },

    /// Relevance judge call failed or produced unusable output.
    #[error("Judge error: {message}")]
    Judge {
        /// Detailed error message
        message: String,
    },

    /// Operation timeout errors
    #[error("Timeout: {operation}")]
    Timeout {
        /// Name of the operation that timed out
        operation: String,
    },

    /// The surrounding query was cancelled.
    #[error("Cancelled: {operation}")]
    Cancelled {
        /// Name of the operation that observed the cancellation
        operation: String,
    },

    /// Configuration validation errors
    #[error("Configuration error: {message}")]
    Configuration {
        /// Detailed error message
        message: String,
    },

    /// Input validation errors
    #[error("Validation error: {message}")]
    Validation {
        /// Detailed error message
        message: String,
    },

    /// JSON serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Generic errors from external dependencies
    #[error("External error: {source}")]
    External {
        /// The underlying error
        #[source]
        source: anyhow::Error,
    },
}

impl EnsembleError {
    /// Create a duplicate id error.
    pub fn duplicate_id<S: Into<String>>(id: S) -> Self {
        Self::DuplicateId { id: id.into() }
    }

    /// Create a new not found error with a resource name.
    pub fn not_found<S: Into<String>>(resource: S) -> Self {
        Self::NotFound {
            resource: resource.into(),
        }
    }

    /// Create a strategy error.
    pub fn strategy<I: Into<String>, S: Into<String>>(strategy_id: I, message: S) -> Self {
        Self::Strategy {
            strategy_id: strategy_id.into(),
            message: message.into(),
        }
    }

    /// Create a judge error.
    pub fn judge<S: Into<String>>(message: S) -> Self {
        Self::Judge {
            message: message.into(),
        }
    }

    /// Create a new timeout error with an operation name.
    pub fn timeout<S: Into<String>>(operation: S) -> Self {
        Self::Timeout {
            operation: operation.into(),
        }
    }

    /// Create a cancellation error with an operation name.
    pub fn cancelled<S: Into<String>>(operation: S) -> Self {
        Self::Cancelled {
            operation: operation.into(),
        }
    }

    /// Create a new configuration error with a message.
    pub fn configuration<S: Into<String>>(message: S) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create a new validation error with a message.
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create a new external error from any error that implements `Into<anyhow::Error>`.
    pub fn external<E: Into<anyhow::Error>>(error: E) -> Self {
        Self::External {
            source: error.into(),
        }
    }

    /// Check if this error is retryable.
    ///
    /// Returns `true` for transient errors that might succeed on retry.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Timeout { .. } | Self::Strategy { .. } | Self::Judge { .. })
    }

    /// Check if this error is caused by misuse on the caller side.
    ///
    /// These are never retried.
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::DuplicateId { .. }
                | Self::NotFound { .. }
                | Self::Validation { .. }
                | Self::Configuration { .. }
        )
    }

    /// Check if this error stems from cancellation of the surrounding query.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }

    /// Per-strategy causes attached to an [`EnsembleError::AllStrategiesFailed`].
    #[must_use]
    pub fn strategy_failures(&self) -> &[StrategyFailure] {
        match self {
            Self::AllStrategiesFailed { failures } => failures,
            _ => &[],
        }
    }
}

/// Convert from `anyhow::Error` to `EnsembleError`.
impl From<anyhow::Error> for EnsembleError {
    fn from(error: anyhow::Error) -> Self {
        Self::External { source: error }
    }
}

/// Result type alias used throughout the ensemble crates.
pub type Result<T> = std::result::Result<T, EnsembleError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = EnsembleError::duplicate_id("g128");
        assert!(matches!(err, EnsembleError::DuplicateId { .. }));
        assert_eq!(err.to_string(), "Duplicate strategy id: g128");
    }

    #[test]
    fn test_all_failed_lists_causes() {
        let err = EnsembleError::AllStrategiesFailed {
            failures: vec![
                StrategyFailure::new("a", "boom"),
                StrategyFailure::new("b", "Timeout: strategy b"),
            ],
        };
        assert_eq!(
            err.to_string(),
            "All 2 strategies failed: a: boom; b: Timeout: strategy b"
        );
        assert_eq!(err.strategy_failures().len(), 2);
        assert!(EnsembleError::timeout("x").strategy_failures().is_empty());
    }

    #[test]
    fn test_error_classification() {
        assert!(EnsembleError::timeout("strategy").is_retryable());
        assert!(!EnsembleError::not_found("g1").is_retryable());
        assert!(EnsembleError::not_found("g1").is_client_error());
        assert!(EnsembleError::duplicate_id("g1").is_client_error());
        assert!(!EnsembleError::judge("bad json").is_client_error());
        assert!(EnsembleError::cancelled("query").is_cancelled());
    }

    #[test]
    fn test_from_anyhow() {
        let err: EnsembleError = anyhow::anyhow!("index offline").into();
        assert_eq!(err.to_string(), "External error: index offline");
    }
}
