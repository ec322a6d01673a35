//! Core data types for ensemble retrieval.
//!
//! Every type here except the strategy metadata is query-scoped: it is
//! created fresh for one query and dropped once the ranked result and its
//! metric have been produced.

pub mod candidate;
pub mod judge;
pub mod metric;
pub mod pool;
pub mod ranked;
pub mod selection;

pub use candidate::*;
pub use judge::*;
pub use metric::*;
pub use pool::*;
pub use ranked::*;
pub use selection::*;
