//! Configuration types for ensemble retrieval.
//!
//! Configurations are serializable, validatable, and loadable from JSON
//! through [`JsonConfigurable`].

pub mod ensemble;
pub mod extensions;
pub mod judge;

pub use ensemble::*;
pub use extensions::*;
pub use judge::*;
