pub mod action;
pub mod config;
pub mod error;
pub mod sequence;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::action::{Action, Predicate};
    pub use crate::config::{Pacing, RunConfig};
    pub use crate::error::{Result, SequenceError};
    pub use crate::sequence::{ActionSequence, Sequence};
}
