pub mod bootstrap;
pub mod group;
pub mod manager;
pub mod pass;
pub mod registry;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use cadence_core::prelude::*;

    pub use crate::bootstrap::{AnyManager, Bootstrap, EngineConfig, ManagerKind};
    pub use crate::group::SequenceGroupManager;
    pub use crate::manager::{
        DefaultSequenceManager, OwnedSequenceManager, RepeatingSequenceManager, SequenceManager,
    };
    pub use crate::pass::{PassHandle, PassOutcome};
    pub use crate::registry::ActionRegistry;
}
