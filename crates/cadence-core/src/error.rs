use thiserror::Error;

/// Top-level error type for the Cadence engine.
#[derive(Debug, Error)]
pub enum SequenceError {
    #[error("Action failed: {0}")]
    Action(String),

    #[error("Action at slot {index} failed: {source}")]
    ActionFailed {
        index: usize,
        source: Box<SequenceError>,
    },

    #[error("No async runtime is available to drive the pass")]
    NoRuntime,

    #[error("Pass panicked: {0}")]
    Panicked(String),

    #[error("Pass was cancelled before it finished")]
    Cancelled,

    #[error("Action not registered: {0}")]
    UnknownAction(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl SequenceError {
    /// Convenience constructor for faults raised from inside user actions.
    pub fn action(message: impl Into<String>) -> Self {
        Self::Action(message.into())
    }

    /// Slot index at which a pass observed this fault, if known.
    pub fn slot(&self) -> Option<usize> {
        match self {
            Self::ActionFailed { index, .. } => Some(*index),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, SequenceError>;
