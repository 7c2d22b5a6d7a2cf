use std::sync::Arc;

use serde::{Deserialize, Serialize};

use cadence_core::config::{Pacing, RunConfig};
use cadence_core::error::Result;
use cadence_core::sequence::{ActionSequence, Sequence};

use crate::manager::{
    DefaultSequenceManager, OwnedSequenceManager, RepeatingSequenceManager, SequenceManager,
};
use crate::pass::PassHandle;

/// Which manager implementation the bootstrap wires up.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ManagerKind {
    #[default]
    Default,
    Owned,
    /// Re-arms a pass with the default pacing whenever one completes.
    Repeating,
}

/// Process-level engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub manager: ManagerKind,

    /// Pacing used by [`Bootstrap::run_default`].
    #[serde(default)]
    pub default_pacing: Pacing,

    /// Label of the shared sequence.
    #[serde(default = "default_sequence_name")]
    pub sequence_name: String,
}

fn default_sequence_name() -> String {
    "main".to_string()
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            manager: ManagerKind::Default,
            default_pacing: Pacing::Yield,
            sequence_name: default_sequence_name(),
        }
    }
}

impl EngineConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn with_manager(mut self, manager: ManagerKind) -> Self {
        self.manager = manager;
        self
    }

    pub fn with_default_pacing(mut self, pacing: Pacing) -> Self {
        self.default_pacing = pacing;
        self
    }
}

/// A manager selected at construction time by [`ManagerKind`].
#[derive(Clone)]
pub enum AnyManager {
    Default(DefaultSequenceManager),
    Owned(OwnedSequenceManager),
    Repeating(RepeatingSequenceManager),
}

impl AnyManager {
    pub fn kind(&self) -> ManagerKind {
        match self {
            Self::Default(_) => ManagerKind::Default,
            Self::Owned(_) => ManagerKind::Owned,
            Self::Repeating(_) => ManagerKind::Repeating,
        }
    }

    /// The callback-capable manager, when that is the selected kind.
    pub fn as_default(&self) -> Option<&DefaultSequenceManager> {
        match self {
            Self::Default(m) => Some(m),
            Self::Repeating(m) => Some(m.manager()),
            Self::Owned(_) => None,
        }
    }
}

impl SequenceManager for AnyManager {
    fn run_with(&self, config: RunConfig) -> PassHandle {
        match self {
            Self::Default(m) => m.run_with(config),
            Self::Owned(m) => m.run_with(config),
            Self::Repeating(m) => m.run_with(config),
        }
    }

    fn stop(&self) {
        match self {
            Self::Default(m) => m.stop(),
            Self::Owned(m) => m.stop(),
            Self::Repeating(m) => m.stop(),
        }
    }

    fn sequence(&self) -> Option<Arc<dyn Sequence>> {
        match self {
            Self::Default(m) => m.sequence(),
            Self::Owned(m) => m.sequence(),
            Self::Repeating(m) => m.sequence(),
        }
    }
}

/// Composition root: one shared sequence and one manager bound to it,
/// built eagerly at startup and handed out by reference.
pub struct Bootstrap {
    config: EngineConfig,
    sequence: Arc<ActionSequence>,
    manager: AnyManager,
}

impl Bootstrap {
    pub fn new(config: EngineConfig) -> Self {
        let sequence = Arc::new(ActionSequence::named(config.sequence_name.clone()));
        let manager = match config.manager {
            ManagerKind::Default => {
                AnyManager::Default(DefaultSequenceManager::with_sequence(sequence.clone()))
            }
            ManagerKind::Owned => AnyManager::Owned(OwnedSequenceManager::new(sequence.clone())),
            ManagerKind::Repeating => AnyManager::Repeating(RepeatingSequenceManager::with_sequence(
                sequence.clone(),
                config.default_pacing,
            )),
        };
        tracing::debug!(
            manager = ?config.manager,
            sequence = %config.sequence_name,
            "engine bootstrapped"
        );
        Self {
            config,
            sequence,
            manager,
        }
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(Self::new(EngineConfig::from_json_str(json)?))
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn sequence(&self) -> &Arc<ActionSequence> {
        &self.sequence
    }

    pub fn manager(&self) -> &AnyManager {
        &self.manager
    }

    /// Dispatch a pass with the configured default pacing.
    pub fn run_default(&self) -> PassHandle {
        self.manager.run_paced(self.config.default_pacing)
    }
}
