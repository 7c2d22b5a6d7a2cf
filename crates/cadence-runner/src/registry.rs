use std::collections::BTreeMap;

use cadence_core::action::Action;
use cadence_core::error::{Result, SequenceError};
use cadence_core::sequence::Sequence;

/// Named actions that tooling can offer for appending to a sequence.
///
/// Entries are registered explicitly; nothing is discovered at runtime.
#[derive(Debug, Clone, Default)]
pub struct ActionRegistry {
    actions: BTreeMap<String, Action>,
}

impl ActionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `action` under `name`, returning the action it replaced.
    pub fn register(&mut self, name: impl Into<String>, action: Action) -> Option<Action> {
        self.actions.insert(name.into(), action)
    }

    pub fn get(&self, name: &str) -> Option<&Action> {
        self.actions.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.actions.contains_key(name)
    }

    /// Registered names in sorted order.
    pub fn names(&self) -> Vec<&str> {
        self.actions.keys().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Append the action registered as `name` to `sequence`.
    pub fn append_to(&self, sequence: &dyn Sequence, name: &str) -> Result<()> {
        let action = self
            .get(name)
            .ok_or_else(|| SequenceError::UnknownAction(name.to_string()))?;
        sequence.add(action.clone());
        tracing::debug!(action = name, sequence = sequence.name(), "added registered action");
        Ok(())
    }
}
