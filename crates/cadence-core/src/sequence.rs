use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

use crate::action::{Action, Predicate};

/// An ordered, mutable list of actions plus a running flag.
///
/// A sequence never executes anything on its own; a driver reads the live
/// list one slot at a time and polls [`Sequence::is_running`] between slots.
/// All methods take `&self` so that a sequence can be shared between its
/// owner, its drivers, and the actions it holds.
pub trait Sequence: Send + Sync {
    /// Label used in log output.
    fn name(&self) -> &str {
        "sequence"
    }

    fn is_running(&self) -> bool;

    /// Append an action. Duplicates are allowed.
    fn add(&self, action: Action);

    /// Remove the first entry that is the same action. No-op when absent.
    fn remove(&self, action: &Action);

    /// Remove every action. A pass in flight terminates at its next read.
    fn clear(&self);

    fn start(&self);

    fn stop(&self);

    /// Live read of one slot.
    fn action_at(&self, index: usize) -> Option<Action>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of the current list.
    fn actions(&self) -> Vec<Action>;

    fn add_delayed(&self, action: Action, delay: Duration) {
        self.add(action.delayed(delay));
    }

    fn add_looping(&self, action: Action, count: usize) {
        self.add(action.looping(count));
    }

    fn add_conditional(&self, action: Action, predicate: Predicate) {
        self.add(action.when(move || predicate()));
    }
}

/// The basic in-memory sequence.
#[derive(Debug)]
pub struct ActionSequence {
    name: String,
    actions: RwLock<Vec<Action>>,
    running: AtomicBool,
}

impl ActionSequence {
    pub fn new() -> Self {
        Self::named("sequence")
    }

    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            actions: RwLock::new(Vec::new()),
            running: AtomicBool::new(false),
        }
    }

    /// Create a sequence pre-populated with `actions`, in order.
    pub fn with_actions(name: impl Into<String>, actions: impl IntoIterator<Item = Action>) -> Self {
        let seq = Self::named(name);
        seq.write().extend(actions);
        seq
    }

    fn read(&self) -> RwLockReadGuard<'_, Vec<Action>> {
        self.actions.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Vec<Action>> {
        self.actions.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for ActionSequence {
    fn default() -> Self {
        Self::new()
    }
}

impl Sequence for ActionSequence {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    fn add(&self, action: Action) {
        let mut actions = self.write();
        actions.push(action);
        tracing::trace!(sequence = %self.name, len = actions.len(), "action added");
    }

    fn remove(&self, action: &Action) {
        let mut actions = self.write();
        if let Some(pos) = actions.iter().position(|a| a.same(action)) {
            actions.remove(pos);
        }
    }

    fn clear(&self) {
        self.write().clear();
    }

    fn start(&self) {
        self.running.store(true, Ordering::Release);
    }

    fn stop(&self) {
        self.running.store(false, Ordering::Release);
    }

    fn action_at(&self, index: usize) -> Option<Action> {
        self.read().get(index).cloned()
    }

    fn len(&self) -> usize {
        self.read().len()
    }

    fn actions(&self) -> Vec<Action> {
        self.read().clone()
    }
}
