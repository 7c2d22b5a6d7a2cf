use std::sync::Arc;
use std::time::Duration;

use cadence_core::config::Pacing;

use crate::manager::SequenceManager;
use crate::pass::PassHandle;

/// Broadcasts run and stop commands to a set of independent managers.
///
/// Passes are dispatched in membership order without waiting on each other.
/// The group has no aggregate completion signal; callers compose one from
/// the returned handles or from per-manager callbacks.
#[derive(Clone, Default)]
pub struct SequenceGroupManager {
    members: Vec<Arc<dyn SequenceManager>>,
}

impl SequenceGroupManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a member. The same manager may be added more than once.
    pub fn add_manager(&mut self, manager: Arc<dyn SequenceManager>) {
        self.members.push(manager);
    }

    pub fn members(&self) -> &[Arc<dyn SequenceManager>] {
        &self.members
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn run_all(&self) -> Vec<PassHandle> {
        self.run_all_paced(Pacing::Yield)
    }

    pub fn run_all_with_delay(&self, delay: Duration) -> Vec<PassHandle> {
        self.run_all_paced(Pacing::Delay(delay))
    }

    /// Each member gets its own pass with a fresh run id.
    pub fn run_all_paced(&self, pacing: Pacing) -> Vec<PassHandle> {
        tracing::debug!(members = self.members.len(), %pacing, "dispatching group run");
        self.members.iter().map(|m| m.run_paced(pacing)).collect()
    }

    /// Request a cooperative stop on every member. Does not wait for them to halt.
    pub fn stop_all(&self) {
        for manager in &self.members {
            manager.stop();
        }
    }
}
