use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock, Weak};
use std::time::Duration;

use async_trait::async_trait;
use tracing::Instrument;

use cadence_core::config::{Pacing, RunConfig};
use cadence_core::error::Result;
use cadence_core::sequence::Sequence;

use crate::pass::{self, PassHandle, PassOutcome};

/// Drives sequences through passes.
///
/// Every `run*` call dispatches a pass onto the current tokio runtime and
/// returns immediately with a [`PassHandle`]. Stopping is cooperative: the
/// running flag is polled between actions.
#[async_trait]
pub trait SequenceManager: Send + Sync {
    /// Dispatch a pass with the given configuration.
    fn run_with(&self, config: RunConfig) -> PassHandle;

    /// Clear the running flag of the driven sequence, if any.
    fn stop(&self);

    /// The sequence this manager currently drives.
    fn sequence(&self) -> Option<Arc<dyn Sequence>>;

    /// Dispatch a pass that yields once after every action.
    fn run(&self) -> PassHandle {
        self.run_with(RunConfig::new())
    }

    /// Dispatch a pass that waits `delay` before every action.
    fn run_with_delay(&self, delay: Duration) -> PassHandle {
        self.run_paced(Pacing::Delay(delay))
    }

    fn run_paced(&self, pacing: Pacing) -> PassHandle {
        self.run_with(pacing.into())
    }

    fn is_running(&self) -> bool {
        self.sequence().is_some_and(|s| s.is_running())
    }

    /// Dispatch a pass and wait for it to end.
    async fn run_to_completion(&self, config: RunConfig) -> Result<PassOutcome> {
        self.run_with(config).wait().await
    }
}

type CompletionFn = Arc<dyn Fn(PassOutcome) + Send + Sync>;

#[derive(Default)]
struct ManagerInner {
    binding: RwLock<Option<Weak<dyn Sequence>>>,
    on_complete: RwLock<Vec<CompletionFn>>,
}

impl ManagerInner {
    fn notify(&self, outcome: PassOutcome) {
        // Snapshot so callbacks may register further callbacks or start a new pass.
        let callbacks = self
            .on_complete
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        for callback in callbacks {
            callback(outcome);
        }
    }
}

/// The standard manager: rebindable, weakly bound, with completion callbacks.
///
/// The manager never keeps its sequence alive. Once the owner drops the
/// sequence, runs become no-ops that resolve to [`PassOutcome::Unbound`].
/// Clones share the same binding and callbacks.
#[derive(Clone, Default)]
pub struct DefaultSequenceManager {
    inner: Arc<ManagerInner>,
}

impl DefaultSequenceManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a manager already bound to `sequence`.
    pub fn with_sequence(sequence: Arc<dyn Sequence>) -> Self {
        let manager = Self::new();
        manager.bind(sequence);
        manager
    }

    /// Drive `sequence` from now on. A pass already in flight keeps the
    /// sequence it started with.
    pub fn bind(&self, sequence: Arc<dyn Sequence>) {
        let weak = Arc::downgrade(&sequence);
        *self
            .inner
            .binding
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(weak);
    }

    pub fn unbind(&self) {
        self.inner
            .binding
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
    }

    /// Register a callback fired once at the end of every pass that completes
    /// or is stopped. Callbacks run in registration order, on the task that
    /// drove the pass. They do not fire when a pass faults.
    ///
    /// A callback may dispatch the next pass itself; this is how a pass is
    /// re-armed when it ends (see [`RepeatingSequenceManager`]).
    pub fn on_complete<F>(&self, callback: F)
    where
        F: Fn(PassOutcome) + Send + Sync + 'static,
    {
        self.inner
            .on_complete
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Arc::new(callback));
    }
}

impl SequenceManager for DefaultSequenceManager {
    fn run_with(&self, config: RunConfig) -> PassHandle {
        let Some(sequence) = self.sequence() else {
            tracing::debug!("run requested with no bound sequence");
            return PassHandle::unbound();
        };

        let span = pass::pass_span(sequence.as_ref(), &config);
        let pass = pass::drive(sequence, config.pacing);
        let inner = self.inner.clone();
        PassHandle::spawn(
            async move {
                let outcome = pass.await?;
                inner.notify(outcome);
                Ok(outcome)
            }
            .instrument(span),
        )
    }

    fn stop(&self) {
        if let Some(sequence) = self.sequence() {
            sequence.stop();
        }
    }

    fn sequence(&self) -> Option<Arc<dyn Sequence>> {
        self.inner
            .binding
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .and_then(Weak::upgrade)
    }
}

/// A manager that owns its sequence from construction.
///
/// It keeps the sequence alive, cannot be rebound, and has no completion
/// callbacks.
#[derive(Clone)]
pub struct OwnedSequenceManager {
    sequence: Arc<dyn Sequence>,
}

impl OwnedSequenceManager {
    pub fn new(sequence: Arc<dyn Sequence>) -> Self {
        Self { sequence }
    }
}

impl SequenceManager for OwnedSequenceManager {
    fn run_with(&self, config: RunConfig) -> PassHandle {
        let span = pass::pass_span(self.sequence.as_ref(), &config);
        let pass = pass::drive(self.sequence.clone(), config.pacing);
        PassHandle::spawn(pass.instrument(span))
    }

    fn stop(&self) {
        self.sequence.stop();
    }

    fn sequence(&self) -> Option<Arc<dyn Sequence>> {
        Some(self.sequence.clone())
    }
}

/// A manager that dispatches the next pass itself whenever a pass completes.
///
/// Each lap after the first uses the pacing given at construction. The loop
/// ends on [`SequenceManager::stop`], on a pass that ends `Stopped`, or on a
/// pass that invoked nothing. Binding and callbacks behave as they do on
/// [`DefaultSequenceManager`].
#[derive(Clone)]
pub struct RepeatingSequenceManager {
    manager: DefaultSequenceManager,
    pacing: Pacing,
    halted: Arc<AtomicBool>,
}

impl RepeatingSequenceManager {
    pub fn new(pacing: Pacing) -> Self {
        let manager = DefaultSequenceManager::new();
        let halted = Arc::new(AtomicBool::new(false));

        let inner = Arc::downgrade(&manager.inner);
        let stop_requested = halted.clone();
        manager.on_complete(move |outcome| {
            let PassOutcome::Completed { invoked } = outcome else {
                return;
            };
            if invoked == 0 || stop_requested.load(Ordering::SeqCst) {
                return;
            }
            let Some(inner) = inner.upgrade() else {
                return;
            };
            tracing::trace!(%pacing, "re-arming pass");
            // Detached: a fault in a later lap is logged by the pass itself.
            drop(DefaultSequenceManager { inner }.run_paced(pacing));
        });

        Self {
            manager,
            pacing,
            halted,
        }
    }

    pub fn with_sequence(sequence: Arc<dyn Sequence>, pacing: Pacing) -> Self {
        let manager = Self::new(pacing);
        manager.bind(sequence);
        manager
    }

    pub fn bind(&self, sequence: Arc<dyn Sequence>) {
        self.manager.bind(sequence);
    }

    pub fn unbind(&self) {
        self.manager.unbind();
    }

    pub fn pacing(&self) -> Pacing {
        self.pacing
    }

    /// Register a callback fired at the end of every lap.
    pub fn on_complete<F>(&self, callback: F)
    where
        F: Fn(PassOutcome) + Send + Sync + 'static,
    {
        self.manager.on_complete(callback);
    }

    /// The underlying manager, sharing this one's binding and callbacks.
    pub fn manager(&self) -> &DefaultSequenceManager {
        &self.manager
    }
}

impl SequenceManager for RepeatingSequenceManager {
    fn run_with(&self, config: RunConfig) -> PassHandle {
        self.halted.store(false, Ordering::SeqCst);
        self.manager.run_with(config)
    }

    fn stop(&self) {
        self.halted.store(true, Ordering::SeqCst);
        self.manager.stop();
    }

    fn sequence(&self) -> Option<Arc<dyn Sequence>> {
        self.manager.sequence()
    }
}
