use std::any::Any;
use std::future::{Future, IntoFuture};
use std::sync::Arc;

use futures::future::{BoxFuture, FutureExt};
use serde::{Deserialize, Serialize};
use tokio::runtime::Handle;
use tokio::task::{JoinError, JoinHandle};

use cadence_core::config::{Pacing, RunConfig};
use cadence_core::error::{Result, SequenceError};
use cadence_core::sequence::Sequence;

/// How a pass ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PassOutcome {
    /// Every slot present when it was read was dispatched.
    Completed { invoked: usize },
    /// The running flag was cleared before the list ran out.
    Stopped { invoked: usize },
    /// The manager had no live sequence, so nothing ran.
    Unbound,
}

impl PassOutcome {
    /// Number of slots dispatched during the pass.
    pub fn invoked(&self) -> usize {
        match self {
            Self::Completed { invoked } | Self::Stopped { invoked } => *invoked,
            Self::Unbound => 0,
        }
    }

    pub fn is_stopped(&self) -> bool {
        matches!(self, Self::Stopped { .. })
    }
}

/// Clears the running flag when dropped, so a pass that faults, panics, is
/// aborted, or is never polled does not leave its sequence marked as running.
struct StopOnDrop(Arc<dyn Sequence>);

impl Drop for StopOnDrop {
    fn drop(&mut self) {
        self.0.stop();
    }
}

/// Start `sequence` and return the future that drives it through one
/// front-to-back pass.
///
/// The running flag is raised before this returns, so a `stop` issued right
/// after dispatch is honoured at the first slot. The list is re-read by index
/// on every step, so mutations made while the pass is in flight are visible
/// to it.
pub(crate) fn drive(
    sequence: Arc<dyn Sequence>,
    pacing: Pacing,
) -> impl Future<Output = Result<PassOutcome>> + Send + 'static {
    sequence.start();
    let guard = StopOnDrop(sequence.clone());

    async move {
        tracing::debug!(len = sequence.len(), "pass started");

        let mut index = 0;
        let outcome = loop {
            let Some(action) = sequence.action_at(index) else {
                break PassOutcome::Completed { invoked: index };
            };
            if !sequence.is_running() {
                break PassOutcome::Stopped { invoked: index };
            }

            if let Pacing::Delay(delay) = pacing {
                tokio::time::sleep(delay).await;
                // The flag is polled again once the wait ends.
                if !sequence.is_running() {
                    break PassOutcome::Stopped { invoked: index };
                }
            }

            tracing::trace!(slot = index, "dispatching action");
            if let Err(e) = action.invoke().await {
                tracing::warn!(slot = index, error = %e, "action faulted, pass aborted");
                return Err(SequenceError::ActionFailed {
                    index,
                    source: Box::new(e),
                });
            }
            index += 1;

            if pacing == Pacing::Yield {
                tokio::task::yield_now().await;
            }
        };

        drop(guard);
        tracing::debug!(?outcome, "pass finished");
        Ok(outcome)
    }
}

/// Tracing span wrapping a single pass.
pub(crate) fn pass_span(sequence: &dyn Sequence, config: &RunConfig) -> tracing::Span {
    tracing::info_span!(
        "sequence_pass",
        sequence = sequence.name(),
        run_id = %config.run_id,
        pacing = %config.pacing,
        tags = ?config.tags,
    )
}

enum HandleState {
    Unbound,
    NoRuntime,
    Spawned(JoinHandle<Result<PassOutcome>>),
}

/// Handle to a dispatched pass.
///
/// Dropping the handle detaches the pass; it keeps running to completion.
pub struct PassHandle {
    state: HandleState,
}

impl PassHandle {
    pub(crate) fn spawn<F>(pass: F) -> Self
    where
        F: Future<Output = Result<PassOutcome>> + Send + 'static,
    {
        let state = match Handle::try_current() {
            Ok(runtime) => HandleState::Spawned(runtime.spawn(pass)),
            Err(_) => {
                tracing::warn!("no tokio runtime is current, pass not started");
                // Dropping the unpolled pass lowers the running flag again.
                drop(pass);
                HandleState::NoRuntime
            }
        };
        Self { state }
    }

    pub(crate) fn unbound() -> Self {
        Self {
            state: HandleState::Unbound,
        }
    }

    /// `true` once the pass has ended, or if it never started.
    pub fn is_finished(&self) -> bool {
        match &self.state {
            HandleState::Spawned(task) => task.is_finished(),
            HandleState::Unbound | HandleState::NoRuntime => true,
        }
    }

    /// Cancel the pass at its next suspension point. This is pre-emptive with
    /// respect to the pass, unlike [`Sequence::stop`]; the running flag is
    /// still cleared and completion callbacks do not fire.
    pub fn abort(&self) {
        if let HandleState::Spawned(task) = &self.state {
            task.abort();
        }
    }

    /// Wait for the pass to end.
    pub async fn wait(self) -> Result<PassOutcome> {
        match self.state {
            HandleState::Unbound => Ok(PassOutcome::Unbound),
            HandleState::NoRuntime => Err(SequenceError::NoRuntime),
            HandleState::Spawned(task) => task.await.unwrap_or_else(|e| Err(join_error(e))),
        }
    }
}

impl IntoFuture for PassHandle {
    type Output = Result<PassOutcome>;
    type IntoFuture = BoxFuture<'static, Result<PassOutcome>>;

    fn into_future(self) -> Self::IntoFuture {
        self.wait().boxed()
    }
}

fn join_error(err: JoinError) -> SequenceError {
    if err.is_panic() {
        SequenceError::Panicked(panic_message(err.into_panic()))
    } else {
        SequenceError::Cancelled
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
