use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use futures::future::{self, BoxFuture, FutureExt};

use crate::error::Result;

type ActionFn = dyn Fn() -> BoxFuture<'static, Result<()>> + Send + Sync;

/// A shared, parameterless boolean check evaluated when a guarded action is dispatched.
pub type Predicate = Arc<dyn Fn() -> bool + Send + Sync>;

/// A deferred, parameterless unit of work stored in a sequence.
///
/// Cloning an `Action` is cheap and the clone keeps the same identity:
/// two actions are equal only when they share the same underlying closure.
#[derive(Clone)]
pub struct Action {
    func: Arc<ActionFn>,
}

impl Action {
    /// Wrap an infallible synchronous closure.
    pub fn new<F>(func: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        Self::fallible(move || {
            func();
            Ok(())
        })
    }

    /// Wrap a synchronous closure that may fault.
    pub fn fallible<F>(func: F) -> Self
    where
        F: Fn() -> Result<()> + Send + Sync + 'static,
    {
        Self::from_boxed(move || future::ready(func()).boxed())
    }

    /// Wrap an async closure. The future is created and awaited each time
    /// the action is invoked.
    pub fn from_async<F, Fut>(func: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        Self::from_boxed(move || func().boxed())
    }

    fn from_boxed<F>(func: F) -> Self
    where
        F: Fn() -> BoxFuture<'static, Result<()>> + Send + Sync + 'static,
    {
        Self {
            func: Arc::new(func),
        }
    }

    /// Run the action to completion.
    pub async fn invoke(&self) -> Result<()> {
        (self.func)().await
    }

    /// Identity comparison. Clones of one action are the same action.
    pub fn same(&self, other: &Action) -> bool {
        Arc::ptr_eq(&self.func, &other.func)
    }

    /// An action that waits `delay` when invoked, then runs `self`.
    ///
    /// The wait starts when the driver reaches this slot, not when the
    /// wrapper is built.
    pub fn delayed(self, delay: Duration) -> Action {
        Action::from_boxed(move || {
            let inner = self.clone();
            async move {
                tokio::time::sleep(delay).await;
                inner.invoke().await
            }
            .boxed()
        })
    }

    /// An action that runs `self` `count` times back to back.
    ///
    /// The sub-loop never consults the running flag of the sequence that
    /// holds it: once dispatched, all iterations run unless one faults.
    pub fn looping(self, count: usize) -> Action {
        Action::from_boxed(move || {
            let inner = self.clone();
            async move {
                for _ in 0..count {
                    inner.invoke().await?;
                }
                Ok(())
            }
            .boxed()
        })
    }

    /// An action that evaluates `predicate` once per dispatch and runs
    /// `self` only when it returns `true`.
    pub fn when<P>(self, predicate: P) -> Action
    where
        P: Fn() -> bool + Send + Sync + 'static,
    {
        Action::from_boxed(move || {
            if predicate() {
                let inner = self.clone();
                async move { inner.invoke().await }.boxed()
            } else {
                future::ready(Ok(())).boxed()
            }
        })
    }
}

impl PartialEq for Action {
    fn eq(&self, other: &Self) -> bool {
        self.same(other)
    }
}

impl Eq for Action {}

impl fmt::Debug for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Action")
            .field("ptr", &Arc::as_ptr(&self.func).cast::<()>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SequenceError;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counter() -> (Arc<AtomicUsize>, Action) {
        let hits = Arc::new(AtomicUsize::new(0));
        let h = hits.clone();
        let action = Action::new(move || {
            h.fetch_add(1, Ordering::SeqCst);
        });
        (hits, action)
    }

    #[tokio::test]
    async fn invoke_runs_closure() {
        let (hits, action) = counter();
        action.invoke().await.unwrap();
        action.invoke().await.unwrap();
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn clones_share_identity() {
        let (_, a) = counter();
        let b = a.clone();
        assert!(a.same(&b));
        assert_eq!(a, b);
    }

    #[test]
    fn distinct_closures_are_not_equal() {
        let a = Action::new(|| {});
        let b = Action::new(|| {});
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn fallible_error_propagates() {
        let action = Action::fallible(|| Err(SequenceError::action("no fuel")));
        let err = action.invoke().await.unwrap_err();
        assert!(err.to_string().contains("no fuel"));
    }

    #[tokio::test]
    async fn from_async_awaits_future() {
        let (hits, _) = counter();
        let h = hits.clone();
        let action = Action::from_async(move || {
            let h = h.clone();
            async move {
                tokio::task::yield_now().await;
                h.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
        });
        action.invoke().await.unwrap();
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn delayed_waits_at_invocation_time() {
        let (hits, action) = counter();
        let delayed = action.delayed(Duration::from_millis(500));

        // Time spent before invocation does not count toward the delay.
        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(hits.load(Ordering::SeqCst), 0);

        let start = tokio::time::Instant::now();
        delayed.invoke().await.unwrap();
        assert!(start.elapsed() >= Duration::from_millis(500));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn looping_runs_count_times() {
        let (hits, action) = counter();
        action.looping(4).invoke().await.unwrap();
        assert_eq!(hits.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn looping_zero_is_noop() {
        let (hits, action) = counter();
        action.looping(0).invoke().await.unwrap();
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn looping_stops_at_first_fault() {
        let hits = Arc::new(AtomicUsize::new(0));
        let h = hits.clone();
        let action = Action::fallible(move || {
            if h.fetch_add(1, Ordering::SeqCst) == 1 {
                Err(SequenceError::action("second call"))
            } else {
                Ok(())
            }
        });
        assert!(action.looping(5).invoke().await.is_err());
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn when_checks_predicate_once_per_dispatch() {
        let (hits, action) = counter();
        let checks = Arc::new(AtomicUsize::new(0));
        let c = checks.clone();
        // Predicate is true on odd-numbered evaluations only.
        let guarded = action.when(move || c.fetch_add(1, Ordering::SeqCst) % 2 == 0);

        for _ in 0..4 {
            guarded.invoke().await.unwrap();
        }
        assert_eq!(checks.load(Ordering::SeqCst), 4);
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn when_false_never_invokes() {
        let (hits, action) = counter();
        action.when(|| false).invoke().await.unwrap();
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }
}
