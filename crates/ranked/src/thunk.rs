//! A memoized, thread-safe, at-most-once deferred computation cell.

use std::fmt;
use std::thread::{self, ThreadId};

use parking_lot::{Condvar, Mutex};
use tracing::trace;

use crate::backoff::Backoff;
use crate::error::{RankedError, Result};

type Closure<T> = Box<dyn FnOnce() -> Result<T> + Send>;

enum ThunkState<T> {
    /// Not yet evaluated; holds the deferred closure.
    Pending(Closure<T>),
    /// Currently being evaluated by the named thread. Other forcers block on
    /// the condvar; the owning thread recognizes its own id and fails fast
    /// with `RecursiveForce` instead of deadlocking on itself.
    Forcing(ThreadId),
    /// Evaluated successfully; the cached value is replayed to every forcer.
    Forced(T),
    /// Evaluation failed; the cached error is replayed to every forcer.
    Failed(RankedError),
}

/// A cell that evaluates its closure at most once, across any number of
/// concurrently forcing threads.
///
/// `Thunk<T>` is the substrate beneath [`crate::Node`]'s value and tail
/// fields. Its state machine is `Pending -> Forcing -> (Forced | Failed)`;
/// `Forcing` is a locked intermediate state used only to serialize concurrent
/// callers, never observed by a successful `force()` return.
pub struct Thunk<T> {
    state: Mutex<ThunkState<T>>,
    ready: Condvar,
}

impl<T> Thunk<T> {
    /// Creates a thunk that will run `closure` the first time it is forced.
    pub fn new_deferred<F>(closure: F) -> Self
    where
        F: FnOnce() -> Result<T> + Send + 'static,
    {
        Self {
            state: Mutex::new(ThunkState::Pending(Box::new(closure))),
            ready: Condvar::new(),
        }
    }

    /// Creates a thunk that is already resolved to `value`.
    pub fn new_forced(value: T) -> Self {
        Self {
            state: Mutex::new(ThunkState::Forced(value)),
            ready: Condvar::new(),
        }
    }

    /// Creates a thunk that is already resolved to an error.
    pub fn new_failed(err: RankedError) -> Self {
        Self {
            state: Mutex::new(ThunkState::Failed(err)),
            ready: Condvar::new(),
        }
    }

    /// True if this thunk has already settled (forced or failed); never
    /// blocks and never triggers evaluation.
    #[must_use]
    pub fn is_forced(&self) -> bool {
        matches!(
            *self.state.lock(),
            ThunkState::Forced(_) | ThunkState::Failed(_)
        )
    }

    /// Evaluates (once) and returns the cached result, blocking if another
    /// thread is currently evaluating this same thunk.
    ///
    /// # Errors
    ///
    /// Returns whatever error the closure produced (cached and replayed to
    /// every caller), or [`RankedError::RecursiveForce`] if the calling thread
    /// re-enters `force()` on this same thunk from within its own closure.
    pub fn force(&self) -> Result<T>
    where
        T: Clone,
    {
        let this_thread = thread::current().id();
        loop {
            let mut guard = self.state.lock();
            match &*guard {
                ThunkState::Forced(value) => return Ok(value.clone()),
                ThunkState::Failed(err) => return Err(err.clone()),
                ThunkState::Forcing(owner) => {
                    if *owner == this_thread {
                        return Err(RankedError::RecursiveForce);
                    }
                    trace!("thunk contended, blocking until forcer finishes");
                    self.ready.wait(&mut guard);
                    // Re-check state on wakeup; spurious wakeups loop harmlessly.
                }
                ThunkState::Pending(_) => {
                    let ThunkState::Pending(closure) =
                        std::mem::replace(&mut *guard, ThunkState::Forcing(this_thread))
                    else {
                        unreachable!("matched Pending above")
                    };
                    // Release the lock before running the closure: closures
                    // may themselves force other thunks, and holding the
                    // lock here would make any reentrant force on *this*
                    // thunk deadlock instead of hitting the `Forcing` arm.
                    drop(guard);

                    let outcome = closure();

                    let mut guard = self.state.lock();
                    *guard = match outcome {
                        Ok(value) => ThunkState::Forced(value),
                        Err(err) => ThunkState::Failed(err),
                    };
                    drop(guard);
                    self.ready.notify_all();
                    // Loop back around; the next iteration reads the settled state.
                }
            }
        }
    }

    /// Non-blocking variant of [`Thunk::force`]: if this thunk is settled,
    /// returns its result immediately; if another thread is evaluating it,
    /// spins and yields for a bounded number of attempts (via [`Backoff`])
    /// rather than parking on the condvar, returning `None` if the thunk is
    /// still unsettled once backoff gives up. Never itself begins evaluating
    /// a `Pending` thunk — a poller that isn't willing to do the work only
    /// wants to know whether the answer is ready yet.
    pub fn try_force(&self) -> Option<Result<T>>
    where
        T: Clone,
    {
        let mut backoff = Backoff::new();
        loop {
            match &*self.state.lock() {
                ThunkState::Forced(value) => return Some(Ok(value.clone())),
                ThunkState::Failed(err) => return Some(Err(err.clone())),
                ThunkState::Pending(_) => return None,
                ThunkState::Forcing(_) => {
                    if backoff.is_completed() {
                        return None;
                    }
                    backoff.snooze();
                }
            }
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Thunk<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &*self.state.lock() {
            ThunkState::Pending(_) => f.write_str("Thunk::Pending"),
            ThunkState::Forcing(_) => f.write_str("Thunk::Forcing"),
            ThunkState::Forced(v) => f.debug_tuple("Thunk::Forced").field(v).finish(),
            ThunkState::Failed(e) => f.debug_tuple("Thunk::Failed").field(e).finish(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn forced_thunk_returns_value_without_running_closure() {
        let t = Thunk::new_forced(42);
        assert!(t.is_forced());
        assert_eq!(t.force().unwrap(), 42);
    }

    #[test]
    fn deferred_thunk_runs_closure_exactly_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let calls2 = Arc::clone(&calls);
        let t = Thunk::new_deferred(move || {
            calls2.fetch_add(1, Ordering::SeqCst);
            Ok(7)
        });
        assert!(!t.is_forced());
        assert_eq!(t.force().unwrap(), 7);
        assert_eq!(t.force().unwrap(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn failed_evaluation_is_cached_and_replayed() {
        let t: Thunk<i32> = Thunk::new_deferred(|| Err(RankedError::Overflow));
        assert!(matches!(t.force(), Err(RankedError::Overflow)));
        assert!(matches!(t.force(), Err(RankedError::Overflow)));
    }

    #[test]
    fn concurrent_forcers_observe_one_evaluation() {
        let calls = Arc::new(AtomicUsize::new(0));
        let calls2 = Arc::clone(&calls);
        let t = Arc::new(Thunk::new_deferred(move || {
            calls2.fetch_add(1, Ordering::SeqCst);
            std::thread::sleep(std::time::Duration::from_millis(20));
            Ok(99)
        }));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let t = Arc::clone(&t);
                std::thread::spawn(move || t.force().unwrap())
            })
            .collect();

        for h in handles {
            assert_eq!(h.join().unwrap(), 99);
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn try_force_returns_immediately_on_a_settled_thunk() {
        let t = Thunk::new_forced(5);
        assert_eq!(t.try_force().map(Result::unwrap), Some(5));
    }

    #[test]
    fn try_force_gives_up_on_a_pending_thunk_without_evaluating_it() {
        let calls = Arc::new(AtomicUsize::new(0));
        let calls2 = Arc::clone(&calls);
        let t: Thunk<i32> = Thunk::new_deferred(move || {
            calls2.fetch_add(1, Ordering::SeqCst);
            Ok(1)
        });
        assert!(t.try_force().is_none());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn try_force_eventually_gives_up_on_a_long_running_forcer() {
        let t = Arc::new(Thunk::new_deferred(|| {
            std::thread::sleep(std::time::Duration::from_millis(200));
            Ok(1)
        }));
        let t2 = Arc::clone(&t);
        let handle = std::thread::spawn(move || t2.force().unwrap());
        std::thread::sleep(std::time::Duration::from_millis(5));
        assert!(t.try_force().is_none());
        assert_eq!(handle.join().unwrap(), 1);
    }

    #[test]
    fn recursive_force_is_detected_not_deadlocked() {
        // A thunk whose closure (synchronously, same thread) forces itself.
        // Built via a two-step handshake since a closure can't capture `self`
        // before `self` exists: we smuggle an `Arc<Thunk<_>>` through a
        // `OnceLock` set right before forcing.
        use std::sync::OnceLock;
        let slot: Arc<OnceLock<Arc<Thunk<i32>>>> = Arc::new(OnceLock::new());
        let slot2 = Arc::clone(&slot);
        let thunk = Arc::new(Thunk::new_deferred(move || {
            let inner = slot2.get().expect("slot populated before force");
            inner.force()
        }));
        slot.set(Arc::clone(&thunk)).ok();

        assert!(matches!(thunk.force(), Err(RankedError::RecursiveForce)));
    }
}
