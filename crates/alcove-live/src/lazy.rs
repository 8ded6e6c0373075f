//! Fetch-once slots for on-demand data.
//!
//! A [`LazySlot`] wraps a value that is expensive to fetch (a member roster,
//! a child-room listing) and must be fetched at most once per attempt.
//! Concurrent callers racing for the first load are coalesced onto a single
//! fetch; a failed attempt is remembered, not retried behind the caller's
//! back.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;

/// Observable state of a [`LazySlot`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadState<T, E> {
    /// No attempt has completed yet. Covers both "never asked" and
    /// "a fetch is in flight".
    Loading,
    /// The last attempt produced a value, held for all future callers.
    Loaded(T),
    /// The last attempt failed. A later [`LazySlot::load`] re-attempts.
    Failed(E),
}

impl<T, E> LoadState<T, E> {
    /// Whether no attempt has completed.
    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }

    /// Whether a value is held.
    pub fn is_loaded(&self) -> bool {
        matches!(self, Self::Loaded(_))
    }

    /// Whether the last attempt failed.
    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }

    /// The held value, if loaded.
    pub fn loaded(&self) -> Option<&T> {
        match self {
            Self::Loaded(value) => Some(value),
            _ => None,
        }
    }

    /// The held error, if the last attempt failed.
    pub fn failed(&self) -> Option<&E> {
        match self {
            Self::Failed(err) => Some(err),
            _ => None,
        }
    }
}

/// A memoized, coalescing, at-most-once-per-attempt fetch container.
///
/// Reads through [`state`](Self::state) never wait on an in-flight fetch;
/// they observe `Loading` until the attempt completes. The fetch path is
/// mutually exclusive: while one caller's fetch is in flight, every other
/// caller parks on the gate and adopts that attempt's outcome instead of
/// issuing its own request.
#[derive(Debug)]
pub struct LazySlot<T, E> {
    state: RwLock<LoadState<T, E>>,
    gate: async_lock::Mutex<()>,
    // Completed attempts. Lets a caller that parked on the gate tell a
    // fresh failure (adopt it) from a stale one (re-attempt).
    attempts: AtomicU64,
}

impl<T, E> Default for LazySlot<T, E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, E> LazySlot<T, E> {
    /// Create an empty slot in the `Loading` state.
    pub fn new() -> Self {
        Self {
            state: RwLock::new(LoadState::Loading),
            gate: async_lock::Mutex::new(()),
            attempts: AtomicU64::new(0),
        }
    }

    /// Create a slot already holding a value.
    pub fn preloaded(value: T) -> Self {
        Self {
            state: RwLock::new(LoadState::Loaded(value)),
            gate: async_lock::Mutex::new(()),
            attempts: AtomicU64::new(1),
        }
    }
}

impl<T, E> LazySlot<T, E>
where
    T: Clone,
    E: Clone,
{
    /// The current state, cloned out without waiting on any fetch.
    pub fn state(&self) -> LoadState<T, E> {
        self.state.read().clone()
    }

    /// Return the memoized value, fetching it if this is the first call.
    ///
    /// `fetch` is only invoked when this caller wins the right to attempt
    /// the load. Callers that arrive while an attempt is in flight await it
    /// and share its outcome, success or failure. After a failure, the next
    /// call re-attempts with its own `fetch`.
    pub async fn load<F, Fut>(&self, fetch: F) -> Result<T, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        if let LoadState::Loaded(value) = &*self.state.read() {
            return Ok(value.clone());
        }
        let seen = self.attempts.load(Ordering::SeqCst);

        let _guard = self.gate.lock().await;

        // Re-check under the gate: an attempt may have completed while this
        // caller was parked.
        match &*self.state.read() {
            LoadState::Loaded(value) => return Ok(value.clone()),
            LoadState::Failed(err) if self.attempts.load(Ordering::SeqCst) != seen => {
                // The failure happened during this caller's wait: share it.
                return Err(err.clone());
            }
            _ => {}
        }

        let outcome = fetch().await;
        {
            let mut state = self.state.write();
            *state = match &outcome {
                Ok(value) => LoadState::Loaded(value.clone()),
                Err(err) => LoadState::Failed(err.clone()),
            };
        }
        self.attempts.fetch_add(1, Ordering::SeqCst);
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::sync::Notify;

    #[tokio::test]
    async fn test_load_fetches_once_and_memoizes() {
        let slot: LazySlot<u32, String> = LazySlot::new();
        let calls = AtomicUsize::new(0);

        let first = slot
            .load(|| async {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(7)
            })
            .await;
        assert_eq!(first, Ok(7));

        let second = slot
            .load(|| async { panic!("fetch must not run when loaded") })
            .await;
        assert_eq!(second, Ok(7));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(slot.state().is_loaded());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_concurrent_loads_share_one_fetch() {
        let slot = Arc::new(LazySlot::<u32, String>::new());
        let calls = Arc::new(AtomicUsize::new(0));
        let gate = Arc::new(Notify::new());

        let spawn_load = |slot: Arc<LazySlot<u32, String>>,
                          calls: Arc<AtomicUsize>,
                          gate: Arc<Notify>| {
            tokio::spawn(async move {
                slot.load(|| async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    gate.notified().await;
                    Ok(42)
                })
                .await
            })
        };

        let a = spawn_load(slot.clone(), calls.clone(), gate.clone());
        let b = spawn_load(slot.clone(), calls.clone(), gate.clone());

        // Let both callers reach the slot before releasing the fetch.
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(slot.state().is_loading());
        gate.notify_one();

        assert_eq!(a.await.unwrap(), Ok(42));
        assert_eq!(b.await.unwrap(), Ok(42));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_waiter_adopts_failure_then_next_call_refetches() {
        let slot = Arc::new(LazySlot::<u32, String>::new());
        let calls = Arc::new(AtomicUsize::new(0));
        let gate = Arc::new(Notify::new());

        let spawn_load = |slot: Arc<LazySlot<u32, String>>,
                          calls: Arc<AtomicUsize>,
                          gate: Arc<Notify>| {
            tokio::spawn(async move {
                slot.load(|| async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    gate.notified().await;
                    Err("boom".to_string())
                })
                .await
            })
        };

        let a = spawn_load(slot.clone(), calls.clone(), gate.clone());
        let b = spawn_load(slot.clone(), calls.clone(), gate.clone());
        tokio::time::sleep(Duration::from_millis(20)).await;
        gate.notify_one();

        // Both the fetching caller and the parked one see the same failure.
        assert_eq!(a.await.unwrap(), Err("boom".to_string()));
        assert_eq!(b.await.unwrap(), Err("boom".to_string()));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(slot.state().is_failed());

        // A fresh call after the failure re-attempts.
        let retried = slot
            .load(|| async {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(9)
            })
            .await;
        assert_eq!(retried, Ok(9));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert!(slot.state().is_loaded());
    }

    #[tokio::test]
    async fn test_preloaded_slot_never_fetches() {
        let slot: LazySlot<&'static str, String> = LazySlot::preloaded("ready");
        let value = slot
            .load(|| async { panic!("fetch must not run for a preloaded slot") })
            .await;
        assert_eq!(value, Ok("ready"));
        assert_eq!(slot.state().loaded(), Some(&"ready"));
    }

    #[test]
    fn test_state_accessors() {
        let loading: LoadState<u8, &str> = LoadState::Loading;
        assert!(loading.is_loading());
        assert!(loading.loaded().is_none());

        let failed: LoadState<u8, &str> = LoadState::Failed("nope");
        assert!(failed.is_failed());
        assert_eq!(failed.failed(), Some(&"nope"));
    }
}
