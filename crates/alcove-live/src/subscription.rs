//! Listener task lifecycle.
//!
//! Every live collection keeps one or more spawned listener tasks (diff
//! feed, pagination status, typing). A [`SubscriptionHandle`] owns exactly
//! one such task together with its shutdown signal; a [`SubscriptionSet`]
//! gathers the handles belonging to one owner so they tear down as a unit.

use std::future::Future;

use parking_lot::Mutex;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Ownership of one spawned listener task.
///
/// Cancelling is idempotent and guarantees the listener future makes no
/// further progress: the shutdown signal wins the race in the wrapper
/// `select!`, and the task is aborted for good measure. Dropping the handle
/// cancels.
#[derive(Debug)]
pub struct SubscriptionHandle {
    shutdown_tx: watch::Sender<bool>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl SubscriptionHandle {
    /// Spawn `fut` as a cancellable listener task.
    pub fn spawn<F>(fut: F) -> Self
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
        let task = tokio::spawn(async move {
            tokio::select! {
                _ = shutdown_rx.changed() => {}
                _ = fut => {}
            }
        });
        Self {
            shutdown_tx,
            task: Mutex::new(Some(task)),
        }
    }

    /// Stop the listener. Safe to call more than once.
    pub fn cancel(&self) {
        let _ = self.shutdown_tx.send(true);
        if let Some(task) = self.task.lock().take() {
            task.abort();
        }
    }

    /// Whether `cancel` has been called.
    pub fn is_cancelled(&self) -> bool {
        *self.shutdown_tx.borrow()
    }

    /// Whether the listener task has stopped, by completion or teardown.
    pub fn is_finished(&self) -> bool {
        self.task
            .lock()
            .as_ref()
            .map_or(true, JoinHandle::is_finished)
    }
}

impl Drop for SubscriptionHandle {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// The set of listener handles owned by one live collection.
#[derive(Debug, Default)]
pub struct SubscriptionSet {
    handles: Mutex<Vec<SubscriptionHandle>>,
}

impl SubscriptionSet {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Take ownership of an existing handle.
    pub fn insert(&self, handle: SubscriptionHandle) {
        self.handles.lock().push(handle);
    }

    /// Spawn `fut` as a listener owned by this set.
    pub fn spawn<F>(&self, fut: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.insert(SubscriptionHandle::spawn(fut));
    }

    /// Number of handles held.
    pub fn len(&self) -> usize {
        self.handles.lock().len()
    }

    /// Whether the set holds no handles.
    pub fn is_empty(&self) -> bool {
        self.handles.lock().is_empty()
    }

    /// Cancel every held listener and release the handles.
    ///
    /// Dropping the set has the same effect through each handle's `Drop`.
    pub fn shutdown(&self) {
        for handle in self.handles.lock().drain(..) {
            handle.cancel();
        }
    }
}
