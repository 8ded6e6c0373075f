//! # Live Projection
//!
//! The composition point of the crate: one [`Projection`] per logical list.
//!
//! A projection spawns a driver task that:
//! - Receives diff batches from the upstream push channel, in arrival order
//! - Applies each batch to a privately owned [`LiveList`]
//! - Publishes one [`Snapshot`] per applied batch on a `watch` channel
//! - Folds pagination status reports into the list's [`Paginator`]
//! - Emits [`ProjectionEvent`]s for consumers that care about outcomes
//!
//! The list lives inside the driver task, so batch application needs no
//! lock and observers can never see a half-applied batch. Different
//! projections are fully independent.

use std::sync::Arc;

use tokio::sync::{broadcast, mpsc, watch};
use tokio_stream::wrappers::WatchStream;

use crate::edit::DiffBatch;
use crate::error::ApplyError;
use crate::list::{ApplyPolicy, LiveList};
use crate::pagination::{PaginationStatus, Paginator};
use crate::subscription::SubscriptionSet;

/// Configuration for one projection.
#[derive(Debug, Clone)]
pub struct ProjectionConfig {
    /// Failure policy for batch application (default: halt).
    pub policy: ApplyPolicy,
    /// Items per backfill request (default: 100).
    pub page_size: u16,
    /// Capacity of the outcome event channel (default: 16, must be > 0).
    pub event_capacity: usize,
}

impl Default for ProjectionConfig {
    fn default() -> Self {
        Self {
            policy: ApplyPolicy::default(),
            page_size: 100,
            event_capacity: 16,
        }
    }
}

/// An immutable copy of a projected list, published once per batch.
///
/// Cloning is cheap: the elements sit behind an `Arc`.
#[derive(Debug)]
pub struct Snapshot<T> {
    items: Arc<[T]>,
    seq: u64,
    desynced: bool,
}

impl<T> Clone for Snapshot<T> {
    fn clone(&self) -> Self {
        Self {
            items: Arc::clone(&self.items),
            seq: self.seq,
            desynced: self.desynced,
        }
    }
}

impl<T> Snapshot<T> {
    /// The snapshot of a list that has seen no batches yet.
    pub fn empty() -> Self {
        Self {
            items: Arc::from(Vec::new()),
            seq: 0,
            desynced: false,
        }
    }

    /// The elements, in list order.
    pub fn items(&self) -> &[T] {
        &self.items
    }

    /// Element at `index`, if present.
    pub fn get(&self, index: usize) -> Option<&T> {
        self.items.get(index)
    }

    /// First element, if any.
    pub fn first(&self) -> Option<&T> {
        self.items.first()
    }

    /// Last element, if any.
    pub fn last(&self) -> Option<&T> {
        self.items.last()
    }

    /// Iterate the elements in order.
    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the list is empty.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// How many batches produced this snapshot. Starts at zero, increments
    /// by one per non-empty batch processed, applied or rejected.
    pub fn seq(&self) -> u64 {
        self.seq
    }

    /// Whether the list diverged from upstream and awaits a reset.
    pub fn is_desynced(&self) -> bool {
        self.desynced
    }
}

impl<T: Clone> Snapshot<T> {
    /// Copy the elements out in order.
    pub fn to_vec(&self) -> Vec<T> {
        self.items.to_vec()
    }
}

/// Outcome of one diff batch, emitted on the projection's event channel.
#[derive(Debug, Clone)]
pub enum ProjectionEvent {
    /// The batch applied cleanly.
    Applied {
        /// Edits applied.
        edits: usize,
        /// List length afterwards.
        len: usize,
        /// Snapshot sequence number this batch produced.
        seq: u64,
    },
    /// The batch violated a precondition; the list is desynchronized until
    /// a reset arrives.
    Rejected {
        /// The rejection, including how much of the batch was committed.
        error: ApplyError,
        /// Snapshot sequence number this batch produced.
        seq: u64,
    },
}

/// A live, observable ordered list driven by upstream diffs.
///
/// Dropping the projection (or calling [`shutdown`](Self::shutdown)) stops
/// the driver task and ends consumption of the upstream feeds. The last
/// published snapshot remains readable.
#[derive(Debug)]
pub struct Projection<T> {
    name: String,
    snapshot_rx: watch::Receiver<Snapshot<T>>,
    events_tx: broadcast::Sender<ProjectionEvent>,
    paginator: Arc<Paginator>,
    subs: SubscriptionSet,
}

impl<T> Projection<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Spawn the driver task for one list.
    ///
    /// `batches` delivers upstream diff batches; `status`, when present,
    /// delivers upstream pagination reports that are folded into this
    /// projection's [`Paginator`].
    pub fn spawn(
        name: impl Into<String>,
        config: ProjectionConfig,
        batches: mpsc::Receiver<DiffBatch<T>>,
        status: Option<mpsc::Receiver<PaginationStatus>>,
    ) -> Self {
        let name = name.into();
        let paginator = Arc::new(Paginator::new(config.page_size));
        let (snapshot_tx, snapshot_rx) = watch::channel(Snapshot::empty());
        let (events_tx, _events_rx) = broadcast::channel(config.event_capacity);

        let driver = Driver {
            name: name.clone(),
            list: LiveList::with_policy(config.policy),
            batch_rx: batches,
            status_rx: status,
            snapshot_tx,
            events_tx: events_tx.clone(),
            paginator: Arc::clone(&paginator),
            seq: 0,
            desynced: false,
        };

        let subs = SubscriptionSet::new();
        subs.spawn(driver.run());

        Self {
            name,
            snapshot_rx,
            events_tx,
            paginator,
            subs,
        }
    }

    /// The list's name, as used in log fields.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The latest published snapshot.
    pub fn snapshot(&self) -> Snapshot<T> {
        self.snapshot_rx.borrow().clone()
    }

    /// A watch over published snapshots. Receivers always observe whole
    /// batches; intermediate per-edit states are never published.
    pub fn watch(&self) -> watch::Receiver<Snapshot<T>> {
        self.snapshot_rx.clone()
    }

    /// The snapshots as an async stream, yielding the current one first.
    ///
    /// Slow consumers skip intermediate snapshots rather than lagging; each
    /// yielded snapshot is the latest published state.
    pub fn stream(&self) -> WatchStream<Snapshot<T>> {
        WatchStream::new(self.snapshot_rx.clone())
    }

    /// Subscribe to per-batch outcome events.
    ///
    /// Events sent while no receiver exists are dropped.
    pub fn events(&self) -> broadcast::Receiver<ProjectionEvent> {
        self.events_tx.subscribe()
    }

    /// The backfill guard for this list.
    pub fn paginator(&self) -> Arc<Paginator> {
        Arc::clone(&self.paginator)
    }

    /// The current backfill status.
    pub fn pagination_status(&self) -> PaginationStatus {
        self.paginator.status()
    }

    /// Stop the driver task. Idempotent; dropping the projection has the
    /// same effect.
    pub fn shutdown(&self) {
        self.subs.shutdown();
    }
}

struct Driver<T> {
    name: String,
    list: LiveList<T>,
    batch_rx: mpsc::Receiver<DiffBatch<T>>,
    status_rx: Option<mpsc::Receiver<PaginationStatus>>,
    snapshot_tx: watch::Sender<Snapshot<T>>,
    events_tx: broadcast::Sender<ProjectionEvent>,
    paginator: Arc<Paginator>,
    seq: u64,
    desynced: bool,
}

impl<T> Driver<T>
where
    T: Clone + Send + Sync + 'static,
{
    async fn run(mut self) {
        tracing::debug!(list = %self.name, "projection driver starting");

        loop {
            tokio::select! {
                maybe_batch = self.batch_rx.recv() => {
                    match maybe_batch {
                        Some(batch) => self.handle_batch(batch),
                        None => {
                            tracing::debug!(list = %self.name, "diff feed closed");
                            break;
                        }
                    }
                }
                maybe_status = Self::next_status(&mut self.status_rx) => {
                    match maybe_status {
                        Some(status) => self.paginator.observe_upstream(status),
                        // Status feed closed; keep driving diffs.
                        None => self.status_rx = None,
                    }
                }
            }
        }

        tracing::debug!(list = %self.name, "projection driver stopped");
    }

    /// Receive from the status feed, or park forever when there is none.
    async fn next_status(
        status_rx: &mut Option<mpsc::Receiver<PaginationStatus>>,
    ) -> Option<PaginationStatus> {
        match status_rx {
            Some(rx) => rx.recv().await,
            None => std::future::pending().await,
        }
    }

    fn handle_batch(&mut self, batch: DiffBatch<T>) {
        // An empty batch is a permitted no-op; observers are not woken.
        if batch.is_empty() {
            return;
        }

        self.seq += 1;
        match self.list.apply(batch) {
            Ok(report) => {
                if report.reset_applied && self.desynced {
                    tracing::info!(list = %self.name, "list resynchronized by reset");
                }
                if report.reset_applied {
                    self.desynced = false;
                }
                self.publish();
                let _ = self.events_tx.send(ProjectionEvent::Applied {
                    edits: report.applied,
                    len: self.list.len(),
                    seq: self.seq,
                });
                tracing::trace!(
                    list = %self.name,
                    edits = report.applied,
                    len = self.list.len(),
                    "applied diff batch"
                );
            }
            Err(error) => {
                tracing::warn!(list = %self.name, %error, "diff batch rejected, awaiting reset");
                self.desynced = true;
                self.publish();
                let _ = self.events_tx.send(ProjectionEvent::Rejected {
                    error,
                    seq: self.seq,
                });
            }
        }
    }

    fn publish(&self) {
        let snapshot = Snapshot {
            items: Arc::from(self.list.as_slice()),
            seq: self.seq,
            desynced: self.desynced,
        };
        self.snapshot_tx.send_replace(snapshot);
    }
}
