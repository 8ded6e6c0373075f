//! Shared plumbing between a [`ListSource`] and a [`Projection`].

use std::sync::Arc;

use tokio::sync::broadcast;

use alcove_directory::{DirectoryError, ListSource};
use alcove_live::{ApplyPolicy, Projection, ProjectionConfig, ProjectionEvent, SubscriptionSet};

/// Subscribe both feeds of `source` and spawn a projection over them.
pub(crate) fn project<T, S>(
    name: impl Into<String>,
    source: &S,
    page_size: u16,
    event_capacity: usize,
) -> Result<Projection<T>, DirectoryError>
where
    T: Clone + Send + Sync + 'static,
    S: ListSource<T> + ?Sized,
{
    let batches = source.subscribe()?;
    let status = source.subscribe_pagination()?;
    let config = ProjectionConfig {
        policy: ApplyPolicy::Halt,
        page_size,
        event_capacity,
    };
    Ok(Projection::spawn(name, config, batches, Some(status)))
}

/// Watch `projection`'s outcomes and ask `source` to replay the list
/// whenever a batch is rejected. The listener lives in `subs`.
///
/// A lagged outcome feed may have dropped the rejection itself, so after a
/// lag the listener consults the snapshot and still requests a replay if
/// the list is desynchronized.
pub(crate) fn spawn_reset_listener<T, S>(
    projection: &Projection<T>,
    source: Arc<S>,
    subs: &SubscriptionSet,
) where
    T: Clone + Send + Sync + 'static,
    S: ListSource<T> + ?Sized + 'static,
{
    let list = projection.name().to_owned();
    let mut events = projection.events();
    let snapshots = projection.watch();
    subs.spawn(async move {
        loop {
            match events.recv().await {
                Ok(ProjectionEvent::Rejected { error, .. }) => {
                    tracing::warn!(list = %list, %error, "requesting replay after rejected batch");
                    if let Err(err) = source.request_reset().await {
                        tracing::error!(list = %list, %err, "replay request failed");
                    }
                }
                Ok(ProjectionEvent::Applied { .. }) => {}
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::debug!(list = %list, skipped, "outcome feed lagged");
                    let desynced = snapshots.borrow().is_desynced();
                    if desynced {
                        tracing::warn!(list = %list, "requesting replay after lag over a rejection");
                        if let Err(err) = source.request_reset().await {
                            tracing::error!(list = %list, %err, "replay request failed");
                        }
                    }
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    });
}
