//! The joined-rooms list.

use std::sync::Arc;

use tokio::sync::{broadcast, watch};

use alcove_directory::{RoomFilter, RoomListSource, RoomSummary, SyncConfig};
use alcove_live::{PaginationStatus, Projection, ProjectionEvent, Snapshot, SubscriptionSet};

use crate::error::Result;
use crate::wiring;

/// Live view of the rooms the user has joined.
///
/// One projection over the directory's room list source, plus the
/// server-side filter pass-through. Batches that the source rejects are
/// answered with a replay request, so the list heals itself.
pub struct RoomListService {
    source: Arc<dyn RoomListSource>,
    projection: Projection<RoomSummary>,
    subs: SubscriptionSet,
}

impl RoomListService {
    pub(crate) fn new(source: Arc<dyn RoomListSource>, config: &SyncConfig) -> Result<Self> {
        let projection = wiring::project(
            "rooms",
            source.as_ref(),
            config.room_list_page_size,
            config.event_channel_capacity,
        )?;
        let subs = SubscriptionSet::new();
        wiring::spawn_reset_listener(&projection, Arc::clone(&source), &subs);
        Ok(Self {
            source,
            projection,
            subs,
        })
    }

    /// The latest room list snapshot.
    pub fn snapshot(&self) -> Snapshot<RoomSummary> {
        self.projection.snapshot()
    }

    /// Watch room list snapshots. One wakeup per applied batch.
    pub fn watch(&self) -> watch::Receiver<Snapshot<RoomSummary>> {
        self.projection.watch()
    }

    /// Per-batch outcome events.
    pub fn events(&self) -> broadcast::Receiver<ProjectionEvent> {
        self.projection.events()
    }

    /// Backfill status reported by the directory for this list.
    pub fn pagination_status(&self) -> PaginationStatus {
        self.projection.pagination_status()
    }

    /// Forward a new server-side filter. The re-filtered list arrives on
    /// the ordinary diff feed.
    pub async fn set_filter(&self, filter: RoomFilter) -> Result<()> {
        tracing::debug!(?filter, "room filter updated");
        self.source.set_filter(filter).await?;
        Ok(())
    }

    /// Stop the projection and the recovery listener.
    pub fn shutdown(&self) {
        self.projection.shutdown();
        self.subs.shutdown();
    }
}
