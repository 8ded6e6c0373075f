//! One room's live timeline.

use std::sync::Arc;

use tokio::sync::{broadcast, watch};

use alcove_directory::{Directory, ListSource, RoomId, SyncConfig, TimelineItem, UserId};
use alcove_live::{PaginationStatus, Projection, ProjectionEvent, Snapshot, SubscriptionSet};

use crate::error::Result;
use crate::wiring;

/// Live view of one room's timeline, newest items at the back.
///
/// History grows at the front through
/// [`paginate_backwards`](Self::paginate_backwards). The handle also
/// carries the room's typing roster. Dropping it tears down every
/// listener it spawned.
pub struct RoomTimeline {
    room: RoomId,
    source: Arc<dyn ListSource<TimelineItem>>,
    projection: Projection<TimelineItem>,
    typing_rx: watch::Receiver<Vec<UserId>>,
    subs: SubscriptionSet,
}

impl RoomTimeline {
    pub(crate) fn open(
        directory: &Arc<dyn Directory>,
        room: RoomId,
        config: &SyncConfig,
    ) -> Result<Self> {
        let source = directory.timeline(&room);
        let projection = wiring::project(
            format!("timeline {room}"),
            source.as_ref(),
            config.timeline_page_size,
            config.event_channel_capacity,
        )?;
        let subs = SubscriptionSet::new();
        wiring::spawn_reset_listener(&projection, Arc::clone(&source), &subs);

        let mut typing_feed = directory.subscribe_typing(&room)?;
        let (typing_tx, typing_rx) = watch::channel(Vec::new());
        subs.spawn(async move {
            while let Some(users) = typing_feed.recv().await {
                typing_tx.send_replace(users);
            }
        });

        tracing::debug!(room = %room, "timeline opened");
        Ok(Self {
            room,
            source,
            projection,
            typing_rx,
            subs,
        })
    }

    /// The room this timeline belongs to.
    pub fn room(&self) -> &RoomId {
        &self.room
    }

    /// The latest timeline snapshot.
    pub fn snapshot(&self) -> Snapshot<TimelineItem> {
        self.projection.snapshot()
    }

    /// Watch timeline snapshots. One wakeup per applied batch.
    pub fn watch(&self) -> watch::Receiver<Snapshot<TimelineItem>> {
        self.projection.watch()
    }

    /// Per-batch outcome events.
    pub fn events(&self) -> broadcast::Receiver<ProjectionEvent> {
        self.projection.events()
    }

    /// Users currently typing in the room. Empty until the directory
    /// first reports.
    pub fn typing(&self) -> watch::Receiver<Vec<UserId>> {
        self.typing_rx.clone()
    }

    /// Current backfill status.
    pub fn pagination_status(&self) -> PaginationStatus {
        self.projection.pagination_status()
    }

    /// Fetch one page of older history.
    ///
    /// Returns `Ok(false)` when the request was suppressed because a fill
    /// is already running or the start of history has been reached. The
    /// fetched items arrive on the diff feed like any other batch.
    pub async fn paginate_backwards(&self) -> Result<bool> {
        let source = Arc::clone(&self.source);
        let completed = self
            .projection
            .paginator()
            .request_more(move |size| async move { source.request_page(size).await })
            .await?;
        Ok(completed)
    }

    /// Stop every listener this timeline spawned. Dropping the handle has
    /// the same effect.
    pub fn shutdown(&self) {
        self.projection.shutdown();
        self.subs.shutdown();
    }
}
