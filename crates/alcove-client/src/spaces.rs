//! The space surface: joined spaces and their lazily expanded children.
//!
//! Spaces form a tree, but the graph never stores owning pointers between
//! levels: nodes live in an arena keyed by room id, and a node's children
//! are just ids inside its own child-room list. Each expanded child list
//! is an ordinary projection with its own backfill guard.

use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::Mutex;
use tokio::sync::watch;

use alcove_directory::{Directory, DirectoryError, ListSource, RoomId, SpaceRoom, SyncConfig};
use alcove_live::{LazySlot, LoadState, PaginationStatus, Projection, Snapshot, SubscriptionSet};

use crate::error::{ClientError, Result};
use crate::wiring;

/// A space's expanded child list.
///
/// Clones share the same projection; the handle is cheap to pass to
/// whichever surface renders the subtree.
#[derive(Clone)]
pub struct SpaceChildren {
    source: Arc<dyn ListSource<SpaceRoom>>,
    projection: Arc<Projection<SpaceRoom>>,
    subs: Arc<SubscriptionSet>,
}

impl std::fmt::Debug for SpaceChildren {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpaceChildren").finish_non_exhaustive()
    }
}

impl SpaceChildren {
    /// The latest child-room snapshot.
    pub fn snapshot(&self) -> Snapshot<SpaceRoom> {
        self.projection.snapshot()
    }

    /// Watch child-room snapshots.
    pub fn watch(&self) -> watch::Receiver<Snapshot<SpaceRoom>> {
        self.projection.watch()
    }

    /// Current backfill status for this child list.
    pub fn pagination_status(&self) -> PaginationStatus {
        self.projection.pagination_status()
    }

    /// Fetch one more page of children. `Ok(false)` means the request was
    /// suppressed: a fill is running or the listing is complete.
    pub async fn paginate(&self) -> Result<bool> {
        let source = Arc::clone(&self.source);
        let completed = self
            .projection
            .paginator()
            .request_more(move |size| async move { source.request_page(size).await })
            .await?;
        Ok(completed)
    }

    /// Stop the child-list driver and its recovery listener.
    pub fn shutdown(&self) {
        self.projection.shutdown();
        self.subs.shutdown();
    }
}

/// One node in the arena: pushed metadata plus the lazy child list.
struct SpaceNode {
    meta_rx: watch::Receiver<Option<SpaceRoom>>,
    children: Arc<LazySlot<SpaceChildren, DirectoryError>>,
    subs: SubscriptionSet,
}

/// Arena of space nodes keyed by room id, in open order. Children are
/// referenced by id only; there are no owning pointers between levels.
struct SpaceGraph {
    nodes: IndexMap<RoomId, SpaceNode>,
}

/// Live view of the user's spaces.
pub struct SpaceService {
    directory: Arc<dyn Directory>,
    config: SyncConfig,
    roots: Projection<SpaceRoom>,
    graph: Mutex<SpaceGraph>,
    subs: SubscriptionSet,
}

impl SpaceService {
    pub(crate) fn new(directory: Arc<dyn Directory>, config: SyncConfig) -> Result<Self> {
        let root_source = directory.joined_spaces();
        let roots = wiring::project(
            "spaces",
            root_source.as_ref(),
            config.space_page_size,
            config.event_channel_capacity,
        )?;
        let subs = SubscriptionSet::new();
        wiring::spawn_reset_listener(&roots, root_source, &subs);
        Ok(Self {
            directory,
            config,
            roots,
            graph: Mutex::new(SpaceGraph {
                nodes: IndexMap::new(),
            }),
            subs,
        })
    }

    /// The latest joined-spaces snapshot.
    pub fn snapshot(&self) -> Snapshot<SpaceRoom> {
        self.roots.snapshot()
    }

    /// Watch the joined-spaces list.
    pub fn watch(&self) -> watch::Receiver<Snapshot<SpaceRoom>> {
        self.roots.watch()
    }

    /// Ids of every open space, in open order.
    pub fn open_spaces(&self) -> Vec<RoomId> {
        self.graph.lock().nodes.keys().cloned().collect()
    }

    /// Open `space` in the graph and subscribe its metadata feed.
    /// Reopening is a no-op.
    pub fn open(&self, space: &RoomId) -> Result<()> {
        let mut graph = self.graph.lock();
        if graph.nodes.contains_key(space) {
            return Ok(());
        }
        let mut feed = self.directory.subscribe_space_meta(space)?;
        let (meta_tx, meta_rx) = watch::channel(None);
        let subs = SubscriptionSet::new();
        subs.spawn(async move {
            while let Some(meta) = feed.recv().await {
                meta_tx.send_replace(meta);
            }
        });
        tracing::debug!(space = %space, "space opened");
        graph.nodes.insert(
            space.clone(),
            SpaceNode {
                meta_rx,
                children: Arc::new(LazySlot::new()),
                subs,
            },
        );
        Ok(())
    }

    /// The pushed metadata of an open space. `None` until the directory
    /// first reports.
    pub fn meta(&self, space: &RoomId) -> Result<watch::Receiver<Option<SpaceRoom>>> {
        let graph = self.graph.lock();
        let node = graph
            .nodes
            .get(space)
            .ok_or_else(|| ClientError::UnknownSpace(space.clone()))?;
        Ok(node.meta_rx.clone())
    }

    /// The load state of an open space's child list, without expanding.
    pub fn children_state(
        &self,
        space: &RoomId,
    ) -> Result<LoadState<SpaceChildren, DirectoryError>> {
        let graph = self.graph.lock();
        let node = graph
            .nodes
            .get(space)
            .ok_or_else(|| ClientError::UnknownSpace(space.clone()))?;
        Ok(node.children.state())
    }

    /// Expand a space: open it if needed, then load its child list.
    ///
    /// The first expansion subscribes the child feeds and kicks off the
    /// first backfill so an expanded space is never blank; later
    /// expansions return the memoized handle. Concurrent first expansions
    /// share one load, and a failed one is retried by calling again.
    pub async fn expand(&self, space: &RoomId) -> Result<SpaceChildren> {
        self.open(space)?;
        let slot = {
            let graph = self.graph.lock();
            let node = graph
                .nodes
                .get(space)
                .ok_or_else(|| ClientError::UnknownSpace(space.clone()))?;
            Arc::clone(&node.children)
        };

        let directory = Arc::clone(&self.directory);
        let space_id = space.clone();
        let page_size = self.config.space_page_size;
        let event_capacity = self.config.event_channel_capacity;
        let children = slot
            .load(|| async move {
                let source = directory.space_children(&space_id);
                let projection = wiring::project(
                    format!("space {space_id}"),
                    source.as_ref(),
                    page_size,
                    event_capacity,
                )?;
                let subs = SubscriptionSet::new();
                wiring::spawn_reset_listener(&projection, Arc::clone(&source), &subs);
                let children = SpaceChildren {
                    source,
                    projection: Arc::new(projection),
                    subs: Arc::new(subs),
                };
                if let Err(error) = children.paginate().await {
                    tracing::warn!(space = %space_id, %error, "first child fill failed");
                }
                Ok(children)
            })
            .await?;
        Ok(children)
    }

    /// Stop the root projection, every node, and every expanded child
    /// list.
    pub fn shutdown(&self) {
        self.roots.shutdown();
        self.subs.shutdown();
        let graph = self.graph.lock();
        for node in graph.nodes.values() {
            node.subs.shutdown();
            if let LoadState::Loaded(children) = node.children.state() {
                children.shutdown();
            }
        }
    }
}
