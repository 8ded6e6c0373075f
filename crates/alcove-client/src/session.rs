//! The root handle of the client core.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::watch;

use alcove_directory::{Directory, RoomId, SyncConfig, SyncState};
use alcove_live::SubscriptionSet;

use crate::error::Result;
use crate::members::RoomMembers;
use crate::room_list::RoomListService;
use crate::spaces::SpaceService;
use crate::timeline::RoomTimeline;

/// A live session over one directory.
///
/// The session owns the always-on surfaces: the joined-rooms list, the
/// space surface, and the connection state watch. Per-room surfaces are
/// opened on demand: timelines are independent handles their caller owns,
/// member lists are shared so each room is fetched once.
pub struct Session {
    directory: Arc<dyn Directory>,
    config: SyncConfig,
    room_list: RoomListService,
    spaces: SpaceService,
    connection_rx: watch::Receiver<SyncState>,
    members: Mutex<HashMap<RoomId, Arc<RoomMembers>>>,
    subs: SubscriptionSet,
}

impl Session {
    /// Start a session over `directory`.
    ///
    /// Subscribes the connection feed and brings up the joined-rooms and
    /// joined-spaces projections. Fails if any of those subscriptions
    /// fail, leaving nothing behind.
    pub fn start(directory: Arc<dyn Directory>, config: SyncConfig) -> Result<Self> {
        let room_list = RoomListService::new(directory.joined_rooms(), &config)?;
        let spaces = SpaceService::new(Arc::clone(&directory), config.clone())?;

        let mut connection_feed = directory.subscribe_connection()?;
        let (connection_tx, connection_rx) = watch::channel(SyncState::Idle);
        let subs = SubscriptionSet::new();
        subs.spawn(async move {
            while let Some(state) = connection_feed.recv().await {
                tracing::debug!(?state, "sync state changed");
                connection_tx.send_replace(state);
            }
        });

        tracing::info!("session started");
        Ok(Self {
            directory,
            config,
            room_list,
            spaces,
            connection_rx,
            members: Mutex::new(HashMap::new()),
            subs,
        })
    }

    /// The joined-rooms list.
    pub fn room_list(&self) -> &RoomListService {
        &self.room_list
    }

    /// The space surface.
    pub fn spaces(&self) -> &SpaceService {
        &self.spaces
    }

    /// Watch the directory's sync loop state. Reads `Idle` until the
    /// directory first reports.
    pub fn connection(&self) -> watch::Receiver<SyncState> {
        self.connection_rx.clone()
    }

    /// The current sync loop state.
    pub fn sync_state(&self) -> SyncState {
        *self.connection_rx.borrow()
    }

    /// Open a live timeline for `room`.
    ///
    /// Every call opens an independent handle; drop it (or call its
    /// `shutdown`) to unsubscribe.
    pub fn timeline(&self, room: &RoomId) -> Result<RoomTimeline> {
        RoomTimeline::open(&self.directory, room.clone(), &self.config)
    }

    /// The member list handle for `room`.
    ///
    /// Shared across calls, so the member walk happens once per room no
    /// matter how many surfaces ask.
    pub fn members(&self, room: &RoomId) -> Arc<RoomMembers> {
        let mut members = self.members.lock();
        let entry = members.entry(room.clone()).or_insert_with(|| {
            Arc::new(RoomMembers::new(
                room.clone(),
                Arc::clone(&self.directory),
                self.config.member_chunk_size,
            ))
        });
        Arc::clone(entry)
    }

    /// Tear down the always-on surfaces and the connection listener.
    /// Timeline handles are owned by their callers and are torn down by
    /// dropping them.
    pub fn shutdown(&self) {
        tracing::info!("session stopping");
        self.room_list.shutdown();
        self.spaces.shutdown();
        self.subs.shutdown();
    }
}
