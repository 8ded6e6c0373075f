//! A fully scripted in-memory [`Directory`].
//!
//! Tests drive it from the outside: push diff batches and signal events,
//! enqueue pages for backfill requests to serve, and read back what the
//! code under test asked for. Nothing happens spontaneously.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::{mpsc, Notify};

use alcove_directory::{
    BatchFeed, ConnectionFeed, Directory, DirectoryError, ListSource, MemberPager, Result,
    RoomFilter, RoomId, RoomListSource, RoomMember, RoomSummary, SpaceMetaFeed, SpaceRoom,
    StatusFeed, SyncConfig, SyncState, TimelineItem, TypingFeed, UserId, VecMemberPager,
};
use alcove_live::{DiffBatch, ListEdit, PaginationStatus};

/// One enqueued response to a `request_page` call.
struct ScriptedPage<T> {
    batch: DiffBatch<T>,
    hit_boundary: bool,
}

/// A scripted [`ListSource`].
///
/// Every subscriber gets its own feed; pushes fan out to all of them.
/// Sends into dropped feeds are discarded, so a test can cancel a
/// consumer and keep pushing.
pub struct ScriptedList<T> {
    name: String,
    diff_capacity: usize,
    status_capacity: usize,
    diff_subs: Mutex<Vec<mpsc::Sender<DiffBatch<T>>>>,
    status_subs: Mutex<Vec<mpsc::Sender<PaginationStatus>>>,
    pages: Mutex<VecDeque<ScriptedPage<T>>>,
    next_page_error: Mutex<Option<DirectoryError>>,
    hold_next_page: Mutex<Option<Arc<Notify>>>,
    canonical: Mutex<Vec<T>>,
    next_reset_error: Mutex<Option<DirectoryError>>,
    hold_next_reset: Mutex<Option<Arc<Notify>>>,
    page_requests: Mutex<Vec<u16>>,
    reset_requests: AtomicUsize,
}

impl<T> ScriptedList<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn new(name: impl Into<String>, config: &SyncConfig) -> Self {
        Self {
            name: name.into(),
            diff_capacity: config.diff_channel_capacity,
            status_capacity: config.signal_channel_capacity,
            diff_subs: Mutex::new(Vec::new()),
            status_subs: Mutex::new(Vec::new()),
            pages: Mutex::new(VecDeque::new()),
            next_page_error: Mutex::new(None),
            hold_next_page: Mutex::new(None),
            canonical: Mutex::new(Vec::new()),
            next_reset_error: Mutex::new(None),
            hold_next_reset: Mutex::new(None),
            page_requests: Mutex::new(Vec::new()),
            reset_requests: AtomicUsize::new(0),
        }
    }

    /// Push one diff batch to every live subscriber.
    pub async fn push_batch(&self, batch: DiffBatch<T>) {
        let senders: Vec<_> = {
            let mut subs = self.diff_subs.lock();
            subs.retain(|tx| !tx.is_closed());
            subs.clone()
        };
        tracing::debug!(list = %self.name, edits = batch.len(), feeds = senders.len(), "pushing batch");
        for tx in senders {
            let _ = tx.send(batch.clone()).await;
        }
    }

    /// Push one pagination report to every live subscriber.
    pub async fn push_status(&self, status: PaginationStatus) {
        let senders: Vec<_> = {
            let mut subs = self.status_subs.lock();
            subs.retain(|tx| !tx.is_closed());
            subs.clone()
        };
        for tx in senders {
            let _ = tx.send(status).await;
        }
    }

    /// Enqueue the response to the next unanswered `request_page`.
    pub fn script_page(&self, batch: DiffBatch<T>, hit_boundary: bool) {
        self.pages.lock().push_back(ScriptedPage {
            batch,
            hit_boundary,
        });
    }

    /// Make the next `request_page` fail with `error` instead of serving
    /// a page.
    pub fn fail_next_page(&self, error: DirectoryError) {
        *self.next_page_error.lock() = Some(error);
    }

    /// Park the next `request_page` until the returned gate is notified.
    ///
    /// Lets a test keep one backfill in flight while it drives the calls
    /// that arrive in the meantime.
    pub fn hold_next_page(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.hold_next_page.lock() = Some(gate.clone());
        gate
    }

    /// Set the list the next `request_reset` replays.
    pub fn set_canonical(&self, items: Vec<T>) {
        *self.canonical.lock() = items;
    }

    /// Make the next `request_reset` fail with `error` instead of
    /// replaying.
    pub fn fail_next_reset(&self, error: DirectoryError) {
        *self.next_reset_error.lock() = Some(error);
    }

    /// Park the next `request_reset` until the returned gate is notified.
    pub fn hold_next_reset(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.hold_next_reset.lock() = Some(gate.clone());
        gate
    }

    /// Page sizes requested so far, in call order.
    pub fn page_requests(&self) -> Vec<u16> {
        self.page_requests.lock().clone()
    }

    /// How many times `request_reset` has been called.
    pub fn reset_requests(&self) -> usize {
        self.reset_requests.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl<T> ListSource<T> for ScriptedList<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn subscribe(&self) -> Result<BatchFeed<T>> {
        let (tx, rx) = mpsc::channel(self.diff_capacity);
        self.diff_subs.lock().push(tx);
        Ok(rx)
    }

    fn subscribe_pagination(&self) -> Result<StatusFeed> {
        let (tx, rx) = mpsc::channel(self.status_capacity);
        self.status_subs.lock().push(tx);
        Ok(rx)
    }

    async fn request_page(&self, size: u16) -> Result<()> {
        self.page_requests.lock().push(size);
        let gate = self.hold_next_page.lock().take();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        if let Some(error) = self.next_page_error.lock().take() {
            return Err(error);
        }
        let page = self.pages.lock().pop_front();
        match page {
            Some(page) => {
                tracing::debug!(list = %self.name, "serving scripted page");
                self.push_batch(page.batch).await;
                self.push_status(PaginationStatus::Idle {
                    hit_boundary: page.hit_boundary,
                })
                .await;
            }
            // Nothing scripted: report the history as exhausted.
            None => {
                self.push_status(PaginationStatus::Idle { hit_boundary: true })
                    .await;
            }
        }
        Ok(())
    }

    async fn request_reset(&self) -> Result<()> {
        self.reset_requests.fetch_add(1, Ordering::SeqCst);
        let gate = self.hold_next_reset.lock().take();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        if let Some(error) = self.next_reset_error.lock().take() {
            return Err(error);
        }
        let values = self.canonical.lock().clone();
        tracing::debug!(list = %self.name, len = values.len(), "replaying canonical list");
        self.push_batch(vec![ListEdit::Reset { values }]).await;
        Ok(())
    }
}

/// The scripted joined-rooms list: a [`ScriptedList`] that also records
/// filter changes.
pub struct ScriptedRoomList {
    list: ScriptedList<RoomSummary>,
    filter: Mutex<RoomFilter>,
    filter_calls: AtomicUsize,
}

impl ScriptedRoomList {
    fn new(config: &SyncConfig) -> Self {
        Self {
            list: ScriptedList::new("rooms", config),
            filter: Mutex::new(RoomFilter::default()),
            filter_calls: AtomicUsize::new(0),
        }
    }

    /// The scripting surface for the underlying list.
    pub fn list(&self) -> &ScriptedList<RoomSummary> {
        &self.list
    }

    /// The most recently set filter.
    pub fn filter(&self) -> RoomFilter {
        *self.filter.lock()
    }

    /// How many times `set_filter` has been called.
    pub fn filter_calls(&self) -> usize {
        self.filter_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ListSource<RoomSummary> for ScriptedRoomList {
    fn subscribe(&self) -> Result<BatchFeed<RoomSummary>> {
        self.list.subscribe()
    }

    fn subscribe_pagination(&self) -> Result<StatusFeed> {
        self.list.subscribe_pagination()
    }

    async fn request_page(&self, size: u16) -> Result<()> {
        self.list.request_page(size).await
    }

    async fn request_reset(&self) -> Result<()> {
        self.list.request_reset().await
    }
}

#[async_trait]
impl RoomListSource for ScriptedRoomList {
    async fn set_filter(&self, filter: RoomFilter) -> Result<()> {
        self.filter_calls.fetch_add(1, Ordering::SeqCst);
        *self.filter.lock() = filter;
        Ok(())
    }
}

/// An in-memory [`Directory`] whose every output is scripted by the test.
pub struct ScriptedDirectory {
    config: SyncConfig,
    rooms: Arc<ScriptedRoomList>,
    joined_spaces: Arc<ScriptedList<SpaceRoom>>,
    timelines: Mutex<HashMap<RoomId, Arc<ScriptedList<TimelineItem>>>>,
    spaces: Mutex<HashMap<RoomId, Arc<ScriptedList<SpaceRoom>>>>,
    typing_subs: Mutex<HashMap<RoomId, Vec<mpsc::Sender<Vec<UserId>>>>>,
    meta_subs: Mutex<HashMap<RoomId, Vec<mpsc::Sender<Option<SpaceRoom>>>>>,
    connection_subs: Mutex<Vec<mpsc::Sender<SyncState>>>,
    members: Mutex<HashMap<RoomId, Vec<RoomMember>>>,
    pager_opens: Mutex<HashMap<RoomId, usize>>,
}

impl ScriptedDirectory {
    /// A scripted directory with default [`SyncConfig`].
    pub fn new() -> Self {
        Self::with_config(SyncConfig::default())
    }

    /// A scripted directory with explicit channel and page sizing.
    pub fn with_config(config: SyncConfig) -> Self {
        Self {
            rooms: Arc::new(ScriptedRoomList::new(&config)),
            joined_spaces: Arc::new(ScriptedList::new("spaces", &config)),
            config,
            timelines: Mutex::new(HashMap::new()),
            spaces: Mutex::new(HashMap::new()),
            typing_subs: Mutex::new(HashMap::new()),
            meta_subs: Mutex::new(HashMap::new()),
            connection_subs: Mutex::new(Vec::new()),
            members: Mutex::new(HashMap::new()),
            pager_opens: Mutex::new(HashMap::new()),
        }
    }

    /// The scripted joined-rooms list.
    pub fn rooms(&self) -> Arc<ScriptedRoomList> {
        Arc::clone(&self.rooms)
    }

    /// The scripted joined-spaces list.
    pub fn joined_spaces_script(&self) -> Arc<ScriptedList<SpaceRoom>> {
        Arc::clone(&self.joined_spaces)
    }

    /// The scripted timeline for `room`, created on first use.
    ///
    /// Returns the same instance the directory hands to the code under
    /// test, so scripting and consumption meet.
    pub fn timeline_script(&self, room: &RoomId) -> Arc<ScriptedList<TimelineItem>> {
        let mut timelines = self.timelines.lock();
        let list = timelines.entry(room.clone()).or_insert_with(|| {
            Arc::new(ScriptedList::new(format!("timeline {room}"), &self.config))
        });
        Arc::clone(list)
    }

    /// The scripted child-room list for `space`, created on first use.
    pub fn space_script(&self, space: &RoomId) -> Arc<ScriptedList<SpaceRoom>> {
        let mut spaces = self.spaces.lock();
        let list = spaces
            .entry(space.clone())
            .or_insert_with(|| Arc::new(ScriptedList::new(format!("space {space}"), &self.config)));
        Arc::clone(list)
    }

    /// Push a typing roster to every live typing subscriber of `room`.
    pub async fn push_typing(&self, room: &RoomId, users: Vec<UserId>) {
        let senders: Vec<_> = {
            let mut subs = self.typing_subs.lock();
            match subs.get_mut(room) {
                Some(list) => {
                    list.retain(|tx| !tx.is_closed());
                    list.clone()
                }
                None => Vec::new(),
            }
        };
        for tx in senders {
            let _ = tx.send(users.clone()).await;
        }
    }

    /// Push a metadata update to every live meta subscriber of `space`.
    pub async fn push_space_meta(&self, space: &RoomId, meta: Option<SpaceRoom>) {
        let senders: Vec<_> = {
            let mut subs = self.meta_subs.lock();
            match subs.get_mut(space) {
                Some(list) => {
                    list.retain(|tx| !tx.is_closed());
                    list.clone()
                }
                None => Vec::new(),
            }
        };
        for tx in senders {
            let _ = tx.send(meta.clone()).await;
        }
    }

    /// Push a sync state change to every live connection subscriber.
    pub async fn push_connection(&self, state: SyncState) {
        let senders: Vec<_> = {
            let mut subs = self.connection_subs.lock();
            subs.retain(|tx| !tx.is_closed());
            subs.clone()
        };
        for tx in senders {
            let _ = tx.send(state).await;
        }
    }

    /// Set the member list served for `room`.
    pub fn set_members(&self, room: &RoomId, members: Vec<RoomMember>) {
        self.members.lock().insert(room.clone(), members);
    }

    /// How many member pagers have been opened for `room`.
    pub fn pager_opens(&self, room: &RoomId) -> usize {
        self.pager_opens.lock().get(room).copied().unwrap_or(0)
    }
}

impl Default for ScriptedDirectory {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Directory for ScriptedDirectory {
    fn joined_rooms(&self) -> Arc<dyn RoomListSource> {
        self.rooms()
    }

    fn joined_spaces(&self) -> Arc<dyn ListSource<SpaceRoom>> {
        self.joined_spaces_script()
    }

    fn space_children(&self, space: &RoomId) -> Arc<dyn ListSource<SpaceRoom>> {
        self.space_script(space)
    }

    fn timeline(&self, room: &RoomId) -> Arc<dyn ListSource<TimelineItem>> {
        self.timeline_script(room)
    }

    fn subscribe_space_meta(&self, space: &RoomId) -> Result<SpaceMetaFeed> {
        let (tx, rx) = mpsc::channel(self.config.signal_channel_capacity);
        self.meta_subs.lock().entry(space.clone()).or_default().push(tx);
        Ok(rx)
    }

    fn subscribe_typing(&self, room: &RoomId) -> Result<TypingFeed> {
        let (tx, rx) = mpsc::channel(self.config.signal_channel_capacity);
        self.typing_subs.lock().entry(room.clone()).or_default().push(tx);
        Ok(rx)
    }

    fn subscribe_connection(&self) -> Result<ConnectionFeed> {
        let (tx, rx) = mpsc::channel(self.config.signal_channel_capacity);
        self.connection_subs.lock().push(tx);
        Ok(rx)
    }

    async fn member_pager(&self, room: &RoomId) -> Result<Box<dyn MemberPager>> {
        let members = self
            .members
            .lock()
            .get(room)
            .cloned()
            .ok_or_else(|| DirectoryError::UnknownRoom(room.to_string()))?;
        *self.pager_opens.lock().entry(room.clone()).or_insert(0) += 1;
        Ok(Box::new(VecMemberPager::new(members)))
    }
}
