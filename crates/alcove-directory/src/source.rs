//! The directory service boundary.
//!
//! A [`Directory`] is the single source of truth for every list the client
//! shows. The client never writes to it; it subscribes to push feeds and
//! issues bounded fetch requests. All feeds are plain `mpsc` receivers, so
//! dropping a feed is how a consumer unsubscribes.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc;

use alcove_live::{DiffBatch, PaginationStatus};

use crate::error::Result;
use crate::id::{RoomId, UserId};
use crate::types::{RoomFilter, RoomMember, RoomSummary, SpaceRoom, SyncState, TimelineItem};

/// Push feed of diff batches for one list.
pub type BatchFeed<T> = mpsc::Receiver<DiffBatch<T>>;

/// Push feed of upstream pagination reports for one list.
pub type StatusFeed = mpsc::Receiver<PaginationStatus>;

/// Push feed of the users currently typing in a room.
pub type TypingFeed = mpsc::Receiver<Vec<UserId>>;

/// Push feed of the directory's sync loop state.
pub type ConnectionFeed = mpsc::Receiver<SyncState>;

/// Push feed of a space's own metadata. `None` means the directory has no
/// view of the space yet.
pub type SpaceMetaFeed = mpsc::Receiver<Option<SpaceRoom>>;

/// One remote ordered list.
///
/// `subscribe` and `subscribe_pagination` hand out fresh feeds; errors
/// surface synchronously and leave no partial subscription behind.
/// `request_page` only triggers work: its effects arrive later, on the
/// diff feed, as ordinary batches.
#[async_trait]
pub trait ListSource<T>: Send + Sync {
    /// Open the diff feed for this list.
    fn subscribe(&self) -> Result<BatchFeed<T>>;

    /// Open the pagination status feed for this list.
    fn subscribe_pagination(&self) -> Result<StatusFeed>;

    /// Ask upstream for up to `size` further historical items.
    async fn request_page(&self, size: u16) -> Result<()>;

    /// Ask upstream to re-send the whole list as a `Reset` batch.
    ///
    /// Used to recover after a rejected batch. Sources that cannot replay
    /// simply leave the default no-op in place; the list then stays
    /// desynchronized until the next natural reset.
    async fn request_reset(&self) -> Result<()> {
        Ok(())
    }
}

/// The joined-rooms list, which additionally accepts a server-side filter.
#[async_trait]
pub trait RoomListSource: ListSource<RoomSummary> {
    /// Replace the active filter. The re-filtered list arrives on the diff
    /// feed, normally as a `Reset`.
    async fn set_filter(&self, filter: RoomFilter) -> Result<()>;
}

/// Cursor over a room's full member list, in directory order.
#[async_trait]
pub trait MemberPager: Send {
    /// Fetch the next chunk of at most `size` members. `None` means the
    /// cursor is exhausted. A `size` of zero ends the walk immediately.
    async fn next_chunk(&mut self, size: u16) -> Result<Option<Vec<RoomMember>>>;
}

impl std::fmt::Debug for dyn MemberPager + '_ {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemberPager").finish_non_exhaustive()
    }
}

/// A remote room directory.
///
/// Handles to lists are cheap and do not touch the network; work starts
/// when a feed is subscribed or a request is issued.
#[async_trait]
pub trait Directory: Send + Sync {
    /// The joined-rooms list.
    fn joined_rooms(&self) -> Arc<dyn RoomListSource>;

    /// The list of spaces the user has joined.
    fn joined_spaces(&self) -> Arc<dyn ListSource<SpaceRoom>>;

    /// The child-room list of one space.
    fn space_children(&self, space: &RoomId) -> Arc<dyn ListSource<SpaceRoom>>;

    /// The timeline of one room.
    fn timeline(&self, room: &RoomId) -> Arc<dyn ListSource<TimelineItem>>;

    /// Metadata pushes for one space.
    fn subscribe_space_meta(&self, space: &RoomId) -> Result<SpaceMetaFeed>;

    /// Typing notifications for one room.
    fn subscribe_typing(&self, room: &RoomId) -> Result<TypingFeed>;

    /// Sync loop state changes.
    fn subscribe_connection(&self) -> Result<ConnectionFeed>;

    /// Open a member cursor for one room.
    async fn member_pager(&self, room: &RoomId) -> Result<Box<dyn MemberPager>>;
}

/// A member pager over an in-memory vector. Useful wherever a member list
/// is already materialized.
#[derive(Debug)]
pub struct VecMemberPager {
    members: Vec<RoomMember>,
    offset: usize,
}

impl VecMemberPager {
    /// Page over `members` in order.
    pub fn new(members: Vec<RoomMember>) -> Self {
        Self { members, offset: 0 }
    }
}

#[async_trait]
impl MemberPager for VecMemberPager {
    async fn next_chunk(&mut self, size: u16) -> Result<Option<Vec<RoomMember>>> {
        if size == 0 || self.offset >= self.members.len() {
            return Ok(None);
        }
        let end = (self.offset + usize::from(size)).min(self.members.len());
        let chunk = self.members[self.offset..end].to_vec();
        self.offset = end;
        Ok(Some(chunk))
    }
}
