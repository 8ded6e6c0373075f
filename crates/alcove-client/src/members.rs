//! Fetch-once room member lists.

use std::sync::Arc;

use alcove_directory::{Directory, DirectoryError, RoomId, RoomMember};
use alcove_live::{LazySlot, LoadState};

use crate::error::Result;

/// The member list of one room, fetched on first use.
///
/// The first [`load`](Self::load) walks the directory's member pager one
/// chunk at a time and memoizes the concatenation; later calls return it
/// without touching the directory. Concurrent first calls share a single
/// walk. A failed walk is kept as [`LoadState::Failed`] until someone
/// calls `load` again.
pub struct RoomMembers {
    room: RoomId,
    directory: Arc<dyn Directory>,
    chunk_size: u16,
    slot: LazySlot<Arc<[RoomMember]>, DirectoryError>,
}

impl RoomMembers {
    pub(crate) fn new(room: RoomId, directory: Arc<dyn Directory>, chunk_size: u16) -> Self {
        Self {
            room,
            directory,
            chunk_size,
            slot: LazySlot::new(),
        }
    }

    /// The room these members belong to.
    pub fn room(&self) -> &RoomId {
        &self.room
    }

    /// The current load state, without triggering a fetch.
    pub fn state(&self) -> LoadState<Arc<[RoomMember]>, DirectoryError> {
        self.slot.state()
    }

    /// The full member list.
    pub async fn load(&self) -> Result<Arc<[RoomMember]>> {
        let room = self.room.clone();
        let directory = Arc::clone(&self.directory);
        let chunk_size = self.chunk_size;
        let members = self
            .slot
            .load(|| async move {
                let mut pager = directory.member_pager(&room).await?;
                let mut members: Vec<RoomMember> = Vec::new();
                while let Some(chunk) = pager.next_chunk(chunk_size).await? {
                    members.extend(chunk);
                }
                tracing::debug!(room = %room, count = members.len(), "member list fetched");
                Ok(Arc::from(members))
            })
            .await?;
        Ok(members)
    }
}
