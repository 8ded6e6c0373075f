//! Boundary value types pushed by a directory.
//!
//! These are plain data carriers: the directory owns their truth, the
//! client only projects them. Identity for diff correlation is the id
//! field on each type.

use serde::{Deserialize, Serialize};

use crate::id::{EventId, RoomId, UserId};

/// Whether a room's history is end-to-end encrypted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EncryptionState {
    /// The room is encrypted.
    Encrypted,
    /// The room is not encrypted.
    NotEncrypted,
    /// Not yet known; the sync data seen so far does not decide it.
    Unknown,
}

/// One entry in the joined-rooms list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomSummary {
    /// Room identifier; the diff correlation key.
    pub id: RoomId,
    /// Computed display name, if one is known.
    pub name: Option<String>,
    /// Room topic, if set.
    pub topic: Option<String>,
    /// Encryption state of the room.
    pub encryption: EncryptionState,
    /// Count of unread notifications.
    pub unread_notifications: u64,
    /// Whether the room is a direct chat.
    pub is_direct: bool,
}

/// One entry in a space's child-room list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpaceRoom {
    /// Room identifier; the diff correlation key.
    pub id: RoomId,
    /// Computed display name, if one is known.
    pub name: Option<String>,
    /// Room topic, if set.
    pub topic: Option<String>,
    /// Number of joined members the directory reports.
    pub num_joined_members: u64,
    /// Number of child rooms, for space nodes.
    pub children_count: u64,
    /// Whether the current user has joined this room.
    pub joined: bool,
}

/// One entry in a room's timeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimelineItem {
    /// Unique per-item key, stable across edits to the same item.
    pub id: String,
    /// What the item is.
    pub kind: TimelineItemKind,
}

/// The payload of a timeline item.
///
/// Virtual items (`DateDivider`, `ReadMarker`, `TimelineStart`) are
/// inserted by the directory between events; they never carry an event id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimelineItemKind {
    /// A message-like event.
    Message {
        /// Event identifier once the server has assigned one.
        event_id: Option<EventId>,
        /// Sending user.
        sender: UserId,
        /// Message body.
        body: String,
        /// Origin server timestamp, milliseconds since the epoch.
        timestamp_ms: u64,
    },
    /// A day boundary between messages.
    DateDivider {
        /// Timestamp of the divider, milliseconds since the epoch.
        timestamp_ms: u64,
    },
    /// The user's read marker position.
    ReadMarker,
    /// The very beginning of the room's history.
    TimelineStart,
}

impl TimelineItem {
    /// Whether this is a real event rather than a virtual marker.
    pub fn is_message(&self) -> bool {
        matches!(self.kind, TimelineItemKind::Message { .. })
    }
}

/// One member of a room, as fetched through a
/// [`MemberPager`](crate::MemberPager).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomMember {
    /// User identifier.
    pub user_id: UserId,
    /// Profile display name, if set.
    pub display_name: Option<String>,
    /// Profile avatar URL, if set.
    pub avatar_url: Option<String>,
}

impl RoomMember {
    /// Display name, falling back to the id's localpart.
    pub fn name(&self) -> &str {
        match &self.display_name {
            Some(name) => name,
            None => self.user_id.localpart(),
        }
    }
}

/// State of the directory's background sync loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SyncState {
    /// Sync has not started or is paused.
    Idle,
    /// Sync is running and delivering updates.
    Running,
    /// Sync hit an error; the directory will retry.
    Error,
    /// Sync has been shut down for good.
    Terminated,
}

impl SyncState {
    /// Whether updates are currently flowing.
    pub fn is_running(self) -> bool {
        matches!(self, SyncState::Running)
    }
}

/// Server-side filter for the joined-rooms list.
///
/// The filter is forwarded to the directory as-is; the resulting list
/// arrives through the same diff feed, usually as a `Reset`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoomFilter {
    /// Every joined room.
    #[default]
    All,
    /// Rooms with unread notifications.
    Unread,
    /// Direct chats only.
    Direct,
}
