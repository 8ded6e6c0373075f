//! Fixture builders for directory payloads.
//!
//! Numbered builders are deterministic, so assertions can reconstruct the
//! expected value. The `unique_*` variants are for tests that need ids
//! that cannot collide across fixtures.

use uuid::Uuid;

use alcove_directory::{
    EncryptionState, EventId, RoomId, RoomMember, RoomSummary, SpaceRoom, TimelineItem,
    TimelineItemKind, UserId,
};

const SERVER: &str = "test.alcove.im";
const EPOCH_MS: u64 = 1_700_000_000_000;

/// Deterministic room id `!room-{n}:test.alcove.im`.
pub fn room_id(n: usize) -> RoomId {
    RoomId::new(format!("!room-{n}:{SERVER}")).unwrap()
}

/// A room id guaranteed unique within the process.
pub fn unique_room_id() -> RoomId {
    RoomId::new(format!("!{}:{SERVER}", Uuid::new_v4().simple())).unwrap()
}

/// Deterministic user id `@user-{n}:test.alcove.im`.
pub fn user_id(n: usize) -> UserId {
    UserId::new(format!("@user-{n}:{SERVER}")).unwrap()
}

/// A user id guaranteed unique within the process.
pub fn unique_user_id() -> UserId {
    UserId::new(format!("@{}:{SERVER}", Uuid::new_v4().simple())).unwrap()
}

/// Deterministic event id `$event-{n}`.
pub fn event_id(n: usize) -> EventId {
    EventId::new(format!("$event-{n}")).unwrap()
}

/// A plain unencrypted room summary named `Room {n}`.
pub fn room_summary(n: usize) -> RoomSummary {
    RoomSummary {
        id: room_id(n),
        name: Some(format!("Room {n}")),
        topic: None,
        encryption: EncryptionState::NotEncrypted,
        unread_notifications: 0,
        is_direct: false,
    }
}

/// A direct-chat room summary with `unread` pending notifications.
pub fn direct_room_summary(n: usize, unread: u64) -> RoomSummary {
    RoomSummary {
        id: room_id(n),
        name: Some(format!("Direct {n}")),
        topic: None,
        encryption: EncryptionState::Encrypted,
        unread_notifications: unread,
        is_direct: true,
    }
}

/// A joined space child room named `Space Room {n}`.
pub fn space_room(n: usize) -> SpaceRoom {
    SpaceRoom {
        id: room_id(n),
        name: Some(format!("Space Room {n}")),
        topic: None,
        num_joined_members: 3,
        children_count: 0,
        joined: true,
    }
}

/// A space node with `children` child rooms, not yet joined.
pub fn space(n: usize, children: u64) -> SpaceRoom {
    SpaceRoom {
        id: room_id(n),
        name: Some(format!("Space {n}")),
        topic: Some("a space".into()),
        num_joined_members: 10,
        children_count: children,
        joined: false,
    }
}

/// A room member without profile data.
pub fn member(n: usize) -> RoomMember {
    RoomMember {
        user_id: user_id(n),
        display_name: None,
        avatar_url: None,
    }
}

/// A message timeline item with id `msg-{n}`, one second apart per `n`.
pub fn message(n: usize, body: &str) -> TimelineItem {
    TimelineItem {
        id: format!("msg-{n}"),
        kind: TimelineItemKind::Message {
            event_id: Some(event_id(n)),
            sender: user_id(n % 7),
            body: body.to_owned(),
            timestamp_ms: EPOCH_MS + (n as u64) * 1000,
        },
    }
}

/// The virtual start-of-history marker.
pub fn timeline_start() -> TimelineItem {
    TimelineItem {
        id: "virtual-timeline-start".into(),
        kind: TimelineItemKind::TimelineStart,
    }
}
