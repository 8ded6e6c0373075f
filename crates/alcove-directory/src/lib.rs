//! # Alcove Directory
//!
//! The boundary between the Alcove client core and the remote room
//! directory it mirrors. This crate holds what both sides must agree on:
//!
//! - [`RoomId`] / [`UserId`] / [`EventId`]: validated wire identifiers
//! - [`RoomSummary`], [`SpaceRoom`], [`TimelineItem`], [`RoomMember`]:
//!   the list element types
//! - [`Directory`], [`ListSource`], [`MemberPager`]: the service traits
//! - [`SyncConfig`]: page sizes and channel capacities
//! - [`DirectoryError`]: the boundary error taxonomy
//!
//! Nothing here performs I/O. Implementations live elsewhere; the only
//! in-repo one is the scripted directory in `alcove-testkit`.

pub mod config;
pub mod error;
pub mod id;
pub mod source;
pub mod types;

pub use config::SyncConfig;
pub use error::{DirectoryError, Result};
pub use id::{EventId, InvalidId, RoomId, UserId};
pub use source::{
    BatchFeed, ConnectionFeed, Directory, ListSource, MemberPager, RoomListSource, SpaceMetaFeed,
    StatusFeed, TypingFeed, VecMemberPager,
};
pub use types::{
    EncryptionState, RoomFilter, RoomMember, RoomSummary, SpaceRoom, SyncState, TimelineItem,
    TimelineItemKind,
};
