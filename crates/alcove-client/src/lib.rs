//! # Alcove Client
//!
//! The composition layer of the Alcove sync core: it wires the generic
//! live-list machinery from `alcove-live` to the service boundary from
//! `alcove-directory` and exposes the surfaces a chat frontend renders.
//!
//! - [`Session`]: root handle; owns the always-on surfaces
//! - [`RoomListService`]: the joined-rooms sidebar list
//! - [`RoomTimeline`]: one room's message history plus typing roster
//! - [`RoomMembers`]: fetch-once member list per room
//! - [`SpaceService`] / [`SpaceChildren`]: the space tree, expanded
//!   node by node
//!
//! Every list follows the same shape: subscribe the directory's diff and
//! status feeds, project them into snapshots, answer rejected batches
//! with a replay request. The frontend only ever sees whole snapshots.

pub mod error;
pub mod members;
pub mod room_list;
pub mod session;
pub mod spaces;
pub mod timeline;

mod wiring;

pub use error::{ClientError, Result};
pub use members::RoomMembers;
pub use room_list::RoomListService;
pub use session::Session;
pub use spaces::{SpaceChildren, SpaceService};
pub use timeline::RoomTimeline;
