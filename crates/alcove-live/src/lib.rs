//! # Alcove Live
//!
//! Diff-driven live list machinery for the Alcove client core.
//!
//! Remote services publish list changes as batches of positional edits.
//! This crate owns everything needed to turn those batches into observable
//! local state:
//!
//! - [`ListEdit`] / [`DiffBatch`]: the edit vocabulary
//! - [`LiveList`]: checked batch application with explicit failure policy
//! - [`LazySlot`]: memoized fetch-once data with load coalescing
//! - [`Paginator`]: the backfill guard state machine
//! - [`SubscriptionHandle`] / [`SubscriptionSet`]: listener task lifecycle
//! - [`Projection`]: one driver task per list, publishing [`Snapshot`]s
//!
//! # Design Principles
//!
//! 1. **Batch atomicity**: observers see whole batches, never partial ones
//! 2. **Single owner**: each list is owned by its driver task, no locks on
//!    the application path
//! 3. **Explicit failure**: precondition violations are typed errors, not
//!    panics, and the committed prefix of a failed batch stands
//! 4. **No hidden retries**: failed fetches and failed batches surface to
//!    the caller, who decides what happens next

pub mod edit;
pub mod error;
pub mod lazy;
pub mod list;
pub mod pagination;
pub mod projection;
pub mod subscription;

pub use edit::{DiffBatch, EditKind, ListEdit};
pub use error::{ApplyError, EditViolation};
pub use lazy::{LazySlot, LoadState};
pub use list::{ApplyPolicy, ApplyReport, LiveList};
pub use pagination::{PaginationStatus, Paginator};
pub use projection::{Projection, ProjectionConfig, ProjectionEvent, Snapshot};
pub use subscription::{SubscriptionHandle, SubscriptionSet};
