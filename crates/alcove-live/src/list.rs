//! # Live List
//!
//! An ordered collection driven entirely by [`ListEdit`] batches.
//!
//! [`LiveList`] owns a `Vec<T>` and replays edit batches against it with
//! checked preconditions:
//! - Every edit is validated against the list as left by the previous edit
//! - A rejected edit never corrupts the list, the committed prefix stands
//! - The failure policy is explicit: halt the batch or skip the bad edit
//!
//! The list itself is single-owner and synchronous. Concurrent observation
//! is layered on top by [`Projection`](crate::projection::Projection), which
//! owns a `LiveList` inside its driver task.

use serde::{Deserialize, Serialize};

use crate::edit::{DiffBatch, ListEdit};
use crate::error::{ApplyError, EditViolation};

/// What to do when an edit in a batch fails its precondition.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ApplyPolicy {
    /// Stop the batch at the rejected edit and surface an [`ApplyError`].
    ///
    /// Edits already applied stay committed. This is the default: a rejected
    /// edit means producer and consumer disagree, and continuing would
    /// compound the divergence silently.
    #[default]
    Halt,
    /// Skip the rejected edit, log it, and continue with the rest.
    Skip,
}

/// Outcome of a batch application that ran to the end of the batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ApplyReport {
    /// Edits applied.
    pub applied: usize,
    /// Edits skipped under [`ApplyPolicy::Skip`]. Always zero under `Halt`.
    pub skipped: usize,
    /// Whether a `Reset` was among the applied edits.
    pub reset_applied: bool,
}

/// An ordered collection mutated through edit batches.
#[derive(Debug, Clone)]
pub struct LiveList<T> {
    items: Vec<T>,
    policy: ApplyPolicy,
}

impl<T> Default for LiveList<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> LiveList<T> {
    /// Create an empty list with the default halt-on-rejection policy.
    pub fn new() -> Self {
        Self {
            items: Vec::new(),
            policy: ApplyPolicy::default(),
        }
    }

    /// Create an empty list with an explicit failure policy.
    pub fn with_policy(policy: ApplyPolicy) -> Self {
        Self {
            items: Vec::new(),
            policy,
        }
    }

    /// Create a list seeded with initial items.
    pub fn from_items(items: Vec<T>) -> Self {
        Self {
            items,
            policy: ApplyPolicy::default(),
        }
    }

    /// The failure policy this list applies batches under.
    pub fn policy(&self) -> ApplyPolicy {
        self.policy
    }

    // ─── Queries ─────────────────────────────────────────────

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the list holds no elements.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Element at `index`, if present.
    pub fn get(&self, index: usize) -> Option<&T> {
        self.items.get(index)
    }

    /// First element, if any.
    pub fn first(&self) -> Option<&T> {
        self.items.first()
    }

    /// Last element, if any.
    pub fn last(&self) -> Option<&T> {
        self.items.last()
    }

    /// Iterate the elements in order.
    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }

    /// The elements as a slice.
    pub fn as_slice(&self) -> &[T] {
        &self.items
    }

    /// Consume the list, returning its elements.
    pub fn into_items(self) -> Vec<T> {
        self.items
    }

    // ─── Batch application ───────────────────────────────────

    /// Apply a batch of edits in order.
    ///
    /// Each edit addresses the list as left by the edits before it. Under
    /// [`ApplyPolicy::Halt`] the first rejected edit stops the batch and is
    /// returned as an [`ApplyError`]; the prefix already applied stays
    /// committed. Under [`ApplyPolicy::Skip`] rejected edits are logged and
    /// dropped, and the report counts them.
    pub fn apply(&mut self, batch: DiffBatch<T>) -> Result<ApplyReport, ApplyError> {
        let batch_len = batch.len();
        let mut report = ApplyReport::default();

        for edit in batch {
            let kind = edit.kind();
            match self.apply_one(edit) {
                Ok(was_reset) => {
                    report.applied += 1;
                    report.reset_applied |= was_reset;
                }
                Err(violation) => match self.policy {
                    ApplyPolicy::Halt => {
                        return Err(ApplyError {
                            kind,
                            violation,
                            applied: report.applied,
                            batch_len,
                            reset_applied: report.reset_applied,
                        });
                    }
                    ApplyPolicy::Skip => {
                        tracing::warn!(%kind, %violation, "skipping rejected edit");
                        report.skipped += 1;
                    }
                },
            }
        }

        Ok(report)
    }

    /// Apply one edit. Returns whether it was a `Reset`.
    fn apply_one(&mut self, edit: ListEdit<T>) -> Result<bool, EditViolation> {
        let len = self.items.len();
        match edit {
            ListEdit::Append { values } => {
                self.items.extend(values);
            }
            ListEdit::Clear => {
                self.items.clear();
            }
            ListEdit::PushFront { value } => {
                self.items.insert(0, value);
            }
            ListEdit::PushBack { value } => {
                self.items.push(value);
            }
            ListEdit::PopFront => {
                if self.items.is_empty() {
                    return Err(EditViolation::PopOnEmpty);
                }
                self.items.remove(0);
            }
            ListEdit::PopBack => {
                if self.items.pop().is_none() {
                    return Err(EditViolation::PopOnEmpty);
                }
            }
            ListEdit::Insert { index, value } => {
                // Inserting at the current length appends.
                if index > len {
                    return Err(EditViolation::IndexOutOfBounds { index, len });
                }
                self.items.insert(index, value);
            }
            ListEdit::Set { index, value } => match self.items.get_mut(index) {
                Some(slot) => *slot = value,
                None => return Err(EditViolation::IndexOutOfBounds { index, len }),
            },
            ListEdit::Remove { index } => {
                if index >= len {
                    return Err(EditViolation::IndexOutOfBounds { index, len });
                }
                self.items.remove(index);
            }
            ListEdit::Truncate { length } => {
                if length > len {
                    return Err(EditViolation::TruncateBeyondLength { target: length, len });
                }
                self.items.truncate(length);
            }
            ListEdit::Reset { values } => {
                self.items = values;
                return Ok(true);
            }
        }
        Ok(false)
    }
}

impl<T: Clone> LiveList<T> {
    /// Copy the elements out in order.
    pub fn to_vec(&self) -> Vec<T> {
        self.items.clone()
    }
}

impl<'a, T> IntoIterator for &'a LiveList<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

// ─── Tests ───────────────────────────────────────────────────
