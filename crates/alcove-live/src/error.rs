//! Errors raised while applying edit batches.

use thiserror::Error;

use crate::edit::EditKind;

/// Why a single edit was rejected by the list it targeted.
///
/// A violation means the upstream producer and this list disagree about the
/// list contents. It is a protocol fault to report, not a condition to retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum EditViolation {
    /// The edit addressed an index the list does not have.
    #[error("index {index} out of bounds for length {len}")]
    IndexOutOfBounds {
        /// Index the edit addressed.
        index: usize,
        /// List length at the moment of application.
        len: usize,
    },

    /// A pop was applied to an empty list.
    #[error("pop on an empty list")]
    PopOnEmpty,

    /// A truncate asked for more elements than the list holds.
    #[error("truncate to {target} exceeds length {len}")]
    TruncateBeyondLength {
        /// Requested post-truncate length.
        target: usize,
        /// List length at the moment of application.
        len: usize,
    },
}

/// A batch application stopped at a rejected edit.
///
/// Edits before the offending one stay applied; the list is left at the
/// state they produced. The fields locate the rejection within the batch so
/// callers can log it and decide how to resynchronize.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind} rejected after {applied} of {batch_len} edits: {violation}")]
pub struct ApplyError {
    /// Discriminant of the rejected edit.
    pub kind: EditKind,
    /// The precondition that failed.
    pub violation: EditViolation,
    /// Edits applied before the rejection.
    pub applied: usize,
    /// Total edits in the batch.
    pub batch_len: usize,
    /// Whether a `Reset` landed among the applied prefix.
    pub reset_applied: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_error_display() {
        let err = ApplyError {
            kind: EditKind::Remove,
            violation: EditViolation::IndexOutOfBounds { index: 9, len: 3 },
            applied: 2,
            batch_len: 5,
            reset_applied: false,
        };
        assert_eq!(
            err.to_string(),
            "remove rejected after 2 of 5 edits: index 9 out of bounds for length 3"
        );
    }

    #[test]
    fn test_violation_display() {
        assert_eq!(
            EditViolation::PopOnEmpty.to_string(),
            "pop on an empty list"
        );
        assert_eq!(
            EditViolation::TruncateBeyondLength { target: 8, len: 2 }.to_string(),
            "truncate to 8 exceeds length 2"
        );
    }
}
