//! List edit operations.
//!
//! A live list is mutated exclusively through [`ListEdit`] values delivered
//! in batches over a channel. The batch is the unit of atomic observation:
//! consumers see the list before a batch and after the whole batch, never in
//! between. Within a batch, every operation addresses the list as left by the
//! operations before it.

use serde::{Deserialize, Serialize};

/// A batch of edits delivered together over a diff channel.
pub type DiffBatch<T> = Vec<ListEdit<T>>;

/// A single positional edit against an ordered list.
///
/// Indices are zero-based and interpreted against the list state at the
/// moment the edit is applied, not against the state at batch start.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ListEdit<T> {
    /// Append values to the tail, preserving their order.
    Append {
        /// Values appended, in order.
        values: Vec<T>,
    },
    /// Remove all elements.
    Clear,
    /// Prepend a single value at the head.
    PushFront {
        /// The new head element.
        value: T,
    },
    /// Append a single value at the tail.
    PushBack {
        /// The new tail element.
        value: T,
    },
    /// Remove the head element. The list must be non-empty.
    PopFront,
    /// Remove the tail element. The list must be non-empty.
    PopBack,
    /// Insert a value at `index`, shifting later elements right.
    ///
    /// `index` may equal the current length, which appends.
    Insert {
        /// Position of the new element.
        index: usize,
        /// The inserted element.
        value: T,
    },
    /// Replace the value at `index`. The length is unchanged.
    Set {
        /// Position of the replaced element.
        index: usize,
        /// The replacement element.
        value: T,
    },
    /// Remove the value at `index`, shifting later elements left.
    Remove {
        /// Position of the removed element.
        index: usize,
    },
    /// Drop elements from the tail until `length` remain.
    ///
    /// `length` must not exceed the current length.
    Truncate {
        /// Number of elements kept.
        length: usize,
    },
    /// Discard the current contents and adopt `values` wholesale.
    Reset {
        /// The list's new contents.
        values: Vec<T>,
    },
}

impl<T> ListEdit<T> {
    /// The discriminant of this edit, for reporting and logging.
    pub fn kind(&self) -> EditKind {
        match self {
            Self::Append { .. } => EditKind::Append,
            Self::Clear => EditKind::Clear,
            Self::PushFront { .. } => EditKind::PushFront,
            Self::PushBack { .. } => EditKind::PushBack,
            Self::PopFront => EditKind::PopFront,
            Self::PopBack => EditKind::PopBack,
            Self::Insert { .. } => EditKind::Insert,
            Self::Set { .. } => EditKind::Set,
            Self::Remove { .. } => EditKind::Remove,
            Self::Truncate { .. } => EditKind::Truncate,
            Self::Reset { .. } => EditKind::Reset,
        }
    }

    /// Whether this edit replaces the list contents unconditionally.
    ///
    /// `Clear` and `Reset` have no precondition and always succeed; every
    /// other edit can be rejected by the list it targets.
    pub fn is_unconditional(&self) -> bool {
        matches!(self, Self::Clear | Self::Reset { .. })
    }
}

/// Edit discriminant without the payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EditKind {
    /// See [`ListEdit::Append`].
    Append,
    /// See [`ListEdit::Clear`].
    Clear,
    /// See [`ListEdit::PushFront`].
    PushFront,
    /// See [`ListEdit::PushBack`].
    PushBack,
    /// See [`ListEdit::PopFront`].
    PopFront,
    /// See [`ListEdit::PopBack`].
    PopBack,
    /// See [`ListEdit::Insert`].
    Insert,
    /// See [`ListEdit::Set`].
    Set,
    /// See [`ListEdit::Remove`].
    Remove,
    /// See [`ListEdit::Truncate`].
    Truncate,
    /// See [`ListEdit::Reset`].
    Reset,
}

impl std::fmt::Display for EditKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Append => "append",
            Self::Clear => "clear",
            Self::PushFront => "push_front",
            Self::PushBack => "push_back",
            Self::PopFront => "pop_front",
            Self::PopBack => "pop_back",
            Self::Insert => "insert",
            Self::Set => "set",
            Self::Remove => "remove",
            Self::Truncate => "truncate",
            Self::Reset => "reset",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_matches_variant() {
        let edits: Vec<ListEdit<u8>> = vec![
            ListEdit::Append { values: vec![1] },
            ListEdit::Clear,
            ListEdit::PushFront { value: 1 },
            ListEdit::PushBack { value: 2 },
            ListEdit::PopFront,
            ListEdit::PopBack,
            ListEdit::Insert { index: 0, value: 3 },
            ListEdit::Set { index: 0, value: 4 },
            ListEdit::Remove { index: 0 },
            ListEdit::Truncate { length: 0 },
            ListEdit::Reset { values: vec![] },
        ];
        let kinds: Vec<_> = edits.iter().map(ListEdit::kind).collect();
        assert_eq!(
            kinds,
            vec![
                EditKind::Append,
                EditKind::Clear,
                EditKind::PushFront,
                EditKind::PushBack,
                EditKind::PopFront,
                EditKind::PopBack,
                EditKind::Insert,
                EditKind::Set,
                EditKind::Remove,
                EditKind::Truncate,
                EditKind::Reset,
            ]
        );
    }

    #[test]
    fn test_unconditional_edits() {
        assert!(ListEdit::<u8>::Clear.is_unconditional());
        assert!(ListEdit::<u8>::Reset { values: vec![] }.is_unconditional());
        assert!(!ListEdit::<u8>::PopFront.is_unconditional());
        assert!(!ListEdit::Set { index: 0, value: 1u8 }.is_unconditional());
    }

    #[test]
    fn test_kind_display_names() {
        assert_eq!(EditKind::PushFront.to_string(), "push_front");
        assert_eq!(EditKind::Reset.to_string(), "reset");
    }

    #[test]
    fn test_serde_roundtrip() {
        let edit = ListEdit::Insert {
            index: 3,
            value: "hello".to_string(),
        };
        let json = serde_json::to_string(&edit).unwrap();
        let restored: ListEdit<String> = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, edit);
    }
}
