//! Error types for directory operations.

use thiserror::Error;

use crate::id::InvalidId;

/// Convenience alias for directory results.
pub type Result<T> = std::result::Result<T, DirectoryError>;

/// Errors surfaced by a [`Directory`](crate::Directory) implementation.
///
/// The variants are deliberately coarse: callers react to them by retrying,
/// resubscribing, or reporting, not by branching on transport detail. They
/// are `Clone` so a single failure can be handed to every waiter of a shared
/// load.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DirectoryError {
    /// The room is not known to this directory.
    #[error("unknown room: {0}")]
    UnknownRoom(String),

    /// The backend rejected or could not complete a request.
    #[error("backend request failed: {0}")]
    Backend(String),

    /// The connection to the backend is gone and will not recover on its own.
    #[error("directory disconnected: {0}")]
    Disconnected(String),

    /// An identifier from the backend did not parse.
    #[error(transparent)]
    BadId(#[from] InvalidId),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = DirectoryError::UnknownRoom("!gone:alcove.im".into());
        assert_eq!(err.to_string(), "unknown room: !gone:alcove.im");
    }

    #[test]
    fn test_invalid_id_converts() {
        use assert_matches::assert_matches;

        let parse_err = crate::RoomId::new("nope").unwrap_err();
        let err = DirectoryError::from(parse_err);
        assert_matches!(err, DirectoryError::BadId(_));
        assert_eq!(err.to_string(), "malformed room id: \"nope\"");
    }
}
