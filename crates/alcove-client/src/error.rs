//! Error types for the client composition layer.

use thiserror::Error;

use alcove_directory::{DirectoryError, RoomId};

/// Convenience alias for client results.
pub type Result<T> = std::result::Result<T, ClientError>;

/// Errors surfaced by the session and its services.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientError {
    /// A space was addressed that the space graph does not hold.
    #[error("unknown space: {0}")]
    UnknownSpace(RoomId),

    /// The directory failed or rejected a request.
    #[error(transparent)]
    Directory(#[from] DirectoryError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_directory_errors_convert() {
        let err: ClientError = DirectoryError::Backend("boom".into()).into();
        assert_eq!(err.to_string(), "backend request failed: boom");
    }

    #[test]
    fn test_unknown_space_names_the_room() {
        let id = RoomId::new("!void:alcove.im").unwrap();
        let err = ClientError::UnknownSpace(id);
        assert_eq!(err.to_string(), "unknown space: !void:alcove.im");
    }
}
