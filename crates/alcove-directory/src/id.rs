//! Identifier types for rooms, users, and events.
//!
//! Wire identifiers are sigil-prefixed strings (`!room:server`,
//! `@user:server`, `$event`). The newtypes validate the shape once at the
//! boundary so the rest of the stack can treat them as opaque keys.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A string did not parse as an identifier of the expected kind.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("malformed {kind} id: {value:?}")]
pub struct InvalidId {
    /// Which identifier kind was expected.
    pub kind: &'static str,
    /// The offending input.
    pub value: String,
}

impl InvalidId {
    fn new(kind: &'static str, value: impl Into<String>) -> Self {
        Self {
            kind,
            value: value.into(),
        }
    }
}

/// Room identifier (`!localpart:server`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub struct RoomId(String);

impl RoomId {
    /// Validate and wrap a room identifier.
    pub fn new(value: impl Into<String>) -> Result<Self, InvalidId> {
        let value = value.into();
        let rest = value.strip_prefix('!').unwrap_or("");
        if rest.is_empty() || !rest.contains(':') {
            return Err(InvalidId::new("room", value));
        }
        Ok(Self(value))
    }

    /// The identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for RoomId {
    type Err = InvalidId;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for RoomId {
    type Error = InvalidId;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<RoomId> for String {
    fn from(id: RoomId) -> Self {
        id.0
    }
}

/// User identifier (`@localpart:server`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub struct UserId(String);

impl UserId {
    /// Validate and wrap a user identifier.
    pub fn new(value: impl Into<String>) -> Result<Self, InvalidId> {
        let value = value.into();
        let rest = value.strip_prefix('@').unwrap_or("");
        if rest.is_empty() || !rest.contains(':') {
            return Err(InvalidId::new("user", value));
        }
        Ok(Self(value))
    }

    /// The identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The part between the sigil and the server name, used as a display
    /// fallback when no profile name is known.
    pub fn localpart(&self) -> &str {
        let rest = self.0.strip_prefix('@').unwrap_or(&self.0);
        rest.split(':').next().unwrap_or(rest)
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for UserId {
    type Err = InvalidId;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for UserId {
    type Error = InvalidId;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<UserId> for String {
    fn from(id: UserId) -> Self {
        id.0
    }
}

/// Event identifier (`$opaque`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub struct EventId(String);

impl EventId {
    /// Validate and wrap an event identifier.
    pub fn new(value: impl Into<String>) -> Result<Self, InvalidId> {
        let value = value.into();
        match value.strip_prefix('$') {
            Some(rest) if !rest.is_empty() => Ok(Self(value)),
            _ => Err(InvalidId::new("event", value)),
        }
    }

    /// The identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for EventId {
    type Err = InvalidId;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for EventId {
    type Error = InvalidId;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<EventId> for String {
    fn from(id: EventId) -> Self {
        id.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_room_id_accepts_sigil_and_server() {
        let id = RoomId::new("!lobby:alcove.im").unwrap();
        assert_eq!(id.as_str(), "!lobby:alcove.im");
        assert_eq!(id.to_string(), "!lobby:alcove.im");
    }

    #[test]
    fn test_room_id_rejects_wrong_shape() {
        assert!(RoomId::new("lobby:alcove.im").is_err());
        assert!(RoomId::new("!lobby").is_err());
        assert!(RoomId::new("!").is_err());
        assert!(RoomId::new("").is_err());
    }

    #[test]
    fn test_user_id_localpart() {
        let id = UserId::new("@ada:alcove.im").unwrap();
        assert_eq!(id.localpart(), "ada");
    }

    #[test]
    fn test_event_id_needs_only_sigil() {
        assert!(EventId::new("$deadbeef").is_ok());
        assert!(EventId::new("deadbeef").is_err());
        assert!(EventId::new("$").is_err());
    }

    #[test]
    fn test_from_str_roundtrip() {
        let id: RoomId = "!ops:alcove.im".parse().unwrap();
        assert_eq!(String::from(id), "!ops:alcove.im");
    }

    #[test]
    fn test_serde_is_transparent() {
        let id = UserId::new("@ada:alcove.im").unwrap();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"@ada:alcove.im\"");
        let back: UserId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn test_deserialize_rejects_malformed_ids() {
        assert!(serde_json::from_str::<UserId>("\"\"").is_err());
        assert!(serde_json::from_str::<UserId>("\"ada:alcove.im\"").is_err());
        assert!(serde_json::from_str::<RoomId>("\"lobby\"").is_err());
        assert!(serde_json::from_str::<EventId>("\"$\"").is_err());
        let id: UserId = serde_json::from_str("\"@ada:alcove.im\"").unwrap();
        assert_eq!(id.localpart(), "ada");
    }
}
