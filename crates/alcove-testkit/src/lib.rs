//! # Alcove Testkit
//!
//! Scripted fixtures for exercising the live sync stack without a real
//! directory. The centrepiece is [`ScriptedDirectory`]: an in-memory
//! [`Directory`](alcove_directory::Directory) that does nothing until the
//! test pushes batches, signals, or scripted pages into it, and records
//! every request the code under test makes.
//!
//! Add it to a crate's `Cargo.toml` dev-dependencies:
//!
//! ```toml
//! [dev-dependencies]
//! alcove-testkit = { path = "../alcove-testkit" }
//! ```

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

pub mod directory;
pub mod fixtures;

pub use directory::{ScriptedDirectory, ScriptedList, ScriptedRoomList};
