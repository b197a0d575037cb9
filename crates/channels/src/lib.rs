//! Host collaborator contracts.
//!
//! The bridge never talks to the game server directly. The host provides a
//! user directory, a message sink, a mode store, a log sink and (optionally)
//! an entity locator; this crate defines those traits together with the
//! in-memory and file-backed implementations used by the console host and
//! the tests.

pub mod directory;
pub mod error;
pub mod gating;
pub mod permissions;
pub mod plugin;
pub mod store;

pub use {
    directory::{StaticUser, StaticUserDirectory},
    error::{Error, Result},
    plugin::{ChatUser, EntityLocator, LogSink, MessageSink, Pose, TracingLogSink, UserDirectory},
    store::{JsonFileModeStore, MemoryModeStore, ModeStore},
};
