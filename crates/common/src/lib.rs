//! Shared types and error definitions used across all parley crates.

pub mod error;
pub mod types;

pub use {
    error::{Error, FromMessage, Result},
    types::{ChatEvent, ChatType, UserKey},
};
