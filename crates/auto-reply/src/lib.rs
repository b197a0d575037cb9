//! Inbound chat processing: the glue between the game host and the model.
//!
//! Flow: chat event → command prefix? → `gptmode` command. Otherwise →
//! dispatch gate (trigger/proximity match, permission, in-flight and cooldown
//! checks) → stored mode → rendered system prompt → chat client → sanitize and
//! truncate → reply into the same chat.

pub mod bridge;
pub mod commands;
pub mod error;
pub mod gate;
pub mod host;
pub mod mode_command;
pub mod nearby;
pub mod prompt;
pub mod sanitize;
pub mod trigger;

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod testing;

pub use {
    bridge::{Bridge, Routed},
    error::{Error, Result},
    gate::{Dispatch, DispatchGate, GateSettings},
    host::Host,
    mode_command::{ModeCommand, ModeOutcome},
    prompt::PromptTable,
    sanitize::{clear_bad_symbols, truncate_reply},
};
