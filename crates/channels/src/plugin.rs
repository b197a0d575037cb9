use std::sync::Arc;

use {async_trait::async_trait, parley_common::ChatType, tracing::info};

use crate::Result;

/// A player known to the host, with its granted permissions.
pub trait ChatUser: Send + Sync {
    fn username(&self) -> &str;

    fn has_permission(&self, permission: &str) -> bool;
}

/// Resolves players by username.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Look a player up. `Ok(None)` means the player is unknown.
    async fn get_user(&self, username: &str) -> Result<Option<Arc<dyn ChatUser>>>;
}

/// Sends chat messages back into the game.
#[async_trait]
pub trait MessageSink: Send + Sync {
    /// Send `text` to `chat_type`, addressed to `recipient`.
    async fn send_message(&self, chat_type: ChatType, text: &str, recipient: &str) -> Result<()>;
}

/// Single-line operator log (the host's console or panel log).
pub trait LogSink: Send + Sync {
    fn log(&self, line: &str);
}

/// Forwards log lines to `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingLogSink;

impl LogSink for TracingLogSink {
    fn log(&self, line: &str) {
        info!(target: "parley::log", "{line}");
    }
}

/// Position and orientation of an entity in the world.
///
/// `yaw` is in radians; an entity with yaw `0` faces north (`-Z`) and yaw
/// grows counter-clockwise, so the facing vector on the X/Z plane is
/// `(-sin yaw, -cos yaw)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub yaw: f64,
}

/// Looks up where players and the bot currently are.
#[async_trait]
pub trait EntityLocator: Send + Sync {
    async fn pose_of(&self, username: &str) -> Option<Pose>;

    async fn bot_pose(&self) -> Option<Pose>;
}
