use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// In-game chat channel a message was posted to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatType {
    /// Local/public chat.
    Chat,
    /// Clan chat.
    Clan,
    /// Server-wide global chat.
    Global,
}

impl ChatType {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Chat => "chat",
            Self::Clan => "clan",
            Self::Global => "global",
        }
    }
}

impl fmt::Display for ChatType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChatType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "chat" => Ok(Self::Chat),
            "clan" => Ok(Self::Clan),
            "global" => Ok(Self::Global),
            other => Err(Error::unknown_chat_type(other)),
        }
    }
}

/// A chat message as delivered by the host transport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatEvent {
    pub username: String,
    pub message: String,
    pub chat_type: ChatType,
}

impl ChatEvent {
    pub fn new(username: impl Into<String>, message: impl Into<String>, chat_type: ChatType) -> Self {
        Self {
            username: username.into(),
            message: message.into(),
            chat_type,
        }
    }

    /// Canonical key of the message author.
    #[must_use]
    pub fn user_key(&self) -> UserKey {
        UserKey::new(&self.username)
    }
}

/// Lowercased username used to join cooldown, in-flight and mode state.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct UserKey(String);

impl UserKey {
    #[must_use]
    pub fn new(username: &str) -> Self {
        Self(username.to_lowercase())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Key under which the user's prompt mode is stored.
    #[must_use]
    pub fn mode_store_key(&self) -> String {
        format!("ai:mode:{}", self.0)
    }
}

impl fmt::Display for UserKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
