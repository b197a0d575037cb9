use std::sync::Arc;

use {
    parley_channels::{EntityLocator, LogSink, MessageSink, ModeStore, UserDirectory},
    parley_common::{ChatType, UserKey},
    tracing::warn,
};

use crate::{Result, prompt::DEFAULT_MODE};

/// Collaborators supplied by the game host.
#[derive(Clone)]
pub struct Host {
    pub users: Arc<dyn UserDirectory>,
    pub messages: Arc<dyn MessageSink>,
    pub modes: Arc<dyn ModeStore>,
    pub log: Arc<dyn LogSink>,
    /// Needed only for proximity addressing.
    pub locator: Option<Arc<dyn EntityLocator>>,
}

impl Host {
    /// Send a chat message; delivery failures are logged and dropped.
    pub async fn notify(&self, chat_type: ChatType, text: &str, recipient: &str) {
        if let Err(e) = self.messages.send_message(chat_type, text, recipient).await {
            warn!(
                error = %e,
                chat_type = %chat_type,
                user = recipient,
                "failed to deliver chat message"
            );
        }
    }

    /// Stored mode of `key`, `default` when unset or blank.
    pub async fn mode_of(&self, key: &UserKey) -> Result<String> {
        Ok(self
            .modes
            .get(&key.mode_store_key())
            .await?
            .filter(|mode| !mode.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_MODE.to_string()))
    }
}
