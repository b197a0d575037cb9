//! In-memory collaborators shared by the unit tests of this crate.

use std::{
    collections::{HashMap, VecDeque},
    sync::{Arc, Mutex},
};

use {
    async_trait::async_trait,
    parley_channels::{
        EntityLocator, LogSink, MemoryModeStore, MessageSink, ModeStore, Pose, StaticUserDirectory,
    },
    parley_common::ChatType,
    parley_config::ProviderKind,
    parley_providers::ChatClient,
    tokio::sync::Notify,
};

use crate::host::Host;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sent {
    pub chat_type: ChatType,
    pub text: String,
    pub recipient: String,
}

#[derive(Default)]
pub struct RecordingSink {
    sent: Mutex<Vec<Sent>>,
}

impl RecordingSink {
    pub fn sent(&self) -> Vec<Sent> {
        self.sent.lock().unwrap().clone()
    }

    pub fn texts(&self) -> Vec<String> {
        self.sent().into_iter().map(|s| s.text).collect()
    }
}

#[async_trait]
impl MessageSink for RecordingSink {
    async fn send_message(
        &self,
        chat_type: ChatType,
        text: &str,
        recipient: &str,
    ) -> parley_channels::Result<()> {
        self.sent.lock().unwrap().push(Sent {
            chat_type,
            text: text.to_string(),
            recipient: recipient.to_string(),
        });
        Ok(())
    }
}

#[derive(Default)]
pub struct RecordingLog {
    lines: Mutex<Vec<String>>,
}

impl RecordingLog {
    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().unwrap().clone()
    }
}

impl LogSink for RecordingLog {
    fn log(&self, line: &str) {
        self.lines.lock().unwrap().push(line.to_string());
    }
}

/// Mode store whose every operation fails.
pub struct BrokenStore;

#[async_trait]
impl ModeStore for BrokenStore {
    async fn get(&self, _key: &str) -> parley_channels::Result<Option<String>> {
        Err(parley_channels::Error::unavailable("store offline"))
    }

    async fn set(&self, _key: &str, _value: &str) -> parley_channels::Result<()> {
        Err(parley_channels::Error::unavailable("store offline"))
    }
}

#[derive(Default)]
pub struct FixedLocator {
    pub players: HashMap<String, Pose>,
    pub bot: Option<Pose>,
}

#[async_trait]
impl EntityLocator for FixedLocator {
    async fn pose_of(&self, username: &str) -> Option<Pose> {
        self.players.get(username).copied()
    }

    async fn bot_pose(&self) -> Option<Pose> {
        self.bot
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientCall {
    pub prompt: String,
    pub user: String,
    pub system_prompt: Option<String>,
}

/// Scripted chat client. Replies are served in order, then `"Hello!"`.
/// When held, each call signals `started` and waits for `release`.
#[derive(Default)]
pub struct FakeClient {
    replies: Mutex<VecDeque<parley_providers::Result<Option<String>>>>,
    calls: Mutex<Vec<ClientCall>>,
    held: bool,
    pub started: Notify,
    pub release: Notify,
}

impl FakeClient {
    pub fn held() -> Self {
        Self {
            held: true,
            ..Default::default()
        }
    }

    pub fn push_reply(&self, reply: parley_providers::Result<Option<String>>) {
        self.replies.lock().unwrap().push_back(reply);
    }

    pub fn calls(&self) -> Vec<ClientCall> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatClient for FakeClient {
    fn provider(&self) -> ProviderKind {
        ProviderKind::OpenRouter
    }

    fn model(&self) -> &str {
        "fake-model"
    }

    async fn chat(
        &self,
        prompt: &str,
        user: &str,
        system_prompt: Option<&str>,
    ) -> parley_providers::Result<Option<String>> {
        self.calls.lock().unwrap().push(ClientCall {
            prompt: prompt.to_string(),
            user: user.to_string(),
            system_prompt: system_prompt.map(str::to_string),
        });
        if self.held {
            self.started.notify_one();
            self.release.notified().await;
        }
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(Some("Hello!".to_string())))
    }
}

pub struct Harness {
    pub host: Host,
    pub sink: Arc<RecordingSink>,
    pub log: Arc<RecordingLog>,
    pub store: Arc<MemoryModeStore>,
}

pub fn harness(users: StaticUserDirectory) -> Harness {
    let sink = Arc::new(RecordingSink::default());
    let log = Arc::new(RecordingLog::default());
    let store = Arc::new(MemoryModeStore::new());
    let host = Host {
        users: Arc::new(users),
        messages: sink.clone(),
        modes: store.clone(),
        log: log.clone(),
        locator: None,
    };
    Harness {
        host,
        sink,
        log,
        store,
    }
}
