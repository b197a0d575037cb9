//! Stdin/stdout stand-in for a game server.
//!
//! Each input line is one chat event: `<chat_type> <username>: <message>`.
//! Outgoing messages are printed as `[chat_type] -> recipient: text`.

use std::{path::PathBuf, sync::Arc};

use {
    anyhow::{Context, Result, bail},
    async_trait::async_trait,
    parley_auto_reply::{Bridge, Host, Routed},
    parley_channels::{
        JsonFileModeStore, MemoryModeStore, MessageSink, ModeStore, StaticUserDirectory,
        TracingLogSink,
    },
    parley_common::{ChatEvent, ChatType},
    parley_config::{ConsoleConfig, ParleyConfig},
    tokio::{
        io::{AsyncBufReadExt, BufReader},
        task::JoinSet,
    },
    tracing::{debug, info, warn},
};

/// Prints outgoing chat messages to stdout.
struct StdoutSink;

#[async_trait]
impl MessageSink for StdoutSink {
    async fn send_message(
        &self,
        chat_type: ChatType,
        text: &str,
        recipient: &str,
    ) -> parley_channels::Result<()> {
        println!("{}", format_outgoing(chat_type, text, recipient));
        Ok(())
    }
}

fn format_outgoing(chat_type: ChatType, text: &str, recipient: &str) -> String {
    format!("[{chat_type}] -> {recipient}: {text}")
}

/// Parse one console line into a chat event.
pub fn parse_line(line: &str) -> Result<ChatEvent> {
    let line = line.trim();
    let Some((chat_type, rest)) = line.split_once(char::is_whitespace) else {
        bail!("expected `<chat_type> <username>: <message>`");
    };
    let chat_type: ChatType = chat_type.parse()?;
    let Some((username, message)) = rest.split_once(':') else {
        bail!("missing `:` after the username");
    };
    let username = username.trim();
    if username.is_empty() || username.contains(char::is_whitespace) {
        bail!("invalid username {username:?}");
    }
    Ok(ChatEvent::new(username, message.trim(), chat_type))
}

fn user_directory(console: &ConsoleConfig) -> StaticUserDirectory {
    let mut users = StaticUserDirectory::new()
        .with_default_permissions(console.default_permissions.clone());
    for (name, permissions) in &console.users {
        users.insert(name, permissions.clone());
    }
    users
}

async fn mode_store(path: Option<PathBuf>) -> Result<Arc<dyn ModeStore>> {
    let path = path.or_else(|| parley_config::config_dir().map(|dir| dir.join("modes.json")));
    match path {
        Some(path) => {
            let store = JsonFileModeStore::open(&path)
                .await
                .with_context(|| format!("failed to open mode store {}", path.display()))?;
            info!(path = %path.display(), "using file mode store");
            Ok(Arc::new(store))
        },
        None => {
            warn!("no config directory available, modes will not persist");
            Ok(Arc::new(MemoryModeStore::new()))
        },
    }
}

/// Run the console host until stdin closes or Ctrl-C.
pub async fn run(config: ParleyConfig, store: Option<PathBuf>) -> Result<()> {
    let host = Host {
        users: Arc::new(user_directory(&config.console)),
        messages: Arc::new(StdoutSink),
        modes: mode_store(store).await?,
        log: Arc::new(TracingLogSink),
        locator: None,
    };
    if config.nearby.enabled {
        warn!("nearby addressing needs entity positions, which the console host cannot provide");
    }

    let bridge = Arc::new(Bridge::load(&config, host).context("failed to load chat bridge")?);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut tasks = JoinSet::new();

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line.context("failed to read stdin")? else {
                    break;
                };
                if line.trim().is_empty() {
                    continue;
                }
                let event = match parse_line(&line) {
                    Ok(event) => event,
                    Err(e) => {
                        eprintln!("ignored line: {e}");
                        continue;
                    },
                };
                let bridge = Arc::clone(&bridge);
                tasks.spawn(async move {
                    let routed: Routed = bridge.handle(&event).await;
                    debug!(user = %event.username, chat_type = %event.chat_type, ?routed, "event handled");
                });
            },
            _ = tokio::signal::ctrl_c() => {
                info!("interrupted, shutting down");
                tasks.abort_all();
                return Ok(());
            },
            Some(_) = tasks.join_next(), if !tasks.is_empty() => {},
        }
    }

    while tasks.join_next().await.is_some() {}
    Ok(())
}
