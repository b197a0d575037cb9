//! Load-time wiring and per-event routing.

use std::sync::Arc;

use {
    parley_common::{ChatEvent, UserKey},
    parley_config::{ParleyConfig, ProviderKind, Severity, validate::validate},
    parley_providers::{ChatClient, create_client},
    tracing::{error, info, warn},
};

use crate::{
    Result,
    commands::parse_command,
    gate::{Dispatch, DispatchGate, GateSettings},
    host::Host,
    mode_command::{ModeCommand, ModeOutcome},
    prompt::PromptTable,
};

/// Where an event ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Routed {
    Command(ModeOutcome),
    /// The mode command hit a store error; an apology was sent.
    CommandFailed,
    Dispatch(Dispatch),
}

/// The assembled chat bridge: mode command plus dispatch gate.
pub struct Bridge {
    gate: DispatchGate,
    command: ModeCommand,
    command_prefix: String,
    host: Host,
}

impl Bridge {
    /// Build the provider client from `config` and assemble the bridge.
    ///
    /// Configuration problems (unknown or unconfigured provider, missing
    /// credentials, invalid proxy) are returned as errors.
    pub fn load(config: &ParleyConfig, host: Host) -> Result<Self> {
        let report = validate(config);
        for diagnostic in &report.diagnostics {
            match diagnostic.severity {
                Severity::Error => error!(path = %diagnostic.path, "{}", diagnostic.message),
                Severity::Warning => warn!(path = %diagnostic.path, "{}", diagnostic.message),
            }
        }

        let client = create_client(config, config.history.enabled)?;
        Ok(Self::with_client(config, client, host))
    }

    /// Assemble the bridge around an existing client.
    pub fn with_client(config: &ParleyConfig, client: Arc<dyn ChatClient>, host: Host) -> Self {
        let prompts = Arc::new(PromptTable::new(
            config.prompts.clone(),
            config.chat.timezone,
        ));
        let provider = client.provider();
        let gate = DispatchGate::new(
            GateSettings::from_config(config),
            prompts.clone(),
            client,
            host.clone(),
        );
        let command = ModeCommand::new(prompts, config.messages.clone(), host.clone());

        let summary = load_summary(config, provider);
        info!(
            provider = %provider,
            triggers = ?gate.settings().triggers.words(),
            modes = config.prompts.len(),
            "chat bridge loaded"
        );
        host.log.log(&summary);

        Self {
            gate,
            command,
            command_prefix: config.bot.command_prefix.clone(),
            host,
        }
    }

    /// Route one chat event to the mode command or the dispatch gate.
    pub async fn handle(&self, event: &ChatEvent) -> Routed {
        let settings = self.gate.settings();
        let invocation = parse_command(&self.command_prefix, &event.message)
            .filter(|c| ModeCommand::matches(&c.name));
        let Some(invocation) = invocation else {
            return Routed::Dispatch(self.gate.handle(event).await);
        };

        if event.user_key() == UserKey::new(&settings.bot_username)
            || !settings.allowed_chat_types.contains(&event.chat_type)
        {
            return Routed::Dispatch(Dispatch::Ignored);
        }

        match self
            .command
            .execute(&event.username, event.chat_type, &invocation.args)
            .await
        {
            Ok(outcome) => Routed::Command(outcome),
            Err(e) => {
                error!(user = %event.username, error = %e, "mode command failed");
                self.host
                    .log
                    .log(&format!("[parley] mode command failed for {}: {e}", event.username));
                self.host
                    .notify(event.chat_type, &settings.messages.error, &event.username)
                    .await;
                Routed::CommandFailed
            },
        }
    }
}

/// One-line load report for the host log, with proxy credentials masked.
fn load_summary(config: &ParleyConfig, provider: ProviderKind) -> String {
    let mut summary = format!(
        "[parley] loaded. provider: {provider}. triggers: {}",
        config.chat.trigger_words.join(", ")
    );
    if let Some(proxy) = config.providers.proxy_for(provider).filter(|p| p.enabled) {
        match proxy.validate() {
            Ok(()) => summary.push_str(&format!(". proxy: {}", proxy.format_proxy_info())),
            Err(e) => summary.push_str(&format!(". proxy error: {e}")),
        }
    }
    summary
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {
        parley_channels::{ModeStore, StaticUserDirectory},
        parley_common::ChatType,
        parley_config::{GoogleConfig, OpenRouterConfig, ProxyConfig, ProxyPort},
    };

    use {
        super::*,
        crate::testing::{FakeClient, harness},
    };

    fn config() -> ParleyConfig {
        let mut config = ParleyConfig::default();
        config.chat.trigger_words = vec!["ai".into()];
        config
    }

    fn users() -> StaticUserDirectory {
        StaticUserDirectory::new()
            .with_user("Steve", &["user.ai"])
            .with_user("Admin", &["user.ai", "admin.gpt"])
    }

    #[tokio::test]
    async fn routes_commands_and_chat() {
        let h = harness(users());
        let mut config = config();
        config
            .prompts
            .insert("pirate".to_string(), "Arr".to_string());
        let client = Arc::new(FakeClient::default());
        let bridge = Bridge::with_client(&config, client.clone(), h.host.clone());

        let routed = bridge
            .handle(&ChatEvent::new("Steve", "!mode pirate", ChatType::Chat))
            .await;
        assert!(matches!(routed, Routed::Command(ModeOutcome::Changed { .. })));
        assert_eq!(
            h.store.get("ai:mode:steve").await.unwrap().as_deref(),
            Some("pirate")
        );

        let routed = bridge
            .handle(&ChatEvent::new("Steve", "ai hello", ChatType::Chat))
            .await;
        assert!(matches!(routed, Routed::Dispatch(Dispatch::Replied { .. })));
        assert_eq!(client.calls()[0].system_prompt.as_deref(), Some("Arr"));
    }

    #[tokio::test]
    async fn unknown_commands_fall_through_to_gate() {
        let h = harness(users());
        let bridge = Bridge::with_client(&config(), Arc::new(FakeClient::default()), h.host.clone());
        let routed = bridge
            .handle(&ChatEvent::new("Steve", "!help", ChatType::Chat))
            .await;
        assert_eq!(routed, Routed::Dispatch(Dispatch::Ignored));
    }

    #[tokio::test]
    async fn commands_respect_allowed_chat_types() {
        let h = harness(users());
        let bridge = Bridge::with_client(&config(), Arc::new(FakeClient::default()), h.host.clone());
        let routed = bridge
            .handle(&ChatEvent::new("Steve", "!gptmode", ChatType::Global))
            .await;
        assert_eq!(routed, Routed::Dispatch(Dispatch::Ignored));
        assert!(h.sink.sent().is_empty());
    }

    #[test]
    fn logs_load_summary_with_masked_proxy() {
        let h = harness(users());
        let mut config = config();
        config.providers.openrouter = Some(OpenRouterConfig {
            proxy: ProxyConfig {
                enabled: true,
                host: Some("10.0.0.1".into()),
                port: Some(ProxyPort::Number(1080)),
                user: Some("bob".into()),
                pass: None,
            },
            ..Default::default()
        });
        Bridge::with_client(&config, Arc::new(FakeClient::default()), h.host.clone());
        assert_eq!(h.log.lines(), vec![
            "[parley] loaded. provider: openrouter. triggers: ai. proxy: bob:***@10.0.0.1:1080"
                .to_string()
        ]);
    }

    #[test]
    fn load_fails_on_configuration_errors() {
        let h = harness(users());
        let mut config = config();
        config.provider = "google".into();
        config.providers.google = Some(GoogleConfig::default());
        let err = Bridge::load(&config, h.host.clone()).err().unwrap();
        assert_eq!(err.to_string(), "google: `api_keys` is not set");
    }
}
