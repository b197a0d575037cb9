use std::{sync::Arc, time::Duration};

use {
    parley_config::{HistoryConfig, ParleyConfig, ProviderKind},
    tracing::info,
};

use crate::{
    ChatClient, Error, GeminiClient, OpenRouterClient, Result, history::ConversationHistory,
};

/// Build the adapter for the configured provider.
///
/// Fails when the provider name is unknown, its block is missing, its
/// credentials are blank, or its proxy does not validate. With `use_history`
/// the adapter remembers `history.max_messages` turns per user.
pub fn create_client(config: &ParleyConfig, use_history: bool) -> Result<Arc<dyn ChatClient>> {
    let kind = ProviderKind::from_name(&config.provider).ok_or_else(|| Error::UnknownProvider {
        name: config.provider.clone(),
    })?;
    if let Some(proxy) = config.providers.proxy_for(kind) {
        proxy.validate()?;
    }
    let history = use_history.then(|| history_for(&config.history));

    let client: Arc<dyn ChatClient> = match kind {
        ProviderKind::OpenRouter => {
            let block = config
                .providers
                .openrouter
                .as_ref()
                .ok_or(Error::NotConfigured { provider: kind })?;
            Arc::new(OpenRouterClient::new(block, history)?)
        },
        ProviderKind::Google => {
            let block = config
                .providers
                .google
                .as_ref()
                .ok_or(Error::NotConfigured { provider: kind })?;
            Arc::new(GeminiClient::new(block, history)?)
        },
    };
    info!(
        provider = %kind,
        model = client.model(),
        history = use_history,
        "chat client ready"
    );
    Ok(client)
}

fn history_for(config: &HistoryConfig) -> ConversationHistory {
    let history = ConversationHistory::new(config.max_messages);
    match config.idle_minutes {
        0 => history,
        minutes => history.with_idle_timeout(Duration::from_secs(minutes.saturating_mul(60))),
    }
}
