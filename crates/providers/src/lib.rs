//! Chat-completion adapters for the supported upstream APIs.
//!
//! Every adapter sits behind [`ChatClient`]; [`create_client`] picks one from
//! configuration.

pub mod error;
pub mod factory;
pub mod gemini;
pub mod history;
pub mod openrouter;

use {async_trait::async_trait, parley_config::ProviderKind};

pub use {
    error::{Error, Result},
    factory::create_client,
    gemini::GeminiClient,
    history::{ConversationHistory, Role, Turn},
    openrouter::OpenRouterClient,
};

/// A single-turn chat interface over one upstream provider.
#[async_trait]
pub trait ChatClient: Send + Sync {
    fn provider(&self) -> ProviderKind;

    fn model(&self) -> &str;

    /// Ask the model. `system_prompt` falls back to the built-in prompt.
    ///
    /// `Ok(None)` means the provider answered without any text content.
    async fn chat(
        &self,
        prompt: &str,
        user: &str,
        system_prompt: Option<&str>,
    ) -> Result<Option<String>>;
}

/// Build the HTTP client, routed through the proxy when one is enabled.
pub(crate) fn http_client(proxy: &parley_config::ProxyConfig) -> Result<reqwest::Client> {
    let mut builder = reqwest::Client::builder();
    if let Some(connection) = proxy.to_connection()? {
        tracing::debug!(proxy = %proxy.format_proxy_info(), "routing provider through proxy");
        builder = builder.proxy(connection.to_reqwest()?);
    }
    Ok(builder.build()?)
}

/// Trimmed text, or `None` when nothing but whitespace is left.
pub(crate) fn non_empty(text: String) -> Option<String> {
    if text.trim().is_empty() {
        None
    } else {
        Some(text)
    }
}
