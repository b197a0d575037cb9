use {
    async_trait::async_trait,
    parley_config::{FALLBACK_PROMPT, OpenRouterConfig, ProviderKind},
    secrecy::{ExposeSecret, Secret},
    serde::Deserialize,
    serde_json::{Value, json},
    tracing::{debug, warn},
};

use crate::{
    ChatClient, Error, Result,
    history::{ConversationHistory, Role},
    http_client, non_empty,
};

/// OpenAI-style `chat/completions` adapter for OpenRouter.
pub struct OpenRouterClient {
    api_key: Secret<String>,
    model: String,
    temperature: Option<f32>,
    max_tokens: Option<u32>,
    base_url: String,
    client: reqwest::Client,
    history: Option<ConversationHistory>,
}

#[derive(Debug, Deserialize)]
struct CompletionPayload {
    #[serde(default)]
    choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    message: Option<CompletionMessage>,
}

#[derive(Debug, Deserialize)]
struct CompletionMessage {
    content: Option<String>,
}

impl OpenRouterClient {
    pub fn new(config: &OpenRouterConfig, history: Option<ConversationHistory>) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .filter(|key| !key.expose_secret().trim().is_empty())
            .ok_or(Error::MissingCredentials {
                provider: ProviderKind::OpenRouter,
                field: "api_key",
            })?;
        Ok(Self {
            api_key,
            model: config.model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            client: http_client(&config.proxy)?,
            history,
        })
    }

    fn request_body(&self, prompt: &str, user: &str, system_prompt: &str) -> Value {
        let mut messages = vec![json!({ "role": "system", "content": system_prompt })];
        if let Some(history) = &self.history {
            messages.extend(history.snapshot(user).into_iter().map(|turn| {
                let role = match turn.role {
                    Role::User => "user",
                    Role::Assistant => "assistant",
                };
                json!({ "role": role, "content": turn.content })
            }));
        }
        messages.push(json!({ "role": "user", "content": prompt }));

        let mut body = json!({
            "model": self.model,
            "messages": messages,
            "user": user,
        });
        if let Some(temperature) = self.temperature {
            body["temperature"] = json!(temperature);
        }
        if let Some(max_tokens) = self.max_tokens {
            body["max_tokens"] = json!(max_tokens);
        }
        body
    }
}

#[async_trait]
impl ChatClient for OpenRouterClient {
    fn provider(&self) -> ProviderKind {
        ProviderKind::OpenRouter
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn chat(
        &self,
        prompt: &str,
        user: &str,
        system_prompt: Option<&str>,
    ) -> Result<Option<String>> {
        let body = self.request_body(prompt, user, system_prompt.unwrap_or(FALLBACK_PROMPT));
        debug!(model = %self.model, user, "openrouter chat request");

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .header(
                "Authorization",
                format!("Bearer {}", self.api_key.expose_secret()),
            )
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = %status, model = %self.model, "openrouter API error");
            return Err(Error::Api {
                provider: ProviderKind::OpenRouter,
                status: status.as_u16(),
                body,
            });
        }

        let payload: CompletionPayload = serde_json::from_str(&response.text().await?)?;
        let content = payload
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message)
            .and_then(|message| message.content)
            .and_then(non_empty);

        if let (Some(history), Some(reply)) = (&self.history, &content) {
            history.record(user, prompt, reply);
        }
        Ok(content)
    }
}
