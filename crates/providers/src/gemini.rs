use std::sync::atomic::{AtomicUsize, Ordering};

use {
    async_trait::async_trait,
    parley_config::{FALLBACK_PROMPT, GoogleConfig, ProviderKind},
    reqwest::StatusCode,
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

/// Google Gemini `generateContent` adapter with API key rotation.
///
/// Each request starts at the next key in round-robin order. A key rejected
/// with 401/403/429 hands the request over to the following key until every
/// key has been tried once.
pub struct GeminiClient {
    api_keys: Vec<Secret<String>>,
    next_key: AtomicUsize,
    model: String,
    temperature: Option<f32>,
    max_tokens: Option<u32>,
    base_url: String,
    client: reqwest::Client,
    history: Option<ConversationHistory>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeneratePayload {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    text: Option<String>,
}

fn key_rejected(status: StatusCode) -> bool {
    matches!(
        status,
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN | StatusCode::TOO_MANY_REQUESTS
    )
}

impl GeminiClient {
    pub fn new(config: &GoogleConfig, history: Option<ConversationHistory>) -> Result<Self> {
        let api_keys: Vec<Secret<String>> = config
            .api_keys
            .iter()
            .filter(|key| !key.expose_secret().trim().is_empty())
            .cloned()
            .collect();
        if api_keys.is_empty() {
            return Err(Error::MissingCredentials {
                provider: ProviderKind::Google,
                field: "api_keys",
            });
        }
        Ok(Self {
            api_keys,
            next_key: AtomicUsize::new(0),
            model: config.model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            client: http_client(&config.proxy)?,
            history,
        })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        )
    }

    fn request_body(&self, prompt: &str, user: &str, system_prompt: &str) -> Value {
        let mut contents = Vec::new();
        if let Some(history) = &self.history {
            contents.extend(history.snapshot(user).into_iter().map(|turn| {
                let role = match turn.role {
                    Role::User => "user",
                    Role::Assistant => "model",
                };
                json!({ "role": role, "parts": [{ "text": turn.content }] })
            }));
        }
        contents.push(json!({ "role": "user", "parts": [{ "text": prompt }] }));

        let mut generation_config = serde_json::Map::new();
        if let Some(temperature) = self.temperature {
            generation_config.insert("temperature".into(), json!(temperature));
        }
        if let Some(max_tokens) = self.max_tokens {
            generation_config.insert("maxOutputTokens".into(), json!(max_tokens));
        }

        json!({
            "systemInstruction": { "parts": [{ "text": system_prompt }] },
            "contents": contents,
            "generationConfig": generation_config,
        })
    }
}

#[async_trait]
impl ChatClient for GeminiClient {
    fn provider(&self) -> ProviderKind {
        ProviderKind::Google
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
        let endpoint = self.endpoint();
        let key_count = self.api_keys.len();
        let start = self.next_key.fetch_add(1, Ordering::Relaxed);
        debug!(model = %self.model, user, "gemini chat request");

        let mut attempt = 0;
        let response = loop {
            let key_index = (start + attempt) % key_count;
            let response = self
                .client
                .post(&endpoint)
                .header("x-goog-api-key", self.api_keys[key_index].expose_secret())
                .json(&body)
                .send()
                .await?;

            let status = response.status();
            if status.is_success() {
                break response;
            }
            attempt += 1;
            if key_rejected(status) && attempt < key_count {
                warn!(status = %status, key_index, "gemini key rejected, trying next key");
                continue;
            }
            let body = response.text().await.unwrap_or_default();
            warn!(status = %status, model = %self.model, "gemini API error");
            return Err(Error::Api {
                provider: ProviderKind::Google,
                status: status.as_u16(),
                body,
            });
        };

        let payload: GeneratePayload = serde_json::from_str(&response.text().await?)?;
        let content = payload
            .candidates
            .into_iter()
            .next()
            .and_then(|candidate| candidate.content)
            .map(|content| {
                content
                    .parts
                    .into_iter()
                    .filter_map(|part| part.text)
                    .collect::<String>()
            })
            .and_then(non_empty);

        if let (Some(history), Some(reply)) = (&self.history, &content) {
            history.record(user, prompt, reply);
        }
        Ok(content)
    }
}
