//! Config schema types (bot, chat gate, prompts, providers, proxy, nearby).
use std::{collections::BTreeMap, fmt};

use {
    parley_common::ChatType,
    secrecy::Secret,
    serde::{Deserialize, Serialize},
};

/// System prompt used when neither the requested mode nor `default` exists.
pub const FALLBACK_PROMPT: &str =
    "You are a helpful AI bot in a Minecraft game. Keep your answers short and friendly.";

/// Root configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ParleyConfig {
    pub bot: BotConfig,
    pub chat: ChatConfig,
    pub messages: MessagesConfig,
    /// Mode name → system prompt template.
    pub prompts: BTreeMap<String, String>,
    /// Selected provider name (`openrouter` or `google`).
    pub provider: String,
    pub providers: ProvidersConfig,
    pub history: HistoryConfig,
    pub nearby: NearbyConfig,
    pub console: ConsoleConfig,
}

impl Default for ParleyConfig {
    fn default() -> Self {
        Self {
            bot: BotConfig::default(),
            chat: ChatConfig::default(),
            messages: MessagesConfig::default(),
            prompts: BTreeMap::from([("default".to_string(), FALLBACK_PROMPT.to_string())]),
            provider: ProviderKind::OpenRouter.name().to_string(),
            providers: ProvidersConfig::default(),
            history: HistoryConfig::default(),
            nearby: NearbyConfig::default(),
            console: ConsoleConfig::default(),
        }
    }
}

/// Identity of the bot account on the game server.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BotConfig {
    /// In-game username of the bot. Its own messages are ignored.
    pub username: String,
    /// Prefix that marks chat commands such as `!gptmode`.
    pub command_prefix: String,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            username: "ParleyBot".into(),
            command_prefix: "!".into(),
        }
    }
}

/// Dispatch gate settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatConfig {
    /// Prefixes that address the bot. Matched case-insensitively, first wins.
    pub trigger_words: Vec<String>,
    pub allowed_chat_types: Vec<ChatType>,
    /// Minimum seconds between two AI calls of the same user.
    pub cooldown_secs: u64,
    /// Stamp the cooldown after failed calls as well.
    pub cooldown_on_failure: bool,
    /// Strip emoji and CJK glyphs from model output.
    pub sanitize_output: bool,
    /// Replies longer than this are cut and end with `...`.
    pub max_reply_chars: usize,
    /// IANA timezone for `{time}`/`{date}` placeholders. Server local time when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timezone: Option<chrono_tz::Tz>,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            trigger_words: vec!["ai".into(), "bot".into()],
            allowed_chat_types: vec![ChatType::Clan, ChatType::Chat],
            cooldown_secs: 10,
            cooldown_on_failure: true,
            sanitize_output: true,
            max_reply_chars: 250,
            timezone: None,
        }
    }
}

/// User-facing notice templates.
///
/// `&a`/`&c`/`&e` are game color codes and are passed through untouched.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MessagesConfig {
    pub thinking: String,
    /// `{timeLeft}` is replaced by the remaining whole seconds.
    pub cooldown: String,
    pub no_prompt: String,
    pub error: String,
    pub mode_current: String,
    pub mode_player: String,
    pub mode_changed_self: String,
    pub mode_changed_other: String,
    pub mode_invalid: String,
    pub no_player: String,
    pub no_permission: String,
}

impl Default for MessagesConfig {
    fn default() -> Self {
        Self {
            thinking: "Still thinking about your previous question...".into(),
            cooldown: "Please wait {timeLeft} more sec.".into(),
            no_prompt: "Ask me something after the trigger word.".into(),
            error: "Sorry, I am having technical difficulties.".into(),
            mode_current: "&aYour mode: &e{mode}".into(),
            mode_player: "&aMode of &e{playername}: &e{mode}".into(),
            mode_changed_self: "&aYour mode is now &e{modename}".into(),
            mode_changed_other: "&aMode of &e{playername} is now &e{modename}".into(),
            mode_invalid: "&cUnknown mode &e{modename}&c | Available modes: &e{modes}".into(),
            no_player: "&cPlayer &e{playername}&c not found.".into(),
            no_permission: "&cYou may only manage your own mode.".into(),
        }
    }
}

/// Supported upstream chat APIs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderKind {
    OpenRouter,
    Google,
}

impl ProviderKind {
    pub const ALL: [Self; 2] = [Self::OpenRouter, Self::Google];

    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::OpenRouter => "openrouter",
            Self::Google => "google",
        }
    }

    /// Resolve a configured provider name. `gemini` is accepted for Google.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "openrouter" => Some(Self::OpenRouter),
            "google" | "gemini" => Some(Self::Google),
            _ => None,
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Per-provider configuration blocks. A missing block means "not configured".
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ProvidersConfig {
    pub openrouter: Option<OpenRouterConfig>,
    pub google: Option<GoogleConfig>,
}

impl ProvidersConfig {
    /// Proxy block of the given provider, when that provider is configured.
    #[must_use]
    pub fn proxy_for(&self, kind: ProviderKind) -> Option<&ProxyConfig> {
        match kind {
            ProviderKind::OpenRouter => self.openrouter.as_ref().map(|c| &c.proxy),
            ProviderKind::Google => self.google.as_ref().map(|c| &c.proxy),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OpenRouterConfig {
    pub api_key: Option<Secret<String>>,
    pub model: String,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    pub base_url: String,
    pub proxy: ProxyConfig,
}

impl Default for OpenRouterConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: "openai/gpt-4o-mini".into(),
            temperature: None,
            max_tokens: None,
            base_url: "https://openrouter.ai/api/v1".into(),
            proxy: ProxyConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GoogleConfig {
    /// One or more API keys, rotated between requests.
    pub api_keys: Vec<Secret<String>>,
    pub model: String,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    pub base_url: String,
    pub proxy: ProxyConfig,
}

impl Default for GoogleConfig {
    fn default() -> Self {
        Self {
            api_keys: Vec::new(),
            model: "gemini-2.0-flash".into(),
            temperature: None,
            max_tokens: None,
            base_url: "https://generativelanguage.googleapis.com".into(),
            proxy: ProxyConfig::default(),
        }
    }
}

/// Outbound proxy descriptor as written in the config file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ProxyConfig {
    pub enabled: bool,
    pub host: Option<String>,
    pub port: Option<ProxyPort>,
    pub user: Option<String>,
    pub pass: Option<Secret<String>>,
}

/// Proxy port, accepted either as a number or as a numeric string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ProxyPort {
    Number(i64),
    Text(String),
}

impl ProxyPort {
    /// The port as an integer, if it parses as one.
    #[must_use]
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Text(s) => s.trim().parse().ok(),
        }
    }
}

impl fmt::Display for ProxyPort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

/// Per-user conversation memory kept by the provider adapter.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    pub enabled: bool,
    /// Messages (user and assistant) remembered per user.
    pub max_messages: usize,
    /// Forget a user's turns after this many idle minutes; 0 keeps them.
    pub idle_minutes: u64,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            max_messages: 20,
            idle_minutes: 60,
        }
    }
}

/// Proximity triggering: players standing close and looking at the bot
/// address it without a trigger word.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NearbyConfig {
    pub enabled: bool,
    /// Maximum distance in blocks.
    pub radius: f64,
    /// Maximum angle between the player's facing and the bot, in degrees.
    pub max_angle_degrees: f64,
    /// Permission required to use this path.
    pub permission: String,
}

impl Default for NearbyConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            radius: 4.0,
            max_angle_degrees: 25.0,
            permission: "user.ainear".into(),
        }
    }
}

/// Users known to the console host (username → permissions).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsoleConfig {
    pub users: BTreeMap<String, Vec<String>>,
    /// Permissions granted to users not listed in `users`. Empty means
    /// unknown users cannot be resolved.
    pub default_permissions: Vec<String>,
}
