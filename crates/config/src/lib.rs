//! Configuration loading, validation, env substitution, and proxy checks.
//!
//! Config files: `parley.toml`, `parley.yaml`, or `parley.json`
//! Searched in `./` then `~/.config/parley/`.
//!
//! Supports `${ENV_VAR}` substitution in all string values.

pub mod env_subst;
pub mod error;
pub mod loader;
pub mod proxy;
pub mod schema;
pub mod validate;

pub use {
    error::{Error, Result},
    loader::{config_dir, discover_and_load, find_config_file, load_config},
    proxy::{ProxyConnection, ProxyError},
    schema::{
        BotConfig, ChatConfig, ConsoleConfig, FALLBACK_PROMPT, GoogleConfig, HistoryConfig,
        MessagesConfig, NearbyConfig, OpenRouterConfig, ParleyConfig, ProviderKind,
        ProvidersConfig, ProxyConfig, ProxyPort,
    },
    validate::{Diagnostic, Severity, ValidationResult},
};
