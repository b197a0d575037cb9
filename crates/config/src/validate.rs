//! Semantic validation of a parsed configuration.
//!
//! Parsing already rejects malformed files; this pass reports settings that
//! parse fine but cannot work (unknown provider, missing provider block) or
//! look like mistakes (no `default` prompt, no trigger words).

use crate::schema::{ParleyConfig, ProviderKind};

/// Severity level for a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Error,
    Warning,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Error => write!(f, "error"),
            Self::Warning => write!(f, "warning"),
        }
    }
}

/// A single validation diagnostic.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub severity: Severity,
    /// Dotted path, e.g. "providers.google.proxy"
    pub path: String,
    pub message: String,
}

/// Result of validating a configuration.
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    pub diagnostics: Vec<Diagnostic>,
}

impl ValidationResult {
    /// Returns `true` if any diagnostic is an error.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.severity == Severity::Error)
    }

    /// Count diagnostics by severity.
    #[must_use]
    pub fn count(&self, severity: Severity) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == severity)
            .count()
    }

    fn push(&mut self, severity: Severity, path: impl Into<String>, message: impl Into<String>) {
        self.diagnostics.push(Diagnostic {
            severity,
            path: path.into(),
            message: message.into(),
        });
    }
}

fn levenshtein(a: &str, b: &str) -> usize {
    let b_chars: Vec<char> = b.chars().collect();
    if a.is_empty() {
        return b_chars.len();
    }
    if b_chars.is_empty() {
        return a.chars().count();
    }

    let mut prev: Vec<usize> = (0..=b_chars.len()).collect();
    let mut curr = vec![0; b_chars.len() + 1];

    for (i, ca) in a.chars().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b_chars.iter().enumerate() {
            let cost = usize::from(ca != *cb);
            curr[j + 1] = (prev[j] + cost).min(prev[j + 1] + 1).min(curr[j] + 1);
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b_chars.len()]
}

/// Closest known provider name within `max_distance` edits.
fn suggest_provider(needle: &str, max_distance: usize) -> Option<&'static str> {
    ProviderKind::ALL
        .iter()
        .map(|kind| (kind.name(), levenshtein(&needle.to_lowercase(), kind.name())))
        .filter(|(_, d)| *d > 0 && *d <= max_distance)
        .min_by_key(|(_, d)| *d)
        .map(|(name, _)| name)
}

/// Validate a parsed configuration.
#[must_use]
pub fn validate(config: &ParleyConfig) -> ValidationResult {
    let mut result = ValidationResult::default();

    match ProviderKind::from_name(&config.provider) {
        None => {
            let message = match suggest_provider(&config.provider, 3) {
                Some(s) => format!("unknown provider \"{}\" (did you mean \"{s}\"?)", config.provider),
                None => format!("unknown provider \"{}\"", config.provider),
            };
            result.push(Severity::Error, "provider", message);
        },
        Some(kind) => {
            let path = format!("providers.{}", kind.name());
            match config.providers.proxy_for(kind) {
                None => result.push(
                    Severity::Error,
                    path,
                    format!("provider \"{kind}\" is selected but not configured"),
                ),
                Some(proxy) => {
                    if let Err(e) = proxy.validate() {
                        result.push(Severity::Error, format!("{path}.proxy"), e.to_string());
                    }
                },
            }
        },
    }

    if !config.prompts.contains_key("default") {
        result.push(
            Severity::Warning,
            "prompts.default",
            "no default prompt, the built-in fallback prompt will be used",
        );
    }
    if config.chat.trigger_words.iter().all(|w| w.trim().is_empty()) && !config.nearby.enabled {
        result.push(
            Severity::Warning,
            "chat.trigger_words",
            "no trigger words configured, the bot will never answer",
        );
    }
    if config.chat.allowed_chat_types.is_empty() {
        result.push(
            Severity::Warning,
            "chat.allowed_chat_types",
            "no chat types allowed, the bot will never answer",
        );
    }
    if config.chat.cooldown_secs == 0 {
        result.push(
            Severity::Warning,
            "chat.cooldown_secs",
            "cooldown is disabled",
        );
    }
    if config.chat.max_reply_chars < 4 {
        result.push(
            Severity::Warning,
            "chat.max_reply_chars",
            "reply limit is too small to fit any text before the ellipsis",
        );
    }

    result
}
