//! Prompt modes and system prompt rendering.

use std::collections::BTreeMap;

use {
    chrono::{Local, NaiveDateTime, Utc},
    chrono_tz::Tz,
    parley_common::ChatType,
    parley_config::FALLBACK_PROMPT,
};

pub const DEFAULT_MODE: &str = "default";

/// Mode name → system prompt template, fixed at load.
#[derive(Debug, Clone)]
pub struct PromptTable {
    prompts: BTreeMap<String, String>,
    timezone: Option<Tz>,
}

impl PromptTable {
    pub fn new(prompts: BTreeMap<String, String>, timezone: Option<Tz>) -> Self {
        Self { prompts, timezone }
    }

    #[must_use]
    pub fn contains(&self, mode: &str) -> bool {
        self.prompts.contains_key(mode)
    }

    /// Known mode names, comma separated, for user-facing notices.
    #[must_use]
    pub fn mode_list(&self) -> String {
        self.prompts
            .keys()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Template for `mode`, falling back to `default` and then to the
    /// built-in prompt.
    #[must_use]
    pub fn template(&self, mode: &str) -> &str {
        self.prompts
            .get(mode)
            .or_else(|| self.prompts.get(DEFAULT_MODE))
            .map(String::as_str)
            .unwrap_or(FALLBACK_PROMPT)
    }

    /// Render the prompt of `mode` for `username` at the current time.
    #[must_use]
    pub fn render(&self, mode: &str, username: &str, chat_type: ChatType) -> String {
        let now = match self.timezone {
            Some(tz) => Utc::now().with_timezone(&tz).naive_local(),
            None => Local::now().naive_local(),
        };
        render_template(self.template(mode), username, chat_type, now)
    }
}

/// Substitute `{username}`, `{user}`, `{chatType}`, `{time}`, `{date}` and
/// `{datetime}` in `template`.
#[must_use]
pub fn render_template(
    template: &str,
    username: &str,
    chat_type: ChatType,
    now: NaiveDateTime,
) -> String {
    let time = now.format("%H:%M").to_string();
    let date = now.format("%d.%m.%Y").to_string();
    template
        .replace("{username}", username)
        .replace("{user}", username)
        .replace("{chatType}", chat_type.as_str())
        .replace("{datetime}", &format!("{date} {time}"))
        .replace("{time}", &time)
        .replace("{date}", &date)
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {super::*, chrono::NaiveDate};

    fn table() -> PromptTable {
        PromptTable::new(
            BTreeMap::from([
                ("default".to_string(), "Be nice to {username}".to_string()),
                ("pirate".to_string(), "Arr, {user}!".to_string()),
            ]),
            None,
        )
    }

    fn morning() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 7)
            .unwrap()
            .and_hms_opt(9, 5, 0)
            .unwrap()
    }

    #[test]
    fn fallback_chain() {
        let table = table();
        assert_eq!(table.template("pirate"), "Arr, {user}!");
        assert_eq!(table.template("missing"), "Be nice to {username}");

        let empty = PromptTable::new(BTreeMap::new(), None);
        assert_eq!(empty.template("default"), FALLBACK_PROMPT);
    }

    #[test]
    fn renders_all_placeholders() {
        let rendered = render_template(
            "{username}/{user} in {chatType} at {time} on {date} ({datetime})",
            "Steve",
            ChatType::Clan,
            morning(),
        );
        assert_eq!(
            rendered,
            "Steve/Steve in clan at 09:05 on 07.03.2024 (07.03.2024 09:05)"
        );
    }

    #[test]
    fn repeated_placeholders_are_all_replaced() {
        let rendered = render_template("{user} {user}", "Alex", ChatType::Chat, morning());
        assert_eq!(rendered, "Alex Alex");
    }

    #[test]
    fn render_uses_mode_template() {
        let rendered = table().render("pirate", "Steve", ChatType::Chat);
        assert_eq!(rendered, "Arr, Steve!");
    }

    #[test]
    fn mode_list_is_sorted() {
        assert!(table().contains("pirate"));
        assert!(!table().contains("Pirate"));
        assert_eq!(table().mode_list(), "default, pirate");
    }
}
