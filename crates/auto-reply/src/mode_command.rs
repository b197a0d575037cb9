//! `gptmode`: show or change the prompt mode of a player.
//!
//! | args              | effect                                            |
//! |-------------------|---------------------------------------------------|
//! | none              | show own mode                                     |
//! | `<mode>`          | change own mode when `<mode>` exists              |
//! | `<player>`        | show the player's mode (`admin.gpt` for others)   |
//! | `<player> <mode>` | change the player's mode (`admin.gpt` for others) |

use std::sync::Arc;

use {
    parley_channels::{ChatUser, permissions},
    parley_common::{ChatType, UserKey},
    parley_config::MessagesConfig,
    tracing::info,
};

use crate::{Result, host::Host, prompt::PromptTable};

pub const NAME: &str = "gptmode";
pub const ALIASES: [&str; 2] = ["gptm", "mode"];

/// What the command did. Every variant except errors has sent one notice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModeOutcome {
    Shown { target: String, mode: String },
    Changed { target: String, mode: String },
    PlayerNotFound,
    UnknownMode,
    Denied,
}

pub struct ModeCommand {
    prompts: Arc<PromptTable>,
    messages: MessagesConfig,
    host: Host,
}

impl ModeCommand {
    pub fn new(prompts: Arc<PromptTable>, messages: MessagesConfig, host: Host) -> Self {
        Self {
            prompts,
            messages,
            host,
        }
    }

    /// Whether `name` (lowercased, without prefix) invokes this command.
    #[must_use]
    pub fn matches(name: &str) -> bool {
        name == NAME || ALIASES.contains(&name)
    }

    /// Run the command for `invoker`. Words beyond the second are ignored.
    ///
    /// Only mode store failures are returned as errors; everything else is
    /// answered with a notice.
    pub async fn execute(
        &self,
        invoker: &str,
        chat_type: ChatType,
        args: &[&str],
    ) -> Result<ModeOutcome> {
        let invoker_key = UserKey::new(invoker);
        let reply = Reply {
            host: &self.host,
            chat_type,
            invoker,
        };

        match args {
            [] => self.show_own(&reply, &invoker_key).await,
            [word] if self.prompts.contains(word) => {
                self.change(&reply, invoker, &invoker_key, word, false).await
            },
            [target] if UserKey::new(target) == invoker_key => {
                self.show_own(&reply, &invoker_key).await
            },
            [target] => {
                if !self.is_mode_admin(invoker).await {
                    return Ok(self.deny(&reply).await);
                }
                let Some(user) = self.find_player(&reply, target).await else {
                    return Ok(ModeOutcome::PlayerNotFound);
                };
                let mode = self.host.mode_of(&UserKey::new(user.username())).await?;
                let text = self
                    .messages
                    .mode_player
                    .replace("{playername}", user.username())
                    .replace("{mode}", &mode);
                reply.send(&text).await;
                Ok(ModeOutcome::Shown {
                    target: user.username().to_string(),
                    mode,
                })
            },
            [target, mode, ..] if UserKey::new(target) == invoker_key => {
                if !self.prompts.contains(mode) {
                    return Ok(self.reject_mode(&reply, mode).await);
                }
                self.change(&reply, invoker, &invoker_key, mode, false).await
            },
            [target, mode, ..] => {
                if !self.is_mode_admin(invoker).await {
                    return Ok(self.deny(&reply).await);
                }
                let Some(user) = self.find_player(&reply, target).await else {
                    return Ok(ModeOutcome::PlayerNotFound);
                };
                if !self.prompts.contains(mode) {
                    return Ok(self.reject_mode(&reply, mode).await);
                }
                let target_key = UserKey::new(user.username());
                self.change(&reply, user.username(), &target_key, mode, true)
                    .await
            },
        }
    }

    async fn show_own(&self, reply: &Reply<'_>, key: &UserKey) -> Result<ModeOutcome> {
        let mode = self.host.mode_of(key).await?;
        reply
            .send(&self.messages.mode_current.replace("{mode}", &mode))
            .await;
        Ok(ModeOutcome::Shown {
            target: reply.invoker.to_string(),
            mode,
        })
    }

    async fn change(
        &self,
        reply: &Reply<'_>,
        target: &str,
        target_key: &UserKey,
        mode: &str,
        other: bool,
    ) -> Result<ModeOutcome> {
        self.host
            .modes
            .set(&target_key.mode_store_key(), mode)
            .await?;

        let (text, audit) = if other {
            (
                self.messages
                    .mode_changed_other
                    .replace("{playername}", target)
                    .replace("{modename}", mode),
                format!(
                    "[parley] {} ({}) changed the mode of {target} to {mode}",
                    reply.invoker,
                    permissions::MODE_ADMIN
                ),
            )
        } else {
            (
                self.messages.mode_changed_self.replace("{modename}", mode),
                format!("[parley] {} changed their mode to {mode}", reply.invoker),
            )
        };
        info!(actor = reply.invoker, player = target, mode, "prompt mode changed");
        self.host.log.log(&audit);
        reply.send(&text).await;

        Ok(ModeOutcome::Changed {
            target: target.to_string(),
            mode: mode.to_string(),
        })
    }

    async fn is_mode_admin(&self, invoker: &str) -> bool {
        matches!(
            self.host.users.get_user(invoker).await,
            Ok(Some(user)) if user.has_permission(permissions::MODE_ADMIN)
        )
    }

    async fn find_player(&self, reply: &Reply<'_>, target: &str) -> Option<Arc<dyn ChatUser>> {
        match self.host.users.get_user(target).await {
            Ok(Some(user)) => Some(user),
            Ok(None) | Err(_) => {
                reply
                    .send(&self.messages.no_player.replace("{playername}", target))
                    .await;
                None
            },
        }
    }

    async fn deny(&self, reply: &Reply<'_>) -> ModeOutcome {
        reply.send(&self.messages.no_permission).await;
        ModeOutcome::Denied
    }

    async fn reject_mode(&self, reply: &Reply<'_>, mode: &str) -> ModeOutcome {
        let text = self
            .messages
            .mode_invalid
            .replace("{modename}", mode)
            .replace("{modes}", &self.prompts.mode_list());
        reply.send(&text).await;
        ModeOutcome::UnknownMode
    }
}

/// Where notices of one invocation go.
struct Reply<'a> {
    host: &'a Host,
    chat_type: ChatType,
    invoker: &'a str,
}

impl Reply<'_> {
    async fn send(&self, text: &str) {
        self.host.notify(self.chat_type, text, self.invoker).await;
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use parley_channels::{ModeStore, StaticUserDirectory};

    use {
        super::*,
        crate::testing::{BrokenStore, Harness, harness},
    };

    fn users() -> StaticUserDirectory {
        StaticUserDirectory::new()
            .with_user("Steve", &["user.ai"])
            .with_user("Alex", &["user.ai"])
            .with_user("Admin", &["admin.gpt"])
    }

    fn command(h: &Harness) -> ModeCommand {
        let prompts = PromptTable::new(
            BTreeMap::from([
                ("default".to_string(), "d".to_string()),
                ("pirate".to_string(), "p".to_string()),
            ]),
            None,
        );
        ModeCommand::new(Arc::new(prompts), MessagesConfig::default(), h.host.clone())
    }

    async fn stored(h: &Harness, user: &str) -> Option<String> {
        h.store
            .get(&UserKey::new(user).mode_store_key())
            .await
            .unwrap()
    }

    #[test]
    fn names_and_aliases() {
        assert!(ModeCommand::matches("gptmode"));
        assert!(ModeCommand::matches("gptm"));
        assert!(ModeCommand::matches("mode"));
        assert!(!ModeCommand::matches("gpt"));
    }

    #[tokio::test]
    async fn no_args_reports_default() {
        let h = harness(users());
        let outcome = command(&h).execute("Steve", ChatType::Chat, &[]).await.unwrap();
        assert_eq!(outcome, ModeOutcome::Shown {
            target: "Steve".into(),
            mode: "default".into()
        });
        assert_eq!(h.sink.texts(), vec!["&aYour mode: &edefault".to_string()]);
    }

    #[tokio::test]
    async fn single_known_mode_changes_own_mode() {
        let h = harness(users());
        let outcome = command(&h)
            .execute("Steve", ChatType::Clan, &["pirate"])
            .await
            .unwrap();
        assert_eq!(outcome, ModeOutcome::Changed {
            target: "Steve".into(),
            mode: "pirate".into()
        });
        assert_eq!(stored(&h, "steve").await.as_deref(), Some("pirate"));
        assert_eq!(h.sink.sent()[0].chat_type, ChatType::Clan);
        assert_eq!(h.log.lines(), vec![
            "[parley] Steve changed their mode to pirate".to_string()
        ]);
    }

    #[tokio::test]
    async fn own_name_with_mode_needs_no_admin() {
        let h = harness(users());
        let outcome = command(&h)
            .execute("Steve", ChatType::Chat, &["STEVE", "pirate"])
            .await
            .unwrap();
        assert!(matches!(outcome, ModeOutcome::Changed { .. }));
        assert_eq!(stored(&h, "steve").await.as_deref(), Some("pirate"));
    }

    #[tokio::test]
    async fn own_name_shows_own_mode() {
        let h = harness(users());
        h.store.set("ai:mode:steve", "pirate").await.unwrap();
        let outcome = command(&h)
            .execute("Steve", ChatType::Chat, &["steve"])
            .await
            .unwrap();
        assert_eq!(outcome, ModeOutcome::Shown {
            target: "Steve".into(),
            mode: "pirate".into()
        });
    }

    #[tokio::test]
    async fn viewing_another_player_requires_admin() {
        let h = harness(users());
        let outcome = command(&h)
            .execute("Steve", ChatType::Chat, &["Alex"])
            .await
            .unwrap();
        assert_eq!(outcome, ModeOutcome::Denied);
        assert_eq!(h.sink.texts(), vec![
            "&cYou may only manage your own mode.".to_string()
        ]);
    }

    #[tokio::test]
    async fn admin_views_another_player() {
        let h = harness(users());
        h.store.set("ai:mode:alex", "pirate").await.unwrap();
        let outcome = command(&h)
            .execute("Admin", ChatType::Chat, &["alex"])
            .await
            .unwrap();
        assert_eq!(outcome, ModeOutcome::Shown {
            target: "Alex".into(),
            mode: "pirate".into()
        });
        assert_eq!(h.sink.texts(), vec!["&aMode of &eAlex: &epirate".to_string()]);
    }

    #[tokio::test]
    async fn admin_changes_another_players_mode() {
        let h = harness(users());
        let outcome = command(&h)
            .execute("Admin", ChatType::Chat, &["Alex", "pirate"])
            .await
            .unwrap();
        assert_eq!(outcome, ModeOutcome::Changed {
            target: "Alex".into(),
            mode: "pirate".into()
        });
        assert_eq!(stored(&h, "alex").await.as_deref(), Some("pirate"));
        assert_eq!(h.log.lines(), vec![
            "[parley] Admin (admin.gpt) changed the mode of Alex to pirate".to_string()
        ]);
    }

    #[tokio::test]
    async fn unknown_target_with_mode_writes_nothing() {
        let h = harness(users());
        let outcome = command(&h)
            .execute("Admin", ChatType::Chat, &["Ghost", "pirate"])
            .await
            .unwrap();
        assert_eq!(outcome, ModeOutcome::PlayerNotFound);
        assert_eq!(stored(&h, "ghost").await, None);
        assert_eq!(h.sink.texts(), vec!["&cPlayer &eGhost&c not found.".to_string()]);
        assert!(h.log.lines().is_empty());
    }

    #[tokio::test]
    async fn unknown_mode_lists_available_modes() {
        let h = harness(users());
        let outcome = command(&h)
            .execute("Admin", ChatType::Chat, &["Alex", "ninja"])
            .await
            .unwrap();
        assert_eq!(outcome, ModeOutcome::UnknownMode);
        assert_eq!(stored(&h, "alex").await, None);
        assert_eq!(h.sink.texts(), vec![
            "&cUnknown mode &eninja&c | Available modes: &edefault, pirate".to_string()
        ]);
    }

    #[tokio::test]
    async fn own_name_with_unknown_mode_writes_nothing() {
        let h = harness(users());
        let outcome = command(&h)
            .execute("Steve", ChatType::Chat, &["Steve", "ninja"])
            .await
            .unwrap();
        assert_eq!(outcome, ModeOutcome::UnknownMode);
        assert_eq!(stored(&h, "steve").await, None);
        assert_eq!(h.sink.texts(), vec![
            "&cUnknown mode &eninja&c | Available modes: &edefault, pirate".to_string()
        ]);
        assert!(h.log.lines().is_empty());
    }

    #[tokio::test]
    async fn changing_another_player_without_admin_is_denied() {
        let h = harness(users());
        let outcome = command(&h)
            .execute("Steve", ChatType::Chat, &["Alex", "pirate"])
            .await
            .unwrap();
        assert_eq!(outcome, ModeOutcome::Denied);
        assert_eq!(stored(&h, "alex").await, None);
    }

    #[tokio::test]
    async fn store_failure_is_returned() {
        let mut h = harness(users());
        h.host.modes = Arc::new(BrokenStore);
        let result = command(&h)
            .execute("Steve", ChatType::Chat, &["pirate"])
            .await;
        assert!(result.is_err());
        assert!(h.sink.sent().is_empty());
    }
}
