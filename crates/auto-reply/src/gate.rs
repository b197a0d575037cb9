//! The dispatch gate: decides whether a chat message goes to the model and
//! relays the reply.
//!
//! Per-user state lives in one map of [`UserSlot`]s. The in-flight check, the
//! cooldown check and the in-flight mark for a key happen under that key's
//! map entry, so at most one model call per user is outstanding. The mark is
//! held by an [`InFlightLease`] that clears it (and stamps the cooldown) when
//! dropped.

use std::{
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
    time::Duration,
};

use {
    dashmap::{DashMap, mapref::entry::Entry},
    parley_channels::{ChatUser, permissions},
    parley_common::{ChatEvent, ChatType, UserKey},
    parley_config::{MessagesConfig, NearbyConfig, ParleyConfig},
    parley_providers::ChatClient,
    tokio::time::Instant,
    tracing::{debug, error, info, warn},
};

use crate::{
    Error, Result,
    host::Host,
    nearby::addressed_by_proximity,
    prompt::PromptTable,
    sanitize::{clear_bad_symbols, truncate_reply},
    trigger::TriggerWords,
};

const SWEEP_EVERY_EVENTS: u64 = 512;

/// What the gate did with an event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatch {
    /// Own message, chat type not allowed, or not addressed to the bot.
    Ignored,
    /// Sender unknown or lacking permission.
    Unauthorized,
    /// A previous request of the sender is still running.
    Busy,
    CoolingDown { seconds_left: u64 },
    EmptyPrompt,
    Replied { reply: String },
    /// The model call failed; an apology was sent.
    Failed,
}

/// Gate configuration, derived from [`ParleyConfig`].
#[derive(Debug, Clone)]
pub struct GateSettings {
    pub bot_username: String,
    pub triggers: TriggerWords,
    pub allowed_chat_types: Vec<ChatType>,
    pub cooldown: Duration,
    pub cooldown_on_failure: bool,
    pub sanitize_output: bool,
    pub max_reply_chars: usize,
    /// Set when proximity addressing is enabled.
    pub nearby: Option<NearbyConfig>,
    pub messages: MessagesConfig,
}

impl GateSettings {
    pub fn from_config(config: &ParleyConfig) -> Self {
        Self {
            bot_username: config.bot.username.clone(),
            triggers: TriggerWords::new(&config.chat.trigger_words),
            allowed_chat_types: config.chat.allowed_chat_types.clone(),
            cooldown: Duration::from_secs(config.chat.cooldown_secs),
            cooldown_on_failure: config.chat.cooldown_on_failure,
            sanitize_output: config.chat.sanitize_output,
            max_reply_chars: config.chat.max_reply_chars,
            nearby: config.nearby.enabled.then(|| config.nearby.clone()),
            messages: config.messages.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct UserSlot {
    last_triggered: Option<Instant>,
    in_flight: bool,
}

enum Admission {
    Busy,
    CoolingDown(u64),
    EmptyPrompt,
    Admitted,
}

/// How the message reached the bot.
enum Addressed<'a> {
    Trigger(&'a str),
    Nearby(&'a str),
}

impl Addressed<'_> {
    fn prompt(&self) -> &str {
        match self {
            Self::Trigger(prompt) | Self::Nearby(prompt) => prompt,
        }
    }
}

/// Clears the in-flight mark of a key on drop, stamping the cooldown first
/// when `stamp` is set.
struct InFlightLease<'a> {
    slots: &'a DashMap<UserKey, UserSlot>,
    key: UserKey,
    stamp: bool,
}

impl Drop for InFlightLease<'_> {
    fn drop(&mut self) {
        if let Entry::Occupied(mut occupied) = self.slots.entry(self.key.clone()) {
            let slot = occupied.get_mut();
            slot.in_flight = false;
            if self.stamp {
                slot.last_triggered = Some(Instant::now());
            }
            if slot.last_triggered.is_none() {
                occupied.remove();
            }
        }
    }
}

pub struct DispatchGate {
    settings: GateSettings,
    prompts: Arc<PromptTable>,
    client: Arc<dyn ChatClient>,
    host: Host,
    slots: DashMap<UserKey, UserSlot>,
    events_seen: AtomicU64,
}

impl DispatchGate {
    pub fn new(
        settings: GateSettings,
        prompts: Arc<PromptTable>,
        client: Arc<dyn ChatClient>,
        host: Host,
    ) -> Self {
        Self {
            settings,
            prompts,
            client,
            host,
            slots: DashMap::new(),
            events_seen: AtomicU64::new(0),
        }
    }

    pub fn settings(&self) -> &GateSettings {
        &self.settings
    }

    /// Run one chat event through the gate.
    ///
    /// Sends at most one chat message and never returns an error: failures
    /// of the model call are logged and answered with an apology.
    pub async fn handle(&self, event: &ChatEvent) -> Dispatch {
        let key = event.user_key();
        if key == UserKey::new(&self.settings.bot_username) {
            return Dispatch::Ignored;
        }
        if !self.settings.allowed_chat_types.contains(&event.chat_type) {
            return Dispatch::Ignored;
        }

        let addressed = match self.settings.triggers.strip(&event.message) {
            Some(prompt) => Addressed::Trigger(prompt),
            None if self.addressed_by_proximity(&event.username).await => {
                Addressed::Nearby(event.message.trim())
            },
            None => return Dispatch::Ignored,
        };

        let Some(user) = self.resolve_user(&event.username).await else {
            return Dispatch::Unauthorized;
        };
        let exempt = user.has_permission(permissions::AI_NO_COOLDOWN);
        if !exempt && !self.may_ask(user.as_ref(), &addressed) {
            debug!(user = %key, "sender lacks AI permission");
            return Dispatch::Unauthorized;
        }

        let prompt = addressed.prompt();
        let messages = &self.settings.messages;
        match self.admit(&key, exempt, prompt.is_empty()) {
            Admission::Busy => {
                self.host
                    .notify(event.chat_type, &messages.thinking, &event.username)
                    .await;
                return Dispatch::Busy;
            },
            Admission::CoolingDown(seconds_left) => {
                let text = messages
                    .cooldown
                    .replace("{timeLeft}", &seconds_left.to_string());
                self.host
                    .notify(event.chat_type, &text, &event.username)
                    .await;
                return Dispatch::CoolingDown { seconds_left };
            },
            Admission::EmptyPrompt => {
                self.host
                    .notify(event.chat_type, &messages.no_prompt, &event.username)
                    .await;
                return Dispatch::EmptyPrompt;
            },
            Admission::Admitted => {},
        }

        let stamps = !exempt && !self.settings.cooldown.is_zero();
        let mut lease = InFlightLease {
            slots: &self.slots,
            key: key.clone(),
            stamp: stamps && self.settings.cooldown_on_failure,
        };
        let outcome = self.ask(&key, event, prompt).await;
        if outcome.is_ok() {
            lease.stamp = stamps;
        }
        drop(lease);

        match outcome {
            Ok(reply) => {
                info!(
                    user = %key,
                    chat_type = %event.chat_type,
                    chars = reply.chars().count(),
                    "relaying AI reply"
                );
                self.host
                    .notify(event.chat_type, &reply, &event.username)
                    .await;
                Dispatch::Replied { reply }
            },
            Err(e) => {
                error!(
                    user = %key,
                    chat_type = %event.chat_type,
                    provider = %self.client.provider(),
                    error = %e,
                    "AI request failed"
                );
                self.host
                    .log
                    .log(&format!("[parley] AI request failed for {}: {e}", event.username));
                self.host
                    .notify(event.chat_type, &messages.error, &event.username)
                    .await;
                Dispatch::Failed
            },
        }
    }

    async fn addressed_by_proximity(&self, username: &str) -> bool {
        let (Some(nearby), Some(locator)) = (&self.settings.nearby, &self.host.locator) else {
            return false;
        };
        let (Some(player), Some(bot)) = (locator.pose_of(username).await, locator.bot_pose().await)
        else {
            return false;
        };
        addressed_by_proximity(nearby, &player, &bot)
    }

    async fn resolve_user(&self, username: &str) -> Option<Arc<dyn ChatUser>> {
        match self.host.users.get_user(username).await {
            Ok(Some(user)) => Some(user),
            Ok(None) => {
                debug!(user = username, "sender not found in user directory");
                None
            },
            Err(e) => {
                warn!(user = username, error = %e, "user directory lookup failed");
                None
            },
        }
    }

    fn may_ask(&self, user: &dyn ChatUser, addressed: &Addressed<'_>) -> bool {
        if user.has_permission(permissions::AI) {
            return true;
        }
        match (addressed, &self.settings.nearby) {
            (Addressed::Nearby(_), Some(nearby)) => user.has_permission(&nearby.permission),
            _ => false,
        }
    }

    fn admit(&self, key: &UserKey, exempt: bool, empty_prompt: bool) -> Admission {
        let now = Instant::now();
        let cooldown = self.settings.cooldown;
        let admission = match self.slots.entry(key.clone()) {
            Entry::Occupied(mut occupied) => {
                let slot = occupied.get_mut();
                let cooling = slot
                    .last_triggered
                    .filter(|_| !exempt)
                    .and_then(|last| remaining_secs(cooldown, now.duration_since(last)));
                if slot.in_flight {
                    Admission::Busy
                } else if let Some(seconds_left) = cooling {
                    Admission::CoolingDown(seconds_left)
                } else if empty_prompt {
                    Admission::EmptyPrompt
                } else {
                    slot.in_flight = true;
                    Admission::Admitted
                }
            },
            Entry::Vacant(vacant) => {
                if empty_prompt {
                    Admission::EmptyPrompt
                } else {
                    vacant.insert(UserSlot {
                        last_triggered: None,
                        in_flight: true,
                    });
                    Admission::Admitted
                }
            },
        };

        self.sweep_if_needed(now);
        admission
    }

    fn sweep_if_needed(&self, now: Instant) {
        let seen = self.events_seen.fetch_add(1, Ordering::Relaxed) + 1;
        if !seen.is_multiple_of(SWEEP_EVERY_EVENTS) {
            return;
        }
        let cooldown = self.settings.cooldown;
        self.slots.retain(|_, slot| {
            slot.in_flight
                || slot
                    .last_triggered
                    .is_some_and(|last| now.duration_since(last) < cooldown)
        });
    }

    async fn ask(&self, key: &UserKey, event: &ChatEvent, prompt: &str) -> Result<String> {
        let mode = self.host.mode_of(key).await?;
        let system_prompt = self
            .prompts
            .render(&mode, &event.username, event.chat_type);
        debug!(
            user = %key,
            mode = %mode,
            provider = %self.client.provider(),
            "dispatching prompt"
        );

        let reply = self
            .client
            .chat(prompt, &event.username, Some(&system_prompt))
            .await?
            .ok_or(Error::EmptyReply)?;
        let reply = if self.settings.sanitize_output {
            clear_bad_symbols(&reply)
        } else {
            reply.trim().to_string()
        };
        if reply.is_empty() {
            return Err(Error::EmptyReply);
        }
        Ok(truncate_reply(&reply, self.settings.max_reply_chars))
    }

    #[cfg(test)]
    fn slot_count(&self) -> usize {
        self.slots.len()
    }
}

/// Whole seconds left until `cooldown` has passed, rounded up, or `None`
/// when it already has.
fn remaining_secs(cooldown: Duration, elapsed: Duration) -> Option<u64> {
    if elapsed >= cooldown {
        return None;
    }
    let left_ms = (cooldown - elapsed).as_millis();
    Some(u64::try_from(left_ms.div_ceil(1000)).unwrap_or(u64::MAX).max(1))
}
