//! Bounded per-user conversation memory.

use std::{
    collections::{HashMap, VecDeque},
    sync::{Mutex, PoisonError},
    time::{Duration, Instant},
};

const SWEEP_EVERY_RECORDS: u64 = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Turn {
    pub role: Role,
    pub content: String,
}

#[derive(Debug)]
struct UserTurns {
    turns: VecDeque<Turn>,
    last_used: Instant,
}

#[derive(Debug, Default)]
struct State {
    users: HashMap<String, UserTurns>,
    records: u64,
}

/// Remembers the last `max_messages` turns of each user, keyed
/// case-insensitively. Only completed exchanges are recorded.
///
/// With an idle timeout, a user's turns are forgotten once they have not
/// chatted for that long; stale users are swept every 64 records.
#[derive(Debug)]
pub struct ConversationHistory {
    max_messages: usize,
    idle_timeout: Option<Duration>,
    state: Mutex<State>,
}

impl ConversationHistory {
    pub fn new(max_messages: usize) -> Self {
        Self {
            max_messages,
            idle_timeout: None,
            state: Mutex::new(State::default()),
        }
    }

    /// Forget users idle for longer than `timeout`.
    #[must_use]
    pub fn with_idle_timeout(mut self, timeout: Duration) -> Self {
        self.idle_timeout = Some(timeout);
        self
    }

    fn is_stale(&self, entry: &UserTurns, now: Instant) -> bool {
        self.idle_timeout
            .is_some_and(|timeout| now.saturating_duration_since(entry.last_used) > timeout)
    }

    /// Turns to replay before a new prompt of `user`, oldest first.
    pub fn snapshot(&self, user: &str) -> Vec<Turn> {
        let now = Instant::now();
        let state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state
            .users
            .get(&user.to_lowercase())
            .filter(|entry| !self.is_stale(entry, now))
            .map(|entry| entry.turns.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Append one prompt/reply exchange, dropping the oldest turns beyond the bound.
    pub fn record(&self, user: &str, prompt: &str, reply: &str) {
        if self.max_messages == 0 {
            return;
        }
        let now = Instant::now();
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);

        let key = user.to_lowercase();
        if state
            .users
            .get(&key)
            .is_some_and(|entry| self.is_stale(entry, now))
        {
            state.users.remove(&key);
        }
        let entry = state.users.entry(key).or_insert_with(|| UserTurns {
            turns: VecDeque::new(),
            last_used: now,
        });
        entry.last_used = now;
        entry.turns.push_back(Turn {
            role: Role::User,
            content: prompt.to_string(),
        });
        entry.turns.push_back(Turn {
            role: Role::Assistant,
            content: reply.to_string(),
        });
        while entry.turns.len() > self.max_messages {
            entry.turns.pop_front();
        }

        state.records += 1;
        if state.records % SWEEP_EVERY_RECORDS == 0 {
            state.users.retain(|_, entry| !self.is_stale(entry, now));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_only_the_newest_turns() {
        let history = ConversationHistory::new(3);
        history.record("Steve", "one", "1");
        history.record("steve", "two", "2");

        let turns = history.snapshot("STEVE");
        assert_eq!(turns.len(), 3);
        assert_eq!(turns[0].content, "1");
        assert_eq!(turns[1].role, Role::User);
        assert_eq!(turns[2].content, "2");
    }

    #[test]
    fn users_are_independent() {
        let history = ConversationHistory::new(20);
        history.record("steve", "hi", "hello");
        assert!(history.snapshot("alex").is_empty());
    }

    #[test]
    fn idle_users_are_forgotten_and_swept() {
        let history = ConversationHistory::new(20).with_idle_timeout(Duration::from_millis(20));
        history.record("alex", "hi", "hello");
        std::thread::sleep(Duration::from_millis(50));
        assert!(history.snapshot("alex").is_empty());

        for i in 0..SWEEP_EVERY_RECORDS {
            history.record("steve", &format!("q{i}"), "a");
        }
        let state = history.state.lock().unwrap_or_else(PoisonError::into_inner);
        assert!(!state.users.contains_key("alex"));
        assert!(state.users.contains_key("steve"));
    }

    #[test]
    fn returning_idle_user_starts_fresh() {
        let history = ConversationHistory::new(20).with_idle_timeout(Duration::from_millis(20));
        history.record("alex", "old", "reply");
        std::thread::sleep(Duration::from_millis(50));
        history.record("alex", "new", "reply");
        let turns = history.snapshot("alex");
        assert_eq!(turns.len(), 2);
        assert_eq!(turns[0].content, "new");
    }

    #[test]
    fn zero_bound_records_nothing() {
        let history = ConversationHistory::new(0);
        history.record("steve", "hi", "hello");
        assert!(history.snapshot("steve").is_empty());
    }
}
