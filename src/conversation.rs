//! In-memory conversation history keyed by (conversation id, provider).
//!
//! Histories live for the process lifetime. `get` hands out owned copies, so
//! two keys never share a buffer. The read-append-set cycle done by callers is
//! not atomic: two concurrent requests on the same key can lose an update.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use chrono::Utc;

use crate::providers::{ChatMessage, Role};

type Key = (String, String);

/// Per-(conversation, provider) message history.
pub struct ConversationStore {
    histories: Mutex<HashMap<Key, Vec<ChatMessage>>>,
    /// Newest messages kept on `set`; `None` keeps everything.
    limit: Option<usize>,
}

impl ConversationStore {
    pub fn new(limit: Option<usize>) -> Self {
        Self {
            histories: Mutex::new(HashMap::new()),
            limit,
        }
    }

    /// Generate a time-based conversation id.
    pub fn new_conversation_id() -> String {
        format!("conv-{}", Utc::now().timestamp_millis())
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<Key, Vec<ChatMessage>>> {
        self.histories
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// History for the key, oldest first. Empty when nothing was stored.
    pub fn get(&self, conversation_id: &str, provider: &str) -> Vec<ChatMessage> {
        self.lock()
            .get(&(conversation_id.to_string(), provider.to_string()))
            .cloned()
            .unwrap_or_default()
    }

    /// Replace the stored history for the key.
    ///
    /// With a limit, the oldest messages go first and the kept window always
    /// opens on a user turn.
    pub fn set(&self, conversation_id: &str, provider: &str, mut history: Vec<ChatMessage>) {
        if let Some(limit) = self.limit {
            if history.len() > limit {
                history.drain(..history.len() - limit);
                let first_user = history
                    .iter()
                    .position(|m| m.role == Role::User)
                    .unwrap_or(history.len());
                history.drain(..first_user);
            }
        }
        self.lock()
            .insert((conversation_id.to_string(), provider.to_string()), history);
    }
}

impl Default for ConversationStore {
    fn default() -> Self {
        Self::new(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_history_is_empty() {
        let store = ConversationStore::default();
        assert!(store.get("c1", "gemini").is_empty());
    }

    #[test]
    fn test_providers_do_not_share_history() {
        let store = ConversationStore::default();
        store.set("c1", "gemini", vec![ChatMessage::user("hi gemini")]);
        store.set("c1", "openai", vec![ChatMessage::user("hi openai")]);

        let mut gemini = store.get("c1", "gemini");
        gemini.push(ChatMessage::assistant("hello"));

        assert_eq!(store.get("c1", "gemini").len(), 1);
        assert_eq!(store.get("c1", "openai")[0].content, "hi openai");
    }

    #[test]
    fn test_limit_keeps_newest() {
        let store = ConversationStore::new(Some(2));
        store.set(
            "c1",
            "claude",
            vec![
                ChatMessage::user("one"),
                ChatMessage::assistant("two"),
                ChatMessage::user("three"),
                ChatMessage::assistant("four"),
            ],
        );

        let history = store.get("c1", "claude");
        assert_eq!(history, vec![ChatMessage::user("three"), ChatMessage::assistant("four")]);
    }

    #[test]
    fn test_odd_limit_never_starts_on_assistant() {
        let store = ConversationStore::new(Some(3));

        for turn in 1..=3 {
            let mut history = store.get("c1", "claude");
            history.push(ChatMessage::user(format!("q{turn}")));
            history.push(ChatMessage::assistant(format!("a{turn}")));
            store.set("c1", "claude", history);

            let stored = store.get("c1", "claude");
            assert_eq!(stored[0].role, Role::User, "turn {turn}: {stored:?}");
            assert!(stored.len() <= 3);
        }

        assert_eq!(
            store.get("c1", "claude"),
            vec![ChatMessage::user("q3"), ChatMessage::assistant("a3")]
        );
    }

    #[test]
    fn test_conversation_id_format() {
        assert!(ConversationStore::new_conversation_id().starts_with("conv-"));
    }
}
