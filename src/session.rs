//! Bounded per-session conversation history.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: String,
    pub content: String,
}

#[derive(Default)]
struct Sessions {
    counter: u64,
    history: HashMap<String, Vec<Message>>,
}

/// Keeps the last `max_history` question/answer exchanges of every session.
pub struct SessionManager {
    max_history: usize,
    inner: Mutex<Sessions>,
}

impl SessionManager {
    pub fn new(max_history: usize) -> Self {
        Self {
            max_history,
            inner: Mutex::new(Sessions::default()),
        }
    }

    fn sessions(&self) -> MutexGuard<'_, Sessions> {
        // History is append-only; a poisoned lock still holds consistent data.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Start a new, empty session and return its id.
    pub fn create_session(&self) -> String {
        let mut sessions = self.sessions();
        sessions.counter += 1;
        let id = format!("session_{}", sessions.counter);
        sessions.history.insert(id.clone(), Vec::new());
        debug!("Created {}", id);
        id
    }

    /// Append a message, creating the session if it is unknown.
    pub fn add_message(&self, session_id: &str, role: &str, content: &str) {
        let limit = self.max_history * 2;
        let mut sessions = self.sessions();
        let messages = sessions.history.entry(session_id.to_string()).or_default();

        messages.push(Message {
            role: role.to_string(),
            content: content.to_string(),
        });

        if messages.len() > limit {
            let excess = messages.len() - limit;
            messages.drain(..excess);
        }
    }

    pub fn add_exchange(&self, session_id: &str, query: &str, answer: &str) {
        self.add_message(session_id, "user", query);
        self.add_message(session_id, "assistant", answer);
    }

    /// Formatted history, or `None` for an unknown or empty session.
    pub fn get_conversation_history(&self, session_id: &str) -> Option<String> {
        let sessions = self.sessions();
        let messages = sessions.history.get(session_id)?;
        if messages.is_empty() {
            return None;
        }

        Some(
            messages
                .iter()
                .map(|m| format!("{}: {}", capitalize(&m.role), m.content))
                .collect::<Vec<_>>()
                .join("\n"),
        )
    }

    pub fn clear_session(&self, session_id: &str) {
        if let Some(messages) = self.sessions().history.get_mut(session_id) {
            messages.clear();
        }
    }

    pub fn session_count(&self) -> usize {
        self.sessions().history.len()
    }
}

fn capitalize(role: &str) -> String {
    let mut chars = role.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_session_ids_increment() {
        let manager = SessionManager::new(2);
        assert_eq!(manager.create_session(), "session_1");
        assert_eq!(manager.create_session(), "session_2");
        assert_eq!(manager.session_count(), 2);
    }

    #[test]
    fn test_history_format() {
        let manager = SessionManager::new(2);
        let id = manager.create_session();
        assert_eq!(manager.get_conversation_history(&id), None);

        manager.add_exchange(&id, "What is AI?", "Artificial intelligence.");
        assert_eq!(
            manager.get_conversation_history(&id).as_deref(),
            Some("User: What is AI?\nAssistant: Artificial intelligence.")
        );
    }

    #[test]
    fn test_history_is_bounded() {
        let manager = SessionManager::new(2);
        let id = manager.create_session();
        for i in 1..=3 {
            manager.add_exchange(&id, &format!("q{}", i), &format!("a{}", i));
        }

        assert_eq!(
            manager.get_conversation_history(&id).as_deref(),
            Some("User: q2\nAssistant: a2\nUser: q3\nAssistant: a3")
        );
    }

    #[test]
    fn test_unknown_session_is_created_on_write() {
        let manager = SessionManager::new(1);
        assert_eq!(manager.get_conversation_history("external-id"), None);

        manager.add_exchange("external-id", "hi", "hello");
        assert!(manager.get_conversation_history("external-id").is_some());
    }

    #[test]
    fn test_clear_session() {
        let manager = SessionManager::new(2);
        let id = manager.create_session();
        manager.add_exchange(&id, "q", "a");
        manager.clear_session(&id);
        assert_eq!(manager.get_conversation_history(&id), None);
    }
}
