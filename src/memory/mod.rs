//! Conversation memory for agent context.
//!
//! This module provides:
//! - [`SessionStore`], an in-memory LRU of session histories
//! - helpers for building the [`AgentContext`] handed to agents
//!
//! Nothing is persisted; a restart starts every session fresh.

use crate::types::{AgentContext, Message};
use lru::LruCache;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::num::NonZeroUsize;

/// Default number of recent messages to include in context.
pub const DEFAULT_HISTORY_WINDOW: usize = 10;

/// Messages retained per session, regardless of the context window.
pub const MAX_MESSAGES_PER_SESSION: usize = 100;

/// Truncates conversation history to the most recent messages.
///
/// # Arguments
/// * `history` - Full conversation history
/// * `window_size` - Maximum number of messages to keep
pub fn truncate_history(history: &[Message], window_size: usize) -> Vec<Message> {
    if history.len() <= window_size {
        history.to_vec()
    } else {
        history[history.len() - window_size..].to_vec()
    }
}

/// Builds an agent context from a session history.
///
/// `history_window` defaults to [`DEFAULT_HISTORY_WINDOW`].
pub fn build_context(history: Vec<Message>, history_window: Option<usize>) -> AgentContext {
    let window = history_window.unwrap_or(DEFAULT_HISTORY_WINDOW);

    AgentContext {
        conversation_history: truncate_history(&history, window),
        ..Default::default()
    }
}

/// Session id → bounded message history, least recently used sessions evicted first
pub struct SessionStore {
    sessions: Mutex<LruCache<String, VecDeque<Message>>>,
}

impl SessionStore {
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            sessions: Mutex::new(LruCache::new(capacity)),
        }
    }

    /// Append messages to a session, creating it if needed
    pub fn append(&self, session_id: &str, messages: impl IntoIterator<Item = Message>) {
        let mut sessions = self.sessions.lock();
        let history = sessions.get_or_insert_mut(session_id.to_string(), VecDeque::new);
        for message in messages {
            if history.len() == MAX_MESSAGES_PER_SESSION {
                history.pop_front();
            }
            history.push_back(message);
        }
    }

    /// The last `limit` messages of a session, oldest first
    pub fn history(&self, session_id: &str, limit: usize) -> Vec<Message> {
        let mut sessions = self.sessions.lock();
        match sessions.get(session_id) {
            Some(history) => {
                let skip = history.len().saturating_sub(limit);
                history.iter().skip(skip).cloned().collect()
            }
            None => Vec::new(),
        }
    }

    pub fn clear(&self, session_id: &str) {
        self.sessions.lock().pop(session_id);
    }

    /// Number of live sessions
    pub fn len(&self) -> usize {
        self.sessions.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
