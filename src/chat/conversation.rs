//! Per-identity conversation history replayed to the completion API.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Ordered message list with a sliding window of at most `limit` entries.
#[derive(Debug, Clone)]
pub struct Conversation {
    messages: VecDeque<Message>,
    limit: usize,
}

impl Conversation {
    pub fn new(limit: usize) -> Self {
        Self {
            messages: VecDeque::new(),
            limit: limit.max(2),
        }
    }

    pub fn messages(&self) -> impl Iterator<Item = &Message> {
        self.messages.iter()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Append one completed exchange, evicting the oldest messages past the limit.
    pub fn push_exchange(&mut self, user: Message, assistant: Message) {
        self.messages.push_back(user);
        self.messages.push_back(assistant);
        self.evict();
    }

    fn evict(&mut self) {
        while self.messages.len() > self.limit {
            self.messages.pop_front();
        }
        // Never open the window on an assistant turn whose prompt was evicted.
        while self
            .messages
            .front()
            .is_some_and(|m| m.role == Role::Assistant)
        {
            self.messages.pop_front();
        }
    }
}

type SharedConversation = Arc<tokio::sync::Mutex<Conversation>>;

struct Slot {
    conversation: SharedConversation,
    last_used: Instant,
}

impl Slot {
    /// A handle is checked out, so a request may still be using this history.
    fn in_use(&self) -> bool {
        Arc::strong_count(&self.conversation) > 1
    }
}

/// Conversations keyed by identity id.
///
/// Each conversation sits behind its own async lock so one identity's
/// in-flight completion never blocks or observes another identity's history.
/// Conversations idle for longer than `idle_ttl` are dropped, and at most
/// `max_sessions` are kept; the least recently used idle one makes room.
pub struct ConversationStore {
    limit: usize,
    idle_ttl: Duration,
    max_sessions: usize,
    sessions: Mutex<HashMap<String, Slot>>,
}

impl ConversationStore {
    pub fn new(limit: usize, idle_ttl: Duration, max_sessions: usize) -> Self {
        Self {
            limit,
            idle_ttl,
            max_sessions: max_sessions.max(1),
            sessions: Mutex::new(HashMap::new()),
        }
    }

    /// Handle to the conversation for `identity`, created empty on first use.
    pub fn session(&self, identity: &str) -> SharedConversation {
        self.session_at(identity, Instant::now())
    }

    fn session_at(&self, identity: &str, now: Instant) -> SharedConversation {
        let mut sessions = self.sessions.lock();
        if let Some(slot) = sessions.get_mut(identity) {
            if slot.in_use() || now.saturating_duration_since(slot.last_used) < self.idle_ttl {
                slot.last_used = now;
                return slot.conversation.clone();
            }
        }

        self.evict(&mut sessions, now);
        let conversation = Arc::new(tokio::sync::Mutex::new(Conversation::new(self.limit)));
        sessions.insert(
            identity.to_string(),
            Slot {
                conversation: conversation.clone(),
                last_used: now,
            },
        );
        conversation
    }

    fn evict(&self, sessions: &mut HashMap<String, Slot>, now: Instant) {
        let before = sessions.len();
        sessions
            .retain(|_, slot| slot.in_use() || now.saturating_duration_since(slot.last_used) < self.idle_ttl);

        while sessions.len() >= self.max_sessions {
            let oldest = sessions
                .iter()
                .filter(|(_, slot)| !slot.in_use())
                .min_by_key(|(_, slot)| slot.last_used)
                .map(|(id, _)| id.clone());
            match oldest {
                Some(id) => {
                    sessions.remove(&id);
                }
                None => break,
            }
        }

        let dropped = before - sessions.len();
        if dropped > 0 {
            tracing::debug!(dropped, remaining = sessions.len(), "evicted idle conversations");
        }
    }

    /// Drop the conversation for `identity`. Returns whether one existed.
    pub fn remove(&self, identity: &str) -> bool {
        self.sessions.lock().remove(identity).is_some()
    }

    pub fn active_sessions(&self) -> usize {
        self.sessions.lock().len()
    }
}
