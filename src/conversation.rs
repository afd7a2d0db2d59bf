//! Per-chat conversation history kept in memory.
//!
//! Each chat owns an ordered [`ConversationLog`] that starts with a single
//! system turn. The log is bounded: once it grows past [`MAX_TURNS`] entries
//! the oldest non-system turns are discarded. Nothing survives a restart.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use teloxide::types::ChatId;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// Maximum number of turns kept in a log, including the system turn.
pub const MAX_TURNS: usize = 12;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Role {
    System,
    User,
    Assistant,
}

/// A single message of a conversation. Immutable once created.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConversationTurn {
    role: Role,
    content: String,
}

impl ConversationTurn {
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: Role::System, content: content.into() }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self { role: Role::User, content: content.into() }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self { role: Role::Assistant, content: content.into() }
    }

    pub const fn role(&self) -> Role {
        self.role
    }

    pub fn content(&self) -> &str {
        &self.content
    }
}

#[derive(Clone, Debug, Default)]
pub struct ConversationLog {
    turns: Vec<ConversationTurn>,
}

impl ConversationLog {
    pub fn seeded(system_prompt: impl Into<String>) -> Self {
        Self { turns: vec![ConversationTurn::system(system_prompt)] }
    }

    /// Append a turn, then drop the oldest turns after the first one until
    /// the log fits into [`MAX_TURNS`].
    pub fn push(&mut self, turn: ConversationTurn) {
        self.turns.push(turn);
        if self.turns.len() > MAX_TURNS {
            let excess = self.turns.len() - MAX_TURNS;
            self.turns.drain(1..=excess);
        }
    }

    pub fn turns(&self) -> &[ConversationTurn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    fn clear(&mut self) {
        self.turns.clear();
    }
}

/// The system prompt every new conversation starts with.
pub fn system_prompt(model_name: &str) -> String {
    format!(
        "You are OpenRouter AI assistant using {model_name}. Provide helpful, \
         accurate responses in a friendly manner. When providing code \
         examples, use proper markdown code blocks with language \
         specification. Format: ```language\ncode\n```"
    )
}

/// Conversation logs of all chats, one lock per chat.
pub struct ConversationStore {
    system_prompt: String,
    chats: Mutex<HashMap<ChatId, Arc<AsyncMutex<ConversationLog>>>>,
}

impl ConversationStore {
    pub fn new(system_prompt: String) -> Self {
        Self { system_prompt, chats: Mutex::new(HashMap::new()) }
    }

    fn slot(&self, chat_id: ChatId) -> Arc<AsyncMutex<ConversationLog>> {
        let mut chats =
            self.chats.lock().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(chats.entry(chat_id).or_default())
    }

    /// Lock the log of a chat for exclusive use, seeding it with the system
    /// turn if it is empty. The lock is held until the guard is dropped.
    pub async fn session(
        &self,
        chat_id: ChatId,
    ) -> OwnedMutexGuard<ConversationLog> {
        let mut log = self.slot(chat_id).lock_owned().await;
        if log.is_empty() {
            *log = ConversationLog::seeded(self.system_prompt.as_str());
        }
        log
    }

    pub async fn append(&self, chat_id: ChatId, turn: ConversationTurn) {
        self.session(chat_id).await.push(turn);
    }

    pub async fn reset(&self, chat_id: ChatId) {
        self.slot(chat_id).lock().await.clear();
    }

    /// Snapshot of the log of a chat. Empty if the chat has no history.
    pub async fn get(&self, chat_id: ChatId) -> Vec<ConversationTurn> {
        let slot = {
            let chats =
                self.chats.lock().unwrap_or_else(PoisonError::into_inner);
            chats.get(&chat_id).map(Arc::clone)
        };
        match slot {
            Some(slot) => slot.lock().await.turns().to_vec(),
            None => Vec::new(),
        }
    }
}
