// src/services/thread_store.rs
use std::{
    collections::HashMap,
    fmt::Debug,
    sync::Arc,
    time::Instant,
};

use tokio::sync::RwLock;
use uuid::Uuid;

use crate::message::ConversationId;

pub type MessageId = String;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Author {
    User,
    Assistant,
}

#[derive(Clone, Debug)]
pub struct Message {
    pub id: MessageId,
    pub author: Author,
    pub content: String,
    pub created_at: Instant,
    pub is_draft: bool,
}

impl Message {
    fn new(author: Author, content: impl Into<String>, is_draft: bool) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            author,
            content: content.into(),
            created_at: Instant::now(),
            is_draft,
        }
    }
}

#[derive(Clone, Debug)]
pub struct Thread {
    pub id: ConversationId,
    pub messages: Vec<Message>,
    pub updated_at: Instant,
}

impl Thread {
    pub fn new(id: ConversationId) -> Self {
        Self { id, messages: Vec::new(), updated_at: Instant::now() }
    }

    fn draft_mut(&mut self, message_id: &str) -> Option<&mut Message> {
        self.messages
            .iter_mut()
            .find(|m| m.id == message_id && m.is_draft)
    }
}

/// In-memory transcripts for the conversations opened in this process.
#[derive(Clone, Default)]
pub struct ThreadStore {
    inner: Arc<RwLock<HashMap<ConversationId, Thread>>>,
}

impl Debug for ThreadStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ThreadStore").finish_non_exhaustive()
    }
}

impl ThreadStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ensure a thread exists for this conversation. Returns true if it was created.
    pub async fn open_thread(&self, id: &ConversationId) -> bool {
        {
            let guard = self.inner.read().await;
            if guard.contains_key(id) {
                return false;
            }
        }
        let mut guard = self.inner.write().await;
        if guard.contains_key(id) {
            return false;
        }
        guard.insert(id.clone(), Thread::new(id.clone()));
        true
    }

    /// Append a finished message and touch updated_at.
    pub async fn append_message(
        &self,
        id: &ConversationId,
        author: Author,
        content: impl Into<String>,
    ) -> MessageId {
        self.push(id, Message::new(author, content, false)).await
    }

    /// Append an empty assistant placeholder to be filled by streamed chunks.
    pub async fn begin_draft(&self, id: &ConversationId) -> MessageId {
        self.push(id, Message::new(Author::Assistant, String::new(), true)).await
    }

    pub async fn append_to_draft(&self, id: &ConversationId, message_id: &str, delta: &str) -> bool {
        let mut guard = self.inner.write().await;
        match guard.get_mut(id).and_then(|t| t.draft_mut(message_id)) {
            Some(draft) => {
                draft.content.push_str(delta);
                true
            }
            None => false,
        }
    }

    /// Mark a draft as a finished message.
    pub async fn finish_draft(&self, id: &ConversationId, message_id: &str) -> bool {
        let mut guard = self.inner.write().await;
        let Some(thread) = guard.get_mut(id) else {
            return false;
        };
        match thread.draft_mut(message_id) {
            Some(draft) => {
                draft.is_draft = false;
                draft.created_at = Instant::now();
                thread.updated_at = Instant::now();
                true
            }
            None => false,
        }
    }

    /// Drop a draft placeholder.
    pub async fn discard_draft(&self, id: &ConversationId, message_id: &str) -> bool {
        let mut guard = self.inner.write().await;
        let Some(thread) = guard.get_mut(id) else {
            return false;
        };
        let before = thread.messages.len();
        thread.messages.retain(|m| !(m.id == message_id && m.is_draft));
        before != thread.messages.len()
    }

    /// Get a copy of the thread's messages
    pub async fn history(&self, id: &ConversationId) -> Option<Vec<Message>> {
        let guard = self.inner.read().await;
        guard.get(id).map(|t| t.messages.clone())
    }

    pub async fn remove_thread(&self, id: &ConversationId) -> bool {
        let mut guard = self.inner.write().await;
        guard.remove(id).is_some()
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_empty()
    }

    /// Conversation ids, most recently updated first.
    pub async fn conversation_ids(&self) -> Vec<ConversationId> {
        let guard = self.inner.read().await;
        let mut threads: Vec<&Thread> = guard.values().collect();
        threads.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        threads.into_iter().map(|t| t.id.clone()).collect()
    }

    async fn push(&self, id: &ConversationId, message: Message) -> MessageId {
        let mut guard = self.inner.write().await;
        let thread = guard
            .entry(id.clone())
            .or_insert_with(|| Thread::new(id.clone()));
        let message_id = message.id.clone();
        thread.messages.push(message);
        thread.updated_at = Instant::now();
        message_id
    }
}
