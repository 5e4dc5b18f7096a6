// src/message.rs
use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque conversation token assigned by the backend.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConversationId(String);

impl ConversationId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ConversationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ConversationId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for ConversationId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Body of both message endpoints.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CreateMessageInput {
    pub question: String,
}

impl CreateMessageInput {
    pub fn new(question: impl Into<String>) -> Self {
        Self { question: question.into() }
    }
}

// Response fields are optional so a missing one is reported by name
// instead of as a serde error.
#[derive(Deserialize)]
pub(crate) struct CreateConversationResponse {
    pub conversation_id: Option<ConversationId>,
}

#[derive(Deserialize)]
pub(crate) struct CreateMessageOutput {
    pub answer: Option<String>,
}

#[derive(Deserialize)]
pub(crate) struct ApiErrorBody {
    pub message: Option<String>,
}
