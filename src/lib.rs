// src/lib.rs
//! Client library for a conversational-agent backend: buffered and streamed
//! message calls plus an in-memory transcript store.
pub mod config;
pub mod error;
pub mod message;
pub mod services;
pub mod state;

pub use config::ClientConfig;
pub use error::{ClientError, Result};
pub use message::{ConversationId, CreateMessageInput};
pub use services::agent_client::AgentClient;
pub use services::stream_client::{
    Callbacks, MessageStream, StreamClient, StreamEvent, StreamHandler, StreamOutcome,
};
