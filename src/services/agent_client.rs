// src/services/agent_client.rs
use reqwest::{Client, Response, header::CONTENT_TYPE};
use serde::de::DeserializeOwned;

use crate::{
    config::ClientConfig,
    error::{ClientError, Result},
    message::{
        ApiErrorBody, ConversationId, CreateConversationResponse, CreateMessageInput,
        CreateMessageOutput,
    },
};

/// Request/response calls against the agent backend.
#[derive(Debug, Clone)]
pub struct AgentClient {
    http: Client,
    config: ClientConfig,
}

impl AgentClient {
    pub fn new(config: ClientConfig) -> Result<Self> {
        let http = Client::builder()
            .connect_timeout(config.connect_timeout)
            .build()?;
        Ok(Self { http, config })
    }

    /// Create a conversation and return its backend-assigned id.
    pub async fn create_conversation(&self) -> Result<ConversationId> {
        let url = self.config.endpoint("/conversations");
        tracing::debug!(%url, "creating conversation");

        let response = self
            .http
            .post(&url)
            .header(CONTENT_TYPE, "application/json")
            .send()
            .await?;

        let body: CreateConversationResponse = parse_success(response, "conversation_id").await?;
        body.conversation_id
            .ok_or_else(|| malformed("conversation_id"))
    }

    /// Post a question into a conversation and wait for the full answer.
    pub async fn create_message(
        &self,
        conversation_id: &ConversationId,
        input: &CreateMessageInput,
    ) -> Result<String> {
        let url = self
            .config
            .endpoint(&format!("/conversations/{}/message", conversation_id));
        tracing::debug!(%conversation_id, "posting message");

        let response = self.http.post(&url).json(input).send().await?;

        let body: CreateMessageOutput = parse_success(response, "answer").await?;
        body.answer.ok_or_else(|| malformed("answer"))
    }
}

fn malformed(field: &'static str) -> ClientError {
    tracing::warn!(field, "backend response missing expected field");
    ClientError::MalformedResponse { field }
}

// Non-2xx responses become status errors; 2xx bodies that are not the expected
// JSON shape become malformed-response errors naming `field`.
async fn parse_success<T: DeserializeOwned>(response: Response, field: &'static str) -> Result<T> {
    ensure_success(response)
        .await?
        .bytes()
        .await
        .map_err(ClientError::from)
        .and_then(|bytes| serde_json::from_slice(&bytes).map_err(|_| malformed(field)))
}

async fn ensure_success(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    // Best effort: an unreadable or non-JSON error body keeps the generic message.
    let message = match response.bytes().await {
        Ok(bytes) => serde_json::from_slice::<ApiErrorBody>(&bytes)
            .ok()
            .and_then(|body| body.message),
        Err(_) => None,
    };

    tracing::warn!(status = status.as_u16(), message = ?message, "backend request failed");
    Err(ClientError::status(status.as_u16(), message))
}
