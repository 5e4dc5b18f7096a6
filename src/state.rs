// src/state.rs
use std::sync::Arc;

use crate::config::ClientConfig;
use crate::error::Result;
use crate::services::agent_client::AgentClient;
use crate::services::stream_client::StreamClient;
use crate::services::thread_store::ThreadStore;

pub type SharedState = Arc<AppState>;

pub struct AppState {
    pub config: ClientConfig,
    pub agent: AgentClient,
    pub stream: StreamClient,
    pub threads: ThreadStore,
}

impl AppState {
    pub fn new(config: ClientConfig) -> Result<Self> {
        Ok(Self {
            agent: AgentClient::new(config.clone())?,
            stream: StreamClient::new(config.clone())?,
            threads: ThreadStore::new(),
            config,
        })
    }
}
