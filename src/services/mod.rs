// src/services/mod.rs
pub mod agent_client;
pub mod decoder;
pub mod stream_client;
pub mod thread_store;
