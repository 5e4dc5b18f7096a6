#![allow(dead_code)]

use std::time::Duration;

use agent_chat_client::{ClientConfig, ClientError, StreamHandler};
use axum::Router;
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;

/// Serve `app` on an ephemeral local port and return its base URL.
pub async fn spawn_backend(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = app.layer(TraceLayer::new_for_http());
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

pub async fn spawn_config(app: Router) -> ClientConfig {
    // trailing slash is stripped by the config
    ClientConfig::new(format!("{}/", spawn_backend(app).await))
}

/// Config for a base URL nothing is listening on.
pub async fn dead_config() -> ClientConfig {
    ClientConfig::new(dead_base_url().await).with_connect_timeout(Duration::from_secs(2))
}

/// A base URL nothing is listening on.
pub async fn dead_base_url() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}", addr)
}

/// Records every callback; optionally cancels after the first chunk.
#[derive(Default)]
pub struct Recorder {
    pub chunks: Vec<String>,
    pub completed: usize,
    pub errors: Vec<ClientError>,
    pub cancel_on_chunk: Option<CancellationToken>,
    pub events_after_terminal: usize,
}

impl Recorder {
    pub fn cancelling(token: CancellationToken) -> Self {
        Self { cancel_on_chunk: Some(token), ..Default::default() }
    }

    pub fn text(&self) -> String {
        self.chunks.concat()
    }

    fn terminated(&self) -> bool {
        self.completed > 0 || !self.errors.is_empty()
    }
}

impl StreamHandler for Recorder {
    fn on_chunk(&mut self, chunk: &str) {
        if self.terminated() {
            self.events_after_terminal += 1;
        }
        self.chunks.push(chunk.to_string());
        if let Some(token) = &self.cancel_on_chunk {
            token.cancel();
        }
    }

    fn on_complete(&mut self) {
        if self.terminated() {
            self.events_after_terminal += 1;
        }
        self.completed += 1;
    }

    fn on_error(&mut self, error: ClientError) {
        if self.terminated() {
            self.events_after_terminal += 1;
        }
        self.errors.push(error);
    }
}
