// src/services/stream_client.rs
use std::pin::Pin;

use bytes::Bytes;
use futures_util::{Stream, StreamExt};
use reqwest::{Client, RequestBuilder};
use tokio_util::sync::CancellationToken;

use crate::{
    config::ClientConfig,
    error::{ClientError, Result},
    message::{ConversationId, CreateMessageInput},
    services::decoder::Utf8StreamDecoder,
};

type BodyStream = Pin<Box<dyn Stream<Item = reqwest::Result<Bytes>> + Send>>;

/// One step of a streamed answer.
#[derive(Debug)]
pub enum StreamEvent {
    Chunk(String),
    Completed,
    Failed(ClientError),
    Cancelled,
}

/// How a streamed call ended. Exactly one per call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamOutcome {
    Completed,
    Failed,
    Cancelled,
}

/// Receiver for a streamed answer.
///
/// `on_chunk` may fire any number of times, always before the single call to
/// `on_complete` or `on_error`. Neither terminal callback fires when the call
/// is cancelled.
pub trait StreamHandler {
    fn on_chunk(&mut self, chunk: &str);
    fn on_complete(&mut self);
    fn on_error(&mut self, error: ClientError);
}

/// Adapts three closures into a [`StreamHandler`].
pub struct Callbacks<C, D, E> {
    on_chunk: C,
    on_complete: D,
    on_error: E,
}

impl<C, D, E> Callbacks<C, D, E>
where
    C: FnMut(&str),
    D: FnMut(),
    E: FnMut(ClientError),
{
    pub fn new(on_chunk: C, on_complete: D, on_error: E) -> Self {
        Self { on_chunk, on_complete, on_error }
    }
}

impl<C, D, E> StreamHandler for Callbacks<C, D, E>
where
    C: FnMut(&str),
    D: FnMut(),
    E: FnMut(ClientError),
{
    fn on_chunk(&mut self, chunk: &str) {
        (self.on_chunk)(chunk)
    }

    fn on_complete(&mut self) {
        (self.on_complete)()
    }

    fn on_error(&mut self, error: ClientError) {
        (self.on_error)(error)
    }
}

/// Streamed message calls against the agent backend.
#[derive(Debug, Clone)]
pub struct StreamClient {
    http: Client,
    config: ClientConfig,
}

impl StreamClient {
    pub fn new(config: ClientConfig) -> Result<Self> {
        let http = Client::builder()
            .connect_timeout(config.connect_timeout)
            .build()?;
        Ok(Self { http, config })
    }

    /// Prepare a streamed answer. Nothing is sent until the first poll.
    pub fn open(
        &self,
        conversation_id: &ConversationId,
        question: &str,
        cancel: CancellationToken,
    ) -> MessageStream {
        let url = self
            .config
            .endpoint(&format!("/conversations/{}/message-stream", conversation_id));
        let request = self.http.post(url).json(&CreateMessageInput::new(question));
        MessageStream {
            conversation_id: conversation_id.clone(),
            state: StreamState::Pending(request),
            cancel,
        }
    }

    /// Stream an answer into `handler`, returning how the call ended.
    pub async fn stream_message<H>(
        &self,
        conversation_id: &ConversationId,
        question: &str,
        cancel: &CancellationToken,
        handler: &mut H,
    ) -> StreamOutcome
    where
        H: StreamHandler + ?Sized,
    {
        let mut stream = self.open(conversation_id, question, cancel.clone());
        loop {
            match stream.next_event().await {
                Some(StreamEvent::Chunk(text)) => handler.on_chunk(&text),
                Some(StreamEvent::Completed) => {
                    handler.on_complete();
                    return StreamOutcome::Completed;
                }
                Some(StreamEvent::Failed(err)) => {
                    handler.on_error(err);
                    return StreamOutcome::Failed;
                }
                Some(StreamEvent::Cancelled) | None => return StreamOutcome::Cancelled,
            }
        }
    }
}

enum StreamState {
    Pending(RequestBuilder),
    Reading {
        body: BodyStream,
        decoder: Utf8StreamDecoder,
    },
    Completing,
    Done,
}

/// A single streamed answer, read lazily.
///
/// Yields chunks in arrival order followed by exactly one terminal event,
/// after which it only returns `None`.
pub struct MessageStream {
    conversation_id: ConversationId,
    state: StreamState,
    cancel: CancellationToken,
}

impl MessageStream {
    /// Wait for the next chunk or the terminal event.
    ///
    /// # Cancel safety
    ///
    /// Not cancel safe. Dropping the returned future before it resolves (for
    /// example as a losing `select!` branch or under `timeout`) abandons the
    /// request: every later call returns `None` and no terminal event is
    /// produced. Stop a stream with its `CancellationToken` instead.
    pub async fn next_event(&mut self) -> Option<StreamEvent> {
        let cancel = self.cancel.clone();
        loop {
            match std::mem::replace(&mut self.state, StreamState::Done) {
                StreamState::Done => return None,
                StreamState::Completing => {
                    tracing::debug!(conversation_id = %self.conversation_id, "stream completed");
                    return Some(StreamEvent::Completed);
                }
                StreamState::Pending(request) => {
                    if cancel.is_cancelled() {
                        return Some(self.cancelled());
                    }
                    tracing::debug!(conversation_id = %self.conversation_id, "opening message stream");

                    let sent = tokio::select! {
                        biased;
                        _ = cancel.cancelled() => None,
                        sent = request.send() => Some(sent),
                    };
                    let response = match sent {
                        None => return Some(self.cancelled()),
                        Some(Err(err)) => return Some(self.fail(ClientError::Transport(err))),
                        Some(Ok(response)) => response,
                    };

                    let status = response.status();
                    if !status.is_success() {
                        return Some(self.fail(ClientError::StreamStatus {
                            status: status.as_u16(),
                        }));
                    }

                    self.state = StreamState::Reading {
                        body: Box::pin(response.bytes_stream()),
                        decoder: Utf8StreamDecoder::new(),
                    };
                }
                StreamState::Reading { mut body, mut decoder } => {
                    let next = tokio::select! {
                        biased;
                        _ = cancel.cancelled() => None,
                        next = body.next() => Some(next),
                    };
                    match next {
                        None => return Some(self.cancelled()),
                        Some(Some(Ok(bytes))) => {
                            let text = decoder.decode(&bytes);
                            self.state = StreamState::Reading { body, decoder };
                            if !text.is_empty() {
                                return Some(StreamEvent::Chunk(text));
                            }
                        }
                        Some(Some(Err(err))) => {
                            return Some(self.fail(ClientError::Transport(err)));
                        }
                        Some(None) => {
                            self.state = StreamState::Completing;
                            let tail = decoder.finish();
                            if !tail.is_empty() {
                                return Some(StreamEvent::Chunk(tail));
                            }
                        }
                    }
                }
            }
        }
    }

    /// View the answer as a sequence of text fragments.
    ///
    /// Completion and cancellation both end the sequence; a failure is
    /// yielded once as `Err` before it ends.
    pub fn into_text_stream(self) -> impl Stream<Item = Result<String>> + Send {
        futures_util::stream::unfold(self, |mut stream| async move {
            match stream.next_event().await? {
                StreamEvent::Chunk(text) => Some((Ok(text), stream)),
                StreamEvent::Failed(err) => Some((Err(err), stream)),
                StreamEvent::Completed | StreamEvent::Cancelled => None,
            }
        })
    }

    pub fn conversation_id(&self) -> &ConversationId {
        &self.conversation_id
    }

    fn cancelled(&self) -> StreamEvent {
        tracing::debug!(conversation_id = %self.conversation_id, "stream cancelled by caller");
        StreamEvent::Cancelled
    }

    // The token decides: a failure seen after cancellation is part of the cancellation.
    fn fail(&self, error: ClientError) -> StreamEvent {
        if self.cancel.is_cancelled() {
            return self.cancelled();
        }
        tracing::warn!(conversation_id = %self.conversation_id, error = %error, "message stream failed");
        StreamEvent::Failed(error)
    }
}
