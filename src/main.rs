use std::io::Write;
use std::sync::{Arc, Mutex};

use agent_chat_client::{
    ConversationId, CreateMessageInput, StreamEvent,
    config::ClientConfig,
    services::thread_store::Author,
    state::{AppState, SharedState},
};
use anyhow::Context;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

enum Mode {
    Streamed,
    Buffered,
}

/// Token of the answer currently streaming, if any.
#[derive(Clone, Default)]
struct InFlight {
    slot: Arc<Mutex<Option<CancellationToken>>>,
}

impl InFlight {
    fn begin(&self) -> CancellationToken {
        let token = CancellationToken::new();
        if let Ok(mut slot) = self.slot.lock() {
            *slot = Some(token.clone());
        }
        token
    }

    fn end(&self) {
        if let Ok(mut slot) = self.slot.lock() {
            slot.take();
        }
    }

    /// Cancel the answer in flight. Returns false when nothing was streaming.
    fn interrupt(&self) -> bool {
        let current = self.slot.lock().ok().and_then(|mut slot| slot.take());
        match current {
            Some(token) => {
                token.cancel();
                true
            }
            None => false,
        }
    }
}

// Installed once: the first ctrl_c() call replaces the default SIGINT handler for good,
// so an idle Ctrl-C has to exit explicitly.
async fn watch_interrupts(in_flight: InFlight) {
    while tokio::signal::ctrl_c().await.is_ok() {
        if !in_flight.interrupt() {
            println!();
            std::process::exit(130);
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let mode = if std::env::args().any(|arg| arg == "--buffered") {
        Mode::Buffered
    } else {
        Mode::Streamed
    };

    let state: SharedState = Arc::new(AppState::new(ClientConfig::from_env())?);
    println!("Connected to {}", state.config.base_url);

    let mut active = new_conversation(&state)
        .await
        .context("could not create a conversation")?;
    println!("Conversation {active}. Type a message, or /new /list /switch <id> /history /quit");

    let in_flight = InFlight::default();
    tokio::spawn(watch_interrupts(in_flight.clone()));

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let input = line.trim();
        match input.split_once(' ').unwrap_or((input, "")) {
            ("/quit", _) => break,
            ("/new", _) => match new_conversation(&state).await {
                Ok(id) => {
                    println!("Conversation {id}");
                    active = id;
                }
                Err(err) => eprintln!("Request failed: {err}"),
            },
            ("/list", _) => {
                for id in state.threads.conversation_ids().await {
                    let marker = if id == active { "*" } else { " " };
                    println!("{marker} {id}");
                }
            }
            ("/switch", target) if !target.trim().is_empty() => {
                let id = ConversationId::new(target.trim());
                state.threads.open_thread(&id).await;
                println!("Conversation {id}");
                active = id;
            }
            ("/history", _) => print_history(&state, &active).await,
            _ if input.is_empty() => eprintln!("Please enter a message."),
            _ => match mode {
                Mode::Streamed => ask_streamed(&state, &active, input, &in_flight).await,
                Mode::Buffered => ask_buffered(&state, &active, input).await,
            },
        }
    }

    Ok(())
}

async fn new_conversation(state: &AppState) -> agent_chat_client::Result<ConversationId> {
    let id = state.agent.create_conversation().await?;
    state.threads.open_thread(&id).await;
    Ok(id)
}

async fn ask_buffered(state: &AppState, conversation_id: &ConversationId, question: &str) {
    state
        .threads
        .append_message(conversation_id, Author::User, question)
        .await;
    match state
        .agent
        .create_message(conversation_id, &CreateMessageInput::new(question))
        .await
    {
        Ok(answer) => {
            println!("{answer}");
            state
                .threads
                .append_message(conversation_id, Author::Assistant, answer)
                .await;
        }
        Err(err) => eprintln!("Request failed: {err}"),
    }
}

async fn ask_streamed(
    state: &AppState,
    conversation_id: &ConversationId,
    question: &str,
    in_flight: &InFlight,
) {
    state
        .threads
        .append_message(conversation_id, Author::User, question)
        .await;
    let draft = state.threads.begin_draft(conversation_id).await;

    // Ctrl-C cancels the answer in flight, not the session.
    let cancel = in_flight.begin();
    let mut stream = state.stream.open(conversation_id, question, cancel);
    let mut received = false;
    while let Some(event) = stream.next_event().await {
        match event {
            StreamEvent::Chunk(text) => {
                received = true;
                print!("{text}");
                let _ = std::io::stdout().flush();
                state
                    .threads
                    .append_to_draft(conversation_id, &draft, &text)
                    .await;
            }
            StreamEvent::Completed => {
                println!();
                state.threads.finish_draft(conversation_id, &draft).await;
            }
            StreamEvent::Cancelled => {
                if received {
                    println!();
                    state.threads.finish_draft(conversation_id, &draft).await;
                } else {
                    state.threads.discard_draft(conversation_id, &draft).await;
                }
            }
            StreamEvent::Failed(err) => {
                if received {
                    println!();
                }
                eprintln!("Request failed: {err}");
                state.threads.discard_draft(conversation_id, &draft).await;
            }
        }
    }
    in_flight.end();
}

async fn print_history(state: &AppState, conversation_id: &ConversationId) {
    let Some(messages) = state.threads.history(conversation_id).await else {
        println!("(no messages)");
        return;
    };
    if messages.is_empty() {
        println!("(no messages)");
    }
    for message in messages {
        let who = match message.author {
            Author::User => "You",
            Author::Assistant => "AI",
        };
        println!("{who}: {}", message.content);
    }
}
