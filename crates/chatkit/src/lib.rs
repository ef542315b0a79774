//! # Chatkit
//!
//! Streaming chat sessions against OpenAI-compatible chat-completions endpoints.
//!
//! ## Overview
//!
//! - **Stream replies** into an assistant turn as server-sent events arrive
//! - **Attach code, charts and tables** from a host application, rendered
//!   through per-kind templates (charts can travel as native image parts)
//! - **Stop** a running stream at any time without leaving an error behind
//! - **Remember models** (name, endpoint, optional key) and the selected one
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use chatkit::prelude::*;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let storage = Arc::new(JsonFileModelStorage::default_location()?);
//!     let mut registry = ModelRegistry::load(storage).await?;
//!     registry
//!         .add(ModelConfig::new("gpt-4o", "https://api.openai.com/v1/chat/completions")
//!             .with_api_key(std::env::var("OPENAI_API_KEY")?))
//!         .await?;
//!
//!     let client = Arc::new(OpenAIClient::new()?);
//!     let session = ChatSession::new(client, SessionConfig::default());
//!
//!     session.receive_attachment(
//!         AttachmentEvent::new(AttachmentKind::Code, "print(1)")
//!             .with_metadata("language", "python"),
//!     );
//!
//!     match session.send("What does this print?", registry.selected()).await? {
//!         StreamOutcome::Completed => {
//!             if let Some(turn) = session.turns().last() {
//!                 println!("{}", turn.content);
//!             }
//!         }
//!         StreamOutcome::Aborted => println!("stopped"),
//!         StreamOutcome::Failed { message } => eprintln!("{}", message),
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! - **`chatkit-types`**: turns, attachments and model configuration
//! - **`chatkit-llm`**: wire types, the SSE decoder and the HTTP client
//! - **`chatkit-persist`**: model registry and its storage backends
//! - **`chatkit-session`**: transcript, attachment intake, formatting and the
//!   streaming engine
//!
//! ## License
//!
//! MIT

pub mod prelude;

pub use chatkit_types::{
    Attachment, AttachmentEvent, AttachmentId, AttachmentKind, ModelConfig, ModelId, OutputRef,
    Role, Turn, TurnId,
};

pub use chatkit_llm::{
    parse_chat_sse_stream, ChatClient, ChatRequest, Content, ContentPart, EventStream, LlmError,
    Message, OpenAIClient, OpenAIClientBuilder, StreamEvent,
};

pub use chatkit_persist::{
    InMemoryModelStorage, JsonFileModelStorage, ModelRegistry, ModelStorage, SelectionChange,
    StorageError,
};

pub use chatkit_session::{
    AttachmentGroup, CancelHandle, ChatSession, EnqueueOutcome, Formatter, GroupKey,
    ImageTransport, IntakeQueue, SessionConfig, SessionError, SessionEvent, StreamOutcome, TemplateRegistry,
    Transcript,
};
