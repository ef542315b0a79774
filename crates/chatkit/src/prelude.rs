//! Prelude module for convenient imports
//!
//! ```rust
//! use chatkit::prelude::*;
//! ```

pub use crate::{
    AttachmentEvent, AttachmentKind, ModelConfig, Role, Turn, TurnId,
    ChatClient, OpenAIClient,
    JsonFileModelStorage, InMemoryModelStorage, ModelRegistry, ModelStorage, SelectionChange,
    ChatSession, ImageTransport, SessionConfig, SessionEvent, StreamOutcome, TemplateRegistry,
};
