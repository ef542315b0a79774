pub mod types;
pub mod traits;
pub mod error;
pub mod streaming;
pub mod buffer_utils;
pub mod openai;

pub use traits::{ChatClient, ChatRequest, EventStream};
pub use error::{LlmError, Result};
pub use streaming::{parse_chat_sse_stream, ChatStreamChunk, StreamEvent};
pub use buffer_utils::CircularLineBuffer;
pub use openai::{OpenAIClient, OpenAIClientBuilder};
pub use types::{Content, ContentPart, ImageUrl, Message};
