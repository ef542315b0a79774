use futures::Stream;
use serde::{Deserialize, Serialize};
use std::fmt::Display;

use crate::buffer_utils::{parse_sse_stream, SseLineParser};
use crate::traits::EventStream;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamEvent {
    /// Incremental assistant text (`choices[0].delta.content`)
    Message {
        content: String,
    },

    Done {
        #[serde(skip_serializing_if = "Option::is_none")]
        finish_reason: Option<String>,
    },
}

/// One `data:` frame of a chat-completions stream.
///
/// Parsing is best-effort: every field is optional so that compatible
/// servers which omit bookkeeping fields still decode.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChatStreamChunk {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub choices: Vec<StreamChoice>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StreamChoice {
    #[serde(default)]
    pub index: u32,
    #[serde(default)]
    pub delta: Delta,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Delta {
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
}

impl ChatStreamChunk {
    pub fn content(&self) -> Option<&str> {
        self.choices
            .first()
            .and_then(|c| c.delta.content.as_deref())
    }

    pub fn finish_reason(&self) -> Option<&str> {
        self.choices
            .first()
            .and_then(|c| c.finish_reason.as_deref())
    }

    fn to_stream_events(&self) -> Vec<StreamEvent> {
        if let Some(error) = &self.error {
            tracing::warn!("Stream frame carried an error object: {}", error);
        }

        match self.content() {
            Some(content) if !content.is_empty() => vec![StreamEvent::Message {
                content: content.to_string(),
            }],
            _ => Vec::new(),
        }
    }
}

/// Parser for chat-completions `data:` payloads
pub struct ChatChunkParser;

impl SseLineParser for ChatChunkParser {
    fn parse_data_line(&self, data: &str) -> Result<Vec<StreamEvent>, serde_json::Error> {
        let chunk: ChatStreamChunk = serde_json::from_str(data)?;
        if let Some(reason) = chunk.finish_reason() {
            tracing::debug!("Stream choice finished: {}", reason);
        }
        Ok(chunk.to_stream_events())
    }
}

/// Decode a chunked chat-completions body into stream events
pub fn parse_chat_sse_stream<S, B, E>(body: S) -> EventStream
where
    S: Stream<Item = Result<B, E>> + Send + 'static,
    B: AsRef<[u8]> + Send + 'static,
    E: Display + Send + 'static,
{
    parse_sse_stream(body, ChatChunkParser)
}
