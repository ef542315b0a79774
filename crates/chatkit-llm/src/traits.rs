use crate::error::Result;
use crate::streaming::StreamEvent;
use crate::types::Message;
use async_trait::async_trait;
use chatkit_types::ModelConfig;
use futures::Stream;
use serde_json::Value;
use std::pin::Pin;

/// Decoded incremental response
pub type EventStream = Pin<Box<dyn Stream<Item = Result<StreamEvent>> + Send>>;

/// Trait for streaming chat-completions endpoints
///
/// Dropping the returned stream aborts the underlying transfer.
#[async_trait]
pub trait ChatClient: Send + Sync {
    /// Open a streaming chat completion
    async fn chat_stream(&self, request: ChatRequest) -> Result<EventStream>;
}

#[derive(Debug, Clone)]
pub struct ChatRequest {
    pub endpoint: String,
    pub api_key: Option<String>,
    pub model: String,
    pub messages: Vec<Message>,
}

impl ChatRequest {
    pub fn new(
        endpoint: impl Into<String>,
        model: impl Into<String>,
        messages: Vec<Message>,
    ) -> Self {
        Self {
            endpoint: endpoint.into(),
            api_key: None,
            model: model.into(),
            messages,
        }
    }

    /// Request against a configured model: its endpoint, name and credential
    pub fn for_model(model: &ModelConfig, messages: Vec<Message>) -> Self {
        Self {
            endpoint: model.endpoint.clone(),
            api_key: model.api_key.clone(),
            model: model.name.clone(),
            messages,
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Request body: `{messages, stream: true, model}`
    pub fn body(&self) -> Result<Value> {
        Ok(serde_json::json!({
            "messages": serde_json::to_value(&self.messages)?,
            "stream": true,
            "model": self.model,
        }))
    }
}
