// OpenAI-compatible chat-completions client

use crate::error::{LlmError, Result};
use crate::streaming::parse_chat_sse_stream;
use crate::traits::{ChatClient, ChatRequest, EventStream};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use std::time::Duration;

/// Chat-completions client (HTTP direct, no SDK)
///
/// The endpoint and credential travel with each request, so one client
/// serves every configured model.
#[derive(Debug, Clone)]
pub struct OpenAIClient {
    http_client: reqwest::Client,
}

impl OpenAIClient {
    /// Create a client without timeouts
    pub fn new() -> Result<Self> {
        Self::builder().build()
    }

    pub fn builder() -> OpenAIClientBuilder {
        OpenAIClientBuilder::default()
    }

    fn request_headers(api_key: Option<&str>) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        if let Some(api_key) = api_key {
            headers.insert(
                AUTHORIZATION,
                HeaderValue::from_str(&format!("Bearer {}", api_key))?,
            );
        }
        Ok(headers)
    }
}

#[derive(Debug, Clone, Default)]
pub struct OpenAIClientBuilder {
    timeout: Option<Duration>,
    connect_timeout: Option<Duration>,
}

impl OpenAIClientBuilder {
    /// Total request timeout, body included. Expiry surfaces as a transport failure.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    pub fn build(self) -> Result<OpenAIClient> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("text/event-stream"));

        let mut builder = reqwest::Client::builder().default_headers(headers);
        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }
        if let Some(timeout) = self.connect_timeout {
            builder = builder.connect_timeout(timeout);
        }

        Ok(OpenAIClient {
            http_client: builder.build()?,
        })
    }
}

#[async_trait]
impl ChatClient for OpenAIClient {
    async fn chat_stream(&self, request: ChatRequest) -> Result<EventStream> {
        let payload = request.body()?;

        tracing::debug!(
            "Opening chat stream: model={}, endpoint={}, messages={}",
            request.model,
            request.endpoint,
            request.messages.len()
        );

        let response = self
            .http_client
            .post(&request.endpoint)
            .headers(Self::request_headers(request.api_key.as_deref())?)
            .json(&payload)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            tracing::warn!("Chat endpoint returned {}: {}", status, body);
            return Err(LlmError::Status { status, body });
        }

        Ok(parse_chat_sse_stream(response.bytes_stream()))
    }
}
