use serde::{Deserialize, Serialize};

use crate::templates::TemplateRegistry;

pub const DEFAULT_GREETING: &str = "Hi, how can I help you?";

/// How chart attachments reach the endpoint
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageTransport {
    /// Charts become `image_url` parts
    #[default]
    Native,
    /// Charts go through their text template; bodies are always strings
    Markdown,
}

#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub greeting: Option<String>,
    pub image_transport: ImageTransport,
    pub templates: TemplateRegistry,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            greeting: Some(DEFAULT_GREETING.to_string()),
            image_transport: ImageTransport::default(),
            templates: TemplateRegistry::default(),
        }
    }
}

impl SessionConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_greeting(mut self, greeting: impl Into<String>) -> Self {
        self.greeting = Some(greeting.into());
        self
    }

    pub fn without_greeting(mut self) -> Self {
        self.greeting = None;
        self
    }

    pub fn with_image_transport(mut self, transport: ImageTransport) -> Self {
        self.image_transport = transport;
        self
    }

    pub fn with_templates(mut self, templates: TemplateRegistry) -> Self {
        self.templates = templates;
        self
    }
}
