use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Identity of a model configuration: `"{name}-{endpoint}"`.
///
/// Renaming either field changes the identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModelId(String);

impl ModelId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ModelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ModelId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// An OpenAI-compatible chat-completions endpoint and the model name to request from it
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelConfig {
    pub name: String,
    pub endpoint: String,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "non_empty_secret"
    )]
    pub api_key: Option<String>,
}

impl ModelConfig {
    pub fn new(name: impl Into<String>, endpoint: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            endpoint: endpoint.into(),
            api_key: None,
        }
    }

    /// Set the bearer credential. An empty key means "no credential".
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        let api_key = api_key.into();
        self.api_key = (!api_key.is_empty()).then_some(api_key);
        self
    }

    pub fn id(&self) -> ModelId {
        ModelId(format!("{}-{}", self.name, self.endpoint))
    }
}

impl fmt::Debug for ModelConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelConfig")
            .field("name", &self.name)
            .field("endpoint", &self.endpoint)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

fn non_empty_secret<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    let value: Option<String> = Option::deserialize(deserializer)?;
    Ok(value.filter(|s| !s.is_empty()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_id_format() {
        let model = ModelConfig::new("gpt-4o", "https://api.openai.com/v1/chat/completions");
        assert_eq!(
            model.id().as_str(),
            "gpt-4o-https://api.openai.com/v1/chat/completions"
        );
    }

    #[test]
    fn test_identity_ignores_credential() {
        let a = ModelConfig::new("m", "http://localhost").with_api_key("one");
        let b = ModelConfig::new("m", "http://localhost").with_api_key("two");
        assert_eq!(a.id(), b.id());
        assert_ne!(a, b);
    }

    #[test]
    fn test_empty_api_key_is_absent() {
        let json = r#"{"name": "m", "endpoint": "http://localhost", "apiKey": ""}"#;
        let model: ModelConfig = serde_json::from_str(json).unwrap();
        assert_eq!(model.api_key, None);

        let model = ModelConfig::new("m", "http://localhost").with_api_key("");
        assert_eq!(model.api_key, None);
    }

    #[test]
    fn test_debug_redacts_api_key() {
        let model = ModelConfig::new("m", "http://localhost").with_api_key("sk-secret");
        let debug = format!("{:?}", model);
        assert!(!debug.contains("sk-secret"));
        assert!(debug.contains("<redacted>"));
    }
}
