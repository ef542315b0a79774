use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use uuid::Uuid;

/// Kind of payload carried by an attachment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttachmentKind {
    /// Source text, `metadata.language` names the language
    Code,
    /// Image URI (usually a `data:` URI)
    Chart,
    /// HTML or plain-text table
    Table,
}

impl AttachmentKind {
    pub const ALL: [AttachmentKind; 3] = [Self::Code, Self::Chart, Self::Table];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Code => "code",
            Self::Chart => "chart",
            Self::Table => "table",
        }
    }
}

impl fmt::Display for AttachmentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Attachment identifier.
///
/// Either assigned by the host (hosts send strings or numbers, both are accepted)
/// or generated locally.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct AttachmentId(String);

impl AttachmentId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AttachmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AttachmentId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for AttachmentId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl<'de> Deserialize<'de> for AttachmentId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawId {
            Text(String),
            Integer(i64),
            Float(f64),
        }

        Ok(match RawId::deserialize(deserializer)? {
            RawId::Text(s) => Self(s),
            RawId::Integer(n) => Self(n.to_string()),
            RawId::Float(n) => Self(n.to_string()),
        })
    }
}

/// The host-side output an attachment was captured from; used to group pending attachments
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputRef {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

impl OutputRef {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: None,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }
}

/// Notification delivered by the host environment when it produces an attachment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttachmentEvent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<AttachmentId>,
    #[serde(rename = "type")]
    pub kind: AttachmentKind,
    pub data: String,
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<OutputRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initial_message: Option<String>,
}

impl AttachmentEvent {
    pub fn new(kind: AttachmentKind, data: impl Into<String>) -> Self {
        Self {
            id: None,
            kind,
            data: data.into(),
            metadata: BTreeMap::new(),
            output: None,
            initial_message: None,
        }
    }

    pub fn with_id(mut self, id: impl Into<AttachmentId>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    pub fn with_output(mut self, output: OutputRef) -> Self {
        self.output = Some(output);
        self
    }

    pub fn with_initial_message(mut self, message: impl Into<String>) -> Self {
        self.initial_message = Some(message.into());
        self
    }
}

/// A typed payload pending for, or frozen into, a user turn
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    pub id: AttachmentId,
    #[serde(rename = "type")]
    pub kind: AttachmentKind,
    pub data: String,
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<OutputRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initial_message: Option<String>,
}

impl Attachment {
    pub fn new(kind: AttachmentKind, data: impl Into<String>) -> Self {
        Self::from_event(AttachmentEvent::new(kind, data))
    }

    /// Build an attachment from a host event, generating an id when the host sent none
    pub fn from_event(event: AttachmentEvent) -> Self {
        Self {
            id: event.id.unwrap_or_else(AttachmentId::generate),
            kind: event.kind,
            data: event.data,
            metadata: event.metadata,
            output: event.output,
            initial_message: event.initial_message,
        }
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Metadata value for `key`, empty when absent
    pub fn metadata_value(&self, key: &str) -> &str {
        self.metadata.get(key).map(String::as_str).unwrap_or("")
    }

    /// Display title: `metadata.title`, falling back to the kind name
    pub fn title(&self) -> &str {
        match self.metadata.get("title") {
            Some(title) if !title.is_empty() => title,
            _ => self.kind.as_str(),
        }
    }
}
