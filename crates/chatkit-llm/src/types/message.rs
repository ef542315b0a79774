use chatkit_types::Role;
use serde::{Deserialize, Serialize};

use super::content::Content;

/// One entry of the outgoing `messages` array: `{role, content}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: Content,
}

impl Message {
    pub fn new(role: Role, content: impl Into<Content>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    /// Create system message
    pub fn system(content: impl Into<Content>) -> Self {
        Self::new(Role::System, content)
    }

    /// Create human message
    pub fn human(content: impl Into<Content>) -> Self {
        Self::new(Role::User, content)
    }

    /// Create AI message with text
    pub fn ai(content: impl Into<Content>) -> Self {
        Self::new(Role::Assistant, content)
    }

    /// Get role as string
    pub fn role(&self) -> &str {
        self.role.as_str()
    }
}
