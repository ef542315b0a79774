use chatkit_types::{Attachment, AttachmentEvent, AttachmentId};

pub const DEFAULT_GROUP_TITLE: &str = "Attachments";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnqueueOutcome {
    Queued {
        id: AttachmentId,
        /// Suggested draft text, offered only for the first item of an empty queue
        prefill: Option<String>,
    },
    /// An item with this id is already queued; nothing changed
    Duplicate { id: AttachmentId },
}

/// Which display group a pending attachment belongs to
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum GroupKey {
    /// Attachments from the host output with this id
    Output(String),
    /// Attachments that carry no output reference
    Ungrouped,
}

impl GroupKey {
    pub fn output(id: impl Into<String>) -> Self {
        Self::Output(id.into())
    }

    pub fn of(attachment: &Attachment) -> Self {
        match &attachment.output {
            Some(output) => Self::Output(output.id.clone()),
            None => Self::Ungrouped,
        }
    }

    fn matches(&self, attachment: &Attachment) -> bool {
        match (self, &attachment.output) {
            (Self::Output(id), Some(output)) => &output.id == id,
            (Self::Ungrouped, None) => true,
            _ => false,
        }
    }
}

/// Pending attachments sharing an output id, for display
#[derive(Debug, Clone, PartialEq)]
pub struct AttachmentGroup {
    pub key: GroupKey,
    pub title: String,
    pub items: Vec<Attachment>,
}

/// Attachments received from the host and not yet sent
#[derive(Debug, Clone, Default)]
pub struct IntakeQueue {
    items: Vec<Attachment>,
}

impl IntakeQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enqueue(&mut self, event: AttachmentEvent) -> EnqueueOutcome {
        if let Some(id) = &event.id {
            if self.contains(id) {
                tracing::warn!("Dropping duplicate attachment {}", id.as_str());
                return EnqueueOutcome::Duplicate { id: id.clone() };
            }
        }

        let was_empty = self.items.is_empty();
        let attachment = Attachment::from_event(event);
        let id = attachment.id.clone();
        let prefill = if was_empty {
            attachment.initial_message.clone().filter(|m| !m.is_empty())
        } else {
            None
        };

        tracing::debug!(
            "Queued {} attachment {} ({} pending)",
            attachment.kind,
            id.as_str(),
            self.items.len() + 1
        );
        self.items.push(attachment);

        EnqueueOutcome::Queued { id, prefill }
    }

    pub fn contains(&self, id: &AttachmentId) -> bool {
        self.items.iter().any(|a| &a.id == id)
    }

    pub fn items(&self) -> &[Attachment] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn remove(&mut self, id: &AttachmentId) -> Option<Attachment> {
        let index = self.items.iter().position(|a| &a.id == id)?;
        Some(self.items.remove(index))
    }

    /// Remove every item of a group, returning them in queue order
    pub fn remove_group(&mut self, key: &GroupKey) -> Vec<Attachment> {
        let (removed, kept): (Vec<Attachment>, Vec<Attachment>) = std::mem::take(&mut self.items)
            .into_iter()
            .partition(|a| key.matches(a));
        self.items = kept;
        removed
    }

    /// Items grouped by output id, groups in order of first appearance
    pub fn groups(&self) -> Vec<AttachmentGroup> {
        let mut groups: Vec<AttachmentGroup> = Vec::new();
        for attachment in &self.items {
            match groups.iter_mut().find(|g| g.key.matches(attachment)) {
                Some(group) => group.items.push(attachment.clone()),
                None => groups.push(AttachmentGroup {
                    key: GroupKey::of(attachment),
                    title: group_title(attachment).to_string(),
                    items: vec![attachment.clone()],
                }),
            }
        }
        groups
    }

    /// Empty the queue, handing its items over in order
    pub fn take(&mut self) -> Vec<Attachment> {
        std::mem::take(&mut self.items)
    }
}

fn group_title(attachment: &Attachment) -> &str {
    attachment
        .output
        .as_ref()
        .and_then(|o| o.title.as_deref())
        .filter(|t| !t.is_empty())
        .unwrap_or(DEFAULT_GROUP_TITLE)
}
