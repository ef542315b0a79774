use chatkit_llm::{Content, ContentPart, Message};
use chatkit_types::{AttachmentKind, Turn};

use crate::config::ImageTransport;
use crate::templates::TemplateRegistry;

/// Turns transcript entries into wire messages
#[derive(Debug, Clone, Default)]
pub struct Formatter {
    templates: TemplateRegistry,
    image_transport: ImageTransport,
}

impl Formatter {
    pub fn new(templates: TemplateRegistry, image_transport: ImageTransport) -> Self {
        Self {
            templates,
            image_transport,
        }
    }

    pub fn templates(&self) -> &TemplateRegistry {
        &self.templates
    }

    pub fn templates_mut(&mut self) -> &mut TemplateRegistry {
        &mut self.templates
    }

    pub fn image_transport(&self) -> ImageTransport {
        self.image_transport
    }

    /// Wire message for one turn
    ///
    /// Without attachments the body is the turn text. With a chart attachment
    /// and native transport the body is a part list: the text first (when not
    /// empty), then one part per attachment in order. Otherwise the text and the
    /// rendered attachments are joined by blank lines.
    pub fn format_turn(&self, turn: &Turn) -> Message {
        Message::new(turn.role, self.format_content(turn))
    }

    /// Wire messages for every sendable turn, in order
    pub fn format_history<'a, I>(&self, turns: I) -> Vec<Message>
    where
        I: IntoIterator<Item = &'a Turn>,
    {
        turns
            .into_iter()
            .filter(|turn| turn.role.is_sendable())
            .map(|turn| self.format_turn(turn))
            .collect()
    }

    fn format_content(&self, turn: &Turn) -> Content {
        if !turn.has_attachments() {
            return Content::Text(turn.content.clone());
        }

        let native_images = self.image_transport == ImageTransport::Native
            && turn
                .attachments
                .iter()
                .any(|a| a.kind == AttachmentKind::Chart);

        if native_images {
            let mut parts = Vec::with_capacity(turn.attachments.len() + 1);
            if !turn.content.is_empty() {
                parts.push(ContentPart::text(turn.content.as_str()));
            }
            for attachment in &turn.attachments {
                parts.push(match attachment.kind {
                    AttachmentKind::Chart => ContentPart::image(attachment.data.as_str()),
                    _ => ContentPart::text(self.templates.render(attachment)),
                });
            }
            return Content::Parts(parts);
        }

        let rendered = turn
            .attachments
            .iter()
            .map(|attachment| self.templates.render(attachment));
        let sections: Vec<String> = std::iter::once(turn.content.clone())
            .chain(rendered)
            .filter(|section| !section.is_empty())
            .collect();

        Content::Text(sections.join("\n\n"))
    }
}
