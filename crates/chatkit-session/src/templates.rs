use chatkit_types::{Attachment, AttachmentKind};
use regex::{Captures, Regex};
use std::collections::BTreeMap;
use std::sync::OnceLock;

pub const DEFAULT_CODE_TEMPLATE: &str = "```{{language}}\n{{data}}\n```";

pub const DEFAULT_CHART_TEMPLATE: &str = "![{{title}}]({{data}})";

pub const DEFAULT_TABLE_TEMPLATE: &str = "{{data}}";

fn placeholder() -> &'static Regex {
    static PLACEHOLDER: OnceLock<Regex> = OnceLock::new();
    PLACEHOLDER.get_or_init(|| {
        Regex::new(r"\{\{\s*([A-Za-z0-9_.-]+)\s*\}\}")
            .expect("placeholder is a valid static regex pattern")
    })
}

/// Per-kind attachment templates
///
/// `{{data}}` expands to the attachment payload, any other `{{key}}` to the
/// metadata value of that key (empty when missing). A kind without a
/// template renders as its raw payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateRegistry {
    templates: BTreeMap<AttachmentKind, String>,
}

impl Default for TemplateRegistry {
    fn default() -> Self {
        let mut templates = BTreeMap::new();
        templates.insert(AttachmentKind::Code, DEFAULT_CODE_TEMPLATE.to_string());
        templates.insert(AttachmentKind::Chart, DEFAULT_CHART_TEMPLATE.to_string());
        templates.insert(AttachmentKind::Table, DEFAULT_TABLE_TEMPLATE.to_string());
        Self { templates }
    }
}

impl TemplateRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry with no templates; everything renders raw
    pub fn empty() -> Self {
        Self {
            templates: BTreeMap::new(),
        }
    }

    pub fn with_template(mut self, kind: AttachmentKind, template: impl Into<String>) -> Self {
        self.set(kind, template);
        self
    }

    pub fn set(&mut self, kind: AttachmentKind, template: impl Into<String>) {
        self.templates.insert(kind, template.into());
    }

    pub fn clear(&mut self, kind: AttachmentKind) -> Option<String> {
        self.templates.remove(&kind)
    }

    /// Restore the built-in templates
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn get(&self, kind: AttachmentKind) -> Option<&str> {
        self.templates.get(&kind).map(String::as_str)
    }

    pub fn render(&self, attachment: &Attachment) -> String {
        match self.get(attachment.kind) {
            Some(template) => apply(template, attachment),
            None => attachment.data.clone(),
        }
    }
}

fn apply(template: &str, attachment: &Attachment) -> String {
    placeholder()
        .replace_all(template, |caps: &Captures<'_>| match &caps[1] {
            "data" => attachment.data.clone(),
            key => attachment.metadata_value(key).to_string(),
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn code(language: &str, data: &str) -> Attachment {
        Attachment::new(AttachmentKind::Code, data).with_metadata("language", language)
    }

    #[test]
    fn test_default_code_template() {
        let registry = TemplateRegistry::default();
        assert_eq!(
            registry.render(&code("python", "print(1)")),
            "```python\nprint(1)\n```"
        );
    }

    #[test]
    fn test_missing_metadata_is_empty() {
        let registry = TemplateRegistry::default();
        let attachment = Attachment::new(AttachmentKind::Code, "x = 1");
        assert_eq!(registry.render(&attachment), "```\nx = 1\n```");
    }

    #[test]
    fn test_values_are_inserted_literally() {
        let registry = TemplateRegistry::empty()
            .with_template(AttachmentKind::Table, "<{{ caption }}>{{data}}{{data}}");
        let attachment = Attachment::new(AttachmentKind::Table, "$1 costs $$")
            .with_metadata("caption", "${0}\\d+");

        assert_eq!(
            registry.render(&attachment),
            "<${0}\\d+>$1 costs $$$1 costs $$"
        );
    }

    #[test]
    fn test_cleared_kind_renders_raw() {
        let mut registry = TemplateRegistry::default();
        assert!(registry.clear(AttachmentKind::Code).is_some());
        assert_eq!(registry.render(&code("rust", "fn main() {}")), "fn main() {}");

        registry.reset();
        assert_eq!(registry.get(AttachmentKind::Code), Some(DEFAULT_CODE_TEMPLATE));
    }

    #[test]
    fn test_chart_template_uses_title() {
        let registry = TemplateRegistry::default();
        let chart = Attachment::new(AttachmentKind::Chart, "data:image/png;base64,AAA")
            .with_metadata("title", "Sales");
        assert_eq!(registry.render(&chart), "![Sales](data:image/png;base64,AAA)");
    }
}
