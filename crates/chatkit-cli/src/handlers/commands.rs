use chatkit_persist::SelectionChange;
use chatkit_session::{GroupKey, SessionError, StreamOutcome};
use chatkit_types::{AttachmentEvent, ModelConfig, Turn, TurnId};
use std::fmt::Write as _;
use std::path::Path;
use std::sync::Arc;
use tokio::task::JoinHandle;

use crate::commands::{AttachSource, Command, HELP};
use crate::state::AppState;

pub enum Reply {
    Text(String),
    /// A send is running in the background
    Streaming(JoinHandle<Result<StreamOutcome, SessionError>>),
    Quit,
}

impl Reply {
    fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }
}

/// Execute one parsed command against the application state
///
/// Sends run on their own task so input keeps being read while streaming.
pub async fn execute(state: &Arc<AppState>, command: Command) -> anyhow::Result<Reply> {
    let session = &state.session;

    let reply = match command {
        Command::Send(text) => {
            if session.is_streaming() {
                return Ok(Reply::text("A response is still streaming; /stop it first"));
            }
            let model = state.selected_model().await;
            let session = session.clone();
            Reply::Streaming(tokio::spawn(async move {
                session.send(&text, model.as_ref()).await
            }))
        }
        Command::Draft(None) => {
            let draft = session.draft();
            if draft.is_empty() {
                Reply::text("Draft is empty")
            } else {
                Reply::Text(draft)
            }
        }
        Command::Draft(Some(text)) => {
            session.set_draft(text);
            Reply::text("Draft updated")
        }
        Command::SendDraft => {
            if session.is_streaming() {
                return Ok(Reply::text("A response is still streaming; /stop it first"));
            }
            if session.draft().trim().is_empty() {
                return Ok(Reply::text("Draft is empty"));
            }
            let model = state.selected_model().await;
            let session = session.clone();
            Reply::Streaming(tokio::spawn(async move {
                session.send_draft(model.as_ref()).await
            }))
        }
        Command::Models => {
            let registry = state.registry.lock().await;
            Reply::Text(list_models(registry.models(), registry.selected()))
        }
        Command::Add {
            name,
            endpoint,
            api_key,
        } => {
            let mut model = ModelConfig::new(name, endpoint);
            if let Some(key) = api_key {
                model = model.with_api_key(key);
            }
            let change = state.registry.lock().await.add(model).await?;
            Reply::Text(describe_change(&change))
        }
        Command::Use(n) => {
            let mut registry = state.registry.lock().await;
            let Some(id) = registry.models().get(n.wrapping_sub(1)).map(ModelConfig::id) else {
                return Ok(Reply::text(format!("No model {}", n)));
            };
            let model = registry.select(&id).await?;
            Reply::Text(format!("Using {}", model.name))
        }
        Command::Remove(n) => {
            let mut registry = state.registry.lock().await;
            let Some(id) = registry.models().get(n.wrapping_sub(1)).map(ModelConfig::id) else {
                return Ok(Reply::text(format!("No model {}", n)));
            };
            let change = registry.remove(&id).await?;
            Reply::Text(describe_change(&change))
        }
        Command::Attach(source) => {
            let event = load_attachment(&source).await?;
            let kind = event.kind;
            session.receive_attachment(event);
            Reply::Text(format!(
                "Queued {} attachment ({} pending)",
                kind,
                session.pending().len()
            ))
        }
        Command::Event(event) => {
            state.intake.send(*event).await?;
            Reply::text("Delivered")
        }
        Command::Pending => Reply::Text(list_pending(state)),
        Command::Drop(id) => match session.remove_pending(&id.as_str().into()) {
            Some(_) => Reply::text(format!("Removed {}", id)),
            None => Reply::text(format!("No pending attachment {}", id)),
        },
        Command::Group(key) => {
            let key = match key {
                Some(id) => GroupKey::Output(id),
                None => GroupKey::Ungrouped,
            };
            let removed = session.remove_pending_group(&key);
            Reply::Text(format!(
                "Removed {} attachments from {}",
                removed.len(),
                group_label(&key)
            ))
        }
        Command::History => Reply::Text(render_history(&session.turns())),
        Command::Raw(n) => match turn_id(state, n).and_then(|id| session.toggle_raw(id)) {
            Some(raw) => Reply::text(format!("Turn {} raw display {}", n, on_off(raw))),
            None => Reply::text(format!("No turn {}", n)),
        },
        Command::Show(n) => match turn_id(state, n).and_then(|id| session.toggle_attachments(id)) {
            Some(visible) => Reply::text(format!("Turn {} attachments {}", n, on_off(visible))),
            None => Reply::text(format!("No turn {}", n)),
        },
        Command::Delete(n) => match turn_id(state, n).and_then(|id| session.delete_turn(id)) {
            Some(_) => Reply::text(format!("Deleted turn {}", n)),
            None => Reply::text(format!("No turn {}", n)),
        },
        Command::Stop => {
            if session.stop() {
                Reply::text("Stopping")
            } else {
                Reply::text("Nothing is streaming")
            }
        }
        Command::Help => Reply::text(HELP),
        Command::Quit => Reply::Quit,
    };

    Ok(reply)
}

/// Turn number `n` as printed by `/history` (1-based)
fn turn_id(state: &AppState, n: usize) -> Option<TurnId> {
    state
        .session
        .with_transcript(|t| t.turns().get(n.wrapping_sub(1)).map(|turn| turn.id))
}

fn on_off(value: bool) -> &'static str {
    if value {
        "on"
    } else {
        "off"
    }
}

async fn load_attachment(source: &AttachSource) -> anyhow::Result<AttachmentEvent> {
    let kind = source.kind();
    let event = match source {
        AttachSource::Code { language, path } => {
            let data = tokio::fs::read_to_string(path).await?;
            AttachmentEvent::new(kind, data)
                .with_metadata("language", language.as_str())
                .with_metadata("title", file_name(path))
        }
        AttachSource::Table { path } => {
            let data = tokio::fs::read_to_string(path).await?;
            AttachmentEvent::new(kind, data).with_metadata("title", file_name(path))
        }
        AttachSource::Chart { uri } => {
            AttachmentEvent::new(kind, uri.as_str()).with_metadata("title", file_name(uri))
        }
    };
    Ok(event)
}

fn file_name(path: &str) -> String {
    Path::new(path)
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string())
}

fn group_label(key: &GroupKey) -> String {
    match key {
        GroupKey::Output(id) => format!("[{}]", id),
        GroupKey::Ungrouped => "(ungrouped)".to_string(),
    }
}

fn describe_change(change: &SelectionChange) -> String {
    match change {
        SelectionChange::Unchanged => "Saved".to_string(),
        SelectionChange::Resynced {
            credential_changed: true,
        } => "Saved; the selected model's API key changed".to_string(),
        SelectionChange::Resynced { .. } => "Saved; selected model updated".to_string(),
        SelectionChange::Replaced { id } => format!("Saved; now using {}", id),
        SelectionChange::Cleared => "Saved; no model selected".to_string(),
    }
}

pub fn list_models(models: &[ModelConfig], selected: Option<&ModelConfig>) -> String {
    if models.is_empty() {
        return "No models configured; add one with /add".to_string();
    }

    let mut out = String::new();
    for (i, model) in models.iter().enumerate() {
        let marker = if Some(model) == selected { "*" } else { " " };
        let key = if model.api_key.is_some() { " (key set)" } else { "" };
        let _ = writeln!(out, "{} {}. {} {}{}", marker, i + 1, model.name, model.endpoint, key);
    }
    out
}

fn list_pending(state: &AppState) -> String {
    let groups = state.session.pending_groups();
    if groups.is_empty() {
        return "No pending attachments".to_string();
    }

    let mut out = String::new();
    for group in groups {
        let _ = writeln!(out, "{} {}", group.title, group_label(&group.key));
        for item in group.items {
            let _ = writeln!(out, "  {} {} {}", item.id, item.kind, item.title());
        }
    }
    out
}

pub fn render_history(turns: &[Turn]) -> String {
    let mut out = String::new();
    for (i, turn) in turns.iter().enumerate() {
        if turn.display_raw {
            let _ = writeln!(out, "{}. {}> {:?}", i + 1, turn.role, turn.content);
        } else {
            let _ = writeln!(out, "{}. {}> {}", i + 1, turn.role, turn.content);
        }

        if turn.has_attachments() {
            if turn.attachments_visible {
                for attachment in &turn.attachments {
                    let _ = writeln!(out, "     + {} {}", attachment.kind, attachment.title());
                }
            } else {
                let _ = writeln!(out, "     ({} attachments, /show {})", turn.attachments.len(), i + 1);
            }
        }
    }
    out
}
