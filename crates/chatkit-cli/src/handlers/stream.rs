use chatkit_session::{ChatSession, SessionEvent, StreamOutcome};
use chatkit_types::{Role, TurnId};
use std::io::Write;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Turns session events into terminal output, printing only new text per update
#[derive(Debug, Default)]
pub struct EventPrinter {
    streaming: Option<TurnId>,
    printed: usize,
}

impl EventPrinter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn render(&mut self, event: &SessionEvent, session: &ChatSession) -> Option<String> {
        match event {
            SessionEvent::TurnAppended {
                turn_id,
                role: Role::Assistant,
            } => {
                self.streaming = Some(*turn_id);
                self.printed = 0;
                Some("assistant> ".to_string())
            }
            SessionEvent::TurnAppended {
                turn_id,
                role: Role::Error,
            } => {
                let separator = if self.streaming.is_some() { "\n" } else { "" };
                session.with_transcript(|transcript| {
                    transcript
                        .get(*turn_id)
                        .map(|turn| format!("{}error> {}\n", separator, turn.content))
                })
            }
            SessionEvent::TurnAppended { .. } => None,
            SessionEvent::TurnUpdated { turn_id, content } => {
                if self.streaming != Some(*turn_id) {
                    return None;
                }
                let delta = content.get(self.printed..).unwrap_or_default();
                self.printed = content.len();
                (!delta.is_empty()).then(|| delta.to_string())
            }
            SessionEvent::StreamEnded { outcome, .. } => {
                self.streaming = None;
                self.printed = 0;
                match outcome {
                    StreamOutcome::Completed => Some("\n".to_string()),
                    StreamOutcome::Aborted => Some(" [stopped]\n".to_string()),
                    // The error turn was already printed
                    StreamOutcome::Failed { .. } => None,
                }
            }
        }
    }
}

/// Print session events to stdout until the session is dropped
pub async fn print_events(session: Arc<ChatSession>, mut events: mpsc::Receiver<SessionEvent>) {
    let mut printer = EventPrinter::new();

    while let Some(event) = events.recv().await {
        tracing::trace!("Session event: {:?}", event);
        if let Some(text) = printer.render(&event, &session) {
            let mut stdout = std::io::stdout().lock();
            if let Err(e) = stdout.write_all(text.as_bytes()).and_then(|_| stdout.flush()) {
                tracing::warn!("Failed to write to stdout: {}", e);
            }
        }
    }
}
