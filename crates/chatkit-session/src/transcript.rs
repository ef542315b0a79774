use chatkit_types::{Role, Turn, TurnId};

use crate::error::{Result, SessionError};

/// Ordered conversation history with at most one assistant turn open for streaming
///
/// The open turn is always the most recently appended one. Only the session
/// engine opens turns and writes streamed content into them.
#[derive(Debug, Clone, Default)]
pub struct Transcript {
    turns: Vec<Turn>,
    open: Option<TurnId>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_greeting(greeting: impl Into<String>) -> Self {
        let mut transcript = Self::new();
        transcript.turns.push(Turn::assistant(greeting));
        transcript
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn get(&self, id: TurnId) -> Option<&Turn> {
        self.turns.iter().find(|t| t.id == id)
    }

    pub fn last(&self) -> Option<&Turn> {
        self.turns.last()
    }

    pub fn open_turn(&self) -> Option<TurnId> {
        self.open
    }

    /// Turns that go upstream: sendable roles, excluding the open placeholder
    pub fn upstream(&self) -> impl Iterator<Item = &Turn> + '_ {
        self.turns
            .iter()
            .filter(move |t| t.role.is_sendable() && Some(t.id) != self.open)
    }

    /// Append a finished turn; refused while a turn is open
    pub(crate) fn push(&mut self, turn: Turn) -> Result<TurnId> {
        if self.open.is_some() {
            return Err(SessionError::StreamInProgress);
        }
        let id = turn.id;
        self.turns.push(turn);
        Ok(id)
    }

    pub(crate) fn open_assistant(&mut self) -> Result<TurnId> {
        let id = self.push(Turn::assistant(""))?;
        self.open = Some(id);
        Ok(id)
    }

    /// Overwrite the open turn's content; false once that turn is gone
    pub(crate) fn set_open_content(&mut self, id: TurnId, content: &str) -> bool {
        if self.open != Some(id) {
            return false;
        }
        match self.turns.last_mut() {
            Some(turn) if turn.id == id && turn.role == Role::Assistant => {
                turn.content.clear();
                turn.content.push_str(content);
                true
            }
            _ => false,
        }
    }

    pub(crate) fn close(&mut self, id: TurnId) {
        if self.open == Some(id) {
            self.open = None;
        }
    }

    pub fn delete(&mut self, id: TurnId) -> Option<Turn> {
        let index = self.turns.iter().position(|t| t.id == id)?;
        self.close(id);
        Some(self.turns.remove(index))
    }

    /// Flip `display_raw`, returning the new value
    pub fn toggle_raw(&mut self, id: TurnId) -> Option<bool> {
        let turn = self.turns.iter_mut().find(|t| t.id == id)?;
        turn.display_raw = !turn.display_raw;
        Some(turn.display_raw)
    }

    /// Flip `attachments_visible`, returning the new value
    pub fn toggle_attachments(&mut self, id: TurnId) -> Option<bool> {
        let turn = self.turns.iter_mut().find(|t| t.id == id)?;
        turn.attachments_visible = !turn.attachments_visible;
        Some(turn.attachments_visible)
    }
}
