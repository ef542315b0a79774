use chatkit_types::{Role, TurnId};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

/// How a `send` ended
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StreamOutcome {
    Completed,
    /// Stopped by the caller; no error turn was appended
    Aborted,
    /// An error turn carrying `message` was appended
    Failed { message: String },
}

/// Transcript mutations as they happen, for hosts that render incrementally
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionEvent {
    TurnAppended {
        turn_id: TurnId,
        role: Role,
    },

    /// `content` is the full accumulated text, not the delta
    TurnUpdated {
        turn_id: TurnId,
        content: String,
    },

    StreamEnded {
        turn_id: TurnId,
        outcome: StreamOutcome,
    },
}

pub type EventSender = mpsc::Sender<SessionEvent>;
