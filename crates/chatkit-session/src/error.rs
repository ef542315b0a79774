use chatkit_llm::LlmError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Please configure and select an AI model first")]
    NoModelSelected,

    #[error("{0}")]
    Transport(#[from] LlmError),

    /// The stream was stopped by the caller or its turn was deleted
    #[error("Stream cancelled")]
    Cancelled,

    #[error("A stream is already in progress")]
    StreamInProgress,

    #[error("Message is empty")]
    EmptyInput,
}

impl SessionError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

pub type Result<T> = std::result::Result<T, SessionError>;
