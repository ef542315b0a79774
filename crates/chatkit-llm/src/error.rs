use thiserror::Error;

#[derive(Error, Debug)]
pub enum LlmError {
    /// Endpoint answered with a non-2xx status
    #[error("HTTP error! status: {status}")]
    Status { status: u16, body: String },

    /// Request could not be sent or the connection failed (includes timeouts)
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The response body failed while it was being read
    #[error("Stream error: {0}")]
    Stream(String),

    #[error("Invalid header value: {0}")]
    InvalidHeader(#[from] reqwest::header::InvalidHeaderValue),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, LlmError>;
