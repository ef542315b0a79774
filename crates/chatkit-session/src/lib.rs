pub mod cancel;
pub mod config;
pub mod error;
pub mod events;
pub mod formatter;
pub mod intake;
pub mod session;
pub mod templates;
pub mod transcript;

pub use cancel::CancelHandle;
pub use config::{ImageTransport, SessionConfig, DEFAULT_GREETING};
pub use error::{Result, SessionError};
pub use events::{EventSender, SessionEvent, StreamOutcome};
pub use formatter::Formatter;
pub use intake::{AttachmentGroup, EnqueueOutcome, GroupKey, IntakeQueue, DEFAULT_GROUP_TITLE};
pub use session::ChatSession;
pub use templates::{
    TemplateRegistry, DEFAULT_CHART_TEMPLATE, DEFAULT_CODE_TEMPLATE, DEFAULT_TABLE_TEMPLATE,
};
pub use transcript::Transcript;
