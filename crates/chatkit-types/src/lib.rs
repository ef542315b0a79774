pub mod attachment;
pub mod model;
pub mod turn;

pub use attachment::{Attachment, AttachmentEvent, AttachmentId, AttachmentKind, OutputRef};
pub use model::{ModelConfig, ModelId};
pub use turn::{Role, Turn, TurnId};
