pub mod error;
pub mod storage;
pub mod memory;
pub mod json;
pub mod registry;

pub use error::{Result, StorageError};
pub use storage::ModelStorage;
pub use memory::InMemoryModelStorage;
pub use json::JsonFileModelStorage;
pub use registry::{ModelRegistry, SelectionChange};
