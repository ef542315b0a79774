use async_trait::async_trait;
use chatkit_types::{ModelConfig, ModelId};

use crate::error::Result;

/// Storage collaborator for the model registry
///
/// Implementations decide where the model list and selection live
/// (memory, a JSON file, the host's own settings store).
#[async_trait]
pub trait ModelStorage: Send + Sync {
    /// Load the saved model list (empty when nothing was saved)
    async fn get_models(&self) -> Result<Vec<ModelConfig>>;

    /// Replace the saved model list
    async fn save_models(&self, models: &[ModelConfig]) -> Result<()>;

    /// Load the saved selection
    async fn get_selected_model(&self) -> Result<Option<ModelId>>;

    /// Replace the saved selection; `None` clears it
    async fn save_selected_model(&self, id: Option<&ModelId>) -> Result<()>;
}
