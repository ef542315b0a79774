use async_trait::async_trait;
use chatkit_types::{ModelConfig, ModelId};
use tokio::sync::Mutex;

use crate::error::Result;
use crate::storage::ModelStorage;

#[derive(Debug, Default)]
struct StoredState {
    models: Vec<ModelConfig>,
    selected: Option<ModelId>,
}

/// Process-local storage; contents are lost when dropped
#[derive(Debug, Default)]
pub struct InMemoryModelStorage {
    state: Mutex<StoredState>,
}

impl InMemoryModelStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_models(models: Vec<ModelConfig>, selected: Option<ModelId>) -> Self {
        Self {
            state: Mutex::new(StoredState { models, selected }),
        }
    }
}

#[async_trait]
impl ModelStorage for InMemoryModelStorage {
    async fn get_models(&self) -> Result<Vec<ModelConfig>> {
        Ok(self.state.lock().await.models.clone())
    }

    async fn save_models(&self, models: &[ModelConfig]) -> Result<()> {
        self.state.lock().await.models = models.to_vec();
        Ok(())
    }

    async fn get_selected_model(&self) -> Result<Option<ModelId>> {
        Ok(self.state.lock().await.selected.clone())
    }

    async fn save_selected_model(&self, id: Option<&ModelId>) -> Result<()> {
        self.state.lock().await.selected = id.cloned();
        Ok(())
    }
}
