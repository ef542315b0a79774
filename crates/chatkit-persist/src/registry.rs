use chatkit_types::{ModelConfig, ModelId};
use std::sync::Arc;

use crate::error::{Result, StorageError};
use crate::storage::ModelStorage;

/// What a model-list update did to the selection
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionChange {
    /// The selected model is still present and identical
    Unchanged,
    /// Same identity, other fields differ; the selection now points at the new record
    Resynced { credential_changed: bool },
    /// The selection moved to another model (the previous one is gone, or none was selected)
    Replaced { id: ModelId },
    /// The list is empty, nothing is selected
    Cleared,
}

/// Configured models plus the currently selected one
///
/// In-memory state only changes after the storage collaborator accepted the
/// write it depends on.
pub struct ModelRegistry {
    storage: Arc<dyn ModelStorage>,
    models: Vec<ModelConfig>,
    selected: Option<ModelId>,
}

impl ModelRegistry {
    /// Load the saved list and restore the saved selection, falling back to the first model
    pub async fn load(storage: Arc<dyn ModelStorage>) -> Result<Self> {
        let models = storage.get_models().await?;
        let saved = storage.get_selected_model().await?;

        let mut registry = Self {
            storage,
            models,
            selected: None,
        };

        let Some(first) = registry.models.first().map(ModelConfig::id) else {
            return Ok(registry);
        };

        match saved.filter(|id| registry.find(id).is_some()) {
            Some(id) => registry.selected = Some(id),
            None => {
                tracing::info!("Saved model selection not found, selecting {}", first);
                registry.storage.save_selected_model(Some(&first)).await?;
                registry.selected = Some(first);
            }
        }

        Ok(registry)
    }

    pub fn models(&self) -> &[ModelConfig] {
        &self.models
    }

    pub fn selected_id(&self) -> Option<&ModelId> {
        self.selected.as_ref()
    }

    /// The selected model; with duplicate identities the first match wins
    pub fn selected(&self) -> Option<&ModelConfig> {
        self.selected.as_ref().and_then(|id| self.find(id))
    }

    pub fn find(&self, id: &ModelId) -> Option<&ModelConfig> {
        self.models.iter().find(|m| &m.id() == id)
    }

    pub async fn select(&mut self, id: &ModelId) -> Result<&ModelConfig> {
        if self.find(id).is_none() {
            return Err(StorageError::UnknownModel(id.clone()));
        }

        self.storage.save_selected_model(Some(id)).await?;
        self.selected = Some(id.clone());

        self.find(id)
            .ok_or_else(|| StorageError::UnknownModel(id.clone()))
    }

    /// Replace the model list and re-resolve the selection against it
    pub async fn save_models(&mut self, models: Vec<ModelConfig>) -> Result<SelectionChange> {
        self.storage.save_models(&models).await?;

        let previous = self.selected().cloned();
        let had_selection = self.selected.is_some();
        self.models = models;

        let first = self.models.first().map(ModelConfig::id);
        let (next, change) = match (first, previous) {
            (None, _) if !had_selection => (None, SelectionChange::Unchanged),
            (None, _) => (None, SelectionChange::Cleared),
            (Some(first), None) => (Some(first.clone()), SelectionChange::Replaced { id: first }),
            (Some(first), Some(previous)) => match self.find(&previous.id()) {
                None => (Some(first.clone()), SelectionChange::Replaced { id: first }),
                Some(current) if current == &previous => {
                    (Some(previous.id()), SelectionChange::Unchanged)
                }
                Some(current) => {
                    let credential_changed = current.api_key != previous.api_key;
                    (
                        Some(current.id()),
                        SelectionChange::Resynced { credential_changed },
                    )
                }
            },
        };

        // Selection follows the committed list even when persisting it fails
        self.selected = next;
        if change != SelectionChange::Unchanged {
            tracing::info!("Model selection update: {:?}", change);
            self.storage.save_selected_model(self.selected.as_ref()).await?;
        }

        Ok(change)
    }

    pub async fn add(&mut self, model: ModelConfig) -> Result<SelectionChange> {
        let mut models = self.models.clone();
        models.push(model);
        self.save_models(models).await
    }

    /// Remove every model with this identity
    pub async fn remove(&mut self, id: &ModelId) -> Result<SelectionChange> {
        let models = self
            .models
            .iter()
            .filter(|m| &m.id() != id)
            .cloned()
            .collect();
        self.save_models(models).await
    }
}
