use async_trait::async_trait;
use chatkit_types::{ModelConfig, ModelId};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

use crate::error::{Result, StorageError};
use crate::storage::ModelStorage;

#[derive(Debug, Default, Serialize, Deserialize)]
struct ModelsFile {
    #[serde(default)]
    models: Vec<ModelConfig>,
    #[serde(default)]
    selected: Option<ModelId>,
}

/// JSON file storage: `{ "models": [...], "selected": "..." }`
///
/// A missing file reads as an empty registry. Writes go to a temporary
/// file that is then renamed over the existing one.
pub struct JsonFileModelStorage {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonFileModelStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// `<config dir>/chatkit/models.json`
    pub fn default_location() -> Result<Self> {
        let config_dir = dirs::config_dir().ok_or_else(|| {
            StorageError::Initialization("Could not determine config directory".to_string())
        })?;
        Ok(Self::new(config_dir.join("chatkit").join("models.json")))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read(&self) -> Result<ModelsFile> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(content) if content.trim().is_empty() => Ok(ModelsFile::default()),
            Ok(content) => Ok(serde_json::from_str(&content)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(ModelsFile::default()),
            Err(e) => Err(e.into()),
        }
    }

    async fn write(&self, file: &ModelsFile) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let json = serde_json::to_string_pretty(file)?;
        let temp_path = self.path.with_extension("json.tmp");
        tokio::fs::write(&temp_path, json).await?;
        tokio::fs::rename(&temp_path, &self.path).await?;

        tracing::debug!("Wrote model storage file {}", self.path.display());
        Ok(())
    }

    async fn update(&self, apply: impl FnOnce(&mut ModelsFile)) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let mut file = self.read().await?;
        apply(&mut file);
        self.write(&file).await
    }
}

#[async_trait]
impl ModelStorage for JsonFileModelStorage {
    async fn get_models(&self) -> Result<Vec<ModelConfig>> {
        Ok(self.read().await?.models)
    }

    async fn save_models(&self, models: &[ModelConfig]) -> Result<()> {
        self.update(|file| file.models = models.to_vec()).await
    }

    async fn get_selected_model(&self) -> Result<Option<ModelId>> {
        Ok(self.read().await?.selected)
    }

    async fn save_selected_model(&self, id: Option<&ModelId>) -> Result<()> {
        self.update(|file| file.selected = id.cloned()).await
    }
}
