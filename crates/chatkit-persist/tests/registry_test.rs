use async_trait::async_trait;
use chatkit_persist::{
    InMemoryModelStorage, ModelRegistry, ModelStorage, SelectionChange, StorageError,
};
use chatkit_types::{ModelConfig, ModelId};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

fn model(name: &str) -> ModelConfig {
    ModelConfig::new(name, format!("http://localhost/{}", name))
}

/// Wraps in-memory storage and fails writes on demand
#[derive(Default)]
struct FlakyStorage {
    inner: InMemoryModelStorage,
    fail_writes: AtomicBool,
}

impl FlakyStorage {
    fn check(&self) -> chatkit_persist::Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            Err(StorageError::Backend("disk full".to_string()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl ModelStorage for FlakyStorage {
    async fn get_models(&self) -> chatkit_persist::Result<Vec<ModelConfig>> {
        self.inner.get_models().await
    }

    async fn save_models(&self, models: &[ModelConfig]) -> chatkit_persist::Result<()> {
        self.check()?;
        self.inner.save_models(models).await
    }

    async fn get_selected_model(&self) -> chatkit_persist::Result<Option<ModelId>> {
        self.inner.get_selected_model().await
    }

    async fn save_selected_model(&self, id: Option<&ModelId>) -> chatkit_persist::Result<()> {
        self.check()?;
        self.inner.save_selected_model(id).await
    }
}

#[tokio::test]
async fn test_load_empty_storage() {
    let registry = ModelRegistry::load(Arc::new(InMemoryModelStorage::new()))
        .await
        .unwrap();

    assert!(registry.models().is_empty());
    assert!(registry.selected().is_none());
}

#[tokio::test]
async fn test_load_restores_saved_selection() {
    let a = model("a");
    let b = model("b");
    let storage = Arc::new(InMemoryModelStorage::with_models(
        vec![a.clone(), b.clone()],
        Some(b.id()),
    ));

    let registry = ModelRegistry::load(storage).await.unwrap();
    assert_eq!(registry.selected(), Some(&b));
}

#[tokio::test]
async fn test_load_falls_back_to_first_and_persists() {
    let a = model("a");
    let storage = Arc::new(InMemoryModelStorage::with_models(
        vec![a.clone(), model("b")],
        Some(ModelId::new("gone-http://nowhere")),
    ));

    let registry = ModelRegistry::load(storage.clone()).await.unwrap();
    assert_eq!(registry.selected(), Some(&a));
    assert_eq!(storage.get_selected_model().await.unwrap(), Some(a.id()));
}

#[tokio::test]
async fn test_removing_selected_model_selects_first() {
    let a = model("a");
    let b = model("b");
    let c = model("c");
    let storage = Arc::new(InMemoryModelStorage::with_models(
        vec![a.clone(), b.clone()],
        Some(b.id()),
    ));
    let mut registry = ModelRegistry::load(storage.clone()).await.unwrap();

    let change = registry.save_models(vec![c.clone(), a.clone()]).await.unwrap();

    assert_eq!(change, SelectionChange::Replaced { id: c.id() });
    assert_eq!(registry.selected(), Some(&c));
    assert_eq!(storage.get_selected_model().await.unwrap(), Some(c.id()));
    assert_eq!(storage.get_models().await.unwrap(), vec![c, a]);
}

#[tokio::test]
async fn test_saving_empty_list_clears_selection() {
    let a = model("a");
    let storage = Arc::new(InMemoryModelStorage::with_models(vec![a.clone()], Some(a.id())));
    let mut registry = ModelRegistry::load(storage.clone()).await.unwrap();

    let change = registry.save_models(Vec::new()).await.unwrap();

    assert_eq!(change, SelectionChange::Cleared);
    assert!(registry.selected().is_none());
    assert_eq!(storage.get_selected_model().await.unwrap(), None);
}

#[tokio::test]
async fn test_first_model_added_becomes_selected() {
    let storage = Arc::new(InMemoryModelStorage::new());
    let mut registry = ModelRegistry::load(storage.clone()).await.unwrap();

    let a = model("a");
    let change = registry.add(a.clone()).await.unwrap();

    assert_eq!(change, SelectionChange::Replaced { id: a.id() });
    assert_eq!(registry.selected(), Some(&a));
    assert_eq!(storage.get_selected_model().await.unwrap(), Some(a.id()));
}

#[tokio::test]
async fn test_unchanged_selection() {
    let a = model("a");
    let storage = Arc::new(InMemoryModelStorage::with_models(vec![a.clone()], Some(a.id())));
    let mut registry = ModelRegistry::load(storage).await.unwrap();

    let change = registry.add(model("b")).await.unwrap();
    assert_eq!(change, SelectionChange::Unchanged);
    assert_eq!(registry.selected(), Some(&a));
}

#[tokio::test]
async fn test_credential_rotation_resyncs() {
    let a = model("a").with_api_key("old");
    let storage = Arc::new(InMemoryModelStorage::with_models(vec![a.clone()], Some(a.id())));
    let mut registry = ModelRegistry::load(storage).await.unwrap();

    let rotated = model("a").with_api_key("new");
    let change = registry.save_models(vec![rotated.clone()]).await.unwrap();

    assert_eq!(
        change,
        SelectionChange::Resynced {
            credential_changed: true
        }
    );
    assert_eq!(registry.selected().and_then(|m| m.api_key.as_deref()), Some("new"));
}

#[tokio::test]
async fn test_duplicate_identities_take_first_match() {
    let first = model("a").with_api_key("first");
    let second = model("a").with_api_key("second");
    let storage = Arc::new(InMemoryModelStorage::with_models(
        vec![first.clone(), second],
        Some(first.id()),
    ));

    let registry = ModelRegistry::load(storage).await.unwrap();
    assert_eq!(registry.selected(), Some(&first));
}

#[tokio::test]
async fn test_select_unknown_model_fails() {
    let a = model("a");
    let storage = Arc::new(InMemoryModelStorage::with_models(vec![a.clone()], Some(a.id())));
    let mut registry = ModelRegistry::load(storage).await.unwrap();

    let result = registry.select(&ModelId::new("nope")).await;
    assert!(matches!(result, Err(StorageError::UnknownModel(_))));
    assert_eq!(registry.selected(), Some(&a));
}

#[tokio::test]
async fn test_select_persists() {
    let a = model("a");
    let b = model("b");
    let storage = Arc::new(InMemoryModelStorage::with_models(
        vec![a.clone(), b.clone()],
        Some(a.id()),
    ));
    let mut registry = ModelRegistry::load(storage.clone()).await.unwrap();

    registry.select(&b.id()).await.unwrap();
    assert_eq!(registry.selected(), Some(&b));
    assert_eq!(storage.get_selected_model().await.unwrap(), Some(b.id()));
}

#[tokio::test]
async fn test_remove_model() {
    let a = model("a");
    let b = model("b");
    let storage = Arc::new(InMemoryModelStorage::with_models(
        vec![a.clone(), b.clone()],
        Some(a.id()),
    ));
    let mut registry = ModelRegistry::load(storage).await.unwrap();

    let change = registry.remove(&a.id()).await.unwrap();
    assert_eq!(change, SelectionChange::Replaced { id: b.id() });
    assert_eq!(registry.models(), &[b]);
}

#[tokio::test]
async fn test_failed_list_write_leaves_state_untouched() {
    let a = model("a");
    let storage = Arc::new(FlakyStorage::default());
    storage.inner.save_models(&[a.clone()]).await.unwrap();
    storage.inner.save_selected_model(Some(&a.id())).await.unwrap();

    let mut registry = ModelRegistry::load(storage.clone()).await.unwrap();
    storage.fail_writes.store(true, Ordering::SeqCst);

    let result = registry.save_models(vec![model("b")]).await;
    assert!(matches!(result, Err(StorageError::Backend(_))));
    assert_eq!(registry.models(), &[a.clone()]);
    assert_eq!(registry.selected(), Some(&a));
}

#[tokio::test]
async fn test_failed_select_write_keeps_previous_selection() {
    let a = model("a");
    let b = model("b");
    let storage = Arc::new(FlakyStorage::default());
    storage.inner.save_models(&[a.clone(), b.clone()]).await.unwrap();
    storage.inner.save_selected_model(Some(&a.id())).await.unwrap();

    let mut registry = ModelRegistry::load(storage.clone()).await.unwrap();
    storage.fail_writes.store(true, Ordering::SeqCst);

    assert!(registry.select(&b.id()).await.is_err());
    assert_eq!(registry.selected(), Some(&a));
}
