use chatkit_llm::ChatClient;
use chatkit_persist::{ModelRegistry, ModelStorage};
use chatkit_session::{ChatSession, SessionEvent};
use chatkit_types::{AttachmentEvent, ModelConfig};
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;

use crate::config::Config;

/// Shared application state passed to all handlers
///
/// The session is shared with the stream and intake tasks; the registry is
/// only touched by command handlers.
pub struct AppState {
    pub config: Arc<Config>,
    pub registry: Mutex<ModelRegistry>,
    pub session: Arc<ChatSession>,
    /// Host side of the attachment delivery channel
    pub intake: mpsc::Sender<AttachmentEvent>,
    intake_task: JoinHandle<()>,
}

impl AppState {
    /// Load the registry, create the session and start attachment intake
    ///
    /// Returns the receiving end of the session's event channel.
    pub async fn start(
        config: Config,
        storage: Arc<dyn ModelStorage>,
        client: Arc<dyn ChatClient>,
    ) -> anyhow::Result<(Arc<Self>, mpsc::Receiver<SessionEvent>)> {
        let registry = ModelRegistry::load(storage).await?;
        tracing::info!("Loaded {} configured models", registry.models().len());

        let (event_tx, event_rx) = mpsc::channel(config.session.event_buffer.max(1));
        let session =
            Arc::new(ChatSession::new(client, config.session_config()).with_events(event_tx));

        let (intake, intake_rx) = mpsc::channel(64);
        let intake_task = session.clone().spawn_intake(intake_rx);

        let state = Arc::new(Self {
            config: Arc::new(config),
            registry: Mutex::new(registry),
            session,
            intake,
            intake_task,
        });

        Ok((state, event_rx))
    }

    pub async fn selected_model(&self) -> Option<ModelConfig> {
        self.registry.lock().await.selected().cloned()
    }
}

impl Drop for AppState {
    fn drop(&mut self) {
        self.intake_task.abort();
    }
}
