use chatkit_llm::{ChatClient, ChatRequest, StreamEvent};
use chatkit_types::{Attachment, AttachmentEvent, AttachmentId, ModelConfig, Role, Turn, TurnId};
use futures::StreamExt;
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::cancel::CancelHandle;
use crate::config::SessionConfig;
use crate::error::{Result, SessionError};
use crate::events::{EventSender, SessionEvent, StreamOutcome};
use crate::formatter::Formatter;
use crate::intake::{AttachmentGroup, EnqueueOutcome, GroupKey, IntakeQueue};
use crate::transcript::Transcript;

#[derive(Debug, Default)]
struct Conversation {
    transcript: Transcript,
    pending: IntakeQueue,
    draft: String,
}

/// One chat conversation against whichever model the caller passes to `send`
///
/// Transcript, pending attachments and draft share a single lock. At most one
/// stream runs at a time; `stop` cancels it from any task.
pub struct ChatSession {
    client: Arc<dyn ChatClient>,
    formatter: Formatter,
    state: Mutex<Conversation>,
    active: Mutex<Option<CancelHandle>>,
    events: Option<EventSender>,
}

impl ChatSession {
    pub fn new(client: Arc<dyn ChatClient>, config: SessionConfig) -> Self {
        let transcript = match config.greeting {
            Some(greeting) => Transcript::with_greeting(greeting),
            None => Transcript::new(),
        };

        Self {
            client,
            formatter: Formatter::new(config.templates, config.image_transport),
            state: Mutex::new(Conversation {
                transcript,
                ..Conversation::default()
            }),
            active: Mutex::new(None),
            events: None,
        }
    }

    /// Report transcript changes on `events`
    pub fn with_events(mut self, events: EventSender) -> Self {
        self.events = Some(events);
        self
    }

    pub fn formatter(&self) -> &Formatter {
        &self.formatter
    }

    /// Send `input` as a user turn and stream the reply into a new assistant turn
    ///
    /// Transport failures and a missing model end as `StreamOutcome::Failed`
    /// with an error turn appended; `stop` ends as `StreamOutcome::Aborted`.
    /// `Err` is only returned for empty input or a stream already in progress.
    pub async fn send(&self, input: &str, model: Option<&ModelConfig>) -> Result<StreamOutcome> {
        let text = input.trim();
        if text.is_empty() {
            return Err(SessionError::EmptyInput);
        }

        let (mut slot, cancel) = self.begin_stream()?;

        let Some(model) = model else {
            let message = SessionError::NoModelSelected.to_string();
            tracing::warn!("Send attempted without a selected model");
            let error_id = slot.finish(Some(Turn::error(message.as_str())));
            drop(slot);
            if let Some(turn_id) = error_id {
                self.emit(
                    SessionEvent::TurnAppended {
                        turn_id,
                        role: Role::Error,
                    },
                    &cancel,
                )
                .await;
            }
            return Ok(StreamOutcome::Failed { message });
        };

        let (user_id, assistant_id, messages) = {
            let mut state = self.state.lock();
            let attachments = state.pending.take();
            let user_id = state.transcript.push(Turn::user(text, attachments))?;
            let messages = self.formatter.format_history(state.transcript.upstream());
            let assistant_id = state.transcript.open_assistant()?;
            (user_id, assistant_id, messages)
        };
        slot.turn = Some(assistant_id);

        self.emit(
            SessionEvent::TurnAppended {
                turn_id: user_id,
                role: Role::User,
            },
            &cancel,
        )
        .await;
        self.emit(
            SessionEvent::TurnAppended {
                turn_id: assistant_id,
                role: Role::Assistant,
            },
            &cancel,
        )
        .await;

        tracing::debug!(
            "Sending {} messages to model {} at {}",
            messages.len(),
            model.name,
            model.endpoint
        );
        let request = ChatRequest::for_model(model, messages);

        let (outcome, error_turn) = match self.pump(request, assistant_id, &cancel).await {
            Ok(deltas) => {
                tracing::debug!(
                    "Stream for turn {} completed after {} deltas",
                    assistant_id,
                    deltas
                );
                (StreamOutcome::Completed, None)
            }
            Err(SessionError::Cancelled) => {
                tracing::debug!("Stream for turn {} aborted", assistant_id);
                (StreamOutcome::Aborted, None)
            }
            Err(e) => {
                let message = format!("Error: {}", e);
                tracing::warn!("Stream for turn {} failed: {}", assistant_id, e);
                (
                    StreamOutcome::Failed {
                        message: message.clone(),
                    },
                    Some(Turn::error(message)),
                )
            }
        };

        let error_id = slot.finish(error_turn);
        drop(slot);

        if let Some(turn_id) = error_id {
            self.emit(
                SessionEvent::TurnAppended {
                    turn_id,
                    role: Role::Error,
                },
                &cancel,
            )
            .await;
        }
        self.emit(
            SessionEvent::StreamEnded {
                turn_id: assistant_id,
                outcome: outcome.clone(),
            },
            &cancel,
        )
        .await;

        Ok(outcome)
    }

    /// Send the draft and clear it
    ///
    /// The draft is kept when the send is refused.
    pub async fn send_draft(&self, model: Option<&ModelConfig>) -> Result<StreamOutcome> {
        let draft = std::mem::take(&mut self.state.lock().draft);

        match self.send(&draft, model).await {
            Err(e) => {
                let mut state = self.state.lock();
                if state.draft.is_empty() {
                    state.draft = draft;
                }
                Err(e)
            }
            outcome => outcome,
        }
    }

    /// Cancel the running stream; false when nothing is streaming
    pub fn stop(&self) -> bool {
        match self.active.lock().as_ref() {
            Some(handle) => {
                handle.cancel();
                true
            }
            None => false,
        }
    }

    pub fn is_streaming(&self) -> bool {
        self.active.lock().is_some()
    }

    /// Read the stream until it ends, returning the number of applied deltas
    async fn pump(
        &self,
        request: ChatRequest,
        turn_id: TurnId,
        cancel: &CancelHandle,
    ) -> Result<usize> {
        let mut stream = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(SessionError::Cancelled),
            opened = self.client.chat_stream(request) => opened?,
        };

        let mut accumulated = String::new();
        let mut deltas = 0;

        loop {
            let next = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(SessionError::Cancelled),
                next = stream.next() => next,
            };

            match next {
                None | Some(Ok(StreamEvent::Done { .. })) => return Ok(deltas),
                Some(Ok(StreamEvent::Message { content })) => {
                    accumulated.push_str(&content);
                    deltas += 1;

                    let applied = self
                        .state
                        .lock()
                        .transcript
                        .set_open_content(turn_id, &accumulated);
                    if !applied {
                        tracing::debug!("Turn {} was removed while streaming", turn_id);
                        return Err(SessionError::Cancelled);
                    }

                    self.emit(
                        SessionEvent::TurnUpdated {
                            turn_id,
                            content: accumulated.clone(),
                        },
                        cancel,
                    )
                    .await;
                }
                Some(Err(e)) => return Err(e.into()),
            }
        }
    }

    fn begin_stream(&self) -> Result<(StreamSlot<'_>, CancelHandle)> {
        let mut active = self.active.lock();
        if active.is_some() {
            return Err(SessionError::StreamInProgress);
        }

        let handle = CancelHandle::new();
        *active = Some(handle.clone());
        Ok((
            StreamSlot {
                session: self,
                turn: None,
            },
            handle,
        ))
    }

    /// Deliver `event`, waiting for channel capacity until the stream is cancelled
    async fn emit(&self, event: SessionEvent, cancel: &CancelHandle) {
        let Some(events) = &self.events else {
            return;
        };

        tokio::select! {
            biased;
            sent = events.send(event) => {
                if sent.is_err() {
                    tracing::debug!("Session event receiver dropped");
                }
            }
            _ = cancel.cancelled() => {
                tracing::debug!("Session event dropped after stop; receiver is full");
            }
        }
    }

    pub fn draft(&self) -> String {
        self.state.lock().draft.clone()
    }

    pub fn set_draft(&self, draft: impl Into<String>) {
        self.state.lock().draft = draft.into();
    }

    /// Clone of the current transcript
    pub fn turns(&self) -> Vec<Turn> {
        self.state.lock().transcript.turns().to_vec()
    }

    /// Run `f` against the transcript without cloning it
    pub fn with_transcript<R>(&self, f: impl FnOnce(&Transcript) -> R) -> R {
        f(&self.state.lock().transcript)
    }

    /// Append a system turn; refused while streaming
    pub fn push_system(&self, content: impl Into<String>) -> Result<TurnId> {
        self.state.lock().transcript.push(Turn::system(content))
    }

    /// Delete a turn; deleting the streaming turn ends its stream as aborted
    pub fn delete_turn(&self, id: TurnId) -> Option<Turn> {
        self.state.lock().transcript.delete(id)
    }

    pub fn toggle_raw(&self, id: TurnId) -> Option<bool> {
        self.state.lock().transcript.toggle_raw(id)
    }

    pub fn toggle_attachments(&self, id: TurnId) -> Option<bool> {
        self.state.lock().transcript.toggle_attachments(id)
    }

    /// Queue an attachment delivered by the host
    ///
    /// An `initialMessage` on the first pending item fills the draft when the draft is empty.
    pub fn receive_attachment(&self, event: AttachmentEvent) -> EnqueueOutcome {
        let mut state = self.state.lock();
        let outcome = state.pending.enqueue(event);

        if let EnqueueOutcome::Queued {
            prefill: Some(message),
            ..
        } = &outcome
        {
            if state.draft.is_empty() {
                state.draft = message.clone();
            }
        }

        outcome
    }

    pub fn pending(&self) -> Vec<Attachment> {
        self.state.lock().pending.items().to_vec()
    }

    pub fn pending_groups(&self) -> Vec<AttachmentGroup> {
        self.state.lock().pending.groups()
    }

    pub fn remove_pending(&self, id: &AttachmentId) -> Option<Attachment> {
        self.state.lock().pending.remove(id)
    }

    pub fn remove_pending_group(&self, key: &GroupKey) -> Vec<Attachment> {
        self.state.lock().pending.remove_group(key)
    }

    /// Feed host attachment events into the pending queue until the sender closes
    pub fn spawn_intake(
        self: Arc<Self>,
        mut events: mpsc::Receiver<AttachmentEvent>,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            while let Some(event) = events.recv().await {
                self.receive_attachment(event);
            }
            tracing::debug!("Attachment intake channel closed");
        })
    }
}

/// Holds the session's single stream slot; releases it on every exit path
struct StreamSlot<'a> {
    session: &'a ChatSession,
    turn: Option<TurnId>,
}

impl StreamSlot<'_> {
    /// Close the open turn and append `trailing` under one lock
    fn finish(&mut self, trailing: Option<Turn>) -> Option<TurnId> {
        let mut state = self.session.state.lock();
        if let Some(turn) = self.turn.take() {
            state.transcript.close(turn);
        }
        trailing.and_then(|turn| state.transcript.push(turn).ok())
    }
}

impl Drop for StreamSlot<'_> {
    fn drop(&mut self) {
        if let Some(turn) = self.turn.take() {
            self.session.state.lock().transcript.close(turn);
        }
        self.session.active.lock().take();
    }
}
