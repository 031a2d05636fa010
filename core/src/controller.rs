use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::buffer::ConversationBuffer;
use crate::completion::{CompletionClient, CompletionRequest};
use crate::config::ChatConfig;
use crate::errors::{CompletionError, SessionError};
use crate::models::{Message, SessionId};
use crate::repository::{DeleteOutcome, SessionRepository};
use crate::store::KeyValueStore;

/// A user message that has been recorded and is waiting for its reply.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingSend {
    pub session_id: SessionId,
    pub request: CompletionRequest,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SessionListItem {
    pub id: SessionId,
    pub title: String,
    pub updated_at: DateTime<Utc>,
    pub is_active: bool,
}

/// Everything a renderer needs, pulled after each state change.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatView {
    pub sessions: Vec<SessionListItem>,
    pub messages: Vec<Message>,
    pub model: String,
    pub sending: bool,
    pub storage_warning: Option<String>,
}

/// Orchestrates user actions over the repository and the conversation buffer.
///
/// After construction there is always exactly one active session, and the
/// buffer always mirrors that session's stored conversation.
pub struct ChatController<K> {
    repo: SessionRepository<K>,
    buffer: ConversationBuffer,
    model: String,
    sending: Option<SessionId>,
}

impl<K: KeyValueStore> ChatController<K> {
    /// Restores the stored active session, or starts a new one when there is
    /// none (or the stored pointer no longer resolves).
    pub fn init(kv: K, config: ChatConfig) -> Self {
        let repo = SessionRepository::open(kv, config);
        let model = repo.config().default_model.clone();
        let mut controller = Self { repo, buffer: ConversationBuffer::new(), model, sending: None };

        let restored = match controller.repo.active_id().cloned() {
            Some(id) => controller.activate(&id).is_ok(),
            None => false,
        };
        if !restored {
            controller.start_new_session();
        }
        controller
    }

    // ── Accessors ────────────────────────────────────────────────────────────

    pub fn repository(&self) -> &SessionRepository<K> {
        &self.repo
    }

    pub fn active_id(&self) -> Option<&SessionId> {
        self.repo.active_id()
    }

    pub fn messages(&self) -> &[Message] {
        self.buffer.messages()
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn is_sending(&self) -> bool {
        self.sending.is_some()
    }

    pub fn view(&self) -> ChatView {
        let active = self.repo.active_id();
        ChatView {
            sessions: self
                .repo
                .list_sessions()
                .into_iter()
                .map(|s| SessionListItem {
                    is_active: active == Some(&s.id),
                    id: s.id,
                    title: s.title,
                    updated_at: s.updated_at,
                })
                .collect(),
            messages: self.buffer.to_vec(),
            model: self.model.clone(),
            sending: self.is_sending(),
            storage_warning: self.repo.last_write_error().map(ToString::to_string),
        }
    }

    // ── Sending ──────────────────────────────────────────────────────────────

    /// Records the user message and returns the request to dispatch.
    /// `None` when the text is blank or another send is still in flight.
    ///
    /// At most one send is outstanding per controller, across all sessions:
    /// a send from another session waits until the pending reply is finished.
    pub fn begin_send(&mut self, text: &str) -> Option<PendingSend> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }
        if let Some(in_flight) = &self.sending {
            debug!("Ignoring send while a reply for {in_flight} is pending");
            return None;
        }
        let Some(session_id) = self.repo.active_id().cloned() else {
            warn!("Ignoring send: {}", SessionError::NoActiveSession);
            return None;
        };

        self.buffer.push(Message::user(text));
        self.flush();
        self.sending = Some(session_id.clone());

        Some(PendingSend {
            request: CompletionRequest {
                message: text.to_string(),
                session_id: session_id.to_string(),
                model: Some(self.model.clone()),
            },
            session_id,
        })
    }

    /// Appends the reply (or the error reply) to the session the request came from.
    pub fn finish_send(&mut self, pending: PendingSend, outcome: Result<String, CompletionError>) {
        self.sending = None;

        let message = match outcome {
            Ok(text) => Message::model(text),
            Err(e) => {
                warn!("Completion for session {} failed: {e}", pending.session_id);
                Message::model_error(self.repo.config().error_reply.clone())
            }
        };

        if self.repo.active_id() == Some(&pending.session_id) {
            self.buffer.push(message);
            self.flush();
        } else if let Err(e) = self.repo.append_to_session(&pending.session_id, message) {
            warn!("Dropping reply: {e}");
        }
    }

    /// Returns `false` when the message was rejected without contacting the endpoint.
    pub async fn send_message<C>(&mut self, client: &C, text: &str) -> bool
    where
        C: CompletionClient + ?Sized,
    {
        let Some(pending) = self.begin_send(text) else {
            return false;
        };
        let outcome = client.complete(&pending.request).await;
        self.finish_send(pending, outcome);
        true
    }

    // ── Session actions ──────────────────────────────────────────────────────

    pub fn switch_to_session(&mut self, id: &SessionId) {
        if self.repo.active_id() == Some(id) {
            return;
        }
        if let Err(e) = self.activate(id) {
            debug!("Ignoring switch: {e}");
        }
    }

    pub fn start_new_session(&mut self) -> SessionId {
        let session = self.repo.create_session(&self.model);
        self.buffer.clear();
        session.id
    }

    /// Deletes any session; if it was the active one, moves to the next
    /// remaining session or starts a fresh one.
    pub fn delete_session(&mut self, id: &SessionId) {
        match self.repo.delete_session(id) {
            DeleteOutcome::RemovedActive { next: Some(next) } => {
                if self.activate(&next).is_err() {
                    self.start_new_session();
                }
            }
            DeleteOutcome::RemovedActive { next: None } => {
                self.start_new_session();
            }
            DeleteOutcome::Removed | DeleteOutcome::NotPresent => {}
        }
    }

    /// Empties the active conversation. Callers confirm with the user first.
    /// Ignored while a reply for the active session is pending.
    pub fn clear_active_conversation(&mut self) {
        if self.sending.is_some() && self.sending.as_ref() == self.repo.active_id() {
            debug!("Ignoring clear while a reply for the active session is pending");
            return;
        }
        self.buffer.clear();
        self.flush();
    }

    /// Changes the model used for the active session and persists it.
    pub fn select_model(&mut self, model: &str) {
        if self.model == model {
            return;
        }
        self.model = model.to_string();
        self.flush();
    }

    fn activate(&mut self, id: &SessionId) -> Result<(), SessionError> {
        let session = self.repo.load_session(id)?;
        self.buffer.replace(session.conversation);
        self.model = session.model;
        Ok(())
    }

    fn flush(&mut self) {
        if let Err(e) = self.repo.update_active_session(self.buffer.messages(), &self.model) {
            warn!("Conversation not saved: {e}");
        }
    }
}
