use std::collections::HashSet;

use chrono::Utc;
use tracing::{debug, warn};

use crate::config::ChatConfig;
use crate::errors::{SessionError, StoreError};
use crate::models::{Message, Role, Session, SessionId, SessionSummary};
use crate::store::{KeyValueStore, SessionStore};

/// What `delete_session` did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteOutcome {
    NotPresent,
    Removed,
    /// The active session was removed; the pointer now refers to `next`.
    RemovedActive { next: Option<SessionId> },
}

/// Owns the session collection and the active pointer.
///
/// The in-memory collection is authoritative. Every mutation is followed by a
/// whole-collection write; a failed write is logged and kept in
/// [`SessionRepository::last_write_error`] until the next successful one.
pub struct SessionRepository<K> {
    store: SessionStore<K>,
    config: ChatConfig,
    sessions: Vec<Session>,
    active: Option<SessionId>,
    last_write_error: Option<StoreError>,
}

impl<K: KeyValueStore> SessionRepository<K> {
    /// Loads the stored collection, dropping duplicate ids and a dangling pointer.
    pub fn open(kv: K, config: ChatConfig) -> Self {
        let store = SessionStore::new(kv).with_default_title(config.default_title.clone());
        let (stored, active) = store.read();

        let mut seen = HashSet::new();
        let sessions: Vec<Session> = stored
            .into_iter()
            .filter(|s| {
                let fresh = seen.insert(s.id.clone());
                if !fresh {
                    warn!("Dropping stored session with duplicate id {}", s.id);
                }
                fresh
            })
            .collect();

        let active = active.filter(|id| {
            let valid = sessions.iter().any(|s| &s.id == id);
            if !valid {
                warn!("Stored active session {id} does not exist");
            }
            valid
        });

        Self { store, config, sessions, active, last_write_error: None }
    }

    pub fn config(&self) -> &ChatConfig {
        &self.config
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    pub fn active_id(&self) -> Option<&SessionId> {
        self.active.as_ref()
    }

    pub fn active_session(&self) -> Option<&Session> {
        self.active.as_ref().and_then(|id| self.session(id))
    }

    pub fn session(&self, id: &SessionId) -> Option<&Session> {
        self.sessions.iter().find(|s| &s.id == id)
    }

    pub fn last_write_error(&self) -> Option<&StoreError> {
        self.last_write_error.as_ref()
    }

    pub fn create_session(&mut self, model: &str) -> Session {
        let title = self.config.initial_title(self.sessions.len());
        let session = Session::new(title, model);
        debug!("Created session {} ({model})", session.id);

        self.sessions.insert(0, session.clone());
        self.active = Some(session.id.clone());
        self.persist();
        session
    }

    pub fn load_session(&mut self, id: &SessionId) -> Result<Session, SessionError> {
        let session = self
            .session(id)
            .cloned()
            .ok_or_else(|| SessionError::not_found(id.as_str()))?;

        self.active = Some(id.clone());
        self.persist();
        Ok(session)
    }

    /// Overwrites the active session's conversation and model, deriving its
    /// title when the conversation goes from empty to a single user message.
    pub fn update_active_session(&mut self, conversation: &[Message], model: &str) -> Result<(), SessionError> {
        let id = self.active.clone().ok_or(SessionError::NoActiveSession)?;
        let derived = conversation
            .first()
            .filter(|m| m.role == Role::User)
            .and_then(|m| self.config.derived_title(&m.text));
        let session = self
            .sessions
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or(SessionError::NoActiveSession)?;

        if session.conversation.is_empty() && conversation.len() == 1 {
            if let Some(title) = derived {
                session.title = title;
            }
        }
        session.conversation = conversation.to_vec();
        session.model = model.to_string();
        session.updated_at = Utc::now();

        self.persist();
        Ok(())
    }

    /// Appends to a session that is not necessarily the active one.
    pub fn append_to_session(&mut self, id: &SessionId, message: Message) -> Result<(), SessionError> {
        let session = self
            .sessions
            .iter_mut()
            .find(|s| &s.id == id)
            .ok_or_else(|| SessionError::not_found(id.as_str()))?;

        session.conversation.push(message);
        session.updated_at = Utc::now();
        self.persist();
        Ok(())
    }

    pub fn delete_session(&mut self, id: &SessionId) -> DeleteOutcome {
        let Some(index) = self.sessions.iter().position(|s| &s.id == id) else {
            return DeleteOutcome::NotPresent;
        };
        self.sessions.remove(index);

        let outcome = if self.active.as_ref() == Some(id) {
            self.active = self.sessions.first().map(|s| s.id.clone());
            DeleteOutcome::RemovedActive { next: self.active.clone() }
        } else {
            DeleteOutcome::Removed
        };
        debug!("Deleted session {id}: {outcome:?}");

        self.persist();
        outcome
    }

    pub fn list_sessions(&self) -> Vec<SessionSummary> {
        self.sessions.iter().map(Session::summary).collect()
    }

    fn persist(&mut self) {
        match self.store.write(&self.sessions, self.active.as_ref()) {
            Ok(()) => self.last_write_error = None,
            Err(e) => {
                warn!("Failed to persist sessions: {e}");
                self.last_write_error = Some(e);
            }
        }
    }
}
