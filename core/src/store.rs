use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use tracing::{debug, warn};

use crate::config::DEFAULT_TITLE;
use crate::errors::StoreError;
use crate::models::{Session, SessionId};
use crate::schema;

pub const SESSIONS_KEY: &str = "sessions";
pub const ACTIVE_SESSION_KEY: &str = "activeSessionId";
/// Where the first browser release kept its unversioned array.
pub const LEGACY_SESSIONS_KEY: &str = "chatSessions";

/// String-valued key-value persistence, e.g. the browser's `localStorage`.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError>;
    fn remove(&mut self, key: &str) -> Result<(), StoreError>;
}

/// In-memory store. Clones share the same entries, so a clone kept aside
/// observes everything written through the original (useful to simulate a reload).
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: Rc<RefCell<BTreeMap<String, String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entry(self, key: &str, value: &str) -> Self {
        self.entries.borrow_mut().insert(key.to_string(), value.to_string());
        self
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.entries.borrow().get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        self.entries.borrow_mut().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        self.entries.borrow_mut().remove(key);
        Ok(())
    }
}

/// Reads and writes the session collection plus the active pointer.
/// Holds no business rules; see [`crate::repository::SessionRepository`].
pub struct SessionStore<K> {
    kv: K,
    default_title: String,
}

impl<K: KeyValueStore> SessionStore<K> {
    pub fn new(kv: K) -> Self {
        Self { kv, default_title: DEFAULT_TITLE.to_string() }
    }

    /// Title given to migrated sessions that were stored without one.
    pub fn with_default_title(mut self, title: impl Into<String>) -> Self {
        self.default_title = title.into();
        self
    }

    /// Never fails: unreadable data is logged and treated as absent.
    /// Falls back to [`LEGACY_SESSIONS_KEY`] when nothing is stored under [`SESSIONS_KEY`].
    pub fn read(&self) -> (Vec<Session>, Option<SessionId>) {
        let raw = match self.kv.get(SESSIONS_KEY) {
            Ok(None) => self.kv.get(LEGACY_SESSIONS_KEY).map(|legacy| {
                if legacy.is_some() {
                    debug!("Migrating sessions from {LEGACY_SESSIONS_KEY}");
                }
                legacy
            }),
            found => found,
        };
        let sessions = match raw {
            Ok(Some(raw)) => schema::decode(&raw, &self.default_title).unwrap_or_else(|e| {
                warn!("Ignoring stored sessions: {e}");
                Vec::new()
            }),
            Ok(None) => Vec::new(),
            Err(e) => {
                warn!("Failed to read stored sessions: {e}");
                Vec::new()
            }
        };

        let active = match self.kv.get(ACTIVE_SESSION_KEY) {
            Ok(Some(id)) if !id.trim().is_empty() => Some(SessionId::from(id)),
            Ok(_) => None,
            Err(e) => {
                warn!("Failed to read active session id: {e}");
                None
            }
        };

        debug!("Read {} stored sessions (active: {active:?})", sessions.len());
        (sessions, active)
    }

    /// Replaces the whole collection and the pointer. Not retried on failure.
    ///
    /// A cleared pointer is removed before the collection is written; a new one
    /// is set after it. If the second step fails the stored pointer may name a
    /// session that is not in the collection, which
    /// [`SessionRepository::open`](crate::repository::SessionRepository::open) drops.
    pub fn write(&mut self, sessions: &[Session], active: Option<&SessionId>) -> Result<(), StoreError> {
        let raw = schema::encode(sessions).map_err(|e| StoreError::Serialize(e.to_string()))?;
        if active.is_none() {
            self.kv.remove(ACTIVE_SESSION_KEY)?;
        }
        self.kv.set(SESSIONS_KEY, &raw)?;
        if let Err(e) = self.kv.remove(LEGACY_SESSIONS_KEY) {
            warn!("Failed to remove {LEGACY_SESSIONS_KEY}: {e}");
        }
        match active {
            Some(id) => self.kv.set(ACTIVE_SESSION_KEY, id.as_str()),
            None => Ok(()),
        }
    }
}
