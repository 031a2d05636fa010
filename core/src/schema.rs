//! Storage document for the session collection.
//!
//! Current shape (version 1):
//!
//! ```json
//! { "version": 1, "sessions": [ { "id": "...", "title": "...", "updatedAt": "...",
//!                                 "model": "...", "conversation": [ { "role": "user", "text": "..." } ] } ] }
//! ```
//!
//! A bare JSON array is the unversioned layout written by the first browser
//! release under the `chatSessions` key (`date` instead of `updatedAt`, messages
//! as `{ role, parts: [{ text }] }`) and is migrated on read. Individual entries
//! that do not parse are skipped.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::warn;

use crate::config::DEFAULT_MODEL;
use crate::models::{Message, Role, Session, SessionId};

pub const SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unsupported schema version {0}")]
    UnsupportedVersion(u32),
}

#[derive(Serialize)]
struct Envelope<'a> {
    version: u32,
    sessions: &'a [Session],
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StoredSessions {
    Versioned { version: u32, sessions: Vec<Value> },
    Unversioned(Vec<Value>),
}

// ── Unversioned layout ───────────────────────────────────────────────────────

#[derive(Deserialize)]
struct LegacySession {
    id: String,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    date: Option<String>,
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    conversation: Vec<LegacyMessage>,
}

#[derive(Deserialize)]
struct LegacyMessage {
    role: String,
    #[serde(default)]
    parts: Vec<LegacyPart>,
}

#[derive(Deserialize)]
struct LegacyPart {
    #[serde(default)]
    text: String,
}

impl LegacySession {
    fn migrate(self, default_title: &str) -> Session {
        let updated_at = self
            .date
            .as_deref()
            .and_then(|d| DateTime::parse_from_rfc3339(d).ok())
            .map(|d| d.with_timezone(&Utc))
            .unwrap_or_else(Utc::now);

        let conversation = self
            .conversation
            .into_iter()
            .filter_map(|m| {
                let role = Role::try_from(m.role.as_str()).ok()?;
                let text: String = m.parts.into_iter().map(|p| p.text).collect();
                Some(Message { role, text, is_error: false })
            })
            .collect();

        Session {
            id: SessionId::from(self.id),
            title: self.title.unwrap_or_else(|| default_title.to_string()),
            updated_at,
            model: self.model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            conversation,
        }
    }
}

// ── Encode / decode ──────────────────────────────────────────────────────────

pub fn encode(sessions: &[Session]) -> Result<String, serde_json::Error> {
    serde_json::to_string(&Envelope { version: SCHEMA_VERSION, sessions })
}

/// Parses a stored document into sessions, migrating the unversioned layout.
pub fn decode(raw: &str, default_title: &str) -> Result<Vec<Session>, SchemaError> {
    match serde_json::from_str::<StoredSessions>(raw)? {
        StoredSessions::Versioned { version, sessions } => {
            if version != SCHEMA_VERSION {
                return Err(SchemaError::UnsupportedVersion(version));
            }
            Ok(parse_entries(sessions, |v| serde_json::from_value::<Session>(v)))
        }
        StoredSessions::Unversioned(sessions) => Ok(parse_entries(sessions, |v| {
            serde_json::from_value::<LegacySession>(v).map(|s| s.migrate(default_title))
        })),
    }
}

fn parse_entries(
    entries: Vec<Value>,
    parse: impl Fn(Value) -> Result<Session, serde_json::Error>,
) -> Vec<Session> {
    entries
        .into_iter()
        .enumerate()
        .filter_map(|(index, value)| match parse(value) {
            Ok(session) => Some(session),
            Err(e) => {
                warn!("Skipping unreadable stored session at index {index}: {e}");
                None
            }
        })
        .collect()
}
