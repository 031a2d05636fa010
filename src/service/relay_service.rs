use std::collections::HashMap;
use std::sync::Arc;

use chat_sessions_core::{CompletionRequest, CompletionResponse, Message};
use tokio::sync::Mutex;
use tracing::debug;

use crate::agent::ChatAgent;
use crate::errors::RelayError;

const MAX_MESSAGE_LENGTH: usize = 8000;
/// Turns kept per session and replayed to the model.
const MAX_HISTORY_MESSAGES: usize = 50;
const DEFAULT_MAX_SESSIONS: usize = 256;

#[derive(Default)]
struct SessionHistory {
    messages: Vec<Message>,
    last_used: u64,
}

#[derive(Default)]
struct Histories {
    sessions: HashMap<String, SessionHistory>,
    clock: u64,
}

/// Serves completion requests, keeping a short in-memory history per browser session.
///
/// At most `max_sessions` histories are held; recording a turn for a new session
/// beyond that drops the least recently used one.
#[derive(Clone)]
pub struct RelayService<A> {
    agent: A,
    default_model: String,
    max_sessions: usize,
    histories: Arc<Mutex<Histories>>,
}

impl<A: ChatAgent> RelayService<A> {
    pub fn new(agent: A, default_model: impl Into<String>) -> Self {
        Self {
            agent,
            default_model: default_model.into(),
            max_sessions: DEFAULT_MAX_SESSIONS,
            histories: Arc::new(Mutex::new(Histories::default())),
        }
    }

    pub fn with_session_limit(mut self, max_sessions: usize) -> Self {
        self.max_sessions = max_sessions.max(1);
        self
    }

    pub async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, RelayError> {
        // ── Validation ────────────────────────────────────────────────────────
        let message = request.message.trim();
        if message.is_empty() {
            return Err(RelayError::empty_field("message"));
        }
        if message.len() > MAX_MESSAGE_LENGTH {
            return Err(RelayError::FieldTooLong {
                field_name: "message".to_string(),
                max_length: MAX_MESSAGE_LENGTH,
                actual_length: message.len(),
            });
        }
        if request.session_id.trim().is_empty() {
            return Err(RelayError::empty_field("sessionId"));
        }

        let model = request
            .model
            .as_deref()
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .unwrap_or(self.default_model.as_str());

        // ── Run the turn with the stored history ──────────────────────────────
        let history = self.history(&request.session_id).await;
        debug!(
            "Completing for session {} with {model} ({} prior messages)",
            request.session_id,
            history.len()
        );
        let reply = self.agent.chat(&request.session_id, model, &history, message).await?;

        self.record(&request.session_id, Message::user(message), Message::model(reply.clone()))
            .await;
        Ok(CompletionResponse::output(reply))
    }

    pub async fn history(&self, session_id: &str) -> Vec<Message> {
        self.histories
            .lock()
            .await
            .sessions
            .get(session_id)
            .map(|h| h.messages.clone())
            .unwrap_or_default()
    }

    async fn record(&self, session_id: &str, user: Message, reply: Message) {
        let mut histories = self.histories.lock().await;
        histories.clock += 1;
        let now = histories.clock;

        let history = histories.sessions.entry(session_id.to_string()).or_default();
        history.last_used = now;
        history.messages.push(user);
        history.messages.push(reply);
        if history.messages.len() > MAX_HISTORY_MESSAGES {
            let excess = history.messages.len() - MAX_HISTORY_MESSAGES;
            history.messages.drain(..excess);
        }

        while histories.sessions.len() > self.max_sessions {
            let Some(oldest) = histories
                .sessions
                .iter()
                .min_by_key(|(_, h)| h.last_used)
                .map(|(id, _)| id.clone())
            else {
                break;
            };
            debug!("Evicting history for session {oldest}");
            histories.sessions.remove(&oldest);
        }
    }
}
