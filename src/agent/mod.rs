use std::future::Future;

use chat_sessions_core::{Message, Role};
use rig::client::Nothing;
use rig::completion::Chat;
use rig::message::Message as RigMessage;
use rig::prelude::CompletionClient;
use rig::providers::ollama;
use tracing::error;

use crate::errors::RelayError;

const PREAMBLE: &str = "You are a helpful AI assistant running locally via Ollama. \
                        Be concise, accurate, and friendly. \
                        If you don't know something, say so.";

/// One chat turn against a language model, with the prior turns replayed as context.
pub trait ChatAgent: Clone + Send + Sync + 'static {
    fn chat(
        &self,
        session_id: &str,
        model: &str,
        history: &[Message],
        user_message: &str,
    ) -> impl Future<Output = Result<String, RelayError>> + Send;
}

/// Builds a rig [`RigMessage`] history list from the relay's stored turns.
/// Locally generated error replies are never part of the context.
fn to_rig_history(messages: &[Message]) -> Vec<RigMessage> {
    messages
        .iter()
        .filter(|m| !m.is_error)
        .map(|m| match m.role {
            Role::User => RigMessage::user(&m.text),
            Role::Model => RigMessage::assistant(&m.text),
        })
        .collect()
}

/// Agent backed by the rig [`ollama::Client`].
/// A fresh rig agent is built per request so the requested model can vary per session.
#[derive(Clone)]
pub struct OllamaAgentService {
    client: ollama::Client,
    base_url: String,
}

impl OllamaAgentService {
    pub fn new(base_url: &str) -> Result<Self, RelayError> {
        let client = ollama::Client::builder()
            .api_key(Nothing)
            .base_url(base_url)
            .build()
            .map_err(|e| RelayError::Unexpected(format!("Failed to build Ollama client: {e}")))?;
        Ok(Self { client, base_url: base_url.to_string() })
    }
}

impl ChatAgent for OllamaAgentService {
    async fn chat(
        &self,
        session_id: &str,
        model: &str,
        history: &[Message],
        user_message: &str,
    ) -> Result<String, RelayError> {
        let agent = self.client.agent(model).preamble(PREAMBLE).build();

        agent
            .chat(user_message, to_rig_history(history))
            .await
            .map_err(|e| {
                error!("Ollama inference failed for session {session_id}: {e}");
                let msg = e.to_string();
                if msg.contains("Connection refused") || msg.contains("connect") {
                    RelayError::OllamaUnavailable { host: self.base_url.clone() }
                } else if msg.contains("model") {
                    RelayError::ModelNotFound { model_name: model.to_string() }
                } else {
                    RelayError::InferenceError { message: msg }
                }
            })
    }
}
