use thiserror::Error;

/// Errors raised while serving a completion request.
/// All variants carry a human-readable message that is returned to the caller.
#[derive(Debug, Error)]
pub enum RelayError {
    // ── AI Agent errors ──────────────────────────────────────────────────────
    #[error("Ollama service unavailable at {host}")]
    OllamaUnavailable { host: String },

    #[error("Model '{model_name}' not found in Ollama")]
    ModelNotFound { model_name: String },

    #[error("Inference error: {message}")]
    InferenceError { message: String },

    // ── Validation errors ────────────────────────────────────────────────────
    #[error("Field '{field_name}' cannot be empty")]
    EmptyField { field_name: String },

    #[error("Field '{field_name}' exceeds max length of {max_length} (actual: {actual_length})")]
    FieldTooLong { field_name: String, max_length: usize, actual_length: usize },

    // ── System errors ────────────────────────────────────────────────────────
    #[error("Unexpected error: {0}")]
    Unexpected(String),
}

impl RelayError {
    pub fn empty_field(field_name: impl Into<String>) -> Self {
        RelayError::EmptyField { field_name: field_name.into() }
    }

    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            RelayError::EmptyField { .. } | RelayError::FieldTooLong { .. } | RelayError::ModelNotFound { .. }
        )
    }

    pub fn is_agent_unavailable(&self) -> bool {
        matches!(self, RelayError::OllamaUnavailable { .. })
    }
}
