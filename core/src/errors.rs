use thiserror::Error;

/// Failures raised by the session repository.
/// Both are recovered inside the controller and never reach the user as raw errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("Session '{id}' not found")]
    NotFound { id: String },

    #[error("No active session to update")]
    NoActiveSession,
}

impl SessionError {
    pub fn not_found(id: impl Into<String>) -> Self {
        SessionError::NotFound { id: id.into() }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, SessionError::NotFound { .. })
    }
}

/// Persistence failures. The in-memory state stays authoritative when one of these occurs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("Storage unavailable: {message}")]
    Unavailable { message: String },

    #[error("Failed to write key '{key}': {message}")]
    Write { key: String, message: String },

    #[error("Failed to serialize sessions: {0}")]
    Serialize(String),
}

impl StoreError {
    pub fn write(key: impl Into<String>, message: impl Into<String>) -> Self {
        StoreError::Write { key: key.into(), message: message.into() }
    }
}

/// Every way a completion request can fail. All of them end up as the same
/// model-authored error reply in the conversation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompletionError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Server error: {status}")]
    Status { status: u16 },

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Response did not contain an output")]
    MissingOutput,
}

impl CompletionError {
    pub fn is_transport(&self) -> bool {
        matches!(self, CompletionError::Network(_) | CompletionError::Status { .. })
    }
}
