//! Contract with the remote completion endpoint.
//!
//! Request: `POST { "message", "sessionId", "model"? }`.
//! Response: `{ "output": "..." }`. Anything else is a failure.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::errors::CompletionError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionRequest {
    pub message: String,
    pub session_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompletionResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
}

impl CompletionResponse {
    pub fn output(text: impl Into<String>) -> Self {
        Self { output: Some(text.into()) }
    }

    /// An empty `output` counts as missing.
    pub fn into_output(self) -> Result<String, CompletionError> {
        self.output
            .filter(|o| !o.trim().is_empty())
            .ok_or(CompletionError::MissingOutput)
    }
}

/// Turns an HTTP status and raw body into the reply text.
pub fn interpret_response(status: u16, body: &str) -> Result<String, CompletionError> {
    if !(200..300).contains(&status) {
        return Err(CompletionError::Status { status });
    }
    serde_json::from_str::<CompletionResponse>(body)
        .map_err(|e| CompletionError::MalformedResponse(e.to_string()))?
        .into_output()
}

/// Sends one request to the completion endpoint.
///
/// `?Send` because the browser client's futures are not `Send`.
#[async_trait(?Send)]
pub trait CompletionClient {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, CompletionError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_uses_wire_names() {
        let req = CompletionRequest {
            message: "hola".into(),
            session_id: "abc".into(),
            model: Some("gemini-2.5-flash".into()),
        };
        assert_eq!(
            serde_json::to_string(&req).unwrap(),
            r#"{"message":"hola","sessionId":"abc","model":"gemini-2.5-flash"}"#
        );

        let req = CompletionRequest { model: None, ..req };
        assert_eq!(serde_json::to_string(&req).unwrap(), r#"{"message":"hola","sessionId":"abc"}"#);
    }

    #[test]
    fn interprets_success() {
        assert_eq!(interpret_response(200, r#"{"output":"hi"}"#), Ok("hi".to_string()));
    }

    #[test]
    fn interprets_failures() {
        assert_eq!(interpret_response(502, r#"{"output":"hi"}"#), Err(CompletionError::Status { status: 502 }));
        assert_eq!(interpret_response(200, r#"{"error":"boom"}"#), Err(CompletionError::MissingOutput));
        assert_eq!(interpret_response(200, r#"{"output":""}"#), Err(CompletionError::MissingOutput));
        assert!(matches!(interpret_response(200, "<html>"), Err(CompletionError::MalformedResponse(_))));
    }
}
