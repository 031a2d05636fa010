use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chat_sessions_core::CompletionRequest;
use serde_json::json;
use tracing::warn;

use crate::agent::ChatAgent;
use crate::errors::RelayError;
use crate::service::relay_service::RelayService;

/// POST `/webhook/chat` — `{ message, sessionId, model? }` in, `{ output }` out.
/// Failures answer `{ error }`, which browser clients treat as a missing output.
pub async fn chat_webhook_handler<A: ChatAgent>(
    State(svc): State<RelayService<A>>,
    Json(request): Json<CompletionRequest>,
) -> Response {
    match svc.complete(request).await {
        Ok(response) => Json(response).into_response(),
        Err(err) => error_response(&err),
    }
}

fn status_for(err: &RelayError) -> StatusCode {
    if err.is_validation() {
        StatusCode::BAD_REQUEST
    } else if err.is_agent_unavailable() {
        StatusCode::SERVICE_UNAVAILABLE
    } else if matches!(err, RelayError::InferenceError { .. }) {
        StatusCode::BAD_GATEWAY
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    }
}

fn error_response(err: &RelayError) -> Response {
    let status = status_for(err);
    warn!("Completion request failed ({status}): {err}");
    (status, Json(json!({ "error": err.to_string() }))).into_response()
}
