use async_trait::async_trait;
use chat_sessions_core::{interpret_response, CompletionClient, CompletionError, CompletionRequest};
use gloo_net::http::Request;

/// Completion endpoint, overridable at build time with `CHAT_ENDPOINT_URL`.
pub const ENDPOINT_URL: &str = match option_env!("CHAT_ENDPOINT_URL") {
    Some(url) => url,
    None => "http://localhost:8080/webhook/chat",
};

/// Models offered in the selector.
pub const MODELS: &[&str] = &["gemini-2.5-flash", "gemini-2.5-pro", "gemini-2.0-flash"];

/// Posts completion requests to the endpoint with `fetch`.
#[derive(Clone, Debug)]
pub struct EndpointClient {
    url: String,
}

impl EndpointClient {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

impl Default for EndpointClient {
    fn default() -> Self {
        Self::new(ENDPOINT_URL)
    }
}

#[async_trait(?Send)]
impl CompletionClient for EndpointClient {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, CompletionError> {
        let resp = Request::post(&self.url)
            .json(request)
            .map_err(|e| CompletionError::Network(format!("Serialize error: {e}")))?
            .send()
            .await
            .map_err(|e| CompletionError::Network(e.to_string()))?;

        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| CompletionError::MalformedResponse(e.to_string()))?;

        interpret_response(status, &body)
    }
}
