//! Relay configuration, loaded from environment variables at startup.
//! A `.env` file in the working directory is honoured for local development.

use std::net::SocketAddr;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

#[derive(Clone, Debug)]
pub struct RelayConfig {
    pub bind_address: SocketAddr,
    pub ollama_base_url: String,
    /// Used when a request does not name a model.
    pub default_model: String,
    /// Sessions whose history is kept; the least recently used is dropped beyond this.
    pub max_sessions: usize,
}

impl RelayConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }

        let port: u16 = match std::env::var("PORT") {
            Ok(p) => p
                .parse()
                .map_err(|_| ConfigError::InvalidValue("PORT".to_string(), format!("'{p}' is not a port")))?,
            Err(_) => 8080,
        };

        let ollama_base_url = std::env::var("OLLAMA_API_BASE_URL")
            .unwrap_or_else(|_| "http://localhost:11434".to_string());

        let default_model =
            std::env::var("RELAY_DEFAULT_MODEL").unwrap_or_else(|_| "llama3.2".to_string());

        let max_sessions: usize = match std::env::var("RELAY_MAX_SESSIONS") {
            Ok(n) => n
                .parse()
                .ok()
                .filter(|n| *n > 0)
                .ok_or_else(|| {
                    ConfigError::InvalidValue("RELAY_MAX_SESSIONS".to_string(), format!("'{n}' is not a positive count"))
                })?,
            Err(_) => 256,
        };

        Ok(Self {
            bind_address: SocketAddr::from(([0, 0, 0, 0], port)),
            ollama_base_url,
            default_model,
            max_sessions,
        })
    }
}
