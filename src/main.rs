mod agent;
mod config;
mod errors;
mod routes;
mod service;

use axum::{routing::post, Router};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::agent::OllamaAgentService;
use crate::config::RelayConfig;
use crate::routes::webhook_routes::chat_webhook_handler;
use crate::service::relay_service::RelayService;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = RelayConfig::from_env()?;

    // Initialise tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "chat_relay=debug,tower_http=debug".into()),
        )
        .init();

    // ── Dependency wiring ─────────────────────────────────────────────────────
    let agent = OllamaAgentService::new(&config.ollama_base_url)?;
    let relay = RelayService::new(agent, config.default_model.clone()).with_session_limit(config.max_sessions);
    info!(
        "Relaying to Ollama at {} (default model {})",
        config.ollama_base_url, config.default_model
    );

    // ── Router ────────────────────────────────────────────────────────────────
    let app = Router::new()
        .route("/webhook/chat", post(chat_webhook_handler::<OllamaAgentService>))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(relay);

    // ── Listen ────────────────────────────────────────────────────────────────
    let listener = tokio::net::TcpListener::bind(config.bind_address).await?;
    info!("Listening on http://{}/", config.bind_address);

    axum::serve(listener, app).await?;
    Ok(())
}
