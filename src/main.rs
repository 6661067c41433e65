//! MindSetu - student wellness dashboard service
//!
//! Serves the role-gated dashboards, pricing flow, and SetuAI chat over a
//! JSON/SSE API.

mod api;
mod chat;
mod guard;
mod identity;
mod llm;
mod system_prompt;
mod wellness;

use api::{create_router, AppState};
use chat::ChatAdapter;
use identity::{MockIdentityBackend, SessionStore};
use llm::{build_provider, LlmConfig};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mindsetu=info,tower_http=debug".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(false)
                .with_span_list(false),
        )
        .init();

    // Configuration
    let port: u16 = std::env::var("MINDSETU_PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(8000);

    let auth_latency = std::env::var("MINDSETU_AUTH_LATENCY_MS")
        .ok()
        .and_then(|ms| ms.parse().ok())
        .map_or(Duration::ZERO, Duration::from_millis);

    // Identity backend
    let backend = MockIdentityBackend::new().with_latency(auth_latency);
    let session = SessionStore::new(Arc::new(backend));

    // Chat provider
    let llm_config = LlmConfig::from_env();
    let provider = build_provider(&llm_config);
    if provider.is_some() {
        tracing::info!(model = %llm_config.model, "Chat provider initialized");
    }
    let system_instruction = system_prompt::build_system_prompt(chrono::Local::now().date_naive());
    let chat = ChatAdapter::new(provider, llm_config.model, system_instruction);

    // Create application state
    let state = AppState::new(session, chat);

    // Create router
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = create_router(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("MindSetu server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
