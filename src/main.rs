//! Crew router - multi-responder conversation service
//!
//! Routes each user message through a bounded dispatcher loop that picks a
//! specialist responder or runs a named task, then returns the final message.

mod api;
mod config;
mod llm;
mod nodes;
mod registry;
mod response_log;
mod runtime;
mod state_machine;

use api::{create_router, AppState};
use config::AppConfig;
use llm::LlmService;
use response_log::ResponseLogger;
use runtime::{Dispatcher, InMemorySessionStore, SessionManager};
use std::net::SocketAddr;
use std::sync::Arc;
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
                .unwrap_or_else(|_| "crew_router=info,tower_http=debug".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(false)
                .with_span_list(false),
        )
        .init();

    let config = AppConfig::from_env();

    // Responders and tasks
    tracing::info!(path = %config.resources_dir.display(), "Loading resources");
    let registry = Arc::new(registry::load_from_dir(&config.resources_dir));
    if registry.resolve_responder(&config.dispatch.default_responder).is_none() {
        tracing::warn!(
            responder = %config.dispatch.default_responder,
            "Default responder is not registered; user messages will fail"
        );
    }
    tracing::info!(
        responders = ?registry.responders().iter().map(|r| r.id.as_str()).collect::<Vec<_>>(),
        tasks = ?registry.task_names(),
        "Registry loaded"
    );

    // Completion provider
    let llm = llm::build_service(&config.llm)?;
    tracing::info!(model = %llm.model_id(), "Completion provider ready");

    let dispatcher = Dispatcher::new(registry, llm, config.dispatch.clone());
    let sessions = SessionManager::new(Arc::new(dispatcher), Arc::new(InMemorySessionStore::new()));
    let state = AppState::new(sessions, ResponseLogger::new(&config.log_dir), Vec::new());

    // Create router
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = create_router(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Crew router listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
