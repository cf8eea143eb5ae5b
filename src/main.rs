//! Focus Relay server.

use std::error::Error;
use std::sync::Arc;

use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use focus_relay::adapters::{app_router, AppState, ModelCatalog, SearxngClient, WebSocketState};
use focus_relay::application::focus_handlers::default_registry;
use focus_relay::application::RequestRouter;
use focus_relay::config::{AppConfig, ServerConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let config = AppConfig::load()?;
    init_tracing(&config.server);
    config.validate()?;

    let catalog = ModelCatalog::discover(&config.providers).await;
    let chat_model = catalog.resolve_default()?;
    let embeddings = catalog.resolve_embeddings()?;
    tracing::info!(
        chat = ?chat_model.provider_info(),
        embeddings = ?embeddings.provider_info(),
        "models resolved"
    );

    let searxng_url = config.search.searxng_url.clone().unwrap_or_default();
    let search = Arc::new(SearxngClient::new(searxng_url)?);
    let registry = default_registry(search, config.search.answer_settings());

    let router = RequestRouter::new(Arc::new(registry), chat_model, embeddings)
        .with_limits(config.streaming.limits());
    let state = AppState::new(
        WebSocketState::new(router, config.streaming.outbound_buffer),
        catalog.listing(),
    );
    let app = app_router(state, &config.server.cors_origins_list());

    let addr = config.server.socket_addr()?;
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, environment = ?config.server.environment, "Focus Relay listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Focus Relay shut down");
    Ok(())
}

fn init_tracing(server: &ServerConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&server.log_level));
    let registry = tracing_subscriber::registry().with(filter);

    if server.is_production() {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_current_span(true))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_target(true))
            .init();
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for ctrl-c: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Received ctrl-c, initiating graceful shutdown");
}
