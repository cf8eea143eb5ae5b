//! HTTP surface: WebSocket endpoint, health and model listing.
//!
//! Routes:
//! - `GET /ws` - streaming protocol (WebSocket upgrade)
//! - `GET /health` - liveness and registered focus modes
//! - `GET /api/models` - available chat and embedding models

mod health;
mod models;

pub use health::{health, HealthResponse};
pub use models::list_models;

use std::sync::Arc;

use axum::extract::FromRef;
use axum::http::HeaderValue;
use axum::routing::get;
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::adapters::ai::ModelListing;
use crate::adapters::websocket::{ws_handler, WebSocketState};

/// Shared state of the HTTP surface.
#[derive(Clone)]
pub struct AppState {
    pub websocket: WebSocketState,
    pub models: Arc<ModelListing>,
}

impl AppState {
    pub fn new(websocket: WebSocketState, models: ModelListing) -> Self {
        Self {
            websocket,
            models: Arc::new(models),
        }
    }
}

impl FromRef<AppState> for WebSocketState {
    fn from_ref(state: &AppState) -> Self {
        state.websocket.clone()
    }
}

/// Builds the application router.
///
/// `cors_origins` empty allows any origin.
pub fn app_router(state: AppState, cors_origins: &[String]) -> Router {
    Router::new()
        .route("/ws", get(ws_handler))
        .route("/health", get(health))
        .route("/api/models", get(list_models))
        .layer(cors_layer(cors_origins))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    let parsed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    if parsed.is_empty() {
        layer.allow_origin(Any)
    } else {
        layer.allow_origin(parsed)
    }
}
