//! Liveness endpoint.

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use super::AppState;

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    /// Focus modes with a registered handler.
    pub focus_modes: Vec<&'static str>,
}

/// Route: `GET /health`
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let mut focus_modes: Vec<_> = state
        .websocket
        .router
        .registry()
        .modes()
        .into_iter()
        .map(|mode| mode.as_str())
        .collect();
    focus_modes.sort_unstable();

    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        focus_modes,
    })
}
