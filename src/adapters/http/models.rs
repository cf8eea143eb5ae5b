//! Model listing endpoint.

use axum::extract::State;
use axum::Json;

use crate::adapters::ai::ModelListing;

use super::AppState;

/// Route: `GET /api/models`
///
/// Chat models per provider plus the embedding model in use.
pub async fn list_models(State(state): State<AppState>) -> Json<ModelListing> {
    Json(state.models.as_ref().clone())
}
