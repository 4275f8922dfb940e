use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::fields::Variant;
use crate::state::AppState;

/// GET /health
/// Returns service status, version and whether the entity model is loaded.
pub async fn health_handler(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "service": "resume-api",
        "default_variant": state.config.default_variant,
        "entity_model_loaded": state.field_extractors.for_variant(Variant::Entity).produces_fields(),
    }))
}
