use axum::{extract::State, routing::get, Json, Router};

use chris::{HealthSnapshot, TtsProbe};

use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_check))
        .route("/health/tts", get(tts_health))
}

/// Service health and integration status
///
/// GET /health
async fn health_check(State(assistant): State<AppState>) -> Json<HealthSnapshot> {
    Json(assistant.health().await)
}

/// Live synthesis connectivity probe
///
/// GET /health/tts
async fn tts_health(State(assistant): State<AppState>) -> Json<TtsProbe> {
    Json(assistant.probe_tts().await)
}
