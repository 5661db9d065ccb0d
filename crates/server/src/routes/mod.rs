use axum::Router;
use tower_http::cors::CorsLayer;

use crate::{middleware::request_id_middleware, AppState};

pub mod admin;
pub mod health;
pub mod voice;

pub fn router(state: AppState) -> Router {
    Router::new()
        .merge(health::router())
        .merge(voice::router())
        .merge(admin::router())
        .layer(axum::middleware::from_fn(request_id_middleware))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
