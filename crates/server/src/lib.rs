pub mod error;
pub mod middleware;
pub mod response;
pub mod routes;

/// Shared state handed to every route
pub type AppState = std::sync::Arc<chris::Assistant>;
