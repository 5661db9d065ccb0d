use std::{sync::Arc, time::Duration};

use chris::{assistant::SESSION_SWEEP_SECONDS, Assistant, AssistantConfig};
use server::{routes, AppState};
use tracing_subscriber::{prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from `.env` if present so local development
    // picks up API keys
    dotenv::dotenv().ok();

    let log_level = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    let filter_string = format!("warn,server={level},chris={level}", level = log_level);
    let env_filter = EnvFilter::try_new(filter_string)?;
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_filter(env_filter))
        .init();

    let config = AssistantConfig::from_env();
    tracing::info!("Public base URL: {}", config.public_base_url);

    let assistant: AppState = Arc::new(Assistant::new(config)?);

    // Sweep stale call sessions and expired audio on an interval
    let sweeper = assistant.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(SESSION_SWEEP_SECONDS));
        loop {
            interval.tick().await;
            sweeper.sweep().await;
        }
    });

    let app = routes::router(assistant);

    let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
    let port = std::env::var("PORT")
        .ok()
        .and_then(|s| s.trim().parse::<u16>().ok())
        .unwrap_or(5000);

    let listener = tokio::net::TcpListener::bind(format!("{host}:{port}")).await?;
    tracing::info!("Frontdesk listening on http://{host}:{port}");

    axum::serve(listener, app).await?;
    Ok(())
}
