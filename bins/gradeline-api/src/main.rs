mod error;
mod handlers;
mod metrics;
mod routes;

use anyhow::Context;
use axum::Router;
use gradeline_common::Config;
use gradeline_grader::Judge0Grader;
use redis::aio::ConnectionManager;
use std::sync::Arc;
use std::time::Instant;
use tokio::net::TcpListener;
use tracing::{info, warn};

pub struct AppState {
    pub redis: ConnectionManager,
    pub grader: Arc<Judge0Grader>,
    pub start_time: Instant,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    info!("Gradeline API booting...");

    let config = Config::from_env();
    if config.api_keys.is_empty() {
        warn!("No judge API keys configured, every grading request will fail");
    }
    info!(
        judge = %config.judge_base_url,
        keys = config.api_keys.len(),
        poll_interval_ms = config.poll_interval_ms,
        max_poll_attempts = config.max_poll_attempts,
        "Loaded configuration"
    );

    metrics::init_metrics();
    info!("Metrics registry initialized");

    let client = redis::Client::open(config.redis_url.as_str())
        .context("Failed to create Redis client")?;
    let redis_conn = ConnectionManager::new(client)
        .await
        .context("Failed to connect to Redis")?;
    info!("Connected to Redis: {}", config.redis_url);

    let grader = gradeline_grader::grader_from_config(&config)
        .context("Failed to build judge client")?;

    let state = Arc::new(AppState {
        redis: redis_conn,
        grader: Arc::new(grader),
        start_time: Instant::now(),
    });

    let app = Router::new().merge(routes::routes()).with_state(state);

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    info!("HTTP server listening on {}", addr);

    axum::serve(listener, app).await.context("Server error")?;
    Ok(())
}
