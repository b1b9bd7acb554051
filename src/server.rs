use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use tokio::net::TcpListener;
use tracing::{error, info};

use crate::config::AppConfig;
use crate::pipeline::run_once;
use crate::types::Result;

pub const SERVICE_NAME: &str = "Niches Hunter Newsletter Generator";

#[derive(Clone)]
struct AppState {
    config: AppConfig,
}

pub fn router(config: AppConfig) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/generate", post(trigger_generate))
        .with_state(AppState { config })
}

/// Bind and serve the trigger surface until the process is stopped.
pub async fn serve(config: AppConfig) -> Result<()> {
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Newsletter generator listening on {}", addr);
    info!("Health check: GET /health, trigger: POST /generate");

    axum::serve(listener, router(config)).await?;
    Ok(())
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "service": SERVICE_NAME,
        "timestamp": Utc::now().to_rfc3339(),
    }))
}

/// Acknowledge immediately and run the pipeline in the background. A failure
/// after the acknowledgement is logged, not surfaced to the caller.
async fn trigger_generate(State(state): State<AppState>) -> Json<serde_json::Value> {
    info!("Manual newsletter generation triggered");

    tokio::spawn(async move {
        if let Err(err) = run_once(&state.config).await {
            error!("Triggered newsletter generation failed: {}", err);
        }
    });

    Json(serde_json::json!({
        "success": true,
        "message": "Newsletter generation started...",
    }))
}
