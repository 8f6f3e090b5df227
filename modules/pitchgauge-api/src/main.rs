//! HTTP shell: a synchronous evaluation endpoint over the core pipeline.
//!
//! One of the two shell designs in circulation (the other being a job
//! queue); this service holds the request open for the duration of the
//! run. Admission is capped with a semaphore so a burst of requests cannot
//! fan out an unbounded number of model calls.

use std::sync::Arc;

use anyhow::Result;
use axum::routing::{get, post};
use axum::Router;
use tokio::sync::Semaphore;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::EnvFilter;

use model_client::Claude;
use pitchgauge_common::Config;
use pitchgauge_core::Evaluator;

mod rest;

pub struct AppState {
    pub evaluator: Evaluator,
    /// Caps simultaneous evaluations. The 4-wide fan-out inside each run
    /// is fixed by the pipeline itself.
    pub admission: Semaphore,
}

fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/evaluate", post(rest::evaluate))
        .route("/health", get(rest::health))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("pitchgauge_api=info".parse()?),
        )
        .init();

    let config = Config::from_env();
    config.log_redacted();

    let model = Arc::new(Claude::new(&config.anthropic_api_key, &config.model));
    let state = Arc::new(AppState {
        evaluator: Evaluator::new(model),
        admission: Semaphore::new(config.max_concurrent_evaluations),
    });

    let app = router(state);

    let listener =
        tokio::net::TcpListener::bind((config.web_host.as_str(), config.web_port)).await?;
    info!(host = %config.web_host, port = config.web_port, "evaluation API listening");
    axum::serve(listener, app).await?;
    Ok(())
}
