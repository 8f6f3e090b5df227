//! REST handlers for the evaluation API.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde::Deserialize;
use tracing::warn;

use crate::AppState;

/// Longest accepted idea text. Anything larger is noise or abuse.
const MAX_IDEA_LEN: usize = 20_000;

#[derive(Deserialize)]
pub struct EvaluateRequest {
    raw_idea: String,
}

pub async fn evaluate(
    State(state): State<Arc<AppState>>,
    Json(body): Json<EvaluateRequest>,
) -> Response {
    let idea = body.raw_idea.trim().to_string();
    if idea.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({"error": "raw_idea must not be empty"})),
        )
            .into_response();
    }
    if idea.len() > MAX_IDEA_LEN {
        return (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({"error": "idea text too long"})),
        )
            .into_response();
    }

    let _permit = match state.admission.acquire().await {
        Ok(permit) => permit,
        Err(_) => {
            return (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(serde_json::json!({"error": "server shutting down"})),
            )
                .into_response();
        }
    };

    match state.evaluator.run(&idea).await {
        Ok(result) => Json(result).into_response(),
        Err(e) => {
            warn!(stage = ?e.stage().map(|s| s.to_string()), error = %e, "evaluation failed");
            let stage = e.stage().map(|s| s.to_string());
            (
                StatusCode::BAD_GATEWAY,
                Json(serde_json::json!({"error": e.to_string(), "stage": stage})),
            )
                .into_response()
        }
    }
}

pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "ok"}))
}
