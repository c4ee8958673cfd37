use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::service::{QueryService, DEFAULT_TOP_K};
use lexibot_core::error::Error;

/// Process-wide state, built once at startup and shared read-only across
/// requests.
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<QueryService>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AskRequest {
    pub query: String,
    #[serde(default = "default_top_k")]
    pub top_k: i64,
}

fn default_top_k() -> i64 {
    DEFAULT_TOP_K as i64
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AskResponse {
    pub query: String,
    pub answer: String,
    pub context: Vec<String>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/ask", post(ask))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn ask(
    State(state): State<AppState>,
    Json(req): Json<AskRequest>,
) -> std::result::Result<Json<AskResponse>, ApiError> {
    // Reject non-positive top_k before any embedding or search work.
    if req.top_k < 1 {
        return Err(ApiError(Error::BadRequest(
            "top_k must be a positive integer".to_string(),
        )));
    }
    let answer = state.service.ask(&req.query, req.top_k as usize).await?;
    Ok(Json(AskResponse {
        query: answer.query,
        answer: answer.answer,
        context: answer.context,
    }))
}

/// Maps the domain error taxonomy onto HTTP statuses: request errors are the
/// client's fault, everything else is a server error.
struct ApiError(Error);

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self.0 {
            Error::BadRequest(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            tracing::error!("request failed: {}", self.0);
        }
        (status, Json(serde_json::json!({ "error": self.0.to_string() }))).into_response()
    }
}
