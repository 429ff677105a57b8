//! HTTP handlers.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use std::sync::Arc;

use crate::application::{CoordinatorError, SessionCoordinator};
use crate::domain::foundation::ThreadId;

use super::dto::{ErrorResponse, MessageRequest, MessageResponse};

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub coordinator: Arc<SessionCoordinator>,
}

/// `GET /health`
pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

/// `POST /threads/:thread_id/messages`
///
/// Processes one conversation turn and returns the assistant's reply.
pub async fn post_message(
    State(state): State<AppState>,
    Path(thread_id): Path<String>,
    Json(request): Json<MessageRequest>,
) -> Response {
    let thread_id = match ThreadId::new(thread_id) {
        Ok(id) => id,
        Err(err) => {
            return error_response(StatusCode::BAD_REQUEST, err.to_string());
        }
    };
    if request.message.trim().is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "message must not be empty".to_string());
    }

    match state
        .coordinator
        .process_message(thread_id.clone(), &request.message)
        .await
    {
        Ok(outcome) => {
            Json(MessageResponse::from_outcome(thread_id.to_string(), outcome)).into_response()
        }
        Err(CoordinatorError::Validation(err)) => {
            error_response(StatusCode::BAD_REQUEST, err.to_string())
        }
        Err(CoordinatorError::Store(err)) => {
            tracing::error!(error = %err, "session storage failure");
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "failed to process message".to_string(),
            )
        }
    }
}

fn error_response(status: StatusCode, message: String) -> Response {
    (status, Json(ErrorResponse { error: message })).into_response()
}
