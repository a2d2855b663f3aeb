//! HTTP handlers

use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use super::AppState;
use super::sse::to_sse_response;
use crate::error::RelayError;
use crate::transcript::{Transcript, TranscriptStatus};
use crate::types::ChatRelayRequest;

/// `POST /api/chat`
pub async fn chat(
    State(state): State<AppState>,
    payload: Result<Json<ChatRelayRequest>, JsonRejection>,
) -> Result<Response, RelayError> {
    let Json(request) = payload.map_err(|rejection| RelayError::InvalidInput(rejection.body_text()))?;

    if request.stream {
        let stream = state.relay.open(&request).await?;
        Ok(to_sse_response(stream, state.sse.clone()))
    } else {
        let transcript = state.relay.complete(&request).await?;
        Ok(completion_response(transcript, &state))
    }
}

/// `GET /health`
pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

fn completion_response(transcript: Transcript, state: &AppState) -> Response {
    let content = transcript.reply().unwrap_or_default().to_string();
    match transcript.status() {
        TranscriptStatus::Completed => {
            (StatusCode::OK, Json(serde_json::json!({ "content": content }))).into_response()
        }
        TranscriptStatus::Failed(error) => (
            StatusCode::BAD_GATEWAY,
            Json(serde_json::json!({ "error": state.sse.error_text(error) })),
        )
            .into_response(),
        TranscriptStatus::Truncated | TranscriptStatus::Streaming => (
            StatusCode::OK,
            Json(serde_json::json!({ "content": content, "truncated": true })),
        )
            .into_response(),
    }
}
