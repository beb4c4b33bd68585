use axum::{extract::State, http::StatusCode, response::Json};
use serde::{Deserialize, Serialize};
use takotako_core::GenerationResult;

use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct CommentRequest {
    pub content: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CommentResponse {
    pub thinking_process: String,
    pub final_comment: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: u16,
}

#[derive(Debug, Serialize)]
pub struct WelcomeResponse {
    pub message: String,
}

pub async fn root() -> Json<WelcomeResponse> {
    Json(WelcomeResponse {
        message: "Welcome to the TakoTako comment API!".to_string(),
    })
}

pub async fn create_comment(
    State(state): State<AppState>,
    Json(request): Json<CommentRequest>,
) -> Result<Json<CommentResponse>, (StatusCode, Json<ErrorResponse>)> {
    if request.content.is_empty() {
        return Err(error_response(
            StatusCode::BAD_REQUEST,
            "content must not be empty",
        ));
    }

    match state.generator.generate(&request.content).await {
        GenerationResult::Success { reasoning, comment } => Ok(Json(CommentResponse {
            thinking_process: reasoning,
            final_comment: comment,
        })),
        GenerationResult::Error { error } => {
            tracing::error!("Comment generation failed: {}", error);
            Err(error_response(StatusCode::INTERNAL_SERVER_ERROR, &error))
        }
    }
}

fn error_response(status: StatusCode, message: &str) -> (StatusCode, Json<ErrorResponse>) {
    (
        status,
        Json(ErrorResponse {
            error: message.to_string(),
            code: status.as_u16(),
        }),
    )
}
