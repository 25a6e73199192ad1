//! Trading assistant handlers

use axum::extract::State;
use axum::Json;
use tracing::info;
use validator::Validate;

use crate::app_state::AppState;
use crate::auth::AuthenticatedUser;
use crate::error::AppError;
use crate::models::{ChatRequest, ChatResponse};

/// Chat with the AI trading assistant.
pub async fn chat_with_assistant(
    State(state): State<AppState>,
    current_user: AuthenticatedUser,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, AppError> {
    request.validate()?;

    info!(
        caller = %current_user.user_id,
        user_id = %request.user_id,
        "assistant chat request"
    );

    let response = state
        .assistant
        .process_message(&request.message, &request.user_id)
        .await?;

    Ok(Json(ChatResponse { response }))
}
