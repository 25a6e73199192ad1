//! Sentiment analysis handlers

use axum::extract::State;
use axum::Json;
use validator::Validate;

use crate::app_state::AppState;
use crate::auth::AuthenticatedUser;
use crate::error::AppError;
use crate::models::{SentimentRequest, SentimentResponse};

/// Score the sentiment of a piece of financial text.
pub async fn analyze_sentiment(
    State(state): State<AppState>,
    _current_user: AuthenticatedUser,
    Json(request): Json<SentimentRequest>,
) -> Result<Json<SentimentResponse>, AppError> {
    request.validate()?;

    let result = state.sentiment.analyze(&request.text);
    Ok(Json(SentimentResponse {
        score: result.score,
        label: result.label,
        confidence: result.confidence,
    }))
}
