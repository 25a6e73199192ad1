//! Route definitions for the AI trading API

use axum::routing::{get, post};
use axum::Router;

use crate::app_state::AppState;
use crate::handlers::*;

/// Assemble the full API surface.
pub fn app_router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_check))
        .merge(assistant_routes())
        .merge(predictions_routes())
        .merge(ai_routes())
        .merge(sentiment_routes())
}

// Trading assistant routes
pub fn assistant_routes() -> Router<AppState> {
    Router::new().route("/api/v1/trading-assistant/chat", post(chat_with_assistant))
}

// Prediction routes
pub fn predictions_routes() -> Router<AppState> {
    Router::new().route("/api/v1/predictions/price", post(predict_price))
}

// AI routes
pub fn ai_routes() -> Router<AppState> {
    Router::new()
        .route("/api/v1/ai/portfolio-optimization", post(optimize_portfolio))
        .route("/api/v1/ai/models", get(list_models))
}

// Sentiment analysis routes
pub fn sentiment_routes() -> Router<AppState> {
    Router::new().route("/api/v1/sentiment/analyze", post(analyze_sentiment))
}
