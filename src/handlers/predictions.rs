//! Price prediction handlers

use axum::extract::State;
use axum::Json;
use validator::Validate;

use crate::app_state::AppState;
use crate::auth::AuthenticatedUser;
use crate::error::AppError;
use crate::models::{PredictPriceRequest, PredictPriceResponse};

/// Predict future price movements using the registered forecasting model.
/// `timeframe` defaults to "1h" and `periods` to 24 when omitted.
pub async fn predict_price(
    State(state): State<AppState>,
    _current_user: AuthenticatedUser,
    Json(request): Json<PredictPriceRequest>,
) -> Result<Json<PredictPriceResponse>, AppError> {
    request.validate()?;

    let predictions = state
        .ml
        .predict_price(&request.symbol, &request.timeframe, request.periods)
        .await?;
    let model_version = state.ml.get_model_version("price_prediction").await?;

    let confidence = predictions.confidence;
    Ok(Json(PredictPriceResponse {
        symbol: request.symbol,
        timeframe: request.timeframe,
        predictions,
        confidence,
        model_version,
    }))
}
