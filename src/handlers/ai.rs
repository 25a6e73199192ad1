//! AI handlers: portfolio optimization and model registry

use axum::extract::State;
use axum::Json;
use validator::Validate;

use crate::app_state::AppState;
use crate::auth::AuthenticatedUser;
use crate::error::AppError;
use crate::models::{OptimizePortfolioRequest, OptimizePortfolioResponse};
use crate::services::ml_service::ModelInfo;

/// Optimize portfolio weights for the requested risk tolerance.
pub async fn optimize_portfolio(
    State(state): State<AppState>,
    _current_user: AuthenticatedUser,
    Json(request): Json<OptimizePortfolioRequest>,
) -> Result<Json<OptimizePortfolioResponse>, AppError> {
    request.validate()?;

    let constraints = request.portfolio_data.constraints.unwrap_or_default();
    let outcome = state
        .ml
        .optimize_portfolio(
            &request.portfolio_data.holdings,
            constraints,
            request.risk_tolerance,
        )
        .await?;

    Ok(Json(OptimizePortfolioResponse {
        optimized_weights: outcome.weights,
        expected_return: outcome.expected_return,
        risk: outcome.risk,
        sharpe_ratio: outcome.sharpe_ratio,
        recommendations: outcome.recommendations,
    }))
}

/// List registered models with their versions and checksums.
pub async fn list_models(
    State(state): State<AppState>,
    _current_user: AuthenticatedUser,
) -> Json<Vec<ModelInfo>> {
    Json(state.ml.list_models().await)
}
