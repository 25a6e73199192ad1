//! Request and response models for the AI trading API

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::services::ml_service::{PricePrediction, WeightConstraints};

/// Health probe response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub version: String,
    pub models_loaded: bool,
}

/// Trading assistant chat request
#[derive(Debug, Deserialize, Validate)]
pub struct ChatRequest {
    #[validate(length(min = 1, message = "message must not be empty"))]
    pub message: String,
    #[validate(length(min = 1, message = "user_id must not be empty"))]
    pub user_id: String,
}

/// Trading assistant chat response
#[derive(Debug, Serialize, Deserialize)]
pub struct ChatResponse {
    pub response: String,
}

/// Price prediction request. `timeframe` and `periods` fall back to the
/// documented defaults when omitted from the body.
#[derive(Debug, Deserialize, Validate)]
pub struct PredictPriceRequest {
    #[validate(length(min = 1, max = 12, message = "symbol must be 1-12 characters"))]
    pub symbol: String,
    #[serde(default = "default_timeframe")]
    pub timeframe: String,
    #[serde(default = "default_periods")]
    pub periods: usize,
}

fn default_timeframe() -> String {
    "1h".to_string()
}

fn default_periods() -> usize {
    24
}

/// Price prediction response
#[derive(Debug, Serialize, Deserialize)]
pub struct PredictPriceResponse {
    pub symbol: String,
    pub timeframe: String,
    pub predictions: PricePrediction,
    pub confidence: f64,
    pub model_version: String,
}

/// Current portfolio snapshot submitted for optimization.
/// Holdings map symbol to current position value.
#[derive(Debug, Clone, Deserialize)]
pub struct PortfolioData {
    pub holdings: BTreeMap<String, f64>,
    #[serde(default)]
    pub constraints: Option<WeightConstraints>,
}

/// Portfolio optimization request
#[derive(Debug, Deserialize, Validate)]
pub struct OptimizePortfolioRequest {
    pub portfolio_data: PortfolioData,
    #[validate(range(min = 0.0, max = 1.0, message = "risk_tolerance must be in [0, 1]"))]
    pub risk_tolerance: f64,
}

/// Portfolio optimization response
#[derive(Debug, Serialize, Deserialize)]
pub struct OptimizePortfolioResponse {
    pub optimized_weights: BTreeMap<String, f64>,
    pub expected_return: f64,
    pub risk: f64,
    pub sharpe_ratio: f64,
    pub recommendations: Vec<String>,
}

/// Sentiment analysis request
#[derive(Debug, Deserialize, Validate)]
pub struct SentimentRequest {
    #[validate(length(min = 1, message = "text must not be empty"))]
    pub text: String,
}

/// Sentiment analysis response
#[derive(Debug, Serialize, Deserialize)]
pub struct SentimentResponse {
    pub score: f64,
    pub label: String,
    pub confidence: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prediction_request_defaults_apply_when_omitted() {
        let request: PredictPriceRequest = serde_json::from_str(r#"{"symbol": "BTC"}"#).unwrap();
        assert_eq!(request.timeframe, "1h");
        assert_eq!(request.periods, 24);
    }

    #[test]
    fn prediction_request_keeps_explicit_values() {
        let request: PredictPriceRequest =
            serde_json::from_str(r#"{"symbol": "ETH", "timeframe": "1d", "periods": 7}"#).unwrap();
        assert_eq!(request.timeframe, "1d");
        assert_eq!(request.periods, 7);
    }

    #[test]
    fn empty_chat_message_fails_validation() {
        let request = ChatRequest {
            message: String::new(),
            user_id: "user-1".to_string(),
        };
        assert!(request.validate().is_err());
    }

    #[test]
    fn out_of_range_risk_tolerance_fails_validation() {
        let request = OptimizePortfolioRequest {
            portfolio_data: PortfolioData {
                holdings: BTreeMap::from([("BTC".to_string(), 1000.0)]),
                constraints: None,
            },
            risk_tolerance: 1.5,
        };
        assert!(request.validate().is_err());
    }
}
