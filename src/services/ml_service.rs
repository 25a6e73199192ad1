//! ML service - model registry, price forecasting and portfolio optimization

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, Utc};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::services::market_data::{MarketDataProvider, Timeframe};

const HISTORY_POINTS: usize = 256;
const RETURN_WINDOW: usize = 120;
const MAX_FORECAST_PERIODS: usize = 500;
const DRIFT_SMOOTHING: f64 = 0.2;
const TRADING_DAYS_PER_YEAR: f64 = 252.0;
const OPTIMIZER_ITERATIONS: usize = 500;
const OPTIMIZER_LEARNING_RATE: f64 = 0.1;

/// Errors surfaced by ML operations.
#[derive(Debug, thiserror::Error)]
pub enum MlError {
    #[error("Models are not loaded")]
    NotLoaded,
    #[error("Unsupported timeframe: {0}")]
    UnsupportedTimeframe(String),
    #[error("Forecast horizon must be between 1 and 500 periods, got {0}")]
    InvalidHorizon(usize),
    #[error("Portfolio has no holdings to optimize")]
    EmptyPortfolio,
    #[error("Portfolio holding {0} has a non-positive value")]
    InvalidHolding(String),
    #[error("Unknown model: {0}")]
    UnknownModel(String),
}

/// A registered model and its provenance.
#[derive(Debug, Clone, Serialize)]
pub struct ModelInfo {
    pub name: String,
    pub version: String,
    pub checksum: String,
    pub loaded_at: DateTime<Utc>,
}

/// One forecast step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictedPoint {
    pub timestamp: DateTime<Utc>,
    pub price: f64,
}

/// Forecast returned by `predict_price`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PricePrediction {
    pub values: Vec<PredictedPoint>,
    pub confidence: f64,
}

/// Per-asset weight bounds applied during optimization.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct WeightConstraints {
    #[serde(default)]
    pub min_weight: f64,
    #[serde(default = "default_max_weight")]
    pub max_weight: f64,
}

fn default_max_weight() -> f64 {
    1.0
}

impl Default for WeightConstraints {
    fn default() -> Self {
        Self {
            min_weight: 0.0,
            max_weight: 1.0,
        }
    }
}

/// Result of a portfolio optimization run.
#[derive(Debug, Clone)]
pub struct OptimizationOutcome {
    pub weights: BTreeMap<String, f64>,
    pub expected_return: f64,
    pub risk: f64,
    pub sharpe_ratio: f64,
    pub recommendations: Vec<String>,
}

/// ML service owning the model registry and the inference paths.
pub struct MlService {
    market: MarketDataProvider,
    risk_free_rate: f64,
    models: RwLock<HashMap<String, ModelInfo>>,
    loaded: AtomicBool,
}

impl MlService {
    pub fn new(risk_free_rate: f64) -> Self {
        Self {
            market: MarketDataProvider::new(),
            risk_free_rate,
            models: RwLock::new(HashMap::new()),
            loaded: AtomicBool::new(false),
        }
    }

    /// Register the model set and flip the loaded flag. The health probe
    /// reports `models_loaded: false` until this completes.
    pub async fn load_models(&self) -> Result<(), MlError> {
        let now = Utc::now();
        let mut registry = self.models.write().await;

        for (name, version) in [
            ("price_prediction", "1.2.0"),
            ("portfolio_optimization", "1.0.3"),
            ("sentiment_analysis", "0.9.1"),
        ] {
            registry.insert(
                name.to_string(),
                ModelInfo {
                    name: name.to_string(),
                    version: version.to_string(),
                    checksum: model_checksum(name, version),
                    loaded_at: now,
                },
            );
        }

        drop(registry);
        self.loaded.store(true, Ordering::SeqCst);
        info!("ML models loaded");
        Ok(())
    }

    pub fn models_loaded(&self) -> bool {
        self.loaded.load(Ordering::SeqCst)
    }

    /// Re-stamp the registry. Invoked by the background refresh task.
    pub async fn refresh_models(&self) -> Result<(), MlError> {
        if !self.models_loaded() {
            return Err(MlError::NotLoaded);
        }

        let now = Utc::now();
        let mut registry = self.models.write().await;
        for model in registry.values_mut() {
            model.loaded_at = now;
        }

        debug!(models = registry.len(), "model registry refreshed");
        Ok(())
    }

    pub async fn get_model_version(&self, name: &str) -> Result<String, MlError> {
        let registry = self.models.read().await;
        registry
            .get(name)
            .map(|model| model.version.clone())
            .ok_or_else(|| MlError::UnknownModel(name.to_string()))
    }

    pub async fn list_models(&self) -> Vec<ModelInfo> {
        let registry = self.models.read().await;
        let mut models: Vec<ModelInfo> = registry.values().cloned().collect();
        models.sort_by(|a, b| a.name.cmp(&b.name));
        models
    }

    /// Forecast `periods` future prices for `symbol`.
    ///
    /// The forecaster fits an exponentially weighted drift to recent log
    /// returns and rolls it forward; confidence decays with realized
    /// volatility and with the horizon length.
    pub async fn predict_price(
        &self,
        symbol: &str,
        timeframe: &str,
        periods: usize,
    ) -> Result<PricePrediction, MlError> {
        if !self.models_loaded() {
            return Err(MlError::NotLoaded);
        }
        let timeframe = Timeframe::parse(timeframe)
            .ok_or_else(|| MlError::UnsupportedTimeframe(timeframe.to_string()))?;
        if periods == 0 || periods > MAX_FORECAST_PERIODS {
            return Err(MlError::InvalidHorizon(periods));
        }

        let history = self.market.price_history(symbol, timeframe, HISTORY_POINTS);
        let returns: Vec<f64> = history
            .windows(2)
            .map(|pair| (pair[1].price / pair[0].price).ln())
            .collect();

        let mut drift = 0.0;
        for value in &returns {
            drift = DRIFT_SMOOTHING * value + (1.0 - DRIFT_SMOOTHING) * drift;
        }
        let volatility = sample_std(&returns);

        let last = history.last().expect("history is never empty");
        let step = timeframe.step();
        let mut price = last.price;
        let mut values = Vec::with_capacity(periods);

        for index in 1..=periods {
            price *= drift.exp();
            values.push(PredictedPoint {
                timestamp: last.timestamp + step * index as i32,
                price: (price * 1e4).round() / 1e4,
            });
        }

        let confidence =
            ((1.0 / (1.0 + 8.0 * volatility)) * 0.985f64.powi(periods as i32)).clamp(0.05, 0.99);

        Ok(PricePrediction { values, confidence })
    }

    /// Optimize portfolio weights for the given risk tolerance.
    ///
    /// Blends a minimum-variance allocation with a maximum-return
    /// allocation: `risk_tolerance = 0` yields the former, `1` the latter.
    /// Weights are long-only and sum to one.
    pub async fn optimize_portfolio(
        &self,
        holdings: &BTreeMap<String, f64>,
        constraints: WeightConstraints,
        risk_tolerance: f64,
    ) -> Result<OptimizationOutcome, MlError> {
        if !self.models_loaded() {
            return Err(MlError::NotLoaded);
        }
        if holdings.is_empty() {
            return Err(MlError::EmptyPortfolio);
        }
        for (symbol, value) in holdings {
            if !value.is_finite() || *value <= 0.0 {
                return Err(MlError::InvalidHolding(symbol.clone()));
            }
        }

        let symbols: Vec<String> = holdings.keys().cloned().collect();
        let risk_tolerance = risk_tolerance.clamp(0.0, 1.0);

        // Annualized return/covariance estimates from daily history.
        let returns_matrix: Vec<Vec<f64>> = symbols
            .iter()
            .map(|symbol| self.market.log_returns(symbol, Timeframe::D1, RETURN_WINDOW))
            .collect();
        let expected_returns = annualized_means(&returns_matrix);
        let covariance = annualized_covariance(&returns_matrix);

        let min_variance = minimize_variance(&covariance, &constraints);
        let max_return = maximize_return(&expected_returns, &constraints);

        // Convex blend of the two anchors: stays in bounds, sums to one,
        // and makes the expected return monotone in risk tolerance.
        let weights = &min_variance * (1.0 - risk_tolerance) + &max_return * risk_tolerance;

        let expected_return = weights.dot(&expected_returns);
        let variance = weights.dot(&covariance.dot(&weights));
        let risk = variance.max(0.0).sqrt();
        let sharpe_ratio = if risk > 0.0 {
            (expected_return - self.risk_free_rate) / risk
        } else {
            0.0
        };

        let weight_map: BTreeMap<String, f64> = symbols
            .iter()
            .zip(weights.iter())
            .map(|(symbol, weight)| (symbol.clone(), weight.max(0.0)))
            .collect();

        let recommendations =
            build_recommendations(holdings, &weight_map, risk_tolerance, sharpe_ratio);

        Ok(OptimizationOutcome {
            weights: weight_map,
            expected_return,
            risk,
            sharpe_ratio,
            recommendations,
        })
    }
}

fn model_checksum(name: &str, version: &str) -> String {
    let digest = Sha256::digest(format!("{name}:{version}").as_bytes());
    hex::encode(&digest[..8])
}

fn sample_std(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let mean = values.iter().sum::<f64>() / values.len() as f64;
    let variance = values
        .iter()
        .map(|value| (value - mean).powi(2))
        .sum::<f64>()
        / (values.len() - 1) as f64;
    variance.sqrt()
}

fn annualized_means(returns: &[Vec<f64>]) -> Array1<f64> {
    Array1::from_iter(returns.iter().map(|series| {
        let mean = series.iter().sum::<f64>() / series.len() as f64;
        mean * TRADING_DAYS_PER_YEAR
    }))
}

fn annualized_covariance(returns: &[Vec<f64>]) -> Array2<f64> {
    let n_assets = returns.len();
    let observations = returns[0].len();
    let means: Vec<f64> = returns
        .iter()
        .map(|series| series.iter().sum::<f64>() / series.len() as f64)
        .collect();

    Array2::from_shape_fn((n_assets, n_assets), |(i, j)| {
        let mut accumulator = 0.0;
        for t in 0..observations {
            accumulator += (returns[i][t] - means[i]) * (returns[j][t] - means[j]);
        }
        accumulator / (observations - 1) as f64 * TRADING_DAYS_PER_YEAR
    })
}

/// Projected gradient descent on portfolio variance.
fn minimize_variance(covariance: &Array2<f64>, constraints: &WeightConstraints) -> Array1<f64> {
    let n_assets = covariance.nrows();
    let mut weights = Array1::from_elem(n_assets, 1.0 / n_assets as f64);

    for _ in 0..OPTIMIZER_ITERATIONS {
        let gradient = 2.0 * covariance.dot(&weights);
        weights = &weights - OPTIMIZER_LEARNING_RATE * &gradient;
        weights = apply_constraints(&weights, constraints);
    }

    weights
}

/// Greedy fill of the highest expected-return assets up to the weight cap.
fn maximize_return(expected_returns: &Array1<f64>, constraints: &WeightConstraints) -> Array1<f64> {
    let n_assets = expected_returns.len();
    let mut order: Vec<usize> = (0..n_assets).collect();
    order.sort_by(|a, b| {
        expected_returns[*b]
            .partial_cmp(&expected_returns[*a])
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let cap = constraints.max_weight.clamp(0.0, 1.0).max(1.0 / n_assets as f64);
    let mut weights = Array1::zeros(n_assets);
    let mut remaining = 1.0;

    for index in order {
        if remaining <= 0.0 {
            break;
        }
        let allocation = cap.min(remaining);
        weights[index] = allocation;
        remaining -= allocation;
    }

    apply_constraints(&weights, constraints)
}

/// Clamp weights into bounds, then normalize to sum to one.
fn apply_constraints(weights: &Array1<f64>, constraints: &WeightConstraints) -> Array1<f64> {
    let mut constrained = weights.clone();

    for weight in constrained.iter_mut() {
        if *weight < constraints.min_weight.max(0.0) {
            *weight = constraints.min_weight.max(0.0);
        }
        if *weight > constraints.max_weight {
            *weight = constraints.max_weight;
        }
    }

    let total: f64 = constrained.iter().sum();
    if total > 0.0 {
        constrained /= total;
    } else {
        constrained.fill(1.0 / constrained.len() as f64);
    }

    constrained
}

fn build_recommendations(
    holdings: &BTreeMap<String, f64>,
    optimized: &BTreeMap<String, f64>,
    risk_tolerance: f64,
    sharpe_ratio: f64,
) -> Vec<String> {
    let total: f64 = holdings.values().sum();
    let mut recommendations = Vec::new();

    for (symbol, target) in optimized {
        let current = holdings.get(symbol).copied().unwrap_or(0.0) / total;
        let delta = target - current;
        if delta.abs() < 0.05 {
            continue;
        }
        let action = if delta > 0.0 { "Increase" } else { "Reduce" };
        recommendations.push(format!(
            "{} {} allocation from {:.1}% to {:.1}%",
            action,
            symbol,
            current * 100.0,
            target * 100.0
        ));
    }

    let profile = if risk_tolerance < 0.35 {
        "conservative"
    } else if risk_tolerance <= 0.7 {
        "balanced"
    } else {
        "aggressive"
    };
    recommendations.push(format!(
        "Allocation tuned for a {} risk profile (Sharpe ratio {:.2})",
        profile, sharpe_ratio
    ));

    recommendations
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_holdings() -> BTreeMap<String, f64> {
        BTreeMap::from([
            ("AAPL".to_string(), 4000.0),
            ("BTC".to_string(), 3000.0),
            ("ETH".to_string(), 2000.0),
            ("MSFT".to_string(), 1000.0),
        ])
    }

    #[tokio::test]
    async fn predict_returns_requested_horizon() {
        let service = MlService::new(0.04);
        service.load_models().await.unwrap();

        let prediction = service.predict_price("BTC", "1h", 24).await.unwrap();
        assert_eq!(prediction.values.len(), 24);
        assert!(prediction.confidence > 0.0 && prediction.confidence <= 1.0);
        assert!(prediction.values.iter().all(|point| point.price > 0.0));
    }

    #[tokio::test]
    async fn predict_rejects_unsupported_timeframe() {
        let service = MlService::new(0.04);
        service.load_models().await.unwrap();

        let err = service.predict_price("BTC", "2w", 24).await.unwrap_err();
        assert!(matches!(err, MlError::UnsupportedTimeframe(_)));
    }

    #[tokio::test]
    async fn predict_rejects_zero_horizon() {
        let service = MlService::new(0.04);
        service.load_models().await.unwrap();

        let err = service.predict_price("BTC", "1h", 0).await.unwrap_err();
        assert!(matches!(err, MlError::InvalidHorizon(0)));
    }

    #[tokio::test]
    async fn predict_fails_before_models_load() {
        let service = MlService::new(0.04);
        let err = service.predict_price("BTC", "1h", 24).await.unwrap_err();
        assert!(matches!(err, MlError::NotLoaded));
    }

    #[tokio::test]
    async fn optimized_weights_sum_to_one_and_are_non_negative() {
        let service = MlService::new(0.04);
        service.load_models().await.unwrap();

        let outcome = service
            .optimize_portfolio(&sample_holdings(), WeightConstraints::default(), 0.5)
            .await
            .unwrap();

        let total: f64 = outcome.weights.values().sum();
        assert!((total - 1.0).abs() < 1e-6);
        assert!(outcome.weights.values().all(|weight| *weight >= 0.0));
        assert!(outcome.risk >= 0.0);
        assert!(!outcome.recommendations.is_empty());
    }

    #[tokio::test]
    async fn higher_risk_tolerance_never_lowers_expected_return() {
        let service = MlService::new(0.04);
        service.load_models().await.unwrap();

        let holdings = sample_holdings();
        let conservative = service
            .optimize_portfolio(&holdings, WeightConstraints::default(), 0.2)
            .await
            .unwrap();
        let aggressive = service
            .optimize_portfolio(&holdings, WeightConstraints::default(), 0.8)
            .await
            .unwrap();

        assert!(aggressive.expected_return >= conservative.expected_return - 1e-9);
    }

    #[tokio::test]
    async fn empty_portfolio_is_rejected() {
        let service = MlService::new(0.04);
        service.load_models().await.unwrap();

        let err = service
            .optimize_portfolio(&BTreeMap::new(), WeightConstraints::default(), 0.5)
            .await
            .unwrap_err();
        assert!(matches!(err, MlError::EmptyPortfolio));
    }

    #[tokio::test]
    async fn single_asset_portfolio_gets_full_weight() {
        let service = MlService::new(0.04);
        service.load_models().await.unwrap();

        let holdings = BTreeMap::from([("BTC".to_string(), 1000.0)]);
        let outcome = service
            .optimize_portfolio(&holdings, WeightConstraints::default(), 0.5)
            .await
            .unwrap();

        assert!((outcome.weights["BTC"] - 1.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn model_registry_exposes_versions() {
        let service = MlService::new(0.04);
        service.load_models().await.unwrap();

        let version = service.get_model_version("price_prediction").await.unwrap();
        assert_eq!(version, "1.2.0");

        let err = service.get_model_version("nonexistent").await.unwrap_err();
        assert!(matches!(err, MlError::UnknownModel(_)));

        let models = service.list_models().await;
        assert_eq!(models.len(), 3);
        assert!(models.iter().all(|model| !model.checksum.is_empty()));
    }

    #[tokio::test]
    async fn loaded_flag_flips_after_load() {
        let service = MlService::new(0.04);
        assert!(!service.models_loaded());
        service.load_models().await.unwrap();
        assert!(service.models_loaded());
    }
}
