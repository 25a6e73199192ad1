//! Synthetic market data provider
//!
//! Price histories are generated deterministically per symbol so the
//! forecasting and optimization paths behave reproducibly without an
//! exchange connection. Each symbol's drift and volatility are derived
//! from a digest of its ticker.

use chrono::{DateTime, Duration, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Supported candle intervals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Timeframe {
    M1,
    M5,
    M15,
    H1,
    H4,
    D1,
}

impl Timeframe {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "1m" => Some(Timeframe::M1),
            "5m" => Some(Timeframe::M5),
            "15m" => Some(Timeframe::M15),
            "1h" => Some(Timeframe::H1),
            "4h" => Some(Timeframe::H4),
            "1d" => Some(Timeframe::D1),
            _ => None,
        }
    }

    pub fn step(&self) -> Duration {
        match self {
            Timeframe::M1 => Duration::minutes(1),
            Timeframe::M5 => Duration::minutes(5),
            Timeframe::M15 => Duration::minutes(15),
            Timeframe::H1 => Duration::hours(1),
            Timeframe::H4 => Duration::hours(4),
            Timeframe::D1 => Duration::days(1),
        }
    }
}

/// A single observed price.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PricePoint {
    pub timestamp: DateTime<Utc>,
    pub price: f64,
}

/// Deterministic price-history source.
#[derive(Debug, Clone, Default)]
pub struct MarketDataProvider;

// Uniform noise on [-1, 1] scaled to unit variance.
const UNIT_VARIANCE_SCALE: f64 = 1.732_050_807_568_877_2;

impl MarketDataProvider {
    pub fn new() -> Self {
        Self
    }

    /// Generate `points` candles for `symbol`, ending at the current time.
    /// Prices follow a geometric walk whose drift and volatility are fixed
    /// per symbol; only the timestamps depend on the clock.
    pub fn price_history(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        points: usize,
    ) -> Vec<PricePoint> {
        let seed = symbol_seed(symbol);
        let mut rng = StdRng::seed_from_u64(seed);

        let start_price = rng.gen_range(20.0..800.0);
        let drift = rng.gen_range(-0.0004..0.0012);
        let volatility = rng.gen_range(0.004..0.028);

        let step = timeframe.step();
        let end = Utc::now();
        let mut price = start_price;
        let mut history = Vec::with_capacity(points);

        for index in 0..points {
            let noise: f64 = rng.gen_range(-1.0..1.0) * UNIT_VARIANCE_SCALE;
            price *= (drift + volatility * noise).exp();
            let offset = (points - 1 - index) as i32;
            history.push(PricePoint {
                timestamp: end - step * offset,
                price,
            });
        }

        history
    }

    /// Most recent price for `symbol`.
    pub fn latest_price(&self, symbol: &str) -> f64 {
        self.price_history(symbol, Timeframe::H1, 64)
            .last()
            .map(|point| point.price)
            .unwrap_or(0.0)
    }

    /// Log returns over the last `points` daily candles.
    pub fn log_returns(&self, symbol: &str, timeframe: Timeframe, points: usize) -> Vec<f64> {
        let history = self.price_history(symbol, timeframe, points + 1);
        history
            .windows(2)
            .map(|pair| (pair[1].price / pair[0].price).ln())
            .collect()
    }
}

fn symbol_seed(symbol: &str) -> u64 {
    let digest = Sha256::digest(symbol.trim().to_uppercase().as_bytes());
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&digest[..8]);
    u64::from_be_bytes(bytes)
}
