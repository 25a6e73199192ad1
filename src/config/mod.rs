//! Runtime configuration for the AI trading server

use std::env;

/// Server settings, loaded once at startup from the environment.
#[derive(Clone, Debug)]
pub struct Settings {
    pub host: String,
    pub port: u16,
    pub allowed_origins: Vec<String>,
    pub jwt_secret: String,
    pub risk_free_rate: f64,
    pub model_refresh_seconds: u64,
}

impl Settings {
    pub fn from_env() -> Self {
        Self {
            host: env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: env::var("PORT")
                .ok()
                .and_then(|value| value.parse().ok())
                .unwrap_or(8000),
            allowed_origins: parse_origins(
                &env::var("CORS_ALLOWED_ORIGINS")
                    .unwrap_or_else(|_| "http://localhost:3000".to_string()),
            ),
            jwt_secret: env::var("JWT_SECRET").unwrap_or_default(),
            risk_free_rate: env::var("RISK_FREE_RATE")
                .ok()
                .and_then(|value| value.parse().ok())
                .unwrap_or(0.04),
            model_refresh_seconds: env::var("MODEL_REFRESH_SECONDS")
                .ok()
                .and_then(|value| value.parse().ok())
                .unwrap_or(3600),
        }
    }

    /// Whether protected routes can authenticate anyone at all.
    /// An empty secret fails closed: every bearer token is rejected.
    pub fn auth_configured(&self) -> bool {
        !self.jwt_secret.trim().is_empty()
    }
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|origin| origin.trim())
        .filter(|origin| !origin.is_empty())
        .map(ToString::to_string)
        .collect()
}
