//! AI Trading Service
//!
//! HTTP server exposing ML-backed price prediction, portfolio
//! optimization, a conversational trading assistant, and sentiment
//! analysis for the trading platform.

use std::sync::Arc;

use axum::http::{header, HeaderValue, Method};
use tokio::time::{sleep, Duration};
use tower_http::cors::CorsLayer;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use ai_trading_server::app_state::AppState;
use ai_trading_server::config::Settings;
use ai_trading_server::routes;
use ai_trading_server::services::{AssistantService, MlService, SentimentService};

const REFRESH_SUPERVISOR_MAX_BACKOFF_SECONDS: u64 = 30;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    // Load environment variables
    dotenvy::dotenv().ok();

    let settings = Arc::new(Settings::from_env());

    info!("Starting AI trading service...");

    // Initialize ML services
    let ml = Arc::new(MlService::new(settings.risk_free_rate));
    ml.load_models().await?;

    let assistant = Arc::new(AssistantService::new(ml.clone()));
    assistant.initialize().await?;

    let sentiment = Arc::new(SentimentService::new());

    info!("AI trading service started successfully");

    let state = AppState::new(settings.clone(), ml.clone(), assistant, sentiment);

    let app = routes::app_router()
        .layer(TraceLayer::new_for_http())
        .layer(SetResponseHeaderLayer::overriding(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(build_cors_layer(&settings))
        .with_state(state);

    // Start and supervise the background model refresh task.
    let refresh_interval = settings.model_refresh_seconds;
    tokio::spawn(async move {
        let mut restart_count: u32 = 0;
        loop {
            let ml = ml.clone();
            let handle = tokio::spawn(async move { run_refresh_loop(ml, refresh_interval).await });

            match handle.await {
                Ok(()) => {
                    info!("model refresh loop exited cleanly; stopping supervisor");
                    break;
                }
                Err(join_error) => {
                    if join_error.is_panic() {
                        error!("model refresh loop panicked; restarting");
                    } else {
                        error!(error = %join_error, "model refresh task failed; restarting");
                    }
                }
            }

            restart_count = restart_count.saturating_add(1);
            let backoff_seconds = (2u64.saturating_pow(restart_count.min(5)))
                .min(REFRESH_SUPERVISOR_MAX_BACKOFF_SECONDS);
            warn!(restart_count, backoff_seconds, "model refresh restart backoff");
            sleep(Duration::from_secs(backoff_seconds)).await;
        }
    });

    let addr = format!("{}:{}", settings.host, settings.port);
    info!("Server starting on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn run_refresh_loop(ml: Arc<MlService>, interval_seconds: u64) {
    loop {
        sleep(Duration::from_secs(interval_seconds)).await;
        if let Err(err) = ml.refresh_models().await {
            error!(error = %err, "model refresh failed");
        }
    }
}

fn build_cors_layer(settings: &Settings) -> CorsLayer {
    let allowed_origins = settings
        .allowed_origins
        .iter()
        .filter_map(|origin| origin.parse::<HeaderValue>().ok())
        .collect::<Vec<_>>();

    CorsLayer::new()
        .allow_origin(allowed_origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT])
        .allow_credentials(true)
}
