//! End-to-end tests for the HTTP API surface.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::util::ServiceExt;

use ai_trading_server::app_state::AppState;
use ai_trading_server::auth::generate_access_token;
use ai_trading_server::config::Settings;
use ai_trading_server::routes;
use ai_trading_server::services::{AssistantService, MlService, SentimentService};

const TEST_SECRET: &str = "integration-test-secret";

struct TestApp {
    router: Router,
}

impl TestApp {
    /// Fully started service: models loaded, assistant initialized.
    async fn started() -> Self {
        Self::build(true, true).await
    }

    async fn build(load_models: bool, init_assistant: bool) -> Self {
        let settings = Arc::new(Settings {
            host: "127.0.0.1".to_string(),
            port: 0,
            allowed_origins: vec!["http://localhost:3000".to_string()],
            jwt_secret: TEST_SECRET.to_string(),
            risk_free_rate: 0.04,
            model_refresh_seconds: 3600,
        });

        let ml = Arc::new(MlService::new(settings.risk_free_rate));
        if load_models {
            ml.load_models().await.unwrap();
        }

        let assistant = Arc::new(AssistantService::new(ml.clone()));
        if init_assistant {
            assistant.initialize().await.unwrap();
        }

        let sentiment = Arc::new(SentimentService::new());
        let state = AppState::new(settings, ml, assistant, sentiment);

        Self {
            router: routes::app_router().with_state(state),
        }
    }

    async fn get(&self, uri: &str) -> (StatusCode, Value) {
        let request = Request::builder()
            .uri(uri)
            .header(header::AUTHORIZATION, bearer())
            .body(Body::empty())
            .unwrap();
        send(self.router.clone(), request).await
    }

    async fn post(&self, uri: &str, payload: Value) -> (StatusCode, Value) {
        let request = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .header(header::AUTHORIZATION, bearer())
            .body(Body::from(payload.to_string()))
            .unwrap();
        send(self.router.clone(), request).await
    }

    async fn post_unauthenticated(&self, uri: &str, payload: Value) -> StatusCode {
        let request = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(payload.to_string()))
            .unwrap();
        let (status, _) = send(self.router.clone(), request).await;
        status
    }
}

fn bearer() -> String {
    format!(
        "Bearer {}",
        generate_access_token(TEST_SECRET, "test-user").unwrap()
    )
}

async fn send(router: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = router.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, body)
}

#[tokio::test]
async fn health_reports_models_loaded_after_startup() {
    let app = TestApp::started().await;
    let (status, body) = app.get("/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["service"], "ai-service");
    assert_eq!(body["version"], "1.0.0");
    assert_eq!(body["models_loaded"], true);
}

#[tokio::test]
async fn health_reports_models_not_loaded_before_startup_completes() {
    let app = TestApp::build(false, false).await;
    let (status, body) = app.get("/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["models_loaded"], false);
}

#[tokio::test]
async fn protected_routes_reject_missing_bearer_token() {
    let app = TestApp::started().await;

    for uri in [
        "/api/v1/trading-assistant/chat",
        "/api/v1/predictions/price",
        "/api/v1/ai/portfolio-optimization",
        "/api/v1/sentiment/analyze",
    ] {
        let status = app.post_unauthenticated(uri, json!({})).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "route {uri}");
    }
}

#[tokio::test]
async fn protected_routes_reject_token_with_wrong_signature() {
    let app = TestApp::started().await;
    let forged = generate_access_token("some-other-secret", "intruder").unwrap();

    let request = Request::builder()
        .method("POST")
        .uri("/api/v1/trading-assistant/chat")
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::AUTHORIZATION, format!("Bearer {forged}"))
        .body(Body::from(
            json!({"message": "hello", "user_id": "user-1"}).to_string(),
        ))
        .unwrap();

    let (status, body) = send(app.router.clone(), request).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body["detail"].as_str().unwrap().contains("Invalid bearer token"));
}

#[tokio::test]
async fn chat_returns_a_response_for_valid_requests() {
    let app = TestApp::started().await;
    let (status, body) = app
        .post(
            "/api/v1/trading-assistant/chat",
            json!({"message": "What is the price outlook for BTC?", "user_id": "user-1"}),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    let response = body["response"].as_str().unwrap();
    assert!(response.contains("BTC"));
}

#[tokio::test]
async fn chat_with_empty_message_is_rejected() {
    let app = TestApp::started().await;
    let (status, _) = app
        .post(
            "/api/v1/trading-assistant/chat",
            json!({"message": "", "user_id": "user-1"}),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn assistant_failures_surface_as_500_with_detail() {
    // Models loaded but the assistant never initialized: the service call
    // fails and its message becomes the response detail.
    let app = TestApp::build(true, false).await;
    let (status, body) = app
        .post(
            "/api/v1/trading-assistant/chat",
            json!({"message": "hello", "user_id": "user-1"}),
        )
        .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["detail"], "Trading assistant is not initialized");
}

#[tokio::test]
async fn prediction_applies_documented_defaults() {
    let app = TestApp::started().await;
    let (status, body) = app
        .post("/api/v1/predictions/price", json!({"symbol": "BTC"}))
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["symbol"], "BTC");
    assert_eq!(body["timeframe"], "1h");
    assert_eq!(body["predictions"]["values"].as_array().unwrap().len(), 24);
    assert_eq!(body["confidence"], body["predictions"]["confidence"]);
    assert_eq!(body["model_version"], "1.2.0");
}

#[tokio::test]
async fn prediction_honors_explicit_parameters() {
    let app = TestApp::started().await;
    let (status, body) = app
        .post(
            "/api/v1/predictions/price",
            json!({"symbol": "ETH", "timeframe": "1d", "periods": 7}),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["timeframe"], "1d");
    assert_eq!(body["predictions"]["values"].as_array().unwrap().len(), 7);
}

#[tokio::test]
async fn prediction_service_errors_surface_as_500_with_detail() {
    let app = TestApp::started().await;
    let (status, body) = app
        .post(
            "/api/v1/predictions/price",
            json!({"symbol": "BTC", "timeframe": "2w"}),
        )
        .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["detail"], "Unsupported timeframe: 2w");
}

#[tokio::test]
async fn portfolio_optimization_returns_normalized_weights() {
    let app = TestApp::started().await;
    let (status, body) = app
        .post(
            "/api/v1/ai/portfolio-optimization",
            json!({
                "portfolio_data": {
                    "holdings": {"AAPL": 4000.0, "BTC": 3000.0, "ETH": 3000.0}
                },
                "risk_tolerance": 0.5
            }),
        )
        .await;

    assert_eq!(status, StatusCode::OK);

    let weights = body["optimized_weights"].as_object().unwrap();
    assert_eq!(weights.len(), 3);
    let total: f64 = weights.values().map(|w| w.as_f64().unwrap()).sum();
    assert!((total - 1.0).abs() < 1e-6);
    assert!(weights.values().all(|w| w.as_f64().unwrap() >= 0.0));

    assert!(body["expected_return"].is_number());
    assert!(body["risk"].as_f64().unwrap() >= 0.0);
    assert!(body["sharpe_ratio"].is_number());
    assert!(!body["recommendations"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn portfolio_optimization_with_no_holdings_is_500() {
    let app = TestApp::started().await;
    let (status, body) = app
        .post(
            "/api/v1/ai/portfolio-optimization",
            json!({"portfolio_data": {"holdings": {}}, "risk_tolerance": 0.5}),
        )
        .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["detail"], "Portfolio has no holdings to optimize");
}

#[tokio::test]
async fn out_of_range_risk_tolerance_is_rejected() {
    let app = TestApp::started().await;
    let (status, _) = app
        .post(
            "/api/v1/ai/portfolio-optimization",
            json!({
                "portfolio_data": {"holdings": {"BTC": 1000.0}},
                "risk_tolerance": 1.5
            }),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn sentiment_endpoint_labels_text() {
    let app = TestApp::started().await;
    let (status, body) = app
        .post(
            "/api/v1/sentiment/analyze",
            json!({"text": "Record profit and strong growth fuel the rally"}),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["label"], "bullish");
    assert!(body["score"].as_f64().unwrap() > 0.0);
    assert!(body["confidence"].as_f64().unwrap() > 0.0);
}

#[tokio::test]
async fn models_endpoint_lists_registered_models() {
    let app = TestApp::started().await;
    let (status, body) = app.get("/api/v1/ai/models").await;

    assert_eq!(status, StatusCode::OK);
    let models = body.as_array().unwrap();
    assert_eq!(models.len(), 3);
    let names: Vec<&str> = models
        .iter()
        .map(|model| model["name"].as_str().unwrap())
        .collect();
    assert!(names.contains(&"price_prediction"));
    assert!(models.iter().all(|model| !model["checksum"].as_str().unwrap().is_empty()));
}
