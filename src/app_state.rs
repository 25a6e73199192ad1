//! Application state shared across handlers

use std::sync::Arc;

use axum::extract::FromRef;

use crate::config::Settings;
use crate::services::{AssistantService, MlService, SentimentService};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub ml: Arc<MlService>,
    pub assistant: Arc<AssistantService>,
    pub sentiment: Arc<SentimentService>,
}

impl AppState {
    pub fn new(
        settings: Arc<Settings>,
        ml: Arc<MlService>,
        assistant: Arc<AssistantService>,
        sentiment: Arc<SentimentService>,
    ) -> Self {
        Self {
            settings,
            ml,
            assistant,
            sentiment,
        }
    }
}

impl FromRef<AppState> for Arc<Settings> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.settings.clone()
    }
}

impl FromRef<AppState> for Arc<MlService> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.ml.clone()
    }
}

impl FromRef<AppState> for Arc<AssistantService> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.assistant.clone()
    }
}

impl FromRef<AppState> for Arc<SentimentService> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.sentiment.clone()
    }
}
