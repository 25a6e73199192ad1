//! Business logic services for the AI trading server

pub mod market_data;
pub mod ml_service;
pub mod sentiment;
pub mod trading_assistant;

pub use ml_service::MlService;
pub use sentiment::SentimentService;
pub use trading_assistant::AssistantService;
