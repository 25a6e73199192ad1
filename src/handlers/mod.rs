//! API handlers for the AI trading server

pub mod ai;
pub mod assistant;
pub mod health;
pub mod predictions;
pub mod sentiment;

pub use ai::{list_models, optimize_portfolio};
pub use assistant::chat_with_assistant;
pub use health::health_check;
pub use predictions::predict_price;
pub use sentiment::analyze_sentiment;
