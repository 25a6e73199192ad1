//! Conversational trading assistant
//!
//! Classifies the caller's intent (price outlook, portfolio advice, risk
//! guidance, greeting) and answers from the ML service where a model
//! applies. Conversation history is kept per user, bounded.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use tracing::{debug, info};
use uuid::Uuid;

use crate::services::ml_service::{MlError, MlService};

const MAX_HISTORY_TURNS: usize = 50;
const PRICE_OUTLOOK_PERIODS: usize = 24;

/// Errors surfaced by the assistant.
#[derive(Debug, thiserror::Error)]
pub enum AssistantError {
    #[error("Trading assistant is not initialized")]
    NotInitialized,
    #[error(transparent)]
    Ml(#[from] MlError),
}

/// One message in a conversation.
#[derive(Debug, Clone)]
pub struct ChatTurn {
    pub id: Uuid,
    pub role: ChatRole,
    pub content: String,
    pub at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatRole {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Intent {
    Greeting,
    PriceOutlook(String),
    PortfolioAdvice,
    RiskGuidance,
    Help,
    Unknown,
}

/// Conversational trading assistant backed by the ML service.
pub struct AssistantService {
    ml: Arc<MlService>,
    sessions: RwLock<HashMap<String, VecDeque<ChatTurn>>>,
    initialized: AtomicBool,
}

impl AssistantService {
    pub fn new(ml: Arc<MlService>) -> Self {
        Self {
            ml,
            sessions: RwLock::new(HashMap::new()),
            initialized: AtomicBool::new(false),
        }
    }

    pub async fn initialize(&self) -> Result<(), AssistantError> {
        self.initialized.store(true, Ordering::SeqCst);
        info!("Trading assistant initialized");
        Ok(())
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::SeqCst)
    }

    /// Produce a reply for `message` and record the exchange in the
    /// caller's conversation history.
    pub async fn process_message(
        &self,
        message: &str,
        user_id: &str,
    ) -> Result<String, AssistantError> {
        if !self.is_initialized() {
            return Err(AssistantError::NotInitialized);
        }

        let intent = classify(message);
        debug!(user_id, ?intent, "assistant intent");

        let reply = match &intent {
            Intent::Greeting => concat!(
                "Hello! I can share model-based price outlooks, portfolio ",
                "allocation advice, and risk guidance. What would you like to know?"
            )
            .to_string(),
            Intent::PriceOutlook(symbol) => self.price_outlook(symbol).await?,
            Intent::PortfolioAdvice => concat!(
                "For portfolio construction I recommend running the optimizer: ",
                "it blends a minimum-variance allocation with a maximum-return one ",
                "according to your risk tolerance. Diversifying across uncorrelated ",
                "assets is the single biggest lever for risk-adjusted returns."
            )
            .to_string(),
            Intent::RiskGuidance => concat!(
                "Position sizing matters more than entry timing. Keep single-asset ",
                "exposure bounded, size positions inversely to volatility, and pick ",
                "a risk tolerance you can hold through a drawdown."
            )
            .to_string(),
            Intent::Help => concat!(
                "Ask me things like \"what's the outlook for BTC\", ",
                "\"how should I diversify my portfolio\", or \"how much risk ",
                "should I take\"."
            )
            .to_string(),
            Intent::Unknown => concat!(
                "I'm not sure I can help with that. I cover price outlooks, ",
                "portfolio allocation, and risk guidance; try asking about one ",
                "of those."
            )
            .to_string(),
        };

        self.record_turns(user_id, message, &reply).await;
        Ok(reply)
    }

    /// Conversation history for one user, oldest first.
    pub async fn history(&self, user_id: &str) -> Vec<ChatTurn> {
        let sessions = self.sessions.read().await;
        sessions
            .get(user_id)
            .map(|turns| turns.iter().cloned().collect())
            .unwrap_or_default()
    }

    async fn price_outlook(&self, symbol: &str) -> Result<String, AssistantError> {
        let prediction = self
            .ml
            .predict_price(symbol, "1h", PRICE_OUTLOOK_PERIODS)
            .await?;

        let first = prediction.values.first().map(|p| p.price).unwrap_or(0.0);
        let last = prediction.values.last().map(|p| p.price).unwrap_or(first);
        let change = if first > 0.0 {
            (last / first - 1.0) * 100.0
        } else {
            0.0
        };
        let direction = if change >= 0.0 { "upward" } else { "downward" };

        Ok(format!(
            "Over the next {} hours my models see {} drifting {} by about {:.2}% (confidence {:.0}%).",
            PRICE_OUTLOOK_PERIODS,
            symbol,
            direction,
            change.abs(),
            prediction.confidence * 100.0
        ))
    }

    async fn record_turns(&self, user_id: &str, message: &str, reply: &str) {
        let now = Utc::now();
        let mut sessions = self.sessions.write().await;
        let turns = sessions.entry(user_id.to_string()).or_default();

        turns.push_back(ChatTurn {
            id: Uuid::new_v4(),
            role: ChatRole::User,
            content: message.to_string(),
            at: now,
        });
        turns.push_back(ChatTurn {
            id: Uuid::new_v4(),
            role: ChatRole::Assistant,
            content: reply.to_string(),
            at: now,
        });

        while turns.len() > MAX_HISTORY_TURNS {
            turns.pop_front();
        }
    }
}

fn classify(message: &str) -> Intent {
    let lowered = message.to_lowercase();

    if contains_any(&lowered, &["hello", "hi ", "hey"]) || lowered.trim() == "hi" {
        return Intent::Greeting;
    }
    if contains_any(&lowered, &["help", "what can you do"]) {
        return Intent::Help;
    }
    if contains_any(&lowered, &["price", "outlook", "forecast", "predict"]) {
        if let Some(symbol) = extract_symbol(message) {
            return Intent::PriceOutlook(symbol);
        }
    }
    if contains_any(&lowered, &["portfolio", "diversif", "allocat", "rebalance"]) {
        return Intent::PortfolioAdvice;
    }
    if contains_any(&lowered, &["risk", "volatil", "drawdown", "exposure"]) {
        return Intent::RiskGuidance;
    }

    Intent::Unknown
}

fn contains_any(haystack: &str, needles: &[&str]) -> bool {
    needles.iter().any(|needle| haystack.contains(needle))
}

/// Pick a ticker out of the message: an all-uppercase token of 2-6 letters,
/// or a well-known asset name.
fn extract_symbol(message: &str) -> Option<String> {
    for token in message.split(|c: char| !c.is_alphanumeric()) {
        if token.len() >= 2
            && token.len() <= 6
            && token.chars().all(|c| c.is_ascii_uppercase())
        {
            return Some(token.to_string());
        }
    }

    let lowered = message.to_lowercase();
    for (name, symbol) in [
        ("bitcoin", "BTC"),
        ("ethereum", "ETH"),
        ("solana", "SOL"),
        ("apple", "AAPL"),
        ("microsoft", "MSFT"),
    ] {
        if lowered.contains(name) {
            return Some(symbol.to_string());
        }
    }

    None
}
