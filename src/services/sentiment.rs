//! Sentiment analysis over financial text
//!
//! Lexicon-based scoring: positive and negative financial terms move the
//! score, hedging language dampens confidence.

use std::collections::HashSet;

use serde::Serialize;

/// Result of scoring a piece of text.
#[derive(Debug, Clone, Serialize)]
pub struct SentimentScore {
    pub score: f64,
    pub label: String,
    pub confidence: f64,
}

/// Financial-lexicon sentiment analyzer.
pub struct SentimentService {
    positive_words: HashSet<&'static str>,
    negative_words: HashSet<&'static str>,
    hedging_words: HashSet<&'static str>,
}

impl Default for SentimentService {
    fn default() -> Self {
        Self::new()
    }
}

impl SentimentService {
    pub fn new() -> Self {
        Self {
            positive_words: HashSet::from([
                "growth", "profit", "gain", "gains", "rally", "bullish", "surge", "beat",
                "record", "strong", "upgrade", "outperform", "momentum", "recovery", "breakout",
                "up", "rise", "rising", "soar", "exceeded",
            ]),
            negative_words: HashSet::from([
                "loss", "losses", "decline", "bearish", "crash", "drop", "miss", "missed",
                "weak", "downgrade", "underperform", "selloff", "recession", "default", "down",
                "fall", "falling", "plunge", "fear", "risk",
            ]),
            hedging_words: HashSet::from([
                "may", "might", "could", "possibly", "perhaps", "uncertain", "unclear",
                "approximately", "roughly", "somewhat",
            ]),
        }
    }

    /// Score `text`, returning a net score in [-1, 1] with a label and a
    /// confidence estimate.
    pub fn analyze(&self, text: &str) -> SentimentScore {
        let lowered = text.to_lowercase();
        let words: Vec<&str> = lowered
            .split(|c: char| !c.is_alphanumeric())
            .filter(|word| !word.is_empty())
            .collect();

        if words.is_empty() {
            return SentimentScore {
                score: 0.0,
                label: "neutral".to_string(),
                confidence: 0.0,
            };
        }

        let positive = words
            .iter()
            .filter(|word| self.positive_words.contains(**word))
            .count() as f64;
        let negative = words
            .iter()
            .filter(|word| self.negative_words.contains(**word))
            .count() as f64;
        let hedging = words
            .iter()
            .filter(|word| self.hedging_words.contains(**word))
            .count() as f64;

        let matched = positive + negative;
        let score = if matched > 0.0 {
            // Hedging halves the weight of whichever side it qualifies.
            ((positive - negative) / matched) * (1.0 - 0.5 * (hedging / words.len() as f64).min(1.0))
        } else {
            0.0
        };
        let score = score.clamp(-1.0, 1.0);

        let label = if score > 0.15 {
            "bullish"
        } else if score < -0.15 {
            "bearish"
        } else {
            "neutral"
        };

        let coverage = (matched / words.len() as f64).min(1.0);
        let confidence = if matched > 0.0 {
            (0.3 + 0.7 * coverage).clamp(0.0, 1.0)
        } else {
            0.1
        };

        SentimentScore {
            score,
            label: label.to_string(),
            confidence,
        }
    }
}
