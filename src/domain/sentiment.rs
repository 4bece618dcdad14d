use crate::domain::errors::ScoringError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub const POSITIVE: &str = "positive";
pub const NEGATIVE: &str = "negative";
pub const NEUTRAL: &str = "neutral";

/// Weight of a class label in the scalar conversion.
/// Unknown labels contribute nothing.
pub fn label_weight(label: &str) -> f64 {
    match label.to_lowercase().as_str() {
        POSITIVE => 1.0,
        NEGATIVE => -1.0,
        _ => 0.0,
    }
}

/// Classifier output for a single text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredText {
    /// Dominant label
    pub label: String,
    pub class_probabilities: HashMap<String, f64>,
}

impl ScoredText {
    pub fn new(label: impl Into<String>, class_probabilities: HashMap<String, f64>) -> Self {
        Self {
            label: label.into(),
            class_probabilities,
        }
    }

    /// Weighted sum of class probabilities: positive +1, negative -1, everything else 0.
    pub fn to_scalar(&self) -> f64 {
        self.class_probabilities
            .iter()
            .map(|(label, p)| label_weight(label) * p)
            .sum()
    }
}

/// One timestamped sentiment scalar, roughly in [-1, 1]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SentimentSample {
    pub timestamp: DateTime<Utc>,
    pub value: f64,
}

impl SentimentSample {
    pub fn new(timestamp: DateTime<Utc>, value: f64) -> Self {
        Self { timestamp, value }
    }
}

/// Text-to-sentiment backend. Returns one result per input text, in input order.
#[async_trait]
pub trait SentimentScorer: Send + Sync {
    async fn score(&self, texts: &[String]) -> Result<Vec<ScoredText>, ScoringError>;

    fn name(&self) -> &str;
}

/// Trims and collapses whitespace runs to a single space.
pub fn clean_text(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
