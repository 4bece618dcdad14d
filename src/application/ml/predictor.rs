use crate::domain::errors::PredictorError;
use std::sync::Arc;

/// Binary outcome of one price interval
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Up,
    NotUp,
}

impl Outcome {
    /// `Up` only for a strictly positive change; flat counts as not up.
    pub fn from_change(change: f64) -> Self {
        if change > 0.0 { Outcome::Up } else { Outcome::NotUp }
    }

    pub fn as_label(self) -> u8 {
        match self {
            Outcome::Up => 1,
            Outcome::NotUp => 0,
        }
    }
}

/// Interface for single-feature incremental classifiers
pub trait OnlineClassifier: Send + Sync {
    /// One learning step on exactly one sample. On error the parameters
    /// must be left as they were.
    fn partial_fit(&mut self, feature: f64, outcome: Outcome) -> Result<(), PredictorError>;

    /// Probability (0.0 to 1.0) that the outcome is `Up`
    fn predict_proba(&self, feature: f64) -> Result<f64, PredictorError>;

    fn name(&self) -> &str;
}

/// Builds a fresh classifier for a symbol seen for the first time
pub type ClassifierFactory = Arc<dyn Fn() -> Box<dyn OnlineClassifier> + Send + Sync>;
