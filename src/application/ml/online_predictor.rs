//! Per-symbol online "price rises next tick" predictor.
//!
//! Each symbol owns a [`PredictorState`]: a bounded FIFO of `(feature, label)`
//! pairs plus classifier parameters. States are created lazily on first access
//! and live for the whole process.

use super::predictor::{ClassifierFactory, OnlineClassifier, Outcome};
use crate::domain::errors::PredictorError;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, error};

pub const DEFAULT_MAX_HISTORY: usize = 500;
pub const DEFAULT_WARMUP: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PredictorSettings {
    pub max_history: usize,
    pub warmup: usize,
}

impl Default for PredictorSettings {
    fn default() -> Self {
        Self {
            max_history: DEFAULT_MAX_HISTORY,
            warmup: DEFAULT_WARMUP,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PredictorPhase {
    Cold,
    Warming,
    Trained,
}

impl PredictorPhase {
    pub fn as_str(self) -> &'static str {
        match self {
            PredictorPhase::Cold => "cold",
            PredictorPhase::Warming => "warming",
            PredictorPhase::Trained => "trained",
        }
    }

    /// Gauge encoding: 0=cold, 1=warming, 2=trained
    pub fn level(self) -> f64 {
        match self {
            PredictorPhase::Cold => 0.0,
            PredictorPhase::Warming => 1.0,
            PredictorPhase::Trained => 2.0,
        }
    }
}

pub struct PredictorState {
    history: VecDeque<(f64, Outcome)>,
    settings: PredictorSettings,
    classifier: Box<dyn OnlineClassifier>,
}

impl PredictorState {
    pub fn new(settings: PredictorSettings, classifier: Box<dyn OnlineClassifier>) -> Self {
        Self {
            history: VecDeque::with_capacity(settings.max_history),
            settings,
            classifier,
        }
    }

    pub fn phase(&self) -> PredictorPhase {
        match self.history.len() {
            0 => PredictorPhase::Cold,
            n if n < self.settings.warmup => PredictorPhase::Warming,
            _ => PredictorPhase::Trained,
        }
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    /// Records the sample and, once warm, runs one learning step on it alone.
    ///
    /// A rejected feature changes nothing. A failed learning step leaves the
    /// classifier parameters untouched, but the sample stays in the history and
    /// still counts towards warmup.
    pub fn update(&mut self, feature: f64, outcome: Outcome) -> Result<(), PredictorError> {
        if !feature.is_finite() {
            return Err(PredictorError::NonFinite {
                what: "feature",
                value: feature,
            });
        }

        if self.history.len() == self.settings.max_history {
            self.history.pop_front();
        }
        self.history.push_back((feature, outcome));

        if self.history.len() >= self.settings.warmup {
            self.classifier.partial_fit(feature, outcome)?;
        }
        Ok(())
    }

    /// `None` until the warmup threshold is reached.
    pub fn predict(&self, feature: f64) -> Result<Option<f64>, PredictorError> {
        if self.history.len() < self.settings.warmup {
            return Ok(None);
        }
        let p = self.classifier.predict_proba(feature)?;
        Ok(Some(p.clamp(0.0, 1.0)))
    }
}

/// Registry of per-symbol predictor states with race-free lazy creation.
pub struct OnlinePredictor {
    states: RwLock<HashMap<String, Arc<Mutex<PredictorState>>>>,
    settings: PredictorSettings,
    factory: ClassifierFactory,
}

impl OnlinePredictor {
    pub fn new(settings: PredictorSettings, factory: ClassifierFactory) -> Self {
        Self {
            states: RwLock::new(HashMap::new()),
            settings,
            factory,
        }
    }

    pub fn settings(&self) -> PredictorSettings {
        self.settings
    }

    async fn state(&self, symbol: &str) -> Arc<Mutex<PredictorState>> {
        if let Some(state) = self.states.read().await.get(symbol) {
            return Arc::clone(state);
        }

        let mut states = self.states.write().await;
        let state = states.entry(symbol.to_string()).or_insert_with(|| {
            debug!("OnlinePredictor: creating state for {}", symbol);
            Arc::new(Mutex::new(PredictorState::new(
                self.settings,
                (self.factory)(),
            )))
        });
        Arc::clone(state)
    }

    /// Feeds one sample. Failures are logged; returns whether the update applied cleanly.
    pub async fn update(&self, symbol: &str, feature: f64, outcome: Outcome) -> bool {
        let state = self.state(symbol).await;
        let mut guard = state.lock().await;
        match guard.update(feature, outcome) {
            Ok(()) => true,
            Err(e) => {
                error!("OnlinePredictor: training error for {}: {}", symbol, e);
                false
            }
        }
    }

    /// Probability of an up move, or `None` while warming up or on failure.
    pub async fn predict(&self, symbol: &str, feature: f64) -> Option<f64> {
        let state = self.state(symbol).await;
        let guard = state.lock().await;
        match guard.predict(feature) {
            Ok(p) => p,
            Err(e) => {
                error!("OnlinePredictor: prediction error for {}: {}", symbol, e);
                None
            }
        }
    }

    pub async fn phase(&self, symbol: &str) -> PredictorPhase {
        match self.states.read().await.get(symbol) {
            Some(state) => state.lock().await.phase(),
            None => PredictorPhase::Cold,
        }
    }

    pub async fn history_len(&self, symbol: &str) -> usize {
        match self.states.read().await.get(symbol) {
            Some(state) => state.lock().await.history_len(),
            None => 0,
        }
    }

    pub async fn tracked_symbols(&self) -> usize {
        self.states.read().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ml::sgd_classifier::SgdLogisticRegression;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn sgd_factory() -> ClassifierFactory {
        Arc::new(|| Box::new(SgdLogisticRegression::default()) as Box<dyn OnlineClassifier>)
    }

    struct FailingClassifier;

    impl OnlineClassifier for FailingClassifier {
        fn partial_fit(&mut self, _feature: f64, _outcome: Outcome) -> Result<(), PredictorError> {
            Err(PredictorError::Diverged { step: 1 })
        }

        fn predict_proba(&self, _feature: f64) -> Result<f64, PredictorError> {
            Err(PredictorError::NonFinite {
                what: "probability",
                value: f64::NAN,
            })
        }

        fn name(&self) -> &str {
            "failing"
        }
    }

    #[tokio::test]
    async fn test_warmup_gates_prediction() {
        let predictor = OnlinePredictor::new(PredictorSettings::default(), sgd_factory());

        for i in 0..9 {
            assert!(predictor.update("AAPL", 0.1 * i as f64, Outcome::Up).await);
        }
        assert_eq!(predictor.phase("AAPL").await, PredictorPhase::Warming);
        assert_eq!(predictor.predict("AAPL", 0.4).await, None);
        assert_eq!(predictor.predict("AAPL", -3.0).await, None);

        predictor.update("AAPL", 0.5, Outcome::Up).await;
        assert_eq!(predictor.phase("AAPL").await, PredictorPhase::Trained);
        let p = predictor.predict("AAPL", 0.4).await.unwrap();
        assert!((0.0..=1.0).contains(&p));
    }

    #[tokio::test]
    async fn test_only_post_warmup_samples_train() {
        let predictor = OnlinePredictor::new(PredictorSettings::default(), sgd_factory());
        for _ in 0..10 {
            predictor.update("AAPL", 0.4, Outcome::Up).await;
        }

        // Exactly one learning step happened: the tenth sample.
        let mut reference = SgdLogisticRegression::default();
        reference.partial_fit(0.4, Outcome::Up).unwrap();
        let expected = reference.predict_proba(0.4).unwrap();

        assert_eq!(predictor.predict("AAPL", 0.4).await, Some(expected));
    }

    #[tokio::test]
    async fn test_history_is_bounded_fifo() {
        let settings = PredictorSettings {
            max_history: 5,
            warmup: 2,
        };
        let predictor = OnlinePredictor::new(settings, sgd_factory());
        for i in 0..12 {
            predictor
                .update("TSLA", i as f64 / 10.0, Outcome::NotUp)
                .await;
        }
        assert_eq!(predictor.history_len("TSLA").await, 5);
        assert_eq!(predictor.phase("TSLA").await, PredictorPhase::Trained);
    }

    #[tokio::test]
    async fn test_symbols_are_independent() {
        let predictor = OnlinePredictor::new(PredictorSettings::default(), sgd_factory());
        for _ in 0..10 {
            predictor.update("AAPL", 0.2, Outcome::Up).await;
        }
        assert_eq!(predictor.phase("AAPL").await, PredictorPhase::Trained);
        assert_eq!(predictor.phase("MSFT").await, PredictorPhase::Cold);
        assert_eq!(predictor.predict("MSFT", 0.2).await, None);
    }

    #[tokio::test]
    async fn test_classifier_failures_are_contained() {
        let factory: ClassifierFactory =
            Arc::new(|| Box::new(FailingClassifier) as Box<dyn OnlineClassifier>);
        let settings = PredictorSettings {
            max_history: 10,
            warmup: 1,
        };
        let predictor = OnlinePredictor::new(settings, factory);

        assert!(!predictor.update("AAPL", 0.1, Outcome::Up).await);
        assert_eq!(predictor.predict("AAPL", 0.1).await, None);
        assert_eq!(predictor.history_len("AAPL").await, 1);
    }

    #[test]
    fn test_failed_fit_keeps_sample_in_history() {
        let settings = PredictorSettings {
            max_history: 10,
            warmup: 2,
        };
        let mut state = PredictorState::new(settings, Box::new(FailingClassifier));

        assert!(state.update(0.2, Outcome::Up).is_ok());
        assert_eq!(state.phase(), PredictorPhase::Warming);

        assert!(matches!(
            state.update(0.3, Outcome::NotUp),
            Err(PredictorError::Diverged { .. })
        ));
        assert_eq!(state.history_len(), 2);
        assert_eq!(state.phase(), PredictorPhase::Trained);
    }

    #[tokio::test]
    async fn test_non_finite_feature_is_rejected_without_mutation() {
        let predictor = OnlinePredictor::new(PredictorSettings::default(), sgd_factory());
        assert!(!predictor.update("AAPL", f64::NAN, Outcome::Up).await);
        assert_eq!(predictor.history_len("AAPL").await, 0);
    }

    #[tokio::test]
    async fn test_concurrent_first_access_creates_one_state() {
        let created = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&created);
        let factory: ClassifierFactory = Arc::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Box::new(SgdLogisticRegression::default()) as Box<dyn OnlineClassifier>
        });
        let predictor = Arc::new(OnlinePredictor::new(PredictorSettings::default(), factory));

        let mut handles = Vec::new();
        for _ in 0..16 {
            let p = Arc::clone(&predictor);
            handles.push(tokio::spawn(async move {
                p.update("NVDA", 0.3, Outcome::Up).await;
            }));
        }
        for h in handles {
            h.await.unwrap();
        }

        assert_eq!(created.load(Ordering::SeqCst), 1);
        assert_eq!(predictor.history_len("NVDA").await, 16);
        assert_eq!(predictor.tracked_symbols().await, 1);
    }
}
