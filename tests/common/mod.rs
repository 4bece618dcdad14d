#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use sentitick::application::market_data::news_aggregator::NewsAggregator;
use sentitick::application::market_data::price_aggregator::PriceAggregator;
use sentitick::application::ml::online_predictor::{OnlinePredictor, PredictorSettings};
use sentitick::application::ml::predictor::{ClassifierFactory, OnlineClassifier};
use sentitick::application::ml::sgd_classifier::SgdLogisticRegression;
use sentitick::application::streaming::broadcaster::SubscriptionBroadcaster;
use sentitick::application::streaming::orchestrator::{
    CycleSettings, StreamServices, TickOrchestrator,
};
use sentitick::application::streaming::scheduler::{CycleTimer, ManualClock, ShutdownTrigger};
use sentitick::application::streaming::symbol_registry::SymbolRegistry;
use sentitick::domain::errors::{DeliveryError, ProviderError, ScoringError};
use sentitick::domain::ports::{
    NewsProvider, PriceChangeProvider, PriceProvider, Subscriber, SubscriberId,
};
use sentitick::domain::sentiment::{NEUTRAL, POSITIVE, ScoredText, SentimentScorer};
use sentitick::infrastructure::observability::Metrics;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use uuid::Uuid;

pub fn start_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 10, 14, 30, 0).unwrap()
}

fn request_failed(provider: &str, symbol: &str) -> ProviderError {
    ProviderError::Request {
        provider: provider.to_string(),
        symbol: symbol.to_string(),
        reason: "connection reset".to_string(),
    }
}

/// Behaviour of a scripted provider for one symbol
#[derive(Clone)]
pub enum Script<T> {
    Returns(T),
    Fails,
    Panics,
}

/// News source answering from a per-symbol script; unknown symbols get nothing.
pub struct ScriptedNews {
    name: String,
    scripts: HashMap<String, Script<Vec<String>>>,
    pub calls: AtomicUsize,
}

impl ScriptedNews {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            scripts: HashMap::new(),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn with(mut self, symbol: &str, script: Script<Vec<&str>>) -> Self {
        let script = match script {
            Script::Returns(texts) => Script::Returns(texts.iter().map(|t| t.to_string()).collect()),
            Script::Fails => Script::Fails,
            Script::Panics => Script::Panics,
        };
        self.scripts.insert(symbol.to_string(), script);
        self
    }
}

#[async_trait]
impl NewsProvider for ScriptedNews {
    async fn fetch(&self, symbol: &str, limit: usize) -> Result<Vec<String>, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.scripts.get(symbol) {
            Some(Script::Returns(texts)) => Ok(texts.iter().take(limit).cloned().collect()),
            Some(Script::Fails) => Err(request_failed(&self.name, symbol)),
            Some(Script::Panics) => panic!("scripted news panic for {}", symbol),
            None => Ok(Vec::new()),
        }
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Price and 1-minute change from a per-symbol script
pub struct ScriptedMarket {
    scripts: HashMap<String, Script<(Option<f64>, Option<f64>)>>,
}

impl ScriptedMarket {
    pub fn new() -> Self {
        Self {
            scripts: HashMap::new(),
        }
    }

    pub fn with(mut self, symbol: &str, script: Script<(Option<f64>, Option<f64>)>) -> Self {
        self.scripts.insert(symbol.to_string(), script);
        self
    }

    fn lookup(&self, symbol: &str) -> Result<(Option<f64>, Option<f64>), ProviderError> {
        match self.scripts.get(symbol) {
            Some(Script::Returns(quote)) => Ok(*quote),
            Some(Script::Fails) | None => Err(request_failed("Scripted market", symbol)),
            Some(Script::Panics) => panic!("scripted market panic for {}", symbol),
        }
    }
}

#[async_trait]
impl PriceProvider for ScriptedMarket {
    async fn fetch_price(&self, symbol: &str) -> Result<Option<f64>, ProviderError> {
        Ok(self.lookup(symbol)?.0)
    }

    fn name(&self) -> &str {
        "Scripted market"
    }
}

#[async_trait]
impl PriceChangeProvider for ScriptedMarket {
    async fn fetch_change_1m(&self, symbol: &str) -> Result<Option<f64>, ProviderError> {
        Ok(self.lookup(symbol)?.1)
    }

    fn name(&self) -> &str {
        "Scripted market"
    }
}

/// Gives every text the same positive share; the scalar equals `positive`.
pub struct FixedScorer {
    pub positive: f64,
}

#[async_trait]
impl SentimentScorer for FixedScorer {
    async fn score(&self, texts: &[String]) -> Result<Vec<ScoredText>, ScoringError> {
        Ok(texts
            .iter()
            .map(|_| {
                ScoredText::new(
                    POSITIVE,
                    HashMap::from([
                        (POSITIVE.to_string(), self.positive),
                        (NEUTRAL.to_string(), 1.0 - self.positive),
                    ]),
                )
            })
            .collect())
    }

    fn name(&self) -> &str {
        "Fixed"
    }
}

/// Fails any batch containing `fail_on`, otherwise scores like [`FixedScorer`].
pub struct SelectiveScorer {
    pub positive: f64,
    pub fail_on: &'static str,
}

#[async_trait]
impl SentimentScorer for SelectiveScorer {
    async fn score(&self, texts: &[String]) -> Result<Vec<ScoredText>, ScoringError> {
        if texts.iter().any(|t| t.contains(self.fail_on)) {
            return Err(ScoringError::Backend {
                reason: "model unavailable".to_string(),
            });
        }
        FixedScorer {
            positive: self.positive,
        }
        .score(texts)
        .await
    }

    fn name(&self) -> &str {
        "Selective"
    }
}

/// Records every payload; optionally refuses all deliveries.
pub struct RecordingSubscriber {
    id: SubscriberId,
    fail: bool,
    pub received: Mutex<Vec<String>>,
}

impl RecordingSubscriber {
    pub fn healthy() -> Arc<Self> {
        Arc::new(Self {
            id: Uuid::new_v4(),
            fail: false,
            received: Mutex::new(Vec::new()),
        })
    }

    pub fn broken() -> Arc<Self> {
        Arc::new(Self {
            id: Uuid::new_v4(),
            fail: true,
            received: Mutex::new(Vec::new()),
        })
    }

    pub fn payloads(&self) -> Vec<String> {
        self.received.lock().unwrap().clone()
    }
}

#[async_trait]
impl Subscriber for RecordingSubscriber {
    fn id(&self) -> SubscriberId {
        self.id
    }

    async fn deliver(&self, payload: &str) -> Result<(), DeliveryError> {
        if self.fail {
            return Err(DeliveryError::Closed { subscriber: self.id });
        }
        self.received.lock().unwrap().push(payload.to_string());
        Ok(())
    }
}

/// Timer that returns immediately and triggers shutdown after `limit` waits.
pub struct CountingTimer {
    pub waits: AtomicUsize,
    limit: usize,
    trigger: ShutdownTrigger,
}

impl CountingTimer {
    pub fn new(limit: usize, trigger: ShutdownTrigger) -> Self {
        Self {
            waits: AtomicUsize::new(0),
            limit,
            trigger,
        }
    }
}

#[async_trait]
impl CycleTimer for CountingTimer {
    async fn wait(&self, _interval: Duration) {
        let waited = self.waits.fetch_add(1, Ordering::SeqCst) + 1;
        if waited >= self.limit {
            self.trigger.trigger();
        }
        tokio::task::yield_now().await;
    }
}

pub fn sgd_factory() -> ClassifierFactory {
    Arc::new(|| Box::new(SgdLogisticRegression::default()) as Box<dyn OnlineClassifier>)
}

pub struct Harness {
    pub orchestrator: TickOrchestrator,
    pub clock: Arc<ManualClock>,
}

impl Harness {
    pub fn services(&self) -> &StreamServices {
        self.orchestrator.services()
    }
}

/// Orchestrator over scripted sources with a manual clock at [`start_time`].
pub fn harness(
    symbols: &[&str],
    news: Vec<Arc<dyn NewsProvider>>,
    market: ScriptedMarket,
    scorer: Arc<dyn SentimentScorer>,
) -> Harness {
    let clock = Arc::new(ManualClock::new(start_time()));
    let market = Arc::new(market);

    let services = StreamServices {
        registry: Arc::new(
            SymbolRegistry::new(symbols.iter().copied(), chrono::Duration::seconds(3600)).unwrap(),
        ),
        news: Arc::new(NewsAggregator::new(news, scorer, clock.clone())),
        prices: Arc::new(PriceAggregator::new(
            vec![market.clone() as Arc<dyn PriceProvider>],
            vec![market as Arc<dyn PriceChangeProvider>],
        )),
        predictor: Arc::new(OnlinePredictor::new(
            PredictorSettings::default(),
            sgd_factory(),
        )),
        broadcaster: Arc::new(SubscriptionBroadcaster::new(Duration::from_millis(500))),
        clock: clock.clone(),
        metrics: Metrics::new().unwrap(),
    };

    Harness {
        orchestrator: TickOrchestrator::new(services, CycleSettings::default()),
        clock,
    }
}
