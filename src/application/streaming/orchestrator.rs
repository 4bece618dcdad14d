//! Tick Orchestrator
//!
//! Drives the two polling cycles over every tracked symbol:
//! - news: fetch + score headlines, append samples to the symbol's window
//! - price: fetch price/change, train the predictor on the current interval,
//!   predict, and broadcast a [`Tick`]
//!
//! Every symbol runs as its own task inside a cycle. The cycle joins all of
//! them, whatever their outcome, before the inter-cycle wait starts.

use crate::application::market_data::news_aggregator::NewsAggregator;
use crate::application::market_data::price_aggregator::{PriceAggregator, PriceObservation};
use crate::application::market_data::sentiment_window::DEFAULT_AVERAGE_WINDOW_SECS;
use crate::application::ml::online_predictor::OnlinePredictor;
use crate::application::ml::predictor::Outcome;
use crate::application::streaming::broadcaster::SubscriptionBroadcaster;
use crate::application::streaming::scheduler::{
    Clock, CycleTimer, ShutdownSignal, run_periodic,
};
use crate::application::streaming::symbol_registry::SymbolRegistry;
use crate::domain::tick::Tick;
use crate::infrastructure::observability::Metrics;
use crate::infrastructure::observability::metrics::{NEWS_CYCLE, PRICE_CYCLE};
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

pub const DEFAULT_NEWS_FETCH_LIMIT: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CycleSettings {
    pub news_interval: Duration,
    pub price_interval: Duration,
    pub news_fetch_limit: usize,
    pub average_window_secs: i64,
}

impl Default for CycleSettings {
    fn default() -> Self {
        Self {
            news_interval: Duration::from_secs(60),
            price_interval: Duration::from_secs(60),
            news_fetch_limit: DEFAULT_NEWS_FETCH_LIMIT,
            average_window_secs: DEFAULT_AVERAGE_WINDOW_SECS,
        }
    }
}

/// Summary of one news cycle
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewsCycleReport {
    pub symbols_completed: usize,
    pub symbols_failed: usize,
    pub samples_appended: usize,
}

/// Summary of one price cycle
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PriceCycleReport {
    pub ticks: Vec<Tick>,
    pub symbols_failed: usize,
}

/// Shared services the orchestrator coordinates
#[derive(Clone)]
pub struct StreamServices {
    pub registry: Arc<SymbolRegistry>,
    pub news: Arc<NewsAggregator>,
    pub prices: Arc<PriceAggregator>,
    pub predictor: Arc<OnlinePredictor>,
    pub broadcaster: Arc<SubscriptionBroadcaster>,
    pub clock: Arc<dyn Clock>,
    pub metrics: Metrics,
}

#[derive(Clone)]
pub struct TickOrchestrator {
    services: StreamServices,
    settings: CycleSettings,
}

impl TickOrchestrator {
    pub fn new(services: StreamServices, settings: CycleSettings) -> Self {
        Self { services, settings }
    }

    pub fn settings(&self) -> CycleSettings {
        self.settings
    }

    pub fn services(&self) -> &StreamServices {
        &self.services
    }

    /// Runs both cycles until shutdown. Returns `(news_cycles, price_cycles)`.
    pub async fn run(&self, timer: Arc<dyn CycleTimer>, shutdown: ShutdownSignal) -> (u64, u64) {
        info!(
            "TickOrchestrator starting for {:?}",
            self.services.registry.symbols()
        );

        let news = run_periodic(
            "News cycle",
            self.settings.news_interval,
            Arc::clone(&timer),
            shutdown.clone(),
            move || async move {
                self.run_news_cycle().await;
            },
        );
        let price = run_periodic(
            "Price cycle",
            self.settings.price_interval,
            timer,
            shutdown,
            move || async move {
                self.run_price_cycle().await;
            },
        );

        tokio::join!(news, price)
    }

    /// One news pass over every symbol.
    pub async fn run_news_cycle(&self) -> NewsCycleReport {
        let results = self
            .fan_out(|this, symbol| async move { this.process_news(&symbol).await })
            .await;

        let mut report = NewsCycleReport::default();
        for result in results {
            match result {
                Some(appended) => {
                    report.symbols_completed += 1;
                    report.samples_appended += appended;
                }
                None => report.symbols_failed += 1,
            }
        }
        self.services
            .metrics
            .record_cycle(NEWS_CYCLE, report.symbols_failed);
        debug!("News cycle: {:?}", report);
        report
    }

    /// One price pass over every symbol. Returns every tick that was emitted.
    pub async fn run_price_cycle(&self) -> PriceCycleReport {
        let results = self
            .fan_out(|this, symbol| async move { this.process_price(&symbol).await })
            .await;

        let mut report = PriceCycleReport::default();
        for result in results {
            match result {
                Some(tick) => report.ticks.push(tick),
                None => report.symbols_failed += 1,
            }
        }
        self.services
            .metrics
            .record_cycle(PRICE_CYCLE, report.symbols_failed);
        debug!(
            "Price cycle: {} ticks, {} failed",
            report.ticks.len(),
            report.symbols_failed
        );
        report
    }

    /// Fetches and scores news for one symbol and appends the samples to its
    /// window. Returns the number of samples appended.
    pub async fn process_news(&self, symbol: &str) -> usize {
        let samples = match self
            .services
            .news
            .score_latest(symbol, self.settings.news_fetch_limit)
            .await
        {
            Ok(samples) => samples,
            Err(e) => {
                warn!("Failed to score news for {}: {}", symbol, e);
                return 0;
            }
        };

        if samples.is_empty() {
            return 0;
        }

        let Some(window) = self.services.registry.window(symbol) else {
            warn!("News for untracked symbol {} discarded", symbol);
            return 0;
        };

        let appended = samples.len();
        let now = self.services.clock.now();
        window.lock().await.append_batch(samples, now);
        self.services.metrics.add_sentiment_samples(symbol, appended);
        debug!("Appended {} sentiment samples for {}", appended, symbol);
        appended
    }

    /// Polls the price, then emits a tick.
    pub async fn process_price(&self, symbol: &str) -> Tick {
        let observation = self.services.prices.observe(symbol).await;
        self.emit_tick(symbol, observation).await
    }

    /// Merges an observation with the rolling sentiment, trains and queries the
    /// predictor, and broadcasts the resulting tick.
    ///
    /// The label describes the move of the same interval the sentiment average
    /// covers, and the prediction is taken after that sample has been learned.
    pub async fn emit_tick(&self, symbol: &str, observation: PriceObservation) -> Tick {
        let now = self.services.clock.now();
        let avg = self.sentiment_average(symbol, now).await;

        if let (Some(change), Some(avg)) = (observation.change_1m, avg) {
            self.services
                .predictor
                .update(symbol, avg, Outcome::from_change(change))
                .await;
        }

        let pred_up_prob = match avg {
            Some(avg) => self.services.predictor.predict(symbol, avg).await,
            None => None,
        };

        let tick = Tick::new(
            symbol,
            now,
            observation.price,
            observation.change_1m,
            avg,
            pred_up_prob,
        );

        let report = self.services.broadcaster.broadcast(&tick).await;
        if report.pruned > 0 {
            info!(
                "{}: delivered to {}, pruned {} subscribers",
                symbol, report.delivered, report.pruned
            );
        }
        self.record_tick_metrics(symbol, report.pruned).await;
        tick
    }

    async fn record_tick_metrics(&self, symbol: &str, pruned: usize) {
        let metrics = &self.services.metrics;
        metrics.record_tick(symbol, pruned);
        metrics.set_subscribers(
            symbol,
            self.services.broadcaster.subscriber_count(symbol).await,
        );
        metrics.set_predictor_phase(
            symbol,
            self.services.predictor.phase(symbol).await.level(),
        );
    }

    pub async fn sentiment_average(
        &self,
        symbol: &str,
        now: chrono::DateTime<chrono::Utc>,
    ) -> Option<f64> {
        let window = self.services.registry.window(symbol)?;
        window
            .lock()
            .await
            .average(now, self.settings.average_window_secs)
    }

    /// Spawns `work` for each tracked symbol and waits for every task.
    /// A panicking task is logged and reported as `None`; siblings keep running.
    async fn fan_out<F, Fut, T>(&self, work: F) -> Vec<Option<T>>
    where
        F: Fn(TickOrchestrator, String) -> Fut,
        Fut: Future<Output = T> + Send + 'static,
        T: Send + 'static,
    {
        let mut tasks = JoinSet::new();
        let mut owners = HashMap::new();
        for symbol in self.services.registry.symbols() {
            let handle = tasks.spawn(work(self.clone(), symbol.clone()));
            owners.insert(handle.id(), symbol.clone());
        }

        let mut results = Vec::with_capacity(owners.len());
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(value) => results.push(Some(value)),
                Err(e) => {
                    let symbol = owners.get(&e.id()).map_or("?", String::as_str);
                    error!("Task for {} aborted: {}", symbol, e);
                    results.push(None);
                }
            }
        }
        results
    }
}
