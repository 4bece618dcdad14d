//! Push-based metrics reporter for Sentitick
//!
//! Periodically refreshes the per-symbol gauges and writes a JSON snapshot to
//! stdout. Only sends data, never accepts requests.

use crate::application::ml::online_predictor::OnlinePredictor;
use crate::application::streaming::broadcaster::SubscriptionBroadcaster;
use crate::application::streaming::scheduler::ShutdownSignal;
use crate::application::streaming::symbol_registry::SymbolRegistry;
use crate::infrastructure::observability::metrics::{Metrics, NEWS_CYCLE, PRICE_CYCLE};
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// Metrics snapshot for JSON output
#[derive(Debug, Serialize)]
pub struct MetricsSnapshot {
    pub timestamp: String,
    pub uptime_seconds: u64,
    pub version: String,
    pub cycles: CycleSnapshot,
    pub symbols: Vec<SymbolSnapshot>,
}

#[derive(Debug, Serialize)]
pub struct CycleSnapshot {
    pub news_completed: u64,
    pub price_completed: u64,
    pub news_symbols_failed: u64,
    pub price_symbols_failed: u64,
}

#[derive(Debug, Serialize)]
pub struct SymbolSnapshot {
    pub symbol: String,
    pub subscribers: usize,
    pub predictor_phase: &'static str,
    pub predictor_history: usize,
    pub ticks_emitted: u64,
    pub subscribers_pruned: u64,
}

pub struct MetricsReporter {
    registry: Arc<SymbolRegistry>,
    broadcaster: Arc<SubscriptionBroadcaster>,
    predictor: Arc<OnlinePredictor>,
    metrics: Metrics,
    start_time: Instant,
    interval: Duration,
}

impl MetricsReporter {
    pub fn new(
        registry: Arc<SymbolRegistry>,
        broadcaster: Arc<SubscriptionBroadcaster>,
        predictor: Arc<OnlinePredictor>,
        metrics: Metrics,
        interval: Duration,
    ) -> Self {
        Self {
            registry,
            broadcaster,
            predictor,
            metrics,
            start_time: Instant::now(),
            interval,
        }
    }

    /// Outputs a snapshot every interval until shutdown.
    pub async fn run(self, mut shutdown: ShutdownSignal) {
        info!(
            "MetricsReporter: Starting push-based metrics (interval: {:?})",
            self.interval
        );

        loop {
            tokio::select! {
                _ = shutdown.triggered() => break,
                _ = tokio::time::sleep(self.interval) => {}
            }

            let snapshot = self.collect_snapshot().await;
            match serde_json::to_string(&snapshot) {
                Ok(json) => {
                    println!("METRICS_JSON:{}", json);
                    info!(
                        "Cycles: news {} / price {} | Uptime: {}s",
                        snapshot.cycles.news_completed,
                        snapshot.cycles.price_completed,
                        snapshot.uptime_seconds
                    );
                }
                Err(e) => warn!("Failed to serialize metrics: {}", e),
            }
        }
        info!("MetricsReporter: stopped");
    }

    /// Refreshes the gauges from live state and reads the counters back.
    pub async fn collect_snapshot(&self) -> MetricsSnapshot {
        let uptime = self.start_time.elapsed().as_secs();
        self.metrics.uptime_seconds.set(uptime as f64);

        let mut symbols = Vec::with_capacity(self.registry.len());
        for symbol in self.registry.symbols() {
            let subscribers = self.broadcaster.subscriber_count(symbol).await;
            let phase = self.predictor.phase(symbol).await;
            self.metrics.set_subscribers(symbol, subscribers);
            self.metrics.set_predictor_phase(symbol, phase.level());

            symbols.push(SymbolSnapshot {
                symbol: symbol.clone(),
                subscribers,
                predictor_phase: phase.as_str(),
                predictor_history: self.predictor.history_len(symbol).await,
                ticks_emitted: self.metrics.ticks_emitted(symbol) as u64,
                subscribers_pruned: self.metrics.subscribers_pruned(symbol) as u64,
            });
        }

        MetricsSnapshot {
            timestamp: chrono::Utc::now().to_rfc3339(),
            uptime_seconds: uptime,
            version: env!("CARGO_PKG_VERSION").to_string(),
            cycles: CycleSnapshot {
                news_completed: self.metrics.cycles(NEWS_CYCLE) as u64,
                price_completed: self.metrics.cycles(PRICE_CYCLE) as u64,
                news_symbols_failed: self.metrics.symbols_failed(NEWS_CYCLE) as u64,
                price_symbols_failed: self.metrics.symbols_failed(PRICE_CYCLE) as u64,
            },
            symbols,
        }
    }
}
