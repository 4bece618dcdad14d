//! Prometheus metrics definitions for Sentitick
//!
//! All metrics use the `sentitick_` prefix.

use prometheus::{
    CounterVec, Gauge, GaugeVec, Opts, Registry, TextEncoder,
    core::{AtomicF64, GenericGauge},
};
use std::sync::Arc;

pub const NEWS_CYCLE: &str = "news";
pub const PRICE_CYCLE: &str = "price";

/// Prometheus metrics for the tick pipeline
#[derive(Clone)]
pub struct Metrics {
    registry: Arc<Registry>,
    /// Completed cycles by kind
    pub cycles_total: CounterVec,
    /// Symbol tasks that aborted, by cycle kind
    pub symbols_failed_total: CounterVec,
    /// Sentiment samples appended per symbol
    pub sentiment_samples_total: CounterVec,
    /// Ticks emitted per symbol
    pub ticks_emitted_total: CounterVec,
    /// Subscribers dropped after a failed delivery
    pub subscribers_pruned_total: CounterVec,
    /// Live subscribers per symbol
    pub subscribers: GaugeVec,
    /// Predictor phase per symbol (0=cold, 1=warming, 2=trained)
    pub predictor_phase: GaugeVec,
    /// Uptime in seconds
    pub uptime_seconds: GenericGauge<AtomicF64>,
}

impl Metrics {
    /// Create a new Metrics instance with all gauges and counters registered
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();

        let cycles_total = CounterVec::new(
            Opts::new("sentitick_cycles_total", "Completed polling cycles"),
            &["cycle"],
        )?;
        registry.register(Box::new(cycles_total.clone()))?;

        let symbols_failed_total = CounterVec::new(
            Opts::new(
                "sentitick_symbols_failed_total",
                "Per-symbol tasks aborted inside a cycle",
            ),
            &["cycle"],
        )?;
        registry.register(Box::new(symbols_failed_total.clone()))?;

        let sentiment_samples_total = CounterVec::new(
            Opts::new(
                "sentitick_sentiment_samples_total",
                "Sentiment samples appended to the rolling window",
            ),
            &["symbol"],
        )?;
        registry.register(Box::new(sentiment_samples_total.clone()))?;

        let ticks_emitted_total = CounterVec::new(
            Opts::new("sentitick_ticks_emitted_total", "Ticks emitted per symbol"),
            &["symbol"],
        )?;
        registry.register(Box::new(ticks_emitted_total.clone()))?;

        let subscribers_pruned_total = CounterVec::new(
            Opts::new(
                "sentitick_subscribers_pruned_total",
                "Subscribers removed after a failed delivery",
            ),
            &["symbol"],
        )?;
        registry.register(Box::new(subscribers_pruned_total.clone()))?;

        let subscribers = GaugeVec::new(
            Opts::new("sentitick_subscribers", "Connected subscribers per symbol"),
            &["symbol"],
        )?;
        registry.register(Box::new(subscribers.clone()))?;

        let predictor_phase = GaugeVec::new(
            Opts::new(
                "sentitick_predictor_phase",
                "Predictor phase per symbol (0=cold, 1=warming, 2=trained)",
            ),
            &["symbol"],
        )?;
        registry.register(Box::new(predictor_phase.clone()))?;

        let uptime_seconds = Gauge::with_opts(Opts::new(
            "sentitick_uptime_seconds",
            "Server uptime in seconds",
        ))?;
        registry.register(Box::new(uptime_seconds.clone()))?;

        Ok(Self {
            registry: Arc::new(registry),
            cycles_total,
            symbols_failed_total,
            sentiment_samples_total,
            ticks_emitted_total,
            subscribers_pruned_total,
            subscribers,
            predictor_phase,
            uptime_seconds,
        })
    }

    /// Render all metrics in Prometheus text format
    pub fn render(&self) -> String {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        encoder
            .encode_to_string(&metric_families)
            .unwrap_or_default()
    }

    /// Count one finished cycle and the symbol tasks it lost
    pub fn record_cycle(&self, cycle: &str, symbols_failed: usize) {
        self.cycles_total.with_label_values(&[cycle]).inc();
        if symbols_failed > 0 {
            self.symbols_failed_total
                .with_label_values(&[cycle])
                .inc_by(symbols_failed as f64);
        }
    }

    pub fn add_sentiment_samples(&self, symbol: &str, count: usize) {
        self.sentiment_samples_total
            .with_label_values(&[symbol])
            .inc_by(count as f64);
    }

    /// Record one emitted tick and the subscribers its broadcast pruned
    pub fn record_tick(&self, symbol: &str, pruned: usize) {
        self.ticks_emitted_total.with_label_values(&[symbol]).inc();
        if pruned > 0 {
            self.subscribers_pruned_total
                .with_label_values(&[symbol])
                .inc_by(pruned as f64);
        }
    }

    pub fn set_subscribers(&self, symbol: &str, count: usize) {
        self.subscribers
            .with_label_values(&[symbol])
            .set(count as f64);
    }

    pub fn set_predictor_phase(&self, symbol: &str, phase: f64) {
        self.predictor_phase.with_label_values(&[symbol]).set(phase);
    }

    fn counter(&self, vec: &CounterVec, label: &str) -> f64 {
        vec.with_label_values(&[label]).get()
    }

    pub fn ticks_emitted(&self, symbol: &str) -> f64 {
        self.counter(&self.ticks_emitted_total, symbol)
    }

    pub fn subscribers_pruned(&self, symbol: &str) -> f64 {
        self.counter(&self.subscribers_pruned_total, symbol)
    }

    pub fn symbols_failed(&self, cycle: &str) -> f64 {
        self.counter(&self.symbols_failed_total, cycle)
    }

    pub fn cycles(&self, cycle: &str) -> f64 {
        self.counter(&self.cycles_total, cycle)
    }

    pub fn sentiment_samples(&self, symbol: &str) -> f64 {
        self.counter(&self.sentiment_samples_total, symbol)
    }
}
