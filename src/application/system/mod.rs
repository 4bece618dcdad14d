use anyhow::{Context, Result};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::info;

use crate::application::market_data::news_aggregator::NewsAggregator;
use crate::application::market_data::price_aggregator::PriceAggregator;
use crate::application::ml::online_predictor::{OnlinePredictor, PredictorSettings};
use crate::application::ml::predictor::{ClassifierFactory, OnlineClassifier};
use crate::application::ml::sgd_classifier::SgdLogisticRegression;
use crate::application::streaming::broadcaster::SubscriptionBroadcaster;
use crate::application::streaming::orchestrator::{CycleSettings, StreamServices, TickOrchestrator};
use crate::application::streaming::scheduler::{
    ShutdownSignal, ShutdownTrigger, SystemClock, TokioTimer, shutdown_channel,
};
use crate::application::streaming::symbol_registry::SymbolRegistry;
use crate::config::{Config, Mode, ProviderEnvConfig};
use crate::domain::ports::{NewsProvider, PriceChangeProvider, PriceProvider};
use crate::infrastructure::http_client_factory::HttpClientFactory;
use crate::infrastructure::news::{
    FinnhubNewsProvider, MockNewsProvider, NewsApiProvider, RssNewsProvider,
};
use crate::infrastructure::observability::Metrics;
use crate::infrastructure::price::{
    AlphaVantageIntradayProvider, FinnhubQuoteProvider, MockPriceFeed, YahooChartProvider,
};
use crate::infrastructure::sentiment::VaderSentimentScorer;

/// Ordered provider chains for one run mode
struct ProviderChains {
    news: Vec<Arc<dyn NewsProvider>>,
    prices: Vec<Arc<dyn PriceProvider>>,
    changes: Vec<Arc<dyn PriceChangeProvider>>,
}

impl ProviderChains {
    fn mock() -> Self {
        let feed = Arc::new(MockPriceFeed::new());
        Self {
            news: vec![Arc::new(MockNewsProvider::new()) as Arc<dyn NewsProvider>],
            prices: vec![feed.clone() as Arc<dyn PriceProvider>],
            changes: vec![feed as Arc<dyn PriceChangeProvider>],
        }
    }

    /// Keyed providers first, keyless Yahoo sources last.
    fn live(providers: &ProviderEnvConfig) -> Self {
        let client = HttpClientFactory::create_client(providers.http_timeout);
        let yahoo = Arc::new(YahooChartProvider::new(client.clone()));

        let mut news: Vec<Arc<dyn NewsProvider>> = Vec::new();
        let mut prices: Vec<Arc<dyn PriceProvider>> = Vec::new();
        let mut changes: Vec<Arc<dyn PriceChangeProvider>> = Vec::new();

        if let Some(key) = &providers.newsapi_key {
            news.push(Arc::new(NewsApiProvider::new(client.clone(), key.clone())));
        }
        if let Some(key) = &providers.finnhub_key {
            news.push(Arc::new(FinnhubNewsProvider::new(client.clone(), key.clone())));
            prices.push(Arc::new(FinnhubQuoteProvider::new(client.clone(), key.clone())));
        }
        if let Some(key) = &providers.alphavantage_key {
            changes.push(Arc::new(AlphaVantageIntradayProvider::new(client.clone(), key.clone())));
        }
        news.push(Arc::new(RssNewsProvider::new(client)));
        prices.push(yahoo.clone());
        changes.push(yahoo);

        Self {
            news,
            prices,
            changes,
        }
    }
}

pub struct SystemHandle {
    pub registry: Arc<SymbolRegistry>,
    pub broadcaster: Arc<SubscriptionBroadcaster>,
    pub predictor: Arc<OnlinePredictor>,
    pub metrics: Metrics,
    shutdown: ShutdownTrigger,
    cycles: JoinHandle<(u64, u64)>,
}

impl SystemHandle {
    pub fn shutdown_signal(&self) -> ShutdownSignal {
        self.shutdown.signal()
    }

    /// Stops both cycles at their next wait and returns `(news_cycles, price_cycles)`.
    pub async fn shutdown(self) -> Result<(u64, u64)> {
        info!("Shutdown requested, waiting for cycles to stop...");
        self.shutdown.trigger();
        let counts = self.cycles.await.context("Cycle task failed")?;
        info!(
            "Cycles stopped (news: {}, price: {})",
            counts.0, counts.1
        );
        Ok(counts)
    }
}

pub struct Application {
    pub config: Config,
    orchestrator: TickOrchestrator,
}

impl Application {
    pub async fn build(config: Config) -> Result<Self> {
        info!("Building Sentitick Application (Mode: {:?})...", config.mode);
        let stream = &config.stream;

        let metrics = Metrics::new().context("Failed to register metrics")?;

        let chains = match config.mode {
            Mode::Mock => ProviderChains::mock(),
            Mode::Live => ProviderChains::live(&config.providers),
        };

        let clock = Arc::new(SystemClock);
        let news = NewsAggregator::new(chains.news, Arc::new(VaderSentimentScorer::new()), clock.clone());
        info!("News chain: {:?}", news.provider_names());
        let prices = PriceAggregator::new(chains.prices, chains.changes);

        // Validate once so the factory below cannot fail per symbol.
        let template = SgdLogisticRegression::new(stream.predictor_alpha)
            .context("Failed to construct classifier")?;
        let factory: ClassifierFactory =
            Arc::new(move || Box::new(template.clone()) as Box<dyn OnlineClassifier>);
        let predictor = OnlinePredictor::new(
            PredictorSettings {
                max_history: stream.predictor_max_history,
                warmup: stream.predictor_warmup,
            },
            factory,
        );

        let registry = SymbolRegistry::new(
            &stream.symbols,
            chrono::Duration::seconds(stream.sentiment_retention_secs),
        )?;
        info!("Tracking symbols: {:?}", registry.symbols());

        let services = StreamServices {
            registry: Arc::new(registry),
            news: Arc::new(news),
            prices: Arc::new(prices),
            predictor: Arc::new(predictor),
            broadcaster: Arc::new(SubscriptionBroadcaster::new(stream.delivery_timeout)),
            clock,
            metrics,
        };
        let orchestrator = TickOrchestrator::new(
            services,
            CycleSettings {
                news_interval: stream.news_poll_interval,
                price_interval: stream.price_poll_interval,
                news_fetch_limit: stream.news_fetch_limit,
                average_window_secs: stream.sentiment_window_secs,
            },
        );

        Ok(Self {
            config,
            orchestrator,
        })
    }

    pub fn orchestrator(&self) -> &TickOrchestrator {
        &self.orchestrator
    }

    pub async fn start(self) -> Result<SystemHandle> {
        info!("Starting news and price cycles...");
        let (trigger, signal) = shutdown_channel();
        let services = self.orchestrator.services().clone();

        let orchestrator = self.orchestrator;
        let cycles = tokio::spawn(async move { orchestrator.run(Arc::new(TokioTimer), signal).await });

        Ok(SystemHandle {
            registry: services.registry,
            broadcaster: services.broadcaster,
            predictor: services.predictor,
            metrics: services.metrics,
            shutdown: trigger,
            cycles,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn mock_config(extra: &[(&str, &str)]) -> Config {
        let mut env: HashMap<String, String> = HashMap::from([
            ("MODE".to_string(), "mock".to_string()),
            ("SYMBOLS".to_string(), "aapl,tsla".to_string()),
        ]);
        for (k, v) in extra {
            env.insert(k.to_string(), v.to_string());
        }
        Config::from_lookup(|key| env.get(key).cloned()).unwrap()
    }

    #[tokio::test]
    async fn test_build_wires_registry_from_config() {
        let app = Application::build(mock_config(&[])).await.unwrap();
        let services = app.orchestrator().services();

        assert_eq!(services.registry.symbols(), ["AAPL", "TSLA"]);
        assert_eq!(services.news.provider_names(), vec!["Mock news"]);
        assert_eq!(services.predictor.settings().warmup, 10);
    }

    #[tokio::test]
    async fn test_mock_price_cycle_updates_metrics() {
        let app = Application::build(mock_config(&[])).await.unwrap();
        let orchestrator = app.orchestrator();

        let report = orchestrator.run_price_cycle().await;
        assert_eq!(report.ticks.len(), 2);

        let metrics = &orchestrator.services().metrics;
        assert_eq!(metrics.cycles("price"), 1.0);
        assert_eq!(metrics.ticks_emitted("AAPL"), 1.0);
        assert_eq!(metrics.ticks_emitted("TSLA"), 1.0);
        assert!(
            metrics
                .render()
                .contains("sentitick_predictor_phase{symbol=\"AAPL\"} 0")
        );
    }

    #[test]
    fn test_live_chain_orders_keyed_providers_first() {
        let providers = ProviderEnvConfig {
            newsapi_key: None,
            finnhub_key: Some("key".to_string()),
            alphavantage_key: None,
            http_timeout: std::time::Duration::from_secs(5),
        };
        let chains = ProviderChains::live(&providers);

        let news: Vec<&str> = chains.news.iter().map(|p| p.name()).collect();
        assert_eq!(news, vec!["Finnhub news", "Yahoo RSS"]);
        assert_eq!(chains.prices.len(), 2);
        assert_eq!(chains.changes.len(), 1);
    }

    #[tokio::test]
    async fn test_start_and_shutdown_mock_system() {
        let app = Application::build(mock_config(&[("PRICE_POLL_INTERVAL", "3600")]))
            .await
            .unwrap();
        let handle = app.start().await.unwrap();

        let (news_cycles, price_cycles) = handle.shutdown().await.unwrap();
        assert!(news_cycles <= 1);
        assert!(price_cycles <= 1);
    }
}
