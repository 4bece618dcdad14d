use crate::domain::ports::{PriceChangeProvider, PriceProvider};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, warn};

/// Result of one price poll. Each field is independently optional.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PriceObservation {
    pub price: Option<f64>,
    pub change_1m: Option<f64>,
}

/// Queries price and 1-minute change through separate provider chains,
/// substituting the last good price when every live source fails.
pub struct PriceAggregator {
    price_providers: Vec<Arc<dyn PriceProvider>>,
    change_providers: Vec<Arc<dyn PriceChangeProvider>>,
    last_price: RwLock<HashMap<String, f64>>,
}

impl PriceAggregator {
    pub fn new(
        price_providers: Vec<Arc<dyn PriceProvider>>,
        change_providers: Vec<Arc<dyn PriceChangeProvider>>,
    ) -> Self {
        Self {
            price_providers,
            change_providers,
            last_price: RwLock::new(HashMap::new()),
        }
    }

    /// Price and change fetched concurrently
    pub async fn observe(&self, symbol: &str) -> PriceObservation {
        let (price, change_1m) = tokio::join!(self.fetch_price(symbol), self.fetch_change_1m(symbol));
        PriceObservation { price, change_1m }
    }

    /// First positive live price, else the last one seen for this symbol.
    pub async fn fetch_price(&self, symbol: &str) -> Option<f64> {
        for provider in &self.price_providers {
            match provider.fetch_price(symbol).await {
                Ok(Some(price)) if price.is_finite() && price > 0.0 => {
                    self.last_price
                        .write()
                        .await
                        .insert(symbol.to_string(), price);
                    return Some(price);
                }
                Ok(Some(price)) => {
                    debug!("{} gave unusable price {} for {}", provider.name(), price, symbol)
                }
                Ok(None) => debug!("{} has no price for {}", provider.name(), symbol),
                Err(e) => warn!("Price fetch via {} failed: {}", provider.name(), e),
            }
        }

        let fallback = self.last_known_price(symbol).await;
        if fallback.is_some() {
            debug!("Using last known price for {}", symbol);
        }
        fallback
    }

    pub async fn fetch_change_1m(&self, symbol: &str) -> Option<f64> {
        for provider in &self.change_providers {
            match provider.fetch_change_1m(symbol).await {
                Ok(Some(change)) if change.is_finite() => return Some(change),
                Ok(_) => debug!("{} has no 1m change for {}", provider.name(), symbol),
                Err(e) => warn!("1m change fetch via {} failed: {}", provider.name(), e),
            }
        }
        None
    }

    pub async fn last_known_price(&self, symbol: &str) -> Option<f64> {
        self.last_price.read().await.get(symbol).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::errors::ProviderError;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Replays a queue of responses; `None` entries become provider errors.
    struct Replay {
        name: &'static str,
        responses: Mutex<Vec<Option<Option<f64>>>>,
    }

    impl Replay {
        fn new(name: &'static str, mut responses: Vec<Option<Option<f64>>>) -> Arc<Self> {
            responses.reverse();
            Arc::new(Self {
                name,
                responses: Mutex::new(responses),
            })
        }

        fn next(&self, symbol: &str) -> Result<Option<f64>, ProviderError> {
            match self.responses.lock().unwrap().pop().flatten() {
                Some(v) => Ok(v),
                None => Err(ProviderError::Request {
                    provider: self.name.to_string(),
                    symbol: symbol.to_string(),
                    reason: "timeout".to_string(),
                }),
            }
        }
    }

    #[async_trait]
    impl PriceProvider for Replay {
        async fn fetch_price(&self, symbol: &str) -> Result<Option<f64>, ProviderError> {
            self.next(symbol)
        }

        fn name(&self) -> &str {
            self.name
        }
    }

    #[async_trait]
    impl PriceChangeProvider for Replay {
        async fn fetch_change_1m(&self, symbol: &str) -> Result<Option<f64>, ProviderError> {
            self.next(symbol)
        }

        fn name(&self) -> &str {
            self.name
        }
    }

    #[tokio::test]
    async fn test_falls_back_to_last_known_price() {
        let quotes = Replay::new("quotes", vec![Some(Some(101.5)), None, Some(Some(0.0))]);
        let agg = PriceAggregator::new(vec![quotes], vec![]);

        assert_eq!(agg.fetch_price("AAPL").await, Some(101.5));
        // provider error
        assert_eq!(agg.fetch_price("AAPL").await, Some(101.5));
        // non-positive quote
        assert_eq!(agg.fetch_price("AAPL").await, Some(101.5));
        assert_eq!(agg.fetch_price("MSFT").await, None);
    }

    #[tokio::test]
    async fn test_price_chain_order() {
        let primary = Replay::new("primary", vec![None]);
        let secondary = Replay::new("secondary", vec![Some(Some(42.0))]);
        let agg = PriceAggregator::new(vec![primary, secondary], vec![]);

        assert_eq!(agg.fetch_price("TSLA").await, Some(42.0));
        assert_eq!(agg.last_known_price("TSLA").await, Some(42.0));
    }

    #[tokio::test]
    async fn test_change_has_no_stale_fallback() {
        let changes = Replay::new("changes", vec![Some(Some(0.002)), None]);
        let agg = PriceAggregator::new(vec![], vec![changes]);

        assert_eq!(agg.fetch_change_1m("AAPL").await, Some(0.002));
        assert_eq!(agg.fetch_change_1m("AAPL").await, None);
    }

    #[tokio::test]
    async fn test_observe_fields_are_independent() {
        let quotes = Replay::new("quotes", vec![Some(Some(150.0))]);
        let changes = Replay::new("changes", vec![None]);
        let agg = PriceAggregator::new(vec![quotes], vec![changes]);

        let obs = agg.observe("AAPL").await;
        assert_eq!(
            obs,
            PriceObservation {
                price: Some(150.0),
                change_1m: None
            }
        );
    }
}
