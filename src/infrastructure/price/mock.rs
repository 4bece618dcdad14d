use crate::domain::errors::ProviderError;
use crate::domain::ports::{PriceChangeProvider, PriceProvider};
use async_trait::async_trait;
use rand::Rng;
use std::collections::HashMap;
use std::sync::Mutex;

const START_PRICE: f64 = 100.0;
const MAX_STEP: f64 = 0.004;

#[derive(Debug, Clone, Copy)]
struct Walk {
    price: f64,
    last_change: Option<f64>,
}

/// Random-walk price feed for offline runs.
///
/// Each `fetch_price` moves the walk one step; `fetch_change_1m` reports the
/// fractional size of the most recent step.
pub struct MockPriceFeed {
    walks: Mutex<HashMap<String, Walk>>,
}

impl MockPriceFeed {
    pub fn new() -> Self {
        Self {
            walks: Mutex::new(HashMap::new()),
        }
    }

    fn with_walk<T>(&self, symbol: &str, f: impl FnOnce(&mut Walk) -> T) -> T {
        let mut walks = match self.walks.lock() {
            Ok(w) => w,
            Err(poisoned) => poisoned.into_inner(),
        };
        let walk = walks.entry(symbol.to_string()).or_insert(Walk {
            price: START_PRICE,
            last_change: None,
        });
        f(walk)
    }
}

impl Default for MockPriceFeed {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PriceProvider for MockPriceFeed {
    async fn fetch_price(&self, symbol: &str) -> Result<Option<f64>, ProviderError> {
        let step = rand::rng().random_range(-MAX_STEP..=MAX_STEP);
        let price = self.with_walk(symbol, |walk| {
            walk.price *= 1.0 + step;
            walk.last_change = Some(step);
            walk.price
        });
        Ok(Some(price))
    }

    fn name(&self) -> &str {
        "Mock price"
    }
}

#[async_trait]
impl PriceChangeProvider for MockPriceFeed {
    async fn fetch_change_1m(&self, symbol: &str) -> Result<Option<f64>, ProviderError> {
        Ok(self.with_walk(symbol, |walk| walk.last_change))
    }

    fn name(&self) -> &str {
        "Mock price"
    }
}
