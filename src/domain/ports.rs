use crate::domain::errors::{DeliveryError, ProviderError};
use async_trait::async_trait;
use uuid::Uuid;

pub type SubscriberId = Uuid;

/// Source of recent headline texts for a symbol
#[async_trait]
pub trait NewsProvider: Send + Sync {
    /// Up to `limit` texts, each already combining headline and summary
    async fn fetch(&self, symbol: &str, limit: usize) -> Result<Vec<String>, ProviderError>;

    fn name(&self) -> &str;
}

/// Source of the current traded price
#[async_trait]
pub trait PriceProvider: Send + Sync {
    async fn fetch_price(&self, symbol: &str) -> Result<Option<f64>, ProviderError>;

    fn name(&self) -> &str;
}

/// Source of the latest 1-minute fractional price change
#[async_trait]
pub trait PriceChangeProvider: Send + Sync {
    async fn fetch_change_1m(&self, symbol: &str) -> Result<Option<f64>, ProviderError>;

    fn name(&self) -> &str;
}

/// A connected tick consumer. Any delivery error means the subscriber is gone.
#[async_trait]
pub trait Subscriber: Send + Sync {
    fn id(&self) -> SubscriberId;

    async fn deliver(&self, payload: &str) -> Result<(), DeliveryError>;
}
