use crate::domain::errors::DeliveryError;
use crate::domain::ports::{Subscriber, SubscriberId};
use crate::domain::tick::Tick;
use futures_util::future::join_all;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{error, info, warn};

pub const DEFAULT_DELIVERY_TIMEOUT: Duration = Duration::from_secs(5);

/// Outcome of one broadcast
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BroadcastReport {
    pub delivered: usize,
    pub pruned: usize,
}

/// Per-symbol subscriber sets with independent fan-out delivery.
pub struct SubscriptionBroadcaster {
    subscribers: RwLock<HashMap<String, Vec<Arc<dyn Subscriber>>>>,
    delivery_timeout: Duration,
}

impl SubscriptionBroadcaster {
    pub fn new(delivery_timeout: Duration) -> Self {
        Self {
            subscribers: RwLock::new(HashMap::new()),
            delivery_timeout,
        }
    }

    pub async fn connect(&self, symbol: &str, subscriber: Arc<dyn Subscriber>) {
        let mut subs = self.subscribers.write().await;
        let list = subs.entry(symbol.to_string()).or_default();
        list.push(subscriber);
        info!("Subscriber connected for {}, total={}", symbol, list.len());
    }

    /// Removes one subscriber by id. Returns false if it was not registered.
    pub async fn disconnect(&self, symbol: &str, id: SubscriberId) -> bool {
        let mut subs = self.subscribers.write().await;
        let Some(list) = subs.get_mut(symbol) else {
            return false;
        };

        let before = list.len();
        list.retain(|s| s.id() != id);
        let removed = list.len() < before;
        if removed {
            info!("Subscriber disconnected for {}, remaining={}", symbol, list.len());
        }
        removed
    }

    pub async fn subscriber_count(&self, symbol: &str) -> usize {
        self.subscribers
            .read()
            .await
            .get(symbol)
            .map_or(0, |list| list.len())
    }

    /// Delivers the tick to every current subscriber of its symbol concurrently,
    /// then prunes the ones that failed.
    pub async fn broadcast(&self, tick: &Tick) -> BroadcastReport {
        let targets: Vec<Arc<dyn Subscriber>> = match self.subscribers.read().await.get(&tick.symbol)
        {
            Some(list) if !list.is_empty() => list.clone(),
            _ => return BroadcastReport::default(),
        };

        let payload = match tick.to_json() {
            Ok(p) => p,
            Err(e) => {
                error!("Failed to serialize tick for {}: {}", tick.symbol, e);
                return BroadcastReport::default();
            }
        };

        let results = join_all(targets.iter().map(|s| self.deliver_one(s.as_ref(), &payload))).await;

        let failed: HashSet<SubscriberId> = targets
            .iter()
            .zip(results)
            .filter_map(|(s, result)| match result {
                Ok(()) => None,
                Err(e) => {
                    warn!("Dropping subscriber for {}: {}", tick.symbol, e);
                    Some(s.id())
                }
            })
            .collect();

        let report = BroadcastReport {
            delivered: targets.len() - failed.len(),
            pruned: failed.len(),
        };

        if !failed.is_empty() {
            let mut subs = self.subscribers.write().await;
            if let Some(list) = subs.get_mut(&tick.symbol) {
                list.retain(|s| !failed.contains(&s.id()));
            }
        }

        report
    }

    async fn deliver_one(&self, subscriber: &dyn Subscriber, payload: &str) -> Result<(), DeliveryError> {
        match tokio::time::timeout(self.delivery_timeout, subscriber.deliver(payload)).await {
            Ok(result) => result,
            Err(_) => Err(DeliveryError::Timeout {
                subscriber: subscriber.id(),
                after_ms: self.delivery_timeout.as_millis() as u64,
            }),
        }
    }
}

impl Default for SubscriptionBroadcaster {
    fn default() -> Self {
        Self::new(DEFAULT_DELIVERY_TIMEOUT)
    }
}
