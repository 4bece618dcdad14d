use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Snapshot pushed to subscribers once per price cycle per symbol.
///
/// Undefined price, change or prediction serialize as `null`; an undefined
/// sentiment average is reported as `0.0`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tick {
    pub symbol: String,
    pub timestamp: DateTime<Utc>,
    pub price: Option<f64>,
    pub change_1m: Option<f64>,
    pub sentiment_avg_5m: f64,
    pub pred_up_prob: Option<f64>,
}

impl Tick {
    pub fn new(
        symbol: impl Into<String>,
        timestamp: DateTime<Utc>,
        price: Option<f64>,
        change_1m: Option<f64>,
        sentiment_avg: Option<f64>,
        pred_up_prob: Option<f64>,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            timestamp,
            price,
            change_1m,
            sentiment_avg_5m: sentiment_avg.unwrap_or(0.0),
            pred_up_prob,
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}
