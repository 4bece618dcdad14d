//! Streaming pipeline configuration: tracked symbols, cycle timing,
//! sentiment windows, predictor tuning and delivery.

use super::{non_empty, parse_or};
use anyhow::{Result, bail};
use std::time::Duration;

const DEFAULT_SYMBOLS: &str = "AAPL,AMZN,MSFT,TSLA";

#[derive(Debug, Clone)]
pub struct StreamEnvConfig {
    pub symbols: Vec<String>,
    pub news_poll_interval: Duration,
    pub price_poll_interval: Duration,
    pub news_fetch_limit: usize,
    pub sentiment_window_secs: i64,
    pub sentiment_retention_secs: i64,
    pub predictor_max_history: usize,
    pub predictor_warmup: usize,
    pub predictor_alpha: f64,
    pub delivery_timeout: Duration,
}

impl StreamEnvConfig {
    pub fn from_lookup<F>(lookup: &F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let raw_symbols =
            non_empty(lookup, "SYMBOLS").unwrap_or_else(|| DEFAULT_SYMBOLS.to_string());
        let config = Self {
            symbols: parse_symbols(&raw_symbols),
            news_poll_interval: Duration::from_secs(parse_or(lookup, "NEWS_POLL_INTERVAL", 60u64)?),
            price_poll_interval: Duration::from_secs(parse_or(
                lookup,
                "PRICE_POLL_INTERVAL",
                60u64,
            )?),
            news_fetch_limit: parse_or(lookup, "NEWS_FETCH_LIMIT", 8usize)?,
            sentiment_window_secs: parse_or(lookup, "SENTIMENT_WINDOW_SECS", 300i64)?,
            sentiment_retention_secs: parse_or(lookup, "SENTIMENT_RETENTION_SECS", 3600i64)?,
            predictor_max_history: parse_or(lookup, "PREDICTOR_MAX_HISTORY", 500usize)?,
            predictor_warmup: parse_or(lookup, "PREDICTOR_WARMUP", 10usize)?,
            predictor_alpha: parse_or(lookup, "PREDICTOR_ALPHA", 0.0001f64)?,
            delivery_timeout: Duration::from_millis(parse_or(lookup, "DELIVERY_TIMEOUT_MS", 5000u64)?),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.symbols.is_empty() {
            bail!("SYMBOLS must name at least one symbol");
        }
        if self.news_poll_interval.is_zero() || self.price_poll_interval.is_zero() {
            bail!("Poll intervals must be greater than zero");
        }
        if self.news_fetch_limit == 0 {
            bail!("NEWS_FETCH_LIMIT must be greater than zero");
        }
        if self.sentiment_window_secs <= 0 || self.sentiment_retention_secs <= 0 {
            bail!("Sentiment window and retention must be greater than zero");
        }
        if self.predictor_warmup == 0 {
            bail!("PREDICTOR_WARMUP must be at least 1");
        }
        if self.predictor_max_history < self.predictor_warmup {
            bail!(
                "PREDICTOR_MAX_HISTORY ({}) must be >= PREDICTOR_WARMUP ({})",
                self.predictor_max_history,
                self.predictor_warmup
            );
        }
        if !self.predictor_alpha.is_finite() || self.predictor_alpha <= 0.0 {
            bail!("PREDICTOR_ALPHA must be positive and finite, got {}", self.predictor_alpha);
        }
        if self.delivery_timeout.is_zero() {
            bail!("DELIVERY_TIMEOUT_MS must be greater than zero");
        }
        Ok(())
    }
}

/// Comma separated, trimmed, upper-cased, de-duplicated in first-seen order.
pub fn parse_symbols(raw: &str) -> Vec<String> {
    let mut symbols: Vec<String> = Vec::new();
    for symbol in raw.split(',').map(|s| s.trim().to_uppercase()) {
        if !symbol.is_empty() && !symbols.contains(&symbol) {
            symbols.push(symbol);
        }
    }
    symbols
}
