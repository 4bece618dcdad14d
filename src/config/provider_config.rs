//! Data provider credentials and HTTP settings.

use super::{non_empty, parse_or};
use anyhow::{Result, bail};
use std::time::Duration;

/// A provider whose key is missing is left out of its fallback chain.
#[derive(Debug, Clone)]
pub struct ProviderEnvConfig {
    pub newsapi_key: Option<String>,
    pub finnhub_key: Option<String>,
    pub alphavantage_key: Option<String>,
    pub http_timeout: Duration,
}

impl ProviderEnvConfig {
    pub fn from_lookup<F>(lookup: &F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let timeout_secs = parse_or(lookup, "HTTP_TIMEOUT_SECS", 20u64)?;
        if timeout_secs == 0 {
            bail!("HTTP_TIMEOUT_SECS must be greater than zero");
        }

        Ok(Self {
            newsapi_key: non_empty(lookup, "NEWSAPI_KEY"),
            finnhub_key: non_empty(lookup, "FINNHUB_KEY"),
            alphavantage_key: non_empty(lookup, "ALPHAVANTAGE_KEY"),
            http_timeout: Duration::from_secs(timeout_secs),
        })
    }
}
