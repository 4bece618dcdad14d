use crate::domain::errors::ProviderError;
use crate::domain::ports::PriceChangeProvider;
use crate::infrastructure::http_client_factory::{check_response, malformed};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::collections::BTreeMap;

const ALPHA_VANTAGE_URL: &str = "https://www.alphavantage.co/query";
const PROVIDER: &str = "Alpha Vantage";

#[derive(Debug, Deserialize)]
struct IntradayResponse {
    #[serde(rename = "Time Series (1min)")]
    series: Option<BTreeMap<String, IntradayBar>>,
    #[serde(rename = "Note")]
    note: Option<String>,
    #[serde(rename = "Information")]
    information: Option<String>,
    #[serde(rename = "Error Message")]
    error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct IntradayBar {
    #[serde(rename = "4. close")]
    close: String,
}

/// 1-minute change from the two most recent intraday closes
pub struct AlphaVantageIntradayProvider {
    client: Client,
    api_key: String,
    url: String,
}

impl AlphaVantageIntradayProvider {
    pub fn new(client: Client, api_key: impl Into<String>) -> Self {
        Self {
            client,
            api_key: api_key.into(),
            url: ALPHA_VANTAGE_URL.to_string(),
        }
    }
}

/// `(last - prev) / prev` over the two latest bars; timestamps sort lexically.
fn change_from_series(
    symbol: &str,
    series: &BTreeMap<String, IntradayBar>,
) -> Result<Option<f64>, ProviderError> {
    let mut latest = series.values().rev();
    let (Some(last), Some(prev)) = (latest.next(), latest.next()) else {
        return Ok(None);
    };

    let parse = |bar: &IntradayBar| {
        bar.close
            .trim()
            .parse::<f64>()
            .map_err(|e| malformed(PROVIDER, symbol, format!("bad close '{}': {}", bar.close, e)))
    };
    let (last, prev) = (parse(last)?, parse(prev)?);

    if prev == 0.0 {
        return Ok(None);
    }
    Ok(Some((last - prev) / prev))
}

#[async_trait]
impl PriceChangeProvider for AlphaVantageIntradayProvider {
    async fn fetch_change_1m(&self, symbol: &str) -> Result<Option<f64>, ProviderError> {
        let result = self
            .client
            .get(&self.url)
            .query(&[
                ("function", "TIME_SERIES_INTRADAY"),
                ("symbol", symbol),
                ("interval", "1min"),
                ("outputsize", "compact"),
                ("apikey", self.api_key.as_str()),
            ])
            .send()
            .await;

        let body: IntradayResponse = check_response(PROVIDER, symbol, result)?
            .json()
            .await
            .map_err(|e| malformed(PROVIDER, symbol, e.to_string()))?;

        if let Some(message) = body.note.or(body.information) {
            return Err(ProviderError::RateLimited {
                provider: PROVIDER.to_string(),
                message,
            });
        }
        if let Some(message) = body.error_message {
            return Err(malformed(PROVIDER, symbol, message));
        }

        match body.series {
            Some(series) => change_from_series(symbol, &series),
            None => Ok(None),
        }
    }

    fn name(&self) -> &str {
        PROVIDER
    }
}
