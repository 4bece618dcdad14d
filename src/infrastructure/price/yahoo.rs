use crate::domain::errors::ProviderError;
use crate::domain::ports::{PriceChangeProvider, PriceProvider};
use crate::infrastructure::http_client_factory::{check_response, malformed};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

const YAHOO_CHART_URL: &str = "https://query1.finance.yahoo.com/v8/finance/chart";
const PROVIDER: &str = "Yahoo chart";

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: Chart,
}

#[derive(Debug, Deserialize)]
struct Chart {
    result: Option<Vec<ChartResult>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    meta: ChartMeta,
    indicators: Option<Indicators>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChartMeta {
    regular_market_price: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    #[serde(default)]
    quote: Vec<QuoteSeries>,
}

#[derive(Debug, Deserialize)]
struct QuoteSeries {
    #[serde(default)]
    close: Vec<Option<f64>>,
}

/// Keyless intraday chart; serves both the price and the 1-minute change chain.
pub struct YahooChartProvider {
    client: Client,
    url: String,
}

impl YahooChartProvider {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            url: YAHOO_CHART_URL.to_string(),
        }
    }

    async fn chart(&self, symbol: &str) -> Result<ChartResult, ProviderError> {
        let result = self
            .client
            .get(format!("{}/{}", self.url, symbol))
            .query(&[("interval", "1m"), ("range", "1d")])
            .send()
            .await;

        let body: ChartResponse = check_response(PROVIDER, symbol, result)?
            .json()
            .await
            .map_err(|e| malformed(PROVIDER, symbol, e.to_string()))?;

        first_result(symbol, body)
    }
}

fn first_result(symbol: &str, body: ChartResponse) -> Result<ChartResult, ProviderError> {
    if let Some(err) = body.chart.error {
        let reason = err.description.unwrap_or_else(|| "unknown error".to_string());
        return Err(malformed(PROVIDER, symbol, reason));
    }
    body.chart
        .result
        .and_then(|r| r.into_iter().next())
        .ok_or_else(|| malformed(PROVIDER, symbol, "empty chart result"))
}

/// Change between the last two non-null closes
fn change_from_closes(closes: &[Option<f64>]) -> Option<f64> {
    let mut valid = closes.iter().rev().filter_map(|c| *c);
    let last = valid.next()?;
    let prev = valid.next()?;
    if prev == 0.0 {
        return None;
    }
    Some((last - prev) / prev)
}

#[async_trait]
impl PriceProvider for YahooChartProvider {
    async fn fetch_price(&self, symbol: &str) -> Result<Option<f64>, ProviderError> {
        Ok(self.chart(symbol).await?.meta.regular_market_price)
    }

    fn name(&self) -> &str {
        PROVIDER
    }
}

#[async_trait]
impl PriceChangeProvider for YahooChartProvider {
    async fn fetch_change_1m(&self, symbol: &str) -> Result<Option<f64>, ProviderError> {
        let chart = self.chart(symbol).await?;
        Ok(chart
            .indicators
            .and_then(|i| i.quote.into_iter().next())
            .and_then(|q| change_from_closes(&q.close)))
    }

    fn name(&self) -> &str {
        PROVIDER
    }
}
