use crate::domain::errors::ProviderError;
use crate::domain::ports::PriceProvider;
use crate::infrastructure::http_client_factory::{check_response, malformed};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

const FINNHUB_QUOTE_URL: &str = "https://finnhub.io/api/v1/quote";
const PROVIDER: &str = "Finnhub quote";

#[derive(Debug, Deserialize)]
struct Quote {
    /// Current price; Finnhub reports 0 for unknown symbols
    c: Option<f64>,
}

pub struct FinnhubQuoteProvider {
    client: Client,
    api_key: String,
    url: String,
}

impl FinnhubQuoteProvider {
    pub fn new(client: Client, api_key: impl Into<String>) -> Self {
        Self {
            client,
            api_key: api_key.into(),
            url: FINNHUB_QUOTE_URL.to_string(),
        }
    }
}

#[async_trait]
impl PriceProvider for FinnhubQuoteProvider {
    async fn fetch_price(&self, symbol: &str) -> Result<Option<f64>, ProviderError> {
        let result = self
            .client
            .get(&self.url)
            .query(&[("symbol", symbol), ("token", self.api_key.as_str())])
            .send()
            .await;

        let quote: Quote = check_response(PROVIDER, symbol, result)?
            .json()
            .await
            .map_err(|e| malformed(PROVIDER, symbol, e.to_string()))?;

        Ok(quote.c)
    }

    fn name(&self) -> &str {
        PROVIDER
    }
}
