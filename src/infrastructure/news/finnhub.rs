use crate::domain::errors::ProviderError;
use crate::domain::ports::NewsProvider;
use crate::infrastructure::http_client_factory::{check_response, combine_headline, malformed};
use async_trait::async_trait;
use chrono::{Duration, Utc};
use reqwest::Client;
use serde::Deserialize;

const FINNHUB_NEWS_URL: &str = "https://finnhub.io/api/v1/company-news";
const PROVIDER: &str = "Finnhub news";
const LOOKBACK_DAYS: i64 = 7;

#[derive(Debug, Deserialize)]
struct CompanyNews {
    headline: Option<String>,
    summary: Option<String>,
}

/// Company news for the past week from Finnhub
pub struct FinnhubNewsProvider {
    client: Client,
    api_key: String,
    url: String,
}

impl FinnhubNewsProvider {
    pub fn new(client: Client, api_key: impl Into<String>) -> Self {
        Self {
            client,
            api_key: api_key.into(),
            url: FINNHUB_NEWS_URL.to_string(),
        }
    }
}

#[async_trait]
impl NewsProvider for FinnhubNewsProvider {
    async fn fetch(&self, symbol: &str, limit: usize) -> Result<Vec<String>, ProviderError> {
        let today = Utc::now().date_naive();
        let from = (today - Duration::days(LOOKBACK_DAYS)).to_string();
        let to = today.to_string();

        let result = self
            .client
            .get(&self.url)
            .query(&[
                ("symbol", symbol),
                ("from", from.as_str()),
                ("to", to.as_str()),
                ("token", self.api_key.as_str()),
            ])
            .send()
            .await;

        let items: Vec<CompanyNews> = check_response(PROVIDER, symbol, result)?
            .json()
            .await
            .map_err(|e| malformed(PROVIDER, symbol, e.to_string()))?;

        Ok(items
            .into_iter()
            .take(limit)
            .filter_map(|n| combine_headline(n.headline.as_deref(), n.summary.as_deref()))
            .collect())
    }

    fn name(&self) -> &str {
        PROVIDER
    }
}
