use crate::domain::errors::ProviderError;
use crate::domain::ports::NewsProvider;
use crate::infrastructure::http_client_factory::{check_response, combine_headline, malformed};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

const NEWSAPI_URL: &str = "https://newsapi.org/v2/everything";
const PROVIDER: &str = "NewsAPI";

#[derive(Debug, Deserialize)]
struct EverythingResponse {
    #[serde(default)]
    articles: Vec<Article>,
}

#[derive(Debug, Deserialize)]
struct Article {
    title: Option<String>,
    description: Option<String>,
}

/// Keyword search over NewsAPI's `everything` endpoint, newest first.
pub struct NewsApiProvider {
    client: Client,
    api_key: String,
    url: String,
}

impl NewsApiProvider {
    pub fn new(client: Client, api_key: impl Into<String>) -> Self {
        Self {
            client,
            api_key: api_key.into(),
            url: NEWSAPI_URL.to_string(),
        }
    }
}

#[async_trait]
impl NewsProvider for NewsApiProvider {
    async fn fetch(&self, symbol: &str, limit: usize) -> Result<Vec<String>, ProviderError> {
        let page_size = limit.to_string();
        let result = self
            .client
            .get(&self.url)
            .header("X-Api-Key", &self.api_key)
            .query(&[
                ("q", symbol),
                ("language", "en"),
                ("pageSize", page_size.as_str()),
                ("sortBy", "publishedAt"),
            ])
            .send()
            .await;

        let body: EverythingResponse = check_response(PROVIDER, symbol, result)?
            .json()
            .await
            .map_err(|e| malformed(PROVIDER, symbol, e.to_string()))?;

        Ok(body
            .articles
            .into_iter()
            .filter_map(|a| combine_headline(a.title.as_deref(), a.description.as_deref()))
            .take(limit)
            .collect())
    }

    fn name(&self) -> &str {
        PROVIDER
    }
}
