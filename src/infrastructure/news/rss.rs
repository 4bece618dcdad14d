use crate::domain::errors::ProviderError;
use crate::domain::ports::NewsProvider;
use crate::infrastructure::http_client_factory::{
    check_response, combine_headline, malformed, request_error,
};
use async_trait::async_trait;
use reqwest::Client;
use rss::Channel;
use std::io::Cursor;
use tracing::debug;

const YAHOO_HEADLINE_FEED: &str = "https://feeds.finance.yahoo.com/rss/2.0/headline";
const PROVIDER: &str = "Yahoo RSS";

/// Keyless per-symbol headline feed. Last resort in the news chain.
pub struct RssNewsProvider {
    client: Client,
    feed_url: String,
}

impl RssNewsProvider {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            feed_url: YAHOO_HEADLINE_FEED.to_string(),
        }
    }
}

/// Headline + description of each item, in feed order
pub fn channel_texts(channel: &Channel, limit: usize) -> Vec<String> {
    channel
        .items()
        .iter()
        .filter_map(|item| combine_headline(item.title(), item.description()))
        .take(limit)
        .collect()
}

#[async_trait]
impl NewsProvider for RssNewsProvider {
    async fn fetch(&self, symbol: &str, limit: usize) -> Result<Vec<String>, ProviderError> {
        let result = self
            .client
            .get(&self.feed_url)
            .query(&[("s", symbol), ("region", "US"), ("lang", "en-US")])
            .send()
            .await;

        let bytes = check_response(PROVIDER, symbol, result)?
            .bytes()
            .await
            .map_err(|e| request_error(PROVIDER, symbol, e))?;

        let channel = Channel::read_from(Cursor::new(bytes))
            .map_err(|e| malformed(PROVIDER, symbol, e.to_string()))?;

        let texts = channel_texts(&channel, limit);
        debug!("RSS feed '{}' gave {} items for {}", channel.title(), texts.len(), symbol);
        Ok(texts)
    }

    fn name(&self) -> &str {
        PROVIDER
    }
}
