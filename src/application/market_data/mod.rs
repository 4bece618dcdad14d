pub mod news_aggregator;
pub mod price_aggregator;
pub mod sentiment_window;
