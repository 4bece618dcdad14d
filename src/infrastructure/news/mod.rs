pub mod finnhub;
pub mod mock_news;
pub mod newsapi;
pub mod rss;

pub use finnhub::FinnhubNewsProvider;
pub use mock_news::MockNewsProvider;
pub use newsapi::NewsApiProvider;
pub use rss::RssNewsProvider;
