pub mod alpha_vantage;
pub mod finnhub;
pub mod mock;
pub mod yahoo;

pub use alpha_vantage::AlphaVantageIntradayProvider;
pub use finnhub::FinnhubQuoteProvider;
pub use mock::MockPriceFeed;
pub use yahoo::YahooChartProvider;
