pub mod vader_scorer;

pub use vader_scorer::VaderSentimentScorer;
