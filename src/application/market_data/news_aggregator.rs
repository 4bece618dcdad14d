use crate::application::streaming::scheduler::Clock;
use crate::domain::errors::ScoringError;
use crate::domain::ports::NewsProvider;
use crate::domain::sentiment::{SentimentSample, SentimentScorer, clean_text};
use std::sync::Arc;
use tracing::{debug, warn};

/// Fetches headlines through an ordered provider chain and scores them.
pub struct NewsAggregator {
    providers: Vec<Arc<dyn NewsProvider>>,
    scorer: Arc<dyn SentimentScorer>,
    clock: Arc<dyn Clock>,
}

impl NewsAggregator {
    pub fn new(
        providers: Vec<Arc<dyn NewsProvider>>,
        scorer: Arc<dyn SentimentScorer>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            providers,
            scorer,
            clock,
        }
    }

    pub fn provider_names(&self) -> Vec<String> {
        self.providers.iter().map(|p| p.name().to_string()).collect()
    }

    /// First non-empty result in provider order; empty when every provider
    /// fails or has nothing.
    pub async fn fetch_texts(&self, symbol: &str, limit: usize) -> Vec<String> {
        for provider in &self.providers {
            match provider.fetch(symbol, limit).await {
                Ok(mut texts) if !texts.is_empty() => {
                    texts.truncate(limit);
                    debug!("{} returned {} texts for {}", provider.name(), texts.len(), symbol);
                    return texts;
                }
                Ok(_) => debug!("{} had no news for {}", provider.name(), symbol),
                Err(e) => warn!("News fetch via {} failed: {}", provider.name(), e),
            }
        }
        Vec::new()
    }

    /// Fetches, cleans and scores the latest texts, converting each result to
    /// a scalar sample stamped with the scoring time.
    pub async fn score_latest(
        &self,
        symbol: &str,
        limit: usize,
    ) -> Result<Vec<SentimentSample>, ScoringError> {
        let texts: Vec<String> = self
            .fetch_texts(symbol, limit)
            .await
            .iter()
            .map(|t| clean_text(t))
            .filter(|t| !t.is_empty())
            .collect();

        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let scored = self.scorer.score(&texts).await?;
        if scored.len() != texts.len() {
            return Err(ScoringError::CountMismatch {
                expected: texts.len(),
                actual: scored.len(),
            });
        }

        let timestamp = self.clock.now();
        let samples = scored
            .iter()
            .filter_map(|s| {
                let value = s.to_scalar();
                if value.is_finite() {
                    Some(SentimentSample::new(timestamp, value))
                } else {
                    warn!("Dropping non-finite sentiment scalar for {}", symbol);
                    None
                }
            })
            .collect();
        Ok(samples)
    }
}
