use crate::domain::errors::ProviderError;
use crate::domain::ports::NewsProvider;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

const HEADLINES: &[&str] = &[
    "{} surges after earnings beat expectations",
    "Analysts upgrade {} on strong demand outlook",
    "{} shares steady as markets await inflation data",
    "{} faces lawsuit over alleged patent violations",
    "Regulators open probe into {} business practices",
    "{} announces record buyback and raises guidance",
    "{} stock slips as supply chain concerns mount",
    "{} unveils new product line at annual event",
];

/// Offline headline source rotating through canned stories per symbol
pub struct MockNewsProvider {
    cursors: Mutex<HashMap<String, usize>>,
    batch: usize,
}

impl MockNewsProvider {
    pub fn new() -> Self {
        Self {
            cursors: Mutex::new(HashMap::new()),
            batch: 3,
        }
    }
}

impl Default for MockNewsProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl NewsProvider for MockNewsProvider {
    async fn fetch(&self, symbol: &str, limit: usize) -> Result<Vec<String>, ProviderError> {
        let start = {
            let mut cursors = match self.cursors.lock() {
                Ok(c) => c,
                Err(poisoned) => poisoned.into_inner(),
            };
            let cursor = cursors.entry(symbol.to_string()).or_insert(0);
            let start = *cursor;
            *cursor = (start + self.batch) % HEADLINES.len();
            start
        };

        Ok((0..self.batch.min(limit))
            .map(|i| HEADLINES[(start + i) % HEADLINES.len()].replace("{}", symbol))
            .collect())
    }

    fn name(&self) -> &str {
        "Mock news"
    }
}
