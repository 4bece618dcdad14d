use crate::application::market_data::sentiment_window::RollingSentimentWindow;
use anyhow::{Result, bail};
use chrono::Duration;
use std::collections::HashMap;
use tokio::sync::Mutex;

/// Fixed set of tracked symbols and their sentiment windows.
///
/// Each window sits behind its own lock, so the news cycle appending for one
/// symbol never blocks the price cycle reading another.
pub struct SymbolRegistry {
    symbols: Vec<String>,
    windows: HashMap<String, Mutex<RollingSentimentWindow>>,
}

impl SymbolRegistry {
    pub fn new<I, S>(symbols: I, retention: Duration) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut ordered = Vec::new();
        for raw in symbols {
            let symbol = normalize_symbol(raw.as_ref());
            if !symbol.is_empty() && !ordered.contains(&symbol) {
                ordered.push(symbol);
            }
        }

        if ordered.is_empty() {
            bail!("At least one symbol must be tracked");
        }

        let windows = ordered
            .iter()
            .map(|s| {
                (
                    s.clone(),
                    Mutex::new(RollingSentimentWindow::with_retention(retention)),
                )
            })
            .collect();

        Ok(Self {
            symbols: ordered,
            windows,
        })
    }

    pub fn symbols(&self) -> &[String] {
        &self.symbols
    }

    pub fn contains(&self, symbol: &str) -> bool {
        self.windows.contains_key(symbol)
    }

    pub fn window(&self, symbol: &str) -> Option<&Mutex<RollingSentimentWindow>> {
        self.windows.get(symbol)
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}

pub fn normalize_symbol(raw: &str) -> String {
    raw.trim().to_uppercase()
}
