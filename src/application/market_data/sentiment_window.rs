use crate::domain::sentiment::SentimentSample;
use chrono::{DateTime, Duration, Utc};
use std::collections::VecDeque;

pub const DEFAULT_RETENTION_SECS: i64 = 3600;
pub const DEFAULT_AVERAGE_WINDOW_SECS: i64 = 300;

/// Time-ordered buffer of sentiment samples for one symbol.
///
/// Eviction runs once per appended batch; averaging never mutates.
#[derive(Debug, Clone)]
pub struct RollingSentimentWindow {
    samples: VecDeque<SentimentSample>,
    retention: Duration,
}

impl RollingSentimentWindow {
    pub fn new() -> Self {
        Self::with_retention(Duration::seconds(DEFAULT_RETENTION_SECS))
    }

    pub fn with_retention(retention: Duration) -> Self {
        Self {
            samples: VecDeque::new(),
            retention,
        }
    }

    pub fn append(&mut self, sample: SentimentSample, now: DateTime<Utc>) {
        self.insert_ordered(sample);
        self.evict(now);
    }

    /// Inserts a batch, then evicts everything older than the retention horizon.
    pub fn append_batch<I>(&mut self, samples: I, now: DateTime<Utc>)
    where
        I: IntoIterator<Item = SentimentSample>,
    {
        for sample in samples {
            self.insert_ordered(sample);
        }
        self.evict(now);
    }

    /// Mean of samples stamped within `window_secs` of `now`, or `None` when
    /// no sample qualifies.
    pub fn average(&self, now: DateTime<Utc>, window_secs: i64) -> Option<f64> {
        let window = Duration::seconds(window_secs);
        let (sum, count) = self
            .samples
            .iter()
            .filter(|s| now - s.timestamp <= window)
            .fold((0.0, 0usize), |(sum, count), s| (sum + s.value, count + 1));

        if count == 0 {
            None
        } else {
            Some(sum / count as f64)
        }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn latest(&self) -> Option<&SentimentSample> {
        self.samples.back()
    }

    fn insert_ordered(&mut self, sample: SentimentSample) {
        match self.samples.back() {
            Some(last) if last.timestamp > sample.timestamp => {
                let idx = self
                    .samples
                    .partition_point(|s| s.timestamp <= sample.timestamp);
                self.samples.insert(idx, sample);
            }
            _ => self.samples.push_back(sample),
        }
    }

    fn evict(&mut self, now: DateTime<Utc>) {
        let cutoff = now - self.retention;
        while self
            .samples
            .front()
            .is_some_and(|s| s.timestamp < cutoff)
        {
            self.samples.pop_front();
        }
    }
}

impl Default for RollingSentimentWindow {
    fn default() -> Self {
        Self::new()
    }
}
