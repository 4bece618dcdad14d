//! Local lexicon-based headline scorer.
//!
//! VADER's `pos`/`neu`/`neg` proportions become the class probabilities.
//! Equity-market jargon that the general lexicon misses moves part of the
//! neutral mass towards the positive or negative class.

use crate::domain::errors::ScoringError;
use crate::domain::sentiment::{NEGATIVE, NEUTRAL, POSITIVE, ScoredText, SentimentScorer};
use async_trait::async_trait;
use std::collections::HashMap;
use vader_sentiment::SentimentIntensityAnalyzer;

const BULLISH_KEYWORDS: &[(&str, f64)] = &[
    ("surge", 0.4),
    ("surges", 0.4),
    ("rally", 0.4),
    ("rallies", 0.4),
    ("soar", 0.5),
    ("soars", 0.5),
    ("jumps", 0.3),
    ("bullish", 0.5),
    ("all-time high", 0.5),
    ("record high", 0.4),
    ("beats estimates", 0.4),
    ("beat expectations", 0.4),
    ("raises guidance", 0.4),
    ("upgrade", 0.3),
    ("buyback", 0.3),
    ("outperform", 0.3),
    ("breakout", 0.3),
    ("partnership", 0.2),
];

const BEARISH_KEYWORDS: &[(&str, f64)] = &[
    ("crash", -0.5),
    ("crashes", -0.5),
    ("plunge", -0.5),
    ("plunges", -0.5),
    ("slips", -0.3),
    ("tumbles", -0.4),
    ("bearish", -0.5),
    ("downgrade", -0.3),
    ("misses estimates", -0.4),
    ("cuts guidance", -0.4),
    ("lawsuit", -0.4),
    ("probe", -0.3),
    ("recall", -0.3),
    ("layoffs", -0.3),
    ("fraud", -0.5),
    ("sell-off", -0.4),
    ("selloff", -0.4),
    ("bankruptcy", -0.6),
];

/// Fraction of the neutral mass that a saturated keyword boost moves
const BOOST_SHARE: f64 = 0.5;

pub struct VaderSentimentScorer {
    analyzer: SentimentIntensityAnalyzer<'static>,
}

impl VaderSentimentScorer {
    pub fn new() -> Self {
        Self {
            analyzer: SentimentIntensityAnalyzer::new(),
        }
    }

    /// Net keyword boost clamped to [-1, 1]
    fn market_boost(&self, text: &str) -> f64 {
        let lower = text.to_lowercase();
        BULLISH_KEYWORDS
            .iter()
            .chain(BEARISH_KEYWORDS)
            .filter(|(keyword, _)| lower.contains(keyword))
            .map(|(_, score)| score)
            .sum::<f64>()
            .clamp(-1.0, 1.0)
    }

    pub fn score_text(&self, text: &str) -> Result<ScoredText, ScoringError> {
        if text.trim().is_empty() {
            return Ok(ScoredText::new(
                NEUTRAL,
                HashMap::from([(NEUTRAL.to_string(), 1.0)]),
            ));
        }

        let scores = self.analyzer.polarity_scores(text);
        let proportion = |key: &str| {
            scores.get(key).copied().ok_or_else(|| ScoringError::Backend {
                reason: format!("VADER result has no '{}' proportion", key),
            })
        };
        let (mut pos, mut neu, mut neg) = (
            proportion("pos")?,
            proportion("neu")?,
            proportion("neg")?,
        );

        let total = pos + neu + neg;
        if total > 0.0 {
            pos /= total;
            neu /= total;
            neg /= total;
        } else {
            neu = 1.0;
        }

        let boost = self.market_boost(text);
        let shifted = neu * BOOST_SHARE * boost.abs();
        neu -= shifted;
        if boost > 0.0 {
            pos += shifted;
        } else {
            neg += shifted;
        }

        let label = [(POSITIVE, pos), (NEGATIVE, neg), (NEUTRAL, neu)]
            .into_iter()
            .fold((NEUTRAL, f64::MIN), |best, candidate| {
                if candidate.1 > best.1 { candidate } else { best }
            })
            .0;

        Ok(ScoredText::new(
            label,
            HashMap::from([
                (POSITIVE.to_string(), pos),
                (NEGATIVE.to_string(), neg),
                (NEUTRAL.to_string(), neu),
            ]),
        ))
    }
}

impl Default for VaderSentimentScorer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SentimentScorer for VaderSentimentScorer {
    async fn score(&self, texts: &[String]) -> Result<Vec<ScoredText>, ScoringError> {
        texts.iter().map(|t| self.score_text(t)).collect()
    }

    fn name(&self) -> &str {
        "VADER"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn probability_sum(scored: &ScoredText) -> f64 {
        scored.class_probabilities.values().sum()
    }

    #[test]
    fn test_bullish_headlines_score_positive() {
        let scorer = VaderSentimentScorer::new();

        for headline in [
            "Shares soar to record high as investors cheer strong results",
            "Analysts upgrade the stock, great growth and bullish outlook",
        ] {
            let scored = scorer.score_text(headline).unwrap();
            assert!(
                scored.to_scalar() > 0.0,
                "Expected positive scalar for '{}', got {}",
                headline,
                scored.to_scalar()
            );
            assert!((probability_sum(&scored) - 1.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_bearish_headlines_score_negative() {
        let scorer = VaderSentimentScorer::new();

        for headline in [
            "Stock crashes after fraud lawsuit, investors panic",
            "Terrible quarter: shares plunge amid bankruptcy fears",
        ] {
            let scored = scorer.score_text(headline).unwrap();
            assert!(
                scored.to_scalar() < 0.0,
                "Expected negative scalar for '{}', got {}",
                headline,
                scored.to_scalar()
            );
            assert_eq!(scored.label, NEGATIVE);
        }
    }

    #[test]
    fn test_keyword_boost_moves_neutral_mass() {
        let scorer = VaderSentimentScorer::new();
        assert_eq!(scorer.market_boost("Quarterly report released"), 0.0);
        assert!(scorer.market_boost("Company announces buyback and raises guidance") > 0.0);
        assert_eq!(scorer.market_boost("crash plunge fraud bankruptcy"), -1.0);
    }

    #[test]
    fn test_empty_text_is_neutral() {
        let scorer = VaderSentimentScorer::new();
        let scored = scorer.score_text("   ").unwrap();
        assert_eq!(scored.label, NEUTRAL);
        assert_eq!(scored.to_scalar(), 0.0);
    }

    #[tokio::test]
    async fn test_batch_preserves_order_and_count() {
        let scorer = VaderSentimentScorer::new();
        let texts = vec![
            "Shares soar to record high".to_string(),
            "Shares plunge after lawsuit".to_string(),
        ];

        let scored = scorer.score(&texts).await.unwrap();
        assert_eq!(scored.len(), 2);
        assert!(scored[0].to_scalar() > scored[1].to_scalar());
    }
}
