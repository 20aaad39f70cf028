//! Dual sentiment scoring
//!
//! Two independent strategies behind one [`SentimentScorer`] trait: a
//! lexicon polarity scorer over the cleaned token stream, and a
//! valence-aware scorer that reads intensifiers, negation and punctuation
//! off the lesser-normalized text. Either can be swapped without touching
//! the aggregator or the correlation engine.

mod lexicon;
mod valence;

pub use lexicon::LexiconScorer;
pub use valence::ValenceScorer;

use serde::{Deserialize, Serialize};

use crate::models::SentimentLabel;

/// A pluggable sentiment scoring strategy.
///
/// Implementations must be pure: same input, same score, no state carried
/// across calls. Scores are bounded to [-1, 1] and empty input scores 0.0.
pub trait SentimentScorer: Send + Sync {
    fn name(&self) -> &'static str;

    /// Score a post. `raw_text` is the original text (for methods that need
    /// punctuation/casing cues), `tokens` the normalized token stream.
    fn score(&self, raw_text: &str, tokens: &[String]) -> f64;
}

/// Compound-score cutoffs for the thresholded sentiment label.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LabelThresholds {
    pub positive: f64,
    pub negative: f64,
}

impl Default for LabelThresholds {
    fn default() -> Self {
        Self {
            positive: 0.05,
            negative: -0.05,
        }
    }
}

impl LabelThresholds {
    pub fn label(&self, compound: f64) -> SentimentLabel {
        if compound >= self.positive {
            SentimentLabel::Positive
        } else if compound <= self.negative {
            SentimentLabel::Negative
        } else {
            SentimentLabel::Neutral
        }
    }
}

/// Scores produced for one post.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SentimentScores {
    pub polarity: f64,
    pub compound: f64,
    pub label: SentimentLabel,
}

/// Combines the two scoring strategies and derives the label from the
/// compound score.
pub struct DualScorer {
    polarity: Box<dyn SentimentScorer>,
    compound: Box<dyn SentimentScorer>,
    thresholds: LabelThresholds,
}

impl DualScorer {
    /// Default pairing: AFINN polarity + valence-aware compound.
    pub fn new(thresholds: LabelThresholds) -> Self {
        Self::with_scorers(
            Box::new(LexiconScorer),
            Box::new(ValenceScorer),
            thresholds,
        )
    }

    pub fn with_scorers(
        polarity: Box<dyn SentimentScorer>,
        compound: Box<dyn SentimentScorer>,
        thresholds: LabelThresholds,
    ) -> Self {
        Self {
            polarity,
            compound,
            thresholds,
        }
    }

    pub fn thresholds(&self) -> LabelThresholds {
        self.thresholds
    }

    pub fn score(&self, raw_text: &str, tokens: &[String]) -> SentimentScores {
        let polarity = self.polarity.score(raw_text, tokens);
        let compound = self.compound.score(raw_text, tokens);
        SentimentScores {
            polarity,
            compound,
            label: self.thresholds.label(compound),
        }
    }
}

impl Default for DualScorer {
    fn default() -> Self {
        Self::new(LabelThresholds::default())
    }
}
