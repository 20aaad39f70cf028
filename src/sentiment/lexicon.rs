//! AFINN lexicon polarity scorer

use std::collections::HashMap;

use lazy_static::lazy_static;

use super::SentimentScorer;

// Load AFINN sentiment lexicon at compile time
const AFINN_LEXICON: &str = include_str!("../../data/afinn.txt");

lazy_static! {
    /// AFINN sentiment scores (-5 to +5)
    static ref AFINN_SCORES: HashMap<String, i8> = {
        let mut map = HashMap::new();
        for line in AFINN_LEXICON.lines() {
            if let Some((word, score_str)) = line.split_once('\t') {
                if let Ok(score) = score_str.trim().parse::<i8>() {
                    map.insert(word.to_lowercase(), score);
                }
            }
        }
        map
    };
}

/// Raw lexicon valence of a single lowercase word, if listed.
pub(crate) fn word_valence(word: &str) -> Option<f64> {
    AFINN_SCORES.get(word).map(|&score| f64::from(score))
}

/// Lexicon-based polarity: the mean AFINN score of the scored tokens,
/// rescaled from [-5, 5] into [-1, 1]. Tokens absent from the lexicon do
/// not dilute the mean; a post with no scored tokens is 0.0.
pub struct LexiconScorer;

impl SentimentScorer for LexiconScorer {
    fn name(&self) -> &'static str {
        "afinn-polarity"
    }

    fn score(&self, _raw_text: &str, tokens: &[String]) -> f64 {
        let scored: Vec<f64> = tokens
            .iter()
            .filter_map(|token| word_valence(token))
            .map(|valence| valence / 5.0)
            .collect();

        if scored.is_empty() {
            0.0
        } else {
            scored.iter().sum::<f64>() / scored.len() as f64
        }
    }
}
