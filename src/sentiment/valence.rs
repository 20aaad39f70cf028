//! Valence-aware compound scorer
//!
//! Works on the lesser-normalized text so it can read cues the token stream
//! loses: intensifiers scale the following sentiment word, negation within a
//! three-word lookback flips it, ALL-CAPS words and trailing exclamation
//! marks amplify. The adjusted sum is squashed into [-1, 1].

use super::lexicon::word_valence;
use super::SentimentScorer;
use crate::normalize::{is_mention, is_url};

/// Degree modifiers and the boost they apply to the next sentiment word.
const BOOSTERS: &[(&str, f64)] = &[
    ("absolutely", 0.293),
    ("completely", 0.293),
    ("deeply", 0.293),
    ("extremely", 0.4),
    ("incredibly", 0.4),
    ("really", 0.293),
    ("so", 0.2),
    ("totally", 0.2),
    ("very", 0.293),
    ("barely", -0.4),
    ("hardly", -0.4),
    ("slightly", -0.3),
    ("somewhat", -0.2),
];

/// Negation markers (apostrophes already removed by the word preparation).
const NEGATIONS: &[&str] = &[
    "aint", "arent", "cannot", "cant", "didnt", "doesnt", "dont", "isnt", "neither", "never",
    "no", "nobody", "none", "nothing", "not", "nor", "rarely", "seldom", "wasnt", "without",
    "wont", "wouldnt",
];

/// Scalar applied when a sentiment word sits inside a negation window.
const NEGATION_SCALAR: f64 = -0.74;

/// Per-exclamation-mark amplification, capped at four marks.
const EXCLAMATION_BOOST: f64 = 0.292;

/// Emphasis added to an ALL-CAPS sentiment word in mixed-case text.
const CAPS_EMPHASIS: f64 = 0.733;

/// Normalization constant for squashing the raw sum into [-1, 1].
const NORMALIZATION_ALPHA: f64 = 15.0;

/// Decay of a booster's influence with distance from the scored word.
const DISTANCE_SCALE: [f64; 3] = [1.0, 0.95, 0.9];

struct Cue {
    key: String,
    all_caps: bool,
}

/// Valence-aware compound scorer.
pub struct ValenceScorer;

impl SentimentScorer for ValenceScorer {
    fn name(&self) -> &'static str {
        "valence-compound"
    }

    fn score(&self, raw_text: &str, _tokens: &[String]) -> f64 {
        let cues = prepare(raw_text);
        if cues.is_empty() {
            return 0.0;
        }

        let caps_count = cues.iter().filter(|c| c.all_caps).count();
        let mixed_case = caps_count < cues.len();

        let mut total = 0.0;
        for (i, cue) in cues.iter().enumerate() {
            if is_booster(&cue.key).is_some() || is_negation(&cue.key) {
                continue;
            }
            let Some(mut valence) = word_valence(&cue.key) else {
                continue;
            };

            if cue.all_caps && mixed_case {
                valence += CAPS_EMPHASIS * valence.signum();
            }

            // Lookback window of three words for boosters and negation
            let window_start = i.saturating_sub(3);
            let mut negated = false;
            for (distance, prior) in cues[window_start..i].iter().rev().enumerate() {
                if let Some(boost) = is_booster(&prior.key) {
                    valence += valence.signum() * boost * DISTANCE_SCALE[distance];
                }
                if is_negation(&prior.key) {
                    negated = true;
                }
            }
            if negated {
                valence *= NEGATION_SCALAR;
            }

            total += valence;
        }

        if total != 0.0 {
            let exclamations = raw_text.chars().filter(|&c| c == '!').count().min(4);
            total += total.signum() * (exclamations as f64 * EXCLAMATION_BOOST);
        }

        (total / (total * total + NORMALIZATION_ALPHA).sqrt()).clamp(-1.0, 1.0)
    }
}

fn is_booster(key: &str) -> Option<f64> {
    BOOSTERS
        .iter()
        .find(|(word, _)| *word == key)
        .map(|&(_, boost)| boost)
}

fn is_negation(key: &str) -> bool {
    NEGATIONS.contains(&key)
}

/// Split the raw text into lookup keys, keeping the casing cue per word.
fn prepare(raw_text: &str) -> Vec<Cue> {
    raw_text
        .split_whitespace()
        .filter(|word| !is_url(word) && !is_mention(word))
        .filter_map(|word| {
            let key: String = word
                .chars()
                .filter(|c| c.is_alphanumeric())
                .flat_map(char::to_lowercase)
                .collect();
            if key.chars().any(char::is_alphabetic) {
                let alpha: Vec<char> = word.chars().filter(|c| c.is_alphabetic()).collect();
                let all_caps = alpha.len() > 1 && alpha.iter().all(|c| c.is_uppercase());
                Some(Cue { key, all_caps })
            } else {
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn compound(text: &str) -> f64 {
        ValenceScorer.score(text, &[])
    }

    #[test]
    fn test_empty_is_zero() {
        assert_eq!(compound(""), 0.0);
        assert_eq!(compound("   "), 0.0);
        assert_eq!(compound("12345 !!!"), 0.0);
    }

    #[test]
    fn test_sign_follows_lexicon() {
        assert!(compound("this is wonderful") > 0.0);
        assert!(compound("this is terrible") < 0.0);
    }

    #[test]
    fn test_intensifier_amplifies() {
        assert!(compound("really wonderful") > compound("wonderful"));
        assert!(compound("slightly wonderful") < compound("wonderful"));
    }

    #[test]
    fn test_negation_flips() {
        assert!(compound("not good") < 0.0);
        assert!(compound("never happy again") < 0.0);
        // Apostrophe forms are caught after apostrophe removal
        assert!(compound("don't love this") < 0.0);
    }

    #[test]
    fn test_exclamation_amplifies() {
        assert!(compound("great!!!") > compound("great"));
        assert!(compound("awful!!!") < compound("awful"));
    }

    #[test]
    fn test_caps_emphasis() {
        assert!(compound("this is GREAT news") > compound("this is great news"));
    }

    #[test]
    fn test_bounded() {
        let pos = "amazing wonderful love joy great!!!! ".repeat(20);
        let neg = "terrible awful hate worst miserable!!!! ".repeat(20);
        assert!((-1.0..=1.0).contains(&compound(&pos)));
        assert!((-1.0..=1.0).contains(&compound(&neg)));
        assert!(compound(&pos) > 0.9);
        assert!(compound(&neg) < -0.9);
    }
}
