//! Mental-health term dictionary and tagger
//!
//! The default dictionary is embedded at compile time and loaded once per
//! process; it is shared read-only into every tagging call and never mutated
//! during a run.

use std::str::FromStr;

use lazy_static::lazy_static;

use crate::models::{Term, TermCategory, ValenceHint};
use crate::normalize::joined;

// Load the default term dictionary at compile time (term, category, valence)
const TERM_DICTIONARY_TSV: &str = include_str!("../data/terms.tsv");

lazy_static! {
    static ref DEFAULT_DICTIONARY: TermDictionary =
        TermDictionary::parse_tsv(TERM_DICTIONARY_TSV);
}

/// Immutable term dictionary.
#[derive(Debug, Clone)]
pub struct TermDictionary {
    terms: Vec<Term>,
}

impl TermDictionary {
    /// Build a dictionary from explicit entries. Term text is lowercased and
    /// whitespace-normalized; duplicates collapse to the first entry.
    pub fn new(terms: Vec<Term>) -> Self {
        let mut normalized: Vec<Term> = Vec::with_capacity(terms.len());
        for mut term in terms {
            term.text = term
                .text
                .to_lowercase()
                .split_whitespace()
                .collect::<Vec<_>>()
                .join(" ");
            if !term.text.is_empty() && !normalized.iter().any(|t| t.text == term.text) {
                normalized.push(term);
            }
        }
        normalized.sort_by(|a, b| a.text.cmp(&b.text));
        Self { terms: normalized }
    }

    /// Parse a TSV dictionary (`term<TAB>category<TAB>valence` per line).
    /// Malformed lines are skipped.
    pub fn parse_tsv(source: &str) -> Self {
        let terms = source
            .lines()
            .filter_map(|line| {
                let mut fields = line.split('\t');
                let text = fields.next()?.trim();
                let category = TermCategory::from_str(fields.next()?).ok()?;
                let valence_hint = ValenceHint::from_str(fields.next()?).ok()?;
                if text.is_empty() {
                    return None;
                }
                Some(Term {
                    text: text.to_string(),
                    category,
                    valence_hint,
                })
            })
            .collect();
        Self::new(terms)
    }

    /// The process-wide default dictionary.
    pub fn default_dictionary() -> &'static TermDictionary {
        &DEFAULT_DICTIONARY
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Term> {
        self.terms.iter()
    }

    pub fn get(&self, term_text: &str) -> Option<&Term> {
        let lookup = term_text.to_lowercase();
        self.terms.iter().find(|t| t.text == lookup)
    }

    /// Tag a normalized token stream with every matching dictionary term.
    ///
    /// Single-word terms match by token equality; multi-word terms by
    /// whitespace-normalized containment with word boundaries. Overlapping
    /// matches are all recorded: term co-occurrence is signal, not noise.
    pub fn tag(&self, tokens: &[String]) -> Vec<&Term> {
        if tokens.is_empty() {
            return Vec::new();
        }
        let padded = format!(" {} ", joined(tokens));

        self.terms
            .iter()
            .filter(|term| {
                if term.text.contains(' ') {
                    padded.contains(&format!(" {} ", term.text))
                } else {
                    tokens.iter().any(|token| *token == term.text)
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::normalize;

    fn tag_texts(dictionary: &TermDictionary, text: &str) -> Vec<String> {
        dictionary
            .tag(&normalize(text))
            .into_iter()
            .map(|t| t.text.clone())
            .collect()
    }

    #[test]
    fn test_default_dictionary_loads() {
        let dict = TermDictionary::default_dictionary();
        assert!(dict.len() >= 20);
        let anxiety = dict.get("anxiety").unwrap();
        assert_eq!(anxiety.category, TermCategory::Condition);
        assert_eq!(anxiety.valence_hint, ValenceHint::Negative);
        assert!(dict.get("mental health").is_some());
    }

    #[test]
    fn test_case_insensitive_match() {
        let dict = TermDictionary::new(vec![Term {
            text: "anxiety".to_string(),
            category: TermCategory::Condition,
            valence_hint: ValenceHint::Negative,
        }]);
        assert_eq!(
            tag_texts(&dict, "Anxiety is tough but manageable"),
            vec!["anxiety"]
        );
    }

    #[test]
    fn test_multi_word_term_containment() {
        let dict = TermDictionary::default_dictionary();
        let matched = tag_texts(dict, "had a panic attack during my commute");
        assert!(matched.contains(&"panic attack".to_string()));
    }

    #[test]
    fn test_multi_word_needs_word_boundaries() {
        let dict = TermDictionary::new(vec![Term {
            text: "self care".to_string(),
            category: TermCategory::Lifestyle,
            valence_hint: ValenceHint::Positive,
        }]);
        // "self-care" normalizes to "self care" and matches
        assert_eq!(tag_texts(&dict, "practicing self-care today"), vec!["self care"]);
        // "selfish careful" must not match
        assert!(tag_texts(&dict, "selfish careful planning").is_empty());
    }

    #[test]
    fn test_overlapping_terms_all_recorded() {
        let dict = TermDictionary::new(vec![
            Term {
                text: "mental health".to_string(),
                category: TermCategory::Condition,
                valence_hint: ValenceHint::Neutral,
            },
            Term {
                text: "health".to_string(),
                category: TermCategory::Lifestyle,
                valence_hint: ValenceHint::Neutral,
            },
        ]);
        let matched = tag_texts(&dict, "my mental health matters");
        assert_eq!(matched.len(), 2);
    }

    #[test]
    fn test_empty_tokens_no_matches() {
        let dict = TermDictionary::default_dictionary();
        assert!(dict.tag(&[]).is_empty());
    }

    #[test]
    fn test_duplicate_terms_collapse() {
        let make = |text: &str| Term {
            text: text.to_string(),
            category: TermCategory::Symptom,
            valence_hint: ValenceHint::Negative,
        };
        let dict = TermDictionary::new(vec![make("Stress"), make("stress"), make("  stress ")]);
        assert_eq!(dict.len(), 1);
    }
}
