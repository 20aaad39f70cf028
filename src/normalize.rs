//! Text normalization for annotation
//!
//! Turns raw post text into an ordered stream of lowercase word tokens:
//! URLs and @mentions are stripped, the `#` of a hashtag is dropped but the
//! word kept, punctuation is collapsed to whitespace and apostrophes are
//! removed so contractions stay a single token. Deterministic and pure.

/// Normalize raw post text into lowercase word tokens.
///
/// Empty, whitespace-only, or fully non-alphabetic input yields an empty
/// token sequence, never an error.
pub fn normalize(text: &str) -> Vec<String> {
    text.split_whitespace()
        .filter(|word| !is_url(word) && !is_mention(word))
        .flat_map(split_word)
        .collect()
}

/// Join normalized tokens back into a single analyzable string.
pub fn joined(tokens: &[String]) -> String {
    tokens.join(" ")
}

pub(crate) fn is_url(word: &str) -> bool {
    let lower = word.to_lowercase();
    lower.starts_with("http://")
        || lower.starts_with("https://")
        || lower.starts_with("www.")
        || lower.contains("://")
}

pub(crate) fn is_mention(word: &str) -> bool {
    word.starts_with('@')
}

/// Lowercase a raw word and split it on punctuation.
///
/// Apostrophes are deleted in place ("I've" becomes "ive"); every other
/// non-alphanumeric character acts as a separator ("self-care" becomes
/// "self", "care"). Tokens without any alphabetic character are dropped.
fn split_word(word: &str) -> Vec<String> {
    let word = word.strip_prefix('#').unwrap_or(word);

    let mut tokens = Vec::new();
    let mut current = String::new();
    for c in word.chars() {
        if c.is_alphanumeric() {
            current.extend(c.to_lowercase());
        } else if c == '\'' || c == '\u{2019}' {
            // Apostrophe: drop, keep the token together
        } else if !current.is_empty() {
            tokens.push(std::mem::take(&mut current));
        }
    }
    if !current.is_empty() {
        tokens.push(current);
    }

    tokens.retain(|t| t.chars().any(char::is_alphabetic));
    tokens
}
