//! Descriptive correlation engine
//!
//! Pearson coefficients over the aggregated data: engagement vs sentiment
//! and mental-health prevalence vs sentiment across users, plus per-category
//! sentiment comparison. Undersized or zero-variance series are reported as
//! insufficient data, never as a fabricated zero. The report is descriptive
//! only and never asserts causal direction.

use std::collections::HashMap;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::aggregate::dedup_by_post;
use crate::config::AppConfig;
use crate::models::{
    AnnotationRecord, CategoryDifference, CategorySentiment, CorrelationEntry,
    CorrelationOutcome, CorrelationReport, Post, TermCategory, UserMetrics,
};
use crate::terms::TermDictionary;

/// Variance below this is treated as zero (correlation undefined).
const VARIANCE_EPSILON: f64 = 1e-12;

/// Normal-approximation critical value for the 5% significance flag.
const T_CRITICAL: f64 = 1.96;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorrelationOptions {
    /// Minimum paired-sample count for a coefficient to be computed.
    pub min_sample_size: usize,
}

impl Default for CorrelationOptions {
    fn default() -> Self {
        Self { min_sample_size: 3 }
    }
}

impl CorrelationOptions {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            min_sample_size: config.min_sample_size(),
        }
    }
}

/// Pearson correlation coefficient of two equal-length series.
///
/// Returns `None` when either series has (near) zero variance; the caller
/// decides how to surface the undefined result.
pub fn pearson(xs: &[f64], ys: &[f64]) -> Option<f64> {
    debug_assert_eq!(xs.len(), ys.len());
    let n = xs.len() as f64;
    if xs.is_empty() {
        return None;
    }

    let mean_x = xs.iter().sum::<f64>() / n;
    let mean_y = ys.iter().sum::<f64>() / n;

    let mut covariance = 0.0;
    let mut variance_x = 0.0;
    let mut variance_y = 0.0;
    for (x, y) in xs.iter().zip(ys) {
        let dx = x - mean_x;
        let dy = y - mean_y;
        covariance += dx * dy;
        variance_x += dx * dx;
        variance_y += dy * dy;
    }

    if variance_x < VARIANCE_EPSILON || variance_y < VARIANCE_EPSILON {
        return None;
    }

    Some((covariance / (variance_x * variance_y).sqrt()).clamp(-1.0, 1.0))
}

fn correlate_series(
    name: &str,
    xs: &[f64],
    ys: &[f64],
    options: &CorrelationOptions,
) -> CorrelationEntry {
    let sample_size = xs.len();
    let outcome = if sample_size < options.min_sample_size {
        CorrelationOutcome::InsufficientData {
            reason: format!(
                "sample size {sample_size} below minimum {}",
                options.min_sample_size
            ),
        }
    } else {
        match pearson(xs, ys) {
            Some(coefficient) => CorrelationOutcome::Computed {
                coefficient,
                significant: is_significant(coefficient, sample_size),
            },
            None => CorrelationOutcome::InsufficientData {
                reason: "zero variance in series".to_string(),
            },
        }
    };
    CorrelationEntry {
        name: name.to_string(),
        sample_size,
        outcome,
    }
}

/// Two-sided t-test flag at the 5% level (normal approximation); a
/// descriptive indicator only.
fn is_significant(coefficient: f64, sample_size: usize) -> bool {
    if sample_size <= 2 {
        return false;
    }
    let r2 = coefficient * coefficient;
    if (1.0 - r2) < VARIANCE_EPSILON {
        return true;
    }
    let t = coefficient * ((sample_size as f64 - 2.0) / (1.0 - r2)).sqrt();
    t.abs() > T_CRITICAL
}

/// Compute the correlation report for the current run.
pub fn correlate(
    user_metrics: &[UserMetrics],
    posts: &[Post],
    records: &[AnnotationRecord],
    dictionary: &TermDictionary,
    options: &CorrelationOptions,
) -> CorrelationReport {
    let mut entries = Vec::new();

    // Engagement vs sentiment across users
    let engagement: Vec<f64> = user_metrics.iter().map(|u| u.average_engagement).collect();
    let compound: Vec<f64> = user_metrics.iter().map(|u| u.average_compound).collect();
    let polarity: Vec<f64> = user_metrics.iter().map(|u| u.average_polarity).collect();
    let mh_fraction: Vec<f64> = user_metrics
        .iter()
        .map(|u| u.mental_health_post_fraction)
        .collect();

    entries.push(correlate_series(
        "engagement_vs_compound",
        &engagement,
        &compound,
        options,
    ));
    entries.push(correlate_series(
        "engagement_vs_polarity",
        &engagement,
        &polarity,
        options,
    ));
    entries.push(correlate_series(
        "mental_health_fraction_vs_polarity",
        &mh_fraction,
        &polarity,
        options,
    ));
    entries.push(correlate_series(
        "mental_health_fraction_vs_compound",
        &mh_fraction,
        &compound,
        options,
    ));

    // Category prevalence per user vs that user's mean sentiment
    let records = dedup_by_post(records);
    let posts_by_id: HashMap<&str, &Post> = posts.iter().map(|p| (p.id.as_str(), p)).collect();
    let prevalence = category_prevalence(&records, &posts_by_id, dictionary);
    for category in TermCategory::ALL {
        let series: Vec<f64> = user_metrics
            .iter()
            .map(|u| {
                prevalence
                    .get(&(u.author_id.as_str(), category))
                    .copied()
                    .unwrap_or(0.0)
            })
            .collect();
        entries.push(correlate_series(
            &format!("{}_prevalence_vs_compound", category.as_str()),
            &series,
            &compound,
            options,
        ));
    }

    let category_sentiment = category_sentiment(&records, dictionary);
    let category_differences = category_differences(&category_sentiment);

    CorrelationReport {
        generated_at: Utc::now(),
        entries,
        category_sentiment,
        category_differences,
    }
}

/// Fraction of each author's records containing at least one term of each
/// category, keyed by (author, category).
fn category_prevalence<'a>(
    records: &[&'a AnnotationRecord],
    posts_by_id: &HashMap<&str, &'a Post>,
    dictionary: &TermDictionary,
) -> HashMap<(&'a str, TermCategory), f64> {
    let mut totals: HashMap<&str, usize> = HashMap::new();
    let mut hits: HashMap<(&str, TermCategory), usize> = HashMap::new();

    for record in records {
        let Some(post) = posts_by_id.get(record.post_id.as_str()) else {
            continue;
        };
        let author = post.author_id.as_str();
        *totals.entry(author).or_default() += 1;

        let mut seen = [false; TermCategory::ALL.len()];
        for term in &record.matched_terms {
            if let Some(entry) = dictionary.get(term) {
                let idx = TermCategory::ALL
                    .iter()
                    .position(|c| *c == entry.category)
                    .unwrap_or(0);
                if !seen[idx] {
                    seen[idx] = true;
                    *hits.entry((author, entry.category)).or_default() += 1;
                }
            }
        }
    }

    hits.into_iter()
        .map(|((author, category), count)| {
            let total = totals.get(author).copied().unwrap_or(1).max(1);
            ((author, category), count as f64 / total as f64)
        })
        .collect()
}

/// Mean sentiment of records containing at least one term of each category.
fn category_sentiment(
    records: &[&AnnotationRecord],
    dictionary: &TermDictionary,
) -> Vec<CategorySentiment> {
    let mut out = Vec::new();
    for category in TermCategory::ALL {
        let in_category: Vec<&&AnnotationRecord> = records
            .iter()
            .filter(|record| {
                record.matched_terms.iter().any(|term| {
                    dictionary
                        .get(term)
                        .is_some_and(|entry| entry.category == category)
                })
            })
            .collect();
        if in_category.is_empty() {
            continue;
        }
        let count = in_category.len() as f64;
        out.push(CategorySentiment {
            category,
            record_count: in_category.len(),
            mean_polarity: in_category.iter().map(|r| r.polarity_score).sum::<f64>() / count,
            mean_compound: in_category.iter().map(|r| r.compound_score).sum::<f64>() / count,
        });
    }
    out
}

fn category_differences(sentiment: &[CategorySentiment]) -> Vec<CategoryDifference> {
    let mut differences = Vec::new();
    for (i, a) in sentiment.iter().enumerate() {
        for b in &sentiment[i + 1..] {
            differences.push(CategoryDifference {
                category_a: a.category,
                category_b: b.category,
                compound_difference: a.mean_compound - b.mean_compound,
            });
        }
    }
    differences
}
