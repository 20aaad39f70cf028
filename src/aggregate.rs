//! Per-user and per-term rollups
//!
//! Aggregation is a wholesale recompute over the complete record set: the
//! output is always a pure function of the current annotations, never an
//! incremental patch. Running twice on unchanged input yields identical
//! output, ordering included.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::config::AppConfig;
use crate::models::{AnnotationRecord, Post, TermSentimentSummary, UserMetrics};
use crate::terms::TermDictionary;

const SECONDS_PER_DAY: f64 = 86_400.0;

/// Weights applied to repost and favorite counts when computing engagement.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EngagementWeights {
    pub retweet: f64,
    pub favorite: f64,
}

impl Default for EngagementWeights {
    fn default() -> Self {
        Self {
            retweet: 1.0,
            favorite: 1.0,
        }
    }
}

impl EngagementWeights {
    pub fn engagement(&self, post: &Post) -> f64 {
        self.retweet * f64::from(post.retweet_count)
            + self.favorite * f64::from(post.favorite_count)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct AggregationOptions {
    pub weights: EngagementWeights,
}

impl AggregationOptions {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            weights: EngagementWeights {
                retweet: config.analysis.retweet_weight,
                favorite: config.analysis.favorite_weight,
            },
        }
    }
}

/// Rollup output of one aggregation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateOutput {
    pub user_metrics: Vec<UserMetrics>,
    pub term_summaries: Vec<TermSentimentSummary>,
}

/// Keep only the newest record per post id (replace-by-post-id lifecycle).
///
/// Ties on `annotated_at` resolve to the later record in the slice, so a
/// reprocessing run appended after the original always wins.
pub(crate) fn dedup_by_post<'a>(records: &'a [AnnotationRecord]) -> Vec<&'a AnnotationRecord> {
    let mut latest: HashMap<&str, &'a AnnotationRecord> = HashMap::new();
    for record in records {
        match latest.get(record.post_id.as_str()) {
            Some(existing) if existing.annotated_at > record.annotated_at => {}
            _ => {
                latest.insert(record.post_id.as_str(), record);
            }
        }
    }
    let mut deduped: Vec<&AnnotationRecord> = latest.into_values().collect();
    deduped.sort_by(|a, b| a.post_id.cmp(&b.post_id));
    deduped
}

/// Roll up annotation records joined with their source posts into
/// per-author metrics and per-term sentiment summaries.
///
/// Records without a matching post are skipped. Sentinel failure records
/// count toward an author's post count (they are valid neutral, no-term
/// records) so coverage stays total over the batch.
pub fn aggregate(
    posts: &[Post],
    records: &[AnnotationRecord],
    dictionary: &TermDictionary,
    options: &AggregationOptions,
) -> AggregateOutput {
    let posts_by_id: HashMap<&str, &Post> = posts.iter().map(|p| (p.id.as_str(), p)).collect();
    let records = dedup_by_post(records);

    let joined: Vec<(&AnnotationRecord, &Post)> = records
        .iter()
        .filter_map(|record| {
            posts_by_id
                .get(record.post_id.as_str())
                .map(|post| (*record, *post))
        })
        .collect();

    AggregateOutput {
        user_metrics: user_metrics(&joined, options),
        term_summaries: term_summaries(&joined, dictionary),
    }
}

fn user_metrics(
    joined: &[(&AnnotationRecord, &Post)],
    options: &AggregationOptions,
) -> Vec<UserMetrics> {
    let mut by_author: HashMap<&str, Vec<(&AnnotationRecord, &Post)>> = HashMap::new();
    for &(record, post) in joined {
        by_author
            .entry(post.author_id.as_str())
            .or_default()
            .push((record, post));
    }

    let mut metrics: Vec<UserMetrics> = by_author
        .into_iter()
        .map(|(author_id, pairs)| {
            let count = pairs.len() as f64;
            let average_polarity =
                pairs.iter().map(|(r, _)| r.polarity_score).sum::<f64>() / count;
            let average_compound =
                pairs.iter().map(|(r, _)| r.compound_score).sum::<f64>() / count;
            let mental_health_posts = pairs
                .iter()
                .filter(|(r, _)| r.contains_mental_health_term)
                .count();
            let average_engagement = pairs
                .iter()
                .map(|(_, p)| options.weights.engagement(p))
                .sum::<f64>()
                / count;

            let earliest = pairs.iter().map(|(_, p)| p.created_at).min();
            let latest = pairs.iter().map(|(_, p)| p.created_at).max();
            // Zero span (single post or identical timestamps) has no defined
            // frequency; report undefined rather than divide by zero
            let posting_frequency = match (earliest, latest) {
                (Some(first), Some(last)) if last > first => {
                    let span_days =
                        (last - first).num_seconds() as f64 / SECONDS_PER_DAY;
                    Some(count / span_days)
                }
                _ => None,
            };

            UserMetrics {
                author_id: author_id.to_string(),
                post_count: pairs.len(),
                average_polarity,
                average_compound,
                posting_frequency,
                mental_health_post_fraction: mental_health_posts as f64 / count,
                average_engagement,
            }
        })
        .collect();

    metrics.sort_by(|a, b| a.author_id.cmp(&b.author_id));
    metrics
}

fn term_summaries(
    joined: &[(&AnnotationRecord, &Post)],
    dictionary: &TermDictionary,
) -> Vec<TermSentimentSummary> {
    struct Accumulator {
        count: usize,
        polarity_sum: f64,
        compound_sum: f64,
    }

    let mut by_term: HashMap<&str, Accumulator> = HashMap::new();
    for (record, _) in joined {
        for term in &record.matched_terms {
            let entry = by_term.entry(term.as_str()).or_insert(Accumulator {
                count: 0,
                polarity_sum: 0.0,
                compound_sum: 0.0,
            });
            entry.count += 1;
            entry.polarity_sum += record.polarity_score;
            entry.compound_sum += record.compound_score;
        }
    }

    let mut summaries: Vec<TermSentimentSummary> = by_term
        .into_iter()
        .filter_map(|(term, acc)| {
            let Some(entry) = dictionary.get(term) else {
                tracing::warn!("Matched term '{term}' missing from dictionary, skipping summary");
                return None;
            };
            Some(TermSentimentSummary {
                term: term.to_string(),
                category: entry.category,
                occurrence_count: acc.count,
                mean_polarity: acc.polarity_sum / acc.count as f64,
                mean_compound: acc.compound_sum / acc.count as f64,
            })
        })
        .collect();

    summaries.sort_by(|a, b| a.term.cmp(&b.term));
    summaries
}
