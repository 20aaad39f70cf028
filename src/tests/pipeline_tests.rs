//! Annotation pipeline tests: coverage, idempotence, edge cases and the
//! scenario fixtures.

use std::sync::Arc;

use chrono::Duration;

use super::{base_time, make_post};
use crate::models::{AnnotationStatus, SentimentLabel, Term, TermCategory, ValenceHint};
use crate::pipeline::{AnnotationPipeline, PipelineOptions};
use crate::sentiment::{DualScorer, LabelThresholds, SentimentScorer, ValenceScorer};
use crate::terms::TermDictionary;

fn default_pipeline() -> AnnotationPipeline {
    AnnotationPipeline::with_default_dictionary(PipelineOptions::default())
}

fn pipeline_with_scorer(scorer: DualScorer, options: PipelineOptions) -> AnnotationPipeline {
    AnnotationPipeline::with_scorer(
        Arc::new(TermDictionary::default_dictionary().clone()),
        scorer,
        options,
    )
}

/// Scorer that faults on a marker word, for exercising the sentinel path.
struct FaultyScorer;

impl SentimentScorer for FaultyScorer {
    fn name(&self) -> &'static str {
        "faulty"
    }

    fn score(&self, raw_text: &str, _tokens: &[String]) -> f64 {
        assert!(!raw_text.contains("kaboom"), "injected scoring fault");
        0.0
    }
}

/// Scorer slow enough that a short batch deadline always fires first.
struct SlowScorer;

impl SentimentScorer for SlowScorer {
    fn name(&self) -> &'static str {
        "slow"
    }

    fn score(&self, _raw_text: &str, _tokens: &[String]) -> f64 {
        std::thread::sleep(std::time::Duration::from_millis(500));
        0.0
    }
}

#[tokio::test]
async fn test_batch_coverage_one_record_per_post() {
    let pipeline = default_pipeline();
    let posts: Vec<_> = (0..25)
        .map(|i| {
            make_post(
                &format!("post-{i:02}"),
                &format!("user-{}", i % 5),
                "feeling good about therapy today",
                base_time() + Duration::minutes(i),
            )
        })
        .collect();

    let outcome = pipeline.annotate_batch(&posts).await;
    assert_eq!(outcome.records.len(), 25);
    assert_eq!(outcome.stats.total_posts, 25);
    assert_eq!(outcome.stats.annotated, 25);
    assert_eq!(outcome.stats.failed, 0);
    assert_eq!(outcome.stats.skipped, 0);

    // One record per post, sorted by post id
    let mut ids: Vec<_> = outcome.records.iter().map(|r| r.post_id.clone()).collect();
    ids.dedup();
    assert_eq!(ids.len(), 25);
    let mut sorted = ids.clone();
    sorted.sort();
    assert_eq!(ids, sorted);
}

#[tokio::test]
async fn test_empty_batch() {
    let pipeline = default_pipeline();
    let outcome = pipeline.annotate_batch(&[]).await;
    assert!(outcome.records.is_empty());
    assert_eq!(outcome.stats.total_posts, 0);
    assert!(outcome.stats.label_agreement.is_none());
}

#[test]
fn test_empty_text_yields_neutral_record() {
    let pipeline = default_pipeline();
    let post = make_post("p1", "u1", "", base_time());
    let record = pipeline.annotate_post(&post);

    assert_eq!(record.status, AnnotationStatus::Annotated);
    assert_eq!(record.normalized_token_count, 0);
    assert_eq!(record.polarity_score, 0.0);
    assert_eq!(record.compound_score, 0.0);
    assert_eq!(record.sentiment_label, SentimentLabel::Neutral);
    assert!(record.matched_terms.is_empty());
    assert!(!record.contains_mental_health_term);
}

#[test]
fn test_annotation_idempotent() {
    let pipeline = default_pipeline();
    let post = make_post(
        "p1",
        "u1",
        "Therapy really helps with my anxiety, I'm so grateful!",
        base_time(),
    );
    let first = pipeline.annotate_post(&post);
    let second = pipeline.annotate_post(&post);

    assert_eq!(first.polarity_score, second.polarity_score);
    assert_eq!(first.compound_score, second.compound_score);
    assert_eq!(first.sentiment_label, second.sentiment_label);
    assert_eq!(first.matched_terms, second.matched_terms);
    assert_eq!(
        first.normalized_token_count,
        second.normalized_token_count
    );
}

#[test]
fn test_mixed_sentiment_post_matches_terms() {
    let pipeline = default_pipeline();
    let post = make_post(
        "p1",
        "u1",
        "I've been dealing with anxiety and depression lately, therapy really helps",
        base_time(),
    );
    let record = pipeline.annotate_post(&post);

    assert_eq!(
        record.matched_terms,
        vec!["anxiety", "depression", "therapy"]
    );
    assert!(record.contains_mental_health_term);
    // The label always follows the compound score through the thresholds
    let thresholds = pipeline.options().thresholds;
    assert_eq!(
        record.sentiment_label,
        thresholds.label(record.compound_score)
    );
    assert!((-1.0..=1.0).contains(&record.polarity_score));
    assert!((-1.0..=1.0).contains(&record.compound_score));
}

#[test]
fn test_case_insensitive_tagging_with_custom_dictionary() {
    let dictionary = TermDictionary::new(vec![Term {
        text: "anxiety".to_string(),
        category: TermCategory::Condition,
        valence_hint: ValenceHint::Negative,
    }]);
    let pipeline = AnnotationPipeline::new(Arc::new(dictionary), PipelineOptions::default());

    let post = make_post("p1", "u1", "Anxiety is tough but manageable", base_time());
    let record = pipeline.annotate_post(&post);
    assert_eq!(record.matched_terms, vec!["anxiety"]);
}

#[tokio::test]
async fn test_batch_stats_label_distribution() {
    let pipeline = default_pipeline();
    let posts = vec![
        make_post("p1", "u1", "I love this, so wonderful!", base_time()),
        make_post("p2", "u1", "this is terrible and awful", base_time()),
        make_post("p3", "u2", "the sky is blue", base_time()),
    ];
    let outcome = pipeline.annotate_batch(&posts).await;

    assert_eq!(outcome.stats.positive, 1);
    assert_eq!(outcome.stats.negative, 1);
    assert_eq!(outcome.stats.neutral, 1);
    assert_eq!(
        outcome.stats.positive + outcome.stats.neutral + outcome.stats.negative,
        outcome.stats.annotated
    );
    let agreement = outcome.stats.label_agreement.unwrap();
    assert!((0.0..=1.0).contains(&agreement));
}

#[tokio::test]
async fn test_faulty_post_yields_sentinel_record() {
    let scorer = DualScorer::with_scorers(
        Box::new(FaultyScorer),
        Box::new(ValenceScorer),
        LabelThresholds::default(),
    );
    let pipeline = pipeline_with_scorer(scorer, PipelineOptions::default());
    let posts = vec![
        make_post("p1", "u1", "all fine here", base_time()),
        make_post("p2", "u1", "kaboom goes this one", base_time()),
        make_post("p3", "u2", "still fine", base_time()),
    ];

    let outcome = pipeline.annotate_batch(&posts).await;

    // The faulting post becomes a sentinel record; the batch stays whole
    assert_eq!(outcome.records.len(), 3);
    assert_eq!(outcome.stats.annotated, 2);
    assert_eq!(outcome.stats.failed, 1);

    let sentinel = outcome
        .records
        .iter()
        .find(|r| r.post_id == "p2")
        .unwrap();
    assert_eq!(sentinel.status, AnnotationStatus::Failed);
    assert_eq!(sentinel.sentiment_label, SentimentLabel::Neutral);
    assert_eq!(sentinel.polarity_score, 0.0);
    assert!(sentinel.matched_terms.is_empty());

    let ok = outcome.records.iter().find(|r| r.post_id == "p1").unwrap();
    assert_eq!(ok.status, AnnotationStatus::Annotated);
}

#[tokio::test]
async fn test_batch_deadline_skips_unprocessed_posts() {
    let scorer = DualScorer::with_scorers(
        Box::new(SlowScorer),
        Box::new(SlowScorer),
        LabelThresholds::default(),
    );
    let options = PipelineOptions {
        batch_timeout: Some(std::time::Duration::from_millis(50)),
        parallelism: 2,
        ..PipelineOptions::default()
    };
    let pipeline = pipeline_with_scorer(scorer, options);
    let posts: Vec<_> = (0..4)
        .map(|i| make_post(&format!("p{i}"), "u1", "slow going", base_time()))
        .collect();

    let outcome = pipeline.annotate_batch(&posts).await;

    // Unprocessed posts are absent from the record set, not errored
    assert!(outcome.records.len() < posts.len());
    assert_eq!(outcome.stats.total_posts, 4);
    assert_eq!(outcome.stats.annotated, outcome.records.len());
    assert_eq!(outcome.stats.failed, 0);
    assert_eq!(outcome.stats.skipped, 4 - outcome.records.len());
}

#[tokio::test]
async fn test_chunked_batches_cover_every_post() {
    let pipeline = default_pipeline();
    let posts: Vec<_> = (0..7)
        .map(|i| {
            make_post(
                &format!("post-{i}"),
                "u1",
                "therapy helps",
                base_time() + Duration::minutes(i),
            )
        })
        .collect();

    let outcome = pipeline.annotate_chunked(&posts, 3).await;

    // Stats span the whole set, not the last chunk
    assert_eq!(outcome.records.len(), 7);
    assert_eq!(outcome.stats.total_posts, 7);
    assert_eq!(outcome.stats.annotated, 7);
    assert_eq!(outcome.stats.skipped, 0);
    let ids: Vec<_> = outcome.records.iter().map(|r| r.post_id.clone()).collect();
    let mut sorted = ids.clone();
    sorted.sort();
    assert_eq!(ids, sorted);
}

#[tokio::test]
async fn test_url_and_mention_only_post_is_neutral() {
    let pipeline = default_pipeline();
    let posts = vec![make_post(
        "p1",
        "u1",
        "@someone https://example.com/article",
        base_time(),
    )];
    let outcome = pipeline.annotate_batch(&posts).await;
    let record = &outcome.records[0];
    assert_eq!(record.normalized_token_count, 0);
    assert_eq!(record.sentiment_label, SentimentLabel::Neutral);
}
