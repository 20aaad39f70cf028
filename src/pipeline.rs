//! Annotation pipeline and analysis run orchestration
//!
//! Per-post annotation is embarrassingly parallel: posts fan out over a
//! bounded set of workers with the read-only term dictionary as the only
//! shared state. Aggregation and correlation are whole-batch reductions and
//! run only after every annotation task for the batch has finished.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::time::Instant;
use tracing::{info, warn};
use uuid::Uuid;

use crate::aggregate::{aggregate, AggregationOptions};
use crate::config::AppConfig;
use crate::correlate::{correlate, CorrelationOptions};
use crate::models::{
    AnnotationRecord, AnnotationStatus, CorrelationReport, Post, SentimentLabel,
    TermSentimentSummary, UserMetrics,
};
use crate::normalize::normalize;
use crate::sentiment::{DualScorer, LabelThresholds};
use crate::store::{PostFilter, Store};
use crate::terms::TermDictionary;
use crate::{MoodLensError, Result};

#[derive(Debug, Clone, Copy)]
pub struct PipelineOptions {
    pub thresholds: LabelThresholds,
    pub parallelism: usize,
    /// Optional batch deadline. Posts not annotated before it are absent
    /// from the run's record set and retried in a subsequent run.
    pub batch_timeout: Option<Duration>,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            thresholds: LabelThresholds::default(),
            parallelism: 4,
            batch_timeout: None,
        }
    }
}

impl PipelineOptions {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            thresholds: config.label_thresholds(),
            parallelism: config.parallelism().max(1),
            batch_timeout: config.batch_timeout(),
        }
    }
}

/// Per-batch statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchStats {
    pub total_posts: usize,
    pub annotated: usize,
    pub failed: usize,
    /// Posts cut off by the batch deadline (absent from the record set).
    pub skipped: usize,
    pub positive: usize,
    pub neutral: usize,
    pub negative: usize,
    /// Fraction of annotated records where the polarity-derived label agrees
    /// with the compound-derived label. `None` for an empty batch.
    pub label_agreement: Option<f64>,
}

/// Result of annotating one batch.
#[derive(Debug, Clone)]
pub struct BatchOutcome {
    /// Records sorted by post id; one per processed post.
    pub records: Vec<AnnotationRecord>,
    pub stats: BatchStats,
}

/// Composes normalizer, dual scorer and term tagger over a batch of posts.
pub struct AnnotationPipeline {
    dictionary: Arc<TermDictionary>,
    scorer: Arc<DualScorer>,
    options: PipelineOptions,
}

impl AnnotationPipeline {
    pub fn new(dictionary: Arc<TermDictionary>, options: PipelineOptions) -> Self {
        let scorer = Arc::new(DualScorer::new(options.thresholds));
        Self {
            dictionary,
            scorer,
            options,
        }
    }

    /// Pipeline over the process-wide default dictionary.
    pub fn with_default_dictionary(options: PipelineOptions) -> Self {
        Self::new(
            Arc::new(TermDictionary::default_dictionary().clone()),
            options,
        )
    }

    /// Pipeline with an explicit scorer, for callers swapping strategies.
    pub fn with_scorer(
        dictionary: Arc<TermDictionary>,
        scorer: DualScorer,
        options: PipelineOptions,
    ) -> Self {
        Self {
            dictionary,
            scorer: Arc::new(scorer),
            options,
        }
    }

    pub fn options(&self) -> &PipelineOptions {
        &self.options
    }

    pub fn dictionary(&self) -> &TermDictionary {
        &self.dictionary
    }

    /// Annotate a single post. Pure with respect to the post text: the same
    /// post and configuration always yield the same scores and term set.
    pub fn annotate_post(&self, post: &Post) -> AnnotationRecord {
        annotate_one(&self.dictionary, &self.scorer, post)
    }

    /// Annotate a batch, one record per post.
    ///
    /// Posts are processed independently; a fault in one post yields a
    /// sentinel failed record and the batch continues. The returned record
    /// set covers every post unless the batch deadline cut the run short.
    pub async fn annotate_batch(&self, posts: &[Post]) -> BatchOutcome {
        let total_posts = posts.len();
        let deadline = self.options.batch_timeout.map(|t| Instant::now() + t);

        let mut tasks = stream::iter(posts.to_vec())
            .map(|post| {
                let dictionary = Arc::clone(&self.dictionary);
                let scorer = Arc::clone(&self.scorer);
                async move {
                    let post_id = post.id.clone();
                    let handle = tokio::task::spawn_blocking(move || {
                        // A panic while scoring one post must not poison the
                        // batch; it becomes a sentinel failed record
                        catch_unwind(AssertUnwindSafe(|| {
                            annotate_one(&dictionary, &scorer, &post)
                        }))
                        .unwrap_or_else(|_| AnnotationRecord::failed(&post.id, Utc::now()))
                    });
                    match handle.await {
                        Ok(record) => record,
                        Err(join_error) => {
                            warn!("Annotation task for post {post_id} failed: {join_error}");
                            AnnotationRecord::failed(&post_id, Utc::now())
                        }
                    }
                }
            })
            .buffer_unordered(self.options.parallelism.max(1));

        let mut records = Vec::with_capacity(total_posts);
        loop {
            let next = if let Some(deadline) = deadline {
                match tokio::time::timeout_at(deadline, tasks.next()).await {
                    Ok(next) => next,
                    Err(_) => {
                        warn!(
                            "Batch deadline reached with {} of {total_posts} posts annotated",
                            records.len()
                        );
                        break;
                    }
                }
            } else {
                tasks.next().await
            };
            match next {
                Some(record) => records.push(record),
                None => break,
            }
        }
        drop(tasks);

        records.sort_by(|a, b| a.post_id.cmp(&b.post_id));
        let stats = batch_stats(total_posts, &records, self.options.thresholds);
        info!(
            "Annotated batch: {} posts, {} failed, {} skipped",
            stats.annotated, stats.failed, stats.skipped
        );
        BatchOutcome { records, stats }
    }

    /// Annotate a post set in batches of `batch_size`, with stats computed
    /// over the whole set. The batch deadline, if any, applies per batch.
    pub async fn annotate_chunked(&self, posts: &[Post], batch_size: usize) -> BatchOutcome {
        let batch_size = batch_size.max(1);
        let mut records = Vec::with_capacity(posts.len());
        for chunk in posts.chunks(batch_size) {
            let outcome = self.annotate_batch(chunk).await;
            records.extend(outcome.records);
        }
        records.sort_by(|a, b| a.post_id.cmp(&b.post_id));
        let stats = batch_stats(posts.len(), &records, self.options.thresholds);
        BatchOutcome { records, stats }
    }
}

/// Normalize, score and tag one post.
fn annotate_one(
    dictionary: &TermDictionary,
    scorer: &DualScorer,
    post: &Post,
) -> AnnotationRecord {
    let tokens = normalize(&post.text);
    let scores = scorer.score(&post.text, &tokens);

    let mut matched_terms: Vec<String> = dictionary
        .tag(&tokens)
        .into_iter()
        .map(|term| term.text.clone())
        .collect();
    matched_terms.sort();
    matched_terms.dedup();

    AnnotationRecord {
        id: Uuid::new_v4(),
        post_id: post.id.clone(),
        status: AnnotationStatus::Annotated,
        normalized_token_count: tokens.len(),
        polarity_score: scores.polarity,
        compound_score: scores.compound,
        sentiment_label: scores.label,
        contains_mental_health_term: !matched_terms.is_empty(),
        matched_terms,
        annotated_at: Utc::now(),
    }
}

fn batch_stats(
    total_posts: usize,
    records: &[AnnotationRecord],
    thresholds: LabelThresholds,
) -> BatchStats {
    let annotated_records: Vec<&AnnotationRecord> = records
        .iter()
        .filter(|r| r.status == AnnotationStatus::Annotated)
        .collect();
    let failed = records.len() - annotated_records.len();

    let mut positive = 0;
    let mut neutral = 0;
    let mut negative = 0;
    let mut agreeing = 0;
    for record in &annotated_records {
        match record.sentiment_label {
            SentimentLabel::Positive => positive += 1,
            SentimentLabel::Neutral => neutral += 1,
            SentimentLabel::Negative => negative += 1,
        }
        // The two scorers are independent; agreement between their
        // thresholded labels is a useful cross-check signal
        if thresholds.label(record.polarity_score) == record.sentiment_label {
            agreeing += 1;
        }
    }

    let label_agreement = if annotated_records.is_empty() {
        None
    } else {
        Some(f64::from(agreeing) / annotated_records.len() as f64)
    };

    BatchStats {
        total_posts,
        annotated: annotated_records.len(),
        failed,
        skipped: total_posts - records.len(),
        positive,
        neutral,
        negative,
        label_agreement,
    }
}

/// Everything a finished analysis run hands to the caller.
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub stats: BatchStats,
    pub user_metrics: Vec<UserMetrics>,
    pub term_summaries: Vec<TermSentimentSummary>,
    pub report: CorrelationReport,
}

/// One full analysis run: read posts, annotate, aggregate, persist, correlate.
pub struct AnalysisRun {
    store: Arc<dyn Store>,
    pipeline: AnnotationPipeline,
    batch_size: usize,
    aggregation: AggregationOptions,
    correlation: CorrelationOptions,
}

impl AnalysisRun {
    pub fn new(store: Arc<dyn Store>, config: &AppConfig) -> Self {
        Self {
            store,
            pipeline: AnnotationPipeline::with_default_dictionary(PipelineOptions::from_config(
                config,
            )),
            batch_size: config.batch_size().max(1),
            aggregation: AggregationOptions::from_config(config),
            correlation: CorrelationOptions::from_config(config),
        }
    }

    pub fn with_pipeline(
        store: Arc<dyn Store>,
        pipeline: AnnotationPipeline,
        batch_size: usize,
        aggregation: AggregationOptions,
        correlation: CorrelationOptions,
    ) -> Self {
        Self {
            store,
            pipeline,
            batch_size: batch_size.max(1),
            aggregation,
            correlation,
        }
    }

    /// Execute the run. Derived outputs are computed in full before any
    /// write; a store failure aborts the run and the caller decides whether
    /// to retry the whole run.
    pub async fn execute(&self, filter: &PostFilter) -> Result<RunOutput> {
        let posts = self
            .store
            .read_posts(filter)
            .await
            .map_err(fatal_store_error)?;
        info!("Analysis run over {} posts", posts.len());

        // Annotation barrier: aggregation sees the complete record set
        let outcome = self
            .pipeline
            .annotate_chunked(&posts, self.batch_size)
            .await;

        let dictionary = self.pipeline.dictionary();
        let aggregates = aggregate(&posts, &outcome.records, dictionary, &self.aggregation);
        let report = correlate(
            &aggregates.user_metrics,
            &posts,
            &outcome.records,
            dictionary,
            &self.correlation,
        );

        self.store
            .write_annotations(&outcome.records)
            .await
            .map_err(fatal_store_error)?;
        self.store
            .write_summaries(&aggregates.user_metrics, &aggregates.term_summaries)
            .await
            .map_err(fatal_store_error)?;

        Ok(RunOutput {
            stats: outcome.stats,
            user_metrics: aggregates.user_metrics,
            term_summaries: aggregates.term_summaries,
            report,
        })
    }
}

fn fatal_store_error(error: MoodLensError) -> MoodLensError {
    match error {
        MoodLensError::Store(_) => error,
        other => MoodLensError::Store(other.to_string()),
    }
}
