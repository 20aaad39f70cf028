//! Store contract and in-memory implementation
//!
//! The core consumes exactly four operations and never assumes a specific
//! storage engine. Writes are keyed (post id, author id, term) with
//! overwrite semantics so at-least-once delivery is safe. A failed store
//! call is fatal to the current run and propagated to the caller.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::models::{AnnotationRecord, Post, TermSentimentSummary, UserMetrics};
use crate::Result;

/// Filter for reading posts out of the store.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PostFilter {
    pub author_id: Option<String>,
    pub since: Option<DateTime<Utc>>,
    pub until: Option<DateTime<Utc>>,
    pub limit: Option<usize>,
}

/// Filter for reading annotation records out of the store.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnnotationFilter {
    pub post_ids: Option<Vec<String>>,
    pub with_terms_only: bool,
    pub limit: Option<usize>,
}

/// The four-operation persistence contract consumed by the core.
#[async_trait]
pub trait Store: Send + Sync {
    async fn read_posts(&self, filter: &PostFilter) -> Result<Vec<Post>>;

    /// Write annotation records, overwriting by post id.
    async fn write_annotations(&self, records: &[AnnotationRecord]) -> Result<()>;

    async fn read_annotations(&self, filter: &AnnotationFilter) -> Result<Vec<AnnotationRecord>>;

    /// Write both summary sets, overwriting by author id and term.
    async fn write_summaries(
        &self,
        user_metrics: &[UserMetrics],
        term_summaries: &[TermSentimentSummary],
    ) -> Result<()>;
}

#[derive(Default)]
struct MemoryInner {
    posts: BTreeMap<String, Post>,
    annotations: BTreeMap<String, AnnotationRecord>,
    user_metrics: BTreeMap<String, UserMetrics>,
    term_summaries: BTreeMap<String, TermSentimentSummary>,
}

/// In-memory store. Each write applies atomically under a single lock;
/// reads return snapshots in key order, so results are deterministic.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<MemoryInner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed posts, overwriting by post id.
    pub async fn insert_posts(&self, posts: &[Post]) {
        let mut inner = self.inner.write().await;
        for post in posts {
            inner.posts.insert(post.id.clone(), post.clone());
        }
    }

    pub async fn user_metrics(&self) -> Vec<UserMetrics> {
        self.inner.read().await.user_metrics.values().cloned().collect()
    }

    pub async fn term_summaries(&self) -> Vec<TermSentimentSummary> {
        self.inner
            .read()
            .await
            .term_summaries
            .values()
            .cloned()
            .collect()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn read_posts(&self, filter: &PostFilter) -> Result<Vec<Post>> {
        let inner = self.inner.read().await;
        let mut posts: Vec<Post> = inner
            .posts
            .values()
            .filter(|post| {
                filter
                    .author_id
                    .as_ref()
                    .map_or(true, |author| post.author_id == *author)
                    && filter.since.map_or(true, |since| post.created_at >= since)
                    && filter.until.map_or(true, |until| post.created_at < until)
            })
            .cloned()
            .collect();
        if let Some(limit) = filter.limit {
            posts.truncate(limit);
        }
        Ok(posts)
    }

    async fn write_annotations(&self, records: &[AnnotationRecord]) -> Result<()> {
        let mut inner = self.inner.write().await;
        for record in records {
            inner
                .annotations
                .insert(record.post_id.clone(), record.clone());
        }
        Ok(())
    }

    async fn read_annotations(&self, filter: &AnnotationFilter) -> Result<Vec<AnnotationRecord>> {
        let inner = self.inner.read().await;
        let mut records: Vec<AnnotationRecord> = inner
            .annotations
            .values()
            .filter(|record| {
                filter
                    .post_ids
                    .as_ref()
                    .map_or(true, |ids| ids.contains(&record.post_id))
                    && (!filter.with_terms_only || record.contains_mental_health_term)
            })
            .cloned()
            .collect();
        if let Some(limit) = filter.limit {
            records.truncate(limit);
        }
        Ok(records)
    }

    async fn write_summaries(
        &self,
        user_metrics: &[UserMetrics],
        term_summaries: &[TermSentimentSummary],
    ) -> Result<()> {
        let mut inner = self.inner.write().await;
        for metrics in user_metrics {
            inner
                .user_metrics
                .insert(metrics.author_id.clone(), metrics.clone());
        }
        for summary in term_summaries {
            inner
                .term_summaries
                .insert(summary.term.clone(), summary.clone());
        }
        Ok(())
    }
}
