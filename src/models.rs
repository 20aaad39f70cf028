use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A single social-media post with engagement metadata.
///
/// Posts are produced by the external collector and are read-only input to
/// the annotation pipeline. Author ids are opaque and already anonymized.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub id: String,
    pub text: String,
    pub created_at: DateTime<Utc>,
    pub author_id: String,
    pub retweet_count: u32,
    pub favorite_count: u32,
    #[serde(default)]
    pub is_repost: bool,
    #[serde(default)]
    pub has_media: bool,
}

/// Category of a mental-health term in the dictionary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TermCategory {
    Condition,
    Symptom,
    Treatment,
    Support,
    Lifestyle,
}

impl TermCategory {
    /// All categories, in a fixed order.
    pub const ALL: [TermCategory; 5] = [
        TermCategory::Condition,
        TermCategory::Symptom,
        TermCategory::Treatment,
        TermCategory::Support,
        TermCategory::Lifestyle,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            TermCategory::Condition => "condition",
            TermCategory::Symptom => "symptom",
            TermCategory::Treatment => "treatment",
            TermCategory::Support => "support",
            TermCategory::Lifestyle => "lifestyle",
        }
    }
}

impl std::str::FromStr for TermCategory {
    type Err = crate::MoodLensError;

    fn from_str(s: &str) -> crate::Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "condition" => Ok(TermCategory::Condition),
            "symptom" => Ok(TermCategory::Symptom),
            "treatment" => Ok(TermCategory::Treatment),
            "support" => Ok(TermCategory::Support),
            "lifestyle" => Ok(TermCategory::Lifestyle),
            other => Err(crate::MoodLensError::Config(format!(
                "unknown term category: {other}"
            ))),
        }
    }
}

/// A-priori valence hint attached to a dictionary term.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValenceHint {
    Positive,
    Negative,
    Neutral,
}

impl std::str::FromStr for ValenceHint {
    type Err = crate::MoodLensError;

    fn from_str(s: &str) -> crate::Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "positive" => Ok(ValenceHint::Positive),
            "negative" => Ok(ValenceHint::Negative),
            "neutral" => Ok(ValenceHint::Neutral),
            other => Err(crate::MoodLensError::Config(format!(
                "unknown valence hint: {other}"
            ))),
        }
    }
}

/// A dictionary-listed mental-health term.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Term {
    pub text: String,
    pub category: TermCategory,
    pub valence_hint: ValenceHint,
}

/// Thresholded sentiment label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SentimentLabel {
    Positive,
    Negative,
    Neutral,
}

impl SentimentLabel {
    pub fn as_str(self) -> &'static str {
        match self {
            SentimentLabel::Positive => "positive",
            SentimentLabel::Negative => "negative",
            SentimentLabel::Neutral => "neutral",
        }
    }
}

/// Lifecycle status of an annotation record.
///
/// `Failed` marks the sentinel record written when a single post faults
/// during annotation; the batch continues around it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnnotationStatus {
    Annotated,
    Failed,
}

/// One annotation per post, produced exactly once per pipeline run.
///
/// Records are immutable after creation. Reprocessing a post produces a new
/// record that logically replaces the old one by `post_id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnnotationRecord {
    pub id: Uuid,
    pub post_id: String,
    pub status: AnnotationStatus,
    pub normalized_token_count: usize,
    /// Lexicon-based polarity score in [-1, 1].
    pub polarity_score: f64,
    /// Valence-aware compound score in [-1, 1].
    pub compound_score: f64,
    pub sentiment_label: SentimentLabel,
    /// Matched dictionary terms, lowercase, sorted, deduplicated.
    pub matched_terms: Vec<String>,
    pub contains_mental_health_term: bool,
    pub annotated_at: DateTime<Utc>,
}

impl AnnotationRecord {
    /// Sentinel record for a post that faulted during annotation.
    pub fn failed(post_id: &str, annotated_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            post_id: post_id.to_string(),
            status: AnnotationStatus::Failed,
            normalized_token_count: 0,
            polarity_score: 0.0,
            compound_score: 0.0,
            sentiment_label: SentimentLabel::Neutral,
            matched_terms: Vec::new(),
            contains_mental_health_term: false,
            annotated_at,
        }
    }
}

/// Per-author rollup, recomputed wholesale from the full record set each run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserMetrics {
    pub author_id: String,
    pub post_count: usize,
    pub average_polarity: f64,
    pub average_compound: f64,
    /// Posts per day over the author's created-at span. `None` when the span
    /// is zero (a single post, or identical timestamps).
    pub posting_frequency: Option<f64>,
    pub mental_health_post_fraction: f64,
    pub average_engagement: f64,
}

/// Per-term sentiment rollup over records containing that term.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TermSentimentSummary {
    pub term: String,
    pub category: TermCategory,
    pub occurrence_count: usize,
    pub mean_polarity: f64,
    pub mean_compound: f64,
}

/// Outcome of a single requested correlation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CorrelationOutcome {
    Computed {
        /// Pearson coefficient in [-1, 1].
        coefficient: f64,
        /// Descriptive t-test flag at the 5% level; never a causal claim.
        significant: bool,
    },
    InsufficientData {
        reason: String,
    },
}

/// One named correlation in the report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelationEntry {
    pub name: String,
    pub sample_size: usize,
    #[serde(flatten)]
    pub outcome: CorrelationOutcome,
}

/// Mean sentiment of records containing at least one term of a category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategorySentiment {
    pub category: TermCategory,
    pub record_count: usize,
    pub mean_polarity: f64,
    pub mean_compound: f64,
}

/// Pairwise mean-compound difference between two categories.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryDifference {
    pub category_a: TermCategory,
    pub category_b: TermCategory,
    pub compound_difference: f64,
}

/// Descriptive correlation report for one analysis run.
///
/// Purely derived, never authoritative state: recomputable from the current
/// metrics and record sets at any time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorrelationReport {
    pub generated_at: DateTime<Utc>,
    pub entries: Vec<CorrelationEntry>,
    pub category_sentiment: Vec<CategorySentiment>,
    pub category_differences: Vec<CategoryDifference>,
}

impl CorrelationReport {
    /// Look up an entry by name.
    pub fn entry(&self, name: &str) -> Option<&CorrelationEntry> {
        self.entries.iter().find(|e| e.name == name)
    }
}
