use std::path::Path;

use serde::Deserialize;
use serde::Serialize;

use crate::sentiment::LabelThresholds;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub backtrace: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            backtrace: true,
        }
    }
}

/// Sentiment thresholds, engagement weights and correlation sample policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Compound score at or above which a post is labeled positive.
    #[serde(default = "default_positive_threshold")]
    pub positive_threshold: f64,
    /// Compound score at or below which a post is labeled negative.
    #[serde(default = "default_negative_threshold")]
    pub negative_threshold: f64,
    #[serde(default = "default_engagement_weight")]
    pub retweet_weight: f64,
    #[serde(default = "default_engagement_weight")]
    pub favorite_weight: f64,
    /// Minimum paired-sample count below which a correlation is reported as
    /// insufficient data instead of a coefficient.
    #[serde(default = "default_min_sample_size")]
    pub min_sample_size: usize,
}

fn default_positive_threshold() -> f64 {
    0.05
}

fn default_negative_threshold() -> f64 {
    -0.05
}

fn default_engagement_weight() -> f64 {
    1.0
}

fn default_min_sample_size() -> usize {
    3
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            positive_threshold: default_positive_threshold(),
            negative_threshold: default_negative_threshold(),
            retweet_weight: default_engagement_weight(),
            favorite_weight: default_engagement_weight(),
            min_sample_size: default_min_sample_size(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    /// Number of concurrent per-post annotation workers.
    #[serde(default = "default_parallelism")]
    pub parallelism: usize,
    /// Optional batch deadline. Posts not annotated before it are absent from
    /// the run and retried in a subsequent run.
    #[serde(default)]
    pub batch_timeout_ms: Option<u64>,
}

fn default_batch_size() -> usize {
    100
}

fn default_parallelism() -> usize {
    4
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            parallelism: default_parallelism(),
            batch_timeout_ms: None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub analysis: AnalysisConfig,
    #[serde(default)]
    pub pipeline: PipelineConfig,
}

impl AppConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: AppConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from default config file path
    pub fn load() -> crate::Result<Self> {
        // Try to load from config.toml first, then fall back to config.example.toml
        if Path::new("config.toml").exists() {
            Self::from_file("config.toml")
        } else if Path::new("config.example.toml").exists() {
            tracing::warn!(
                "Using config.example.toml. Please create config.toml for production use."
            );
            Self::from_file("config.example.toml")
        } else {
            Err(crate::MoodLensError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "No config file found. Please create config.toml or config.example.toml",
            )))
        }
    }

    fn validate(&self) -> crate::Result<()> {
        if self.analysis.positive_threshold < self.analysis.negative_threshold {
            return Err(crate::MoodLensError::Config(
                "positive_threshold must not be below negative_threshold".to_string(),
            ));
        }
        if self.pipeline.parallelism == 0 {
            return Err(crate::MoodLensError::Config(
                "parallelism must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Get sentiment label thresholds
    pub fn label_thresholds(&self) -> LabelThresholds {
        LabelThresholds {
            positive: self.analysis.positive_threshold,
            negative: self.analysis.negative_threshold,
        }
    }

    /// Get minimum sample size for correlations
    pub fn min_sample_size(&self) -> usize {
        self.analysis.min_sample_size
    }

    /// Get annotation batch size
    pub fn batch_size(&self) -> usize {
        self.pipeline.batch_size
    }

    /// Get annotation parallelism degree
    pub fn parallelism(&self) -> usize {
        self.pipeline.parallelism
    }

    /// Get optional batch timeout
    pub fn batch_timeout(&self) -> Option<std::time::Duration> {
        self.pipeline
            .batch_timeout_ms
            .map(std::time::Duration::from_millis)
    }
}
