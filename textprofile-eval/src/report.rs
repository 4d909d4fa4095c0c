//! Report types and output helpers.

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::classification::{ClassificationOutcome, QualitySummary};
use crate::error::EvalError;
use crate::metrics::MetricValue;
use crate::similarity::SimilarityRecord;

/// Report metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportMetadata {
    /// Report generation timestamp.
    pub generated_at: String,
    /// Version of textprofile-eval.
    pub eval_version: String,
    /// Root directory the run used.
    pub root: Option<String>,
}

impl Default for ReportMetadata {
    fn default() -> Self {
        Self {
            generated_at: chrono::Utc::now().to_rfc3339(),
            eval_version: env!("CARGO_PKG_VERSION").to_string(),
            root: None,
        }
    }
}

impl ReportMetadata {
    /// Metadata for a run over `root`.
    #[must_use]
    pub fn for_root(root: &Path) -> Self {
        Self {
            root: Some(root.display().to_string()),
            ..Self::default()
        }
    }
}

/// An item left out of a run, and why.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedItem {
    /// Dataset path or trial label.
    pub item: String,
    /// Why it was skipped.
    pub reason: String,
}

impl SkippedItem {
    /// Creates a skipped-item entry.
    #[must_use]
    pub fn new(item: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            item: item.into(),
            reason: reason.into(),
        }
    }
}

/// Aggregate of all trials for one cluster count.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigurationSummary {
    /// Number of clusters (datasets) per trial.
    pub clusters: usize,
    /// μ passed to the oracle.
    pub mu: f64,
    /// θ passed to the oracle.
    pub theta: f64,
    /// Trials attempted.
    pub trials: usize,
    /// Trials with a defined NMI.
    pub scored_trials: usize,
    /// Trials whose NMI was undefined.
    pub undefined_trials: usize,
    /// Mean NMI over scored trials.
    pub mean_nmi: MetricValue,
    /// Total learning time.
    pub total_time_ms: u64,
    /// Mean learning time over completed trials.
    pub mean_time_ms: MetricValue,
    /// Sample standard deviation of the learning time over completed trials.
    pub stddev_time_ms: MetricValue,
}

/// Result of the clustering estimate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusteringReport {
    /// Report metadata.
    pub metadata: ReportMetadata,
    /// One entry per cluster count.
    pub configurations: Vec<ConfigurationSummary>,
    /// Trials that failed.
    pub skipped: Vec<SkippedItem>,
}

/// Quality result for one dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetQuality {
    /// Dataset path relative to the root.
    pub dataset: String,
    /// Strings learned from.
    pub profiled: usize,
    /// Descriptions of the learned program.
    pub patterns: Vec<String>,
    /// Classification of the held-out pools.
    pub outcome: ClassificationOutcome,
}

/// Result of the quality estimate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QualityReport {
    /// Report metadata.
    pub metadata: ReportMetadata,
    /// Fraction of each dataset learned from.
    pub profile_fraction: f64,
    /// μ passed to the oracle.
    pub mu: f64,
    /// θ passed to the oracle.
    pub theta: f64,
    /// Per-dataset results.
    pub datasets: Vec<DatasetQuality>,
    /// Datasets left out.
    pub skipped: Vec<SkippedItem>,
    /// Running means across datasets.
    pub summary: QualitySummary,
    /// Mean per-dataset score.
    pub average_score: MetricValue,
    /// Mean precision.
    pub precision: MetricValue,
    /// Mean recall.
    pub recall: MetricValue,
    /// F1 over the mean precision and recall.
    pub f1: MetricValue,
}

/// Result of the similarity estimate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimilarityReport {
    /// Report metadata.
    pub metadata: ReportMetadata,
    /// Pairs with ground truth `true`.
    pub similar_pairs: usize,
    /// Pairs with ground truth `false`.
    pub dissimilar_pairs: usize,
    /// Mean score of similar pairs.
    pub mean_similar_score: MetricValue,
    /// Mean score of dissimilar pairs.
    pub mean_dissimilar_score: MetricValue,
    /// Every scored pair.
    pub records: Vec<SimilarityRecord>,
    /// Datasets or pairs left out.
    pub skipped: Vec<SkippedItem>,
}

/// Serializes `value` as pretty JSON.
///
/// # Errors
///
/// Returns `EvalError::Json` if serialization fails.
pub fn to_json<T: Serialize>(value: &T) -> Result<String, EvalError> {
    serde_json::to_string_pretty(value).map_err(|e| EvalError::Json {
        context: "report serialization".to_string(),
        message: e.to_string(),
    })
}

/// Writes `value` as pretty JSON to `path`.
///
/// # Errors
///
/// Returns `EvalError::Json` or `EvalError::Io` on failure.
pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), EvalError> {
    let json = to_json(value)?;
    std::fs::write(path, json)
        .map_err(|e| EvalError::io(format!("write '{}'", path.display()), &e))
}

/// Creates (truncating) a buffered log file, creating parent directories.
///
/// # Errors
///
/// Returns `EvalError::Io` if the file cannot be created.
pub fn create_log(path: &Path) -> Result<BufWriter<File>, EvalError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|e| EvalError::io(format!("create '{}'", parent.display()), &e))?;
    }
    let file = File::create(path)
        .map_err(|e| EvalError::io(format!("create '{}'", path.display()), &e))?;
    Ok(BufWriter::new(file))
}
