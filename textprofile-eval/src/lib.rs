//! Evaluation harness for pattern profilers.
//!
//! Every evaluation drives a learner through the [`textprofile::Oracle`]
//! trait, so any engine that implements it can be measured:
//!
//! 1. **Clustering** ([`Orchestrator::estimate_clustering`]): strings drawn
//!    from N clean datasets are profiled with exactly N disjuncts, and the
//!    disjunct assignment is compared to the true source datasets with
//!    normalized mutual information.
//!
//! 2. **Quality** ([`Orchestrator::estimate_quality`]): a program learned from
//!    a fraction of one dataset is scored on held-out strings of the same
//!    dataset and on strings of the other datasets.
//!
//! 3. **Similarity** ([`Orchestrator::estimate_similarity`]): the cost of the
//!    best single pattern covering two strings, for same-dataset and
//!    cross-dataset pairs.
//!
//! The `textprofile-eval` binary also profiles single dataset files, reports
//! pairwise dissimilarity of explicit strings, and runs the dataset test
//! suite.
//!
//! # Quick Start
//!
//! ## Cluster Agreement
//!
//! ```rust
//! use textprofile_eval::{normalized_mutual_information, Partition};
//!
//! let truth = Partition::new(vec![
//!     vec!["2019-01-02".into(), "2020-11-30".into()],
//!     vec!["alice".into(), "bob".into()],
//! ]);
//! let learned = Partition::group_by(
//!     ["2019-01-02", "2020-11-30", "alice", "bob"],
//!     |s| s.starts_with(char::is_numeric),
//! );
//!
//! let nmi = normalized_mutual_information(&truth, &learned);
//! assert!((nmi.value().unwrap() - 1.0).abs() < 1e-12);
//!
//! // A single cluster carries no information.
//! let one = Partition::new(vec![vec!["a".into(), "b".into()]]);
//! assert!(!normalized_mutual_information(&one, &one).is_defined());
//! ```
//!
//! ## Classification Quality
//!
//! ```rust
//! use textprofile::{Constraints, Oracle, SignatureLearner, TokenRegistry};
//! use textprofile_eval::{evaluate, MetricValue};
//!
//! let registry = TokenRegistry::new();
//! let mut learner = SignatureLearner::new(&registry);
//! let program = learner
//!     .learn(&Constraints::new().with_positives(["2019-01-02", "2020-11-30"]))
//!     .unwrap();
//!
//! let outcome = evaluate(program.as_ref(), &["1999-12-31"], &["hello"]);
//! assert_eq!(outcome.precision, MetricValue::Defined(1.0));
//! ```
//!
//! ## Full Runs
//!
//! ```rust,no_run
//! use textprofile::{SignatureLearner, TokenRegistry};
//! use textprofile_eval::{ClusteringConfig, EvalPaths, Orchestrator};
//!
//! let paths = EvalPaths::new("/data/profiling");
//! let registry = TokenRegistry::with_semantic_atoms(&paths.atoms_dir).unwrap();
//! let mut learner = SignatureLearner::new(&registry);
//!
//! let mut orchestrator = Orchestrator::new(&mut learner, &registry, paths).unwrap();
//! let report = orchestrator
//!     .estimate_clustering(&ClusteringConfig::default(), &mut std::io::stdout())
//!     .unwrap();
//! for config in &report.configurations {
//!     println!("N={} NMI={}", config.clusters, config.mean_nmi);
//! }
//! ```
//!
//! # Degenerate Metrics
//!
//! Ratios with a zero denominator are [`MetricValue::Undefined`] with a
//! [`Degeneracy`] reason. Undefined values are reported, never averaged.

#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod agreement;
pub mod classification;
pub mod config;
pub mod dataset;
pub mod error;
pub mod eta;
pub mod logging;
pub mod metrics;
pub mod orchestrator;
pub mod profile;
pub mod report;
pub mod sampler;
pub mod similarity;
pub mod suite;

// Re-exports
pub use agreement::{entropy, mutual_information, normalized_mutual_information, Partition};
pub use classification::{evaluate, evaluate_with, f1_score, ClassificationOutcome, QualitySummary};
pub use config::{
    ClusteringConfig, EtaConfig, EvalPaths, ProfileConfig, QualityConfig, SimilarityConfig,
};
pub use dataset::{CustomRegexToken, DatasetCatalog, DatasetFile, TestCaseSpec};
pub use error::{DataError, EvalError};
pub use eta::{compute_eta, EtaReport};
pub use metrics::{mean, stddev, Degeneracy, MetricValue, RunningMean};
pub use orchestrator::{ConfigurationRun, Orchestrator};
pub use profile::{profile_dataset, CaseProfile, PatternCoverage, ProfileReport};
pub use report::{
    ClusteringReport, ConfigurationSummary, DatasetQuality, QualityReport, ReportMetadata,
    SimilarityReport, SkippedItem,
};
pub use sampler::{sample, SampleSet, SamplerConfig};
pub use similarity::{combined_description, SimilarityRecord, SimilarityScorer};
pub use suite::{run_suite, CaseResult, CaseStatus, SuiteReport};
