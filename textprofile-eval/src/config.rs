//! Configuration for the evaluation runs.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use textprofile::ClusteringParameters;

use crate::sampler::SamplerConfig;

/// Locations of datasets, vocabularies and logs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvalPaths {
    /// Root directory holding `tests/` and `logs/`.
    pub root: PathBuf,
    /// Directory of `*.nocase` / `*.case` vocabularies.
    pub atoms_dir: PathBuf,
}

impl Default for EvalPaths {
    fn default() -> Self {
        Self::new(".")
    }
}

impl EvalPaths {
    /// Paths under `root`, with vocabularies in `<root>/semantic_atoms`.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let atoms_dir = root.join("semantic_atoms");
        Self { root, atoms_dir }
    }

    /// Overrides the vocabulary directory.
    #[must_use]
    pub fn with_atoms_dir(mut self, atoms_dir: impl Into<PathBuf>) -> Self {
        self.atoms_dir = atoms_dir.into();
        self
    }

    /// `<root>/logs`.
    #[must_use]
    pub fn logs_dir(&self) -> PathBuf {
        self.root.join("logs")
    }

    /// `<root>/tests`.
    #[must_use]
    pub fn tests_dir(&self) -> PathBuf {
        self.root.join("tests")
    }

    /// The directories the test suite runs by default.
    #[must_use]
    pub fn default_suite_dirs(&self) -> Vec<PathBuf> {
        ["homo", "hetero", "homo.simple"]
            .iter()
            .map(|d| self.tests_dir().join(d))
            .collect()
    }

    /// Returns the root.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }
}

/// Configuration for the clustering estimate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClusteringConfig {
    /// Trials per cluster count.
    pub trials: usize,
    /// Strings drawn from each dataset.
    pub strings_per_cluster: usize,
    /// Smallest cluster count.
    pub min_clusters: usize,
    /// Largest cluster count.
    pub max_clusters: usize,
    /// Clustering parameters passed to the oracle.
    pub params: ClusteringParameters,
    /// Seed for reproducibility.
    pub seed: u64,
}

impl Default for ClusteringConfig {
    fn default() -> Self {
        Self {
            trials: 10,
            strings_per_cluster: 256,
            min_clusters: 2,
            max_clusters: 8,
            params: ClusteringParameters::default(),
            seed: 0xface,
        }
    }
}

impl ClusteringConfig {
    /// Sets the number of trials per cluster count.
    #[must_use]
    pub const fn with_trials(mut self, trials: usize) -> Self {
        self.trials = trials;
        self
    }

    /// Sets the strings drawn per dataset.
    #[must_use]
    pub const fn with_strings_per_cluster(mut self, n: usize) -> Self {
        self.strings_per_cluster = n;
        self
    }

    /// Sets the cluster-count range.
    #[must_use]
    pub const fn with_cluster_range(mut self, min: usize, max: usize) -> Self {
        self.min_clusters = min;
        self.max_clusters = max;
        self
    }

    /// Sets the clustering parameters.
    #[must_use]
    pub const fn with_params(mut self, params: ClusteringParameters) -> Self {
        self.params = params;
        self
    }

    /// Sets the seed.
    #[must_use]
    pub const fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }
}

/// Configuration for the quality estimate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QualityConfig {
    /// Fraction of each dataset used for learning.
    pub profile_fraction: f64,
    /// Clustering parameters passed to the oracle.
    pub params: ClusteringParameters,
    /// Datasets whose learning subset is smaller are skipped.
    pub min_profile_size: usize,
    /// Seed for reproducibility.
    pub seed: u64,
}

impl Default for QualityConfig {
    fn default() -> Self {
        Self {
            profile_fraction: 0.5,
            params: ClusteringParameters::default(),
            min_profile_size: 8,
            seed: 0xf00d,
        }
    }
}

impl QualityConfig {
    /// Creates a configuration learning from `profile_fraction` of the data.
    #[must_use]
    pub fn new(profile_fraction: f64) -> Self {
        Self {
            profile_fraction,
            ..Self::default()
        }
    }

    /// Sets the clustering parameters.
    #[must_use]
    pub const fn with_params(mut self, params: ClusteringParameters) -> Self {
        self.params = params;
        self
    }

    /// Sets the minimum learning subset size.
    #[must_use]
    pub const fn with_min_profile_size(mut self, n: usize) -> Self {
        self.min_profile_size = n;
        self
    }

    /// Sets the seed.
    #[must_use]
    pub const fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }
}

/// Configuration for the similarity estimate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimilarityConfig {
    /// Same-dataset pairs per dataset.
    pub sim_count: usize,
    /// Strings per side for each pair of different datasets.
    pub dis_count: usize,
    /// Seed for reproducibility.
    pub seed: u64,
}

impl SimilarityConfig {
    /// Creates a configuration.
    #[must_use]
    pub const fn new(sim_count: usize, dis_count: usize) -> Self {
        Self {
            sim_count,
            dis_count,
            seed: 0xf00d,
        }
    }

    /// Sets the seed.
    #[must_use]
    pub const fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }
}

/// Configuration for `profile`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileConfig {
    /// Print the learned program after the coverage table.
    pub show_program: bool,
    /// Example strings shown per pattern.
    pub num_examples: usize,
}

impl Default for ProfileConfig {
    fn default() -> Self {
        Self {
            show_program: false,
            num_examples: 1,
        }
    }
}

impl ProfileConfig {
    /// Sets whether the program is printed.
    #[must_use]
    pub const fn with_show_program(mut self, show: bool) -> Self {
        self.show_program = show;
        self
    }

    /// Sets the example count.
    #[must_use]
    pub const fn with_num_examples(mut self, n: usize) -> Self {
        self.num_examples = n;
        self
    }
}

/// Configuration for `eta`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EtaConfig {
    /// Sampled candidate patterns to show.
    pub num_candidates: usize,
    /// Sampling seed; entropy-seeded when absent.
    pub seed: Option<u64>,
    /// Sampler limits.
    pub sampler: SamplerConfig,
}

impl Default for EtaConfig {
    fn default() -> Self {
        Self {
            num_candidates: 5,
            seed: None,
            sampler: SamplerConfig::default(),
        }
    }
}

impl EtaConfig {
    /// Sets the candidate count.
    #[must_use]
    pub const fn with_num_candidates(mut self, n: usize) -> Self {
        self.num_candidates = n;
        self
    }

    /// Sets the sampling seed.
    #[must_use]
    pub const fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Sets the sampler limits.
    #[must_use]
    pub const fn with_sampler(mut self, sampler: SamplerConfig) -> Self {
        self.sampler = sampler;
        self
    }
}
