//! Evaluation orchestrator: the clustering, quality and similarity runs.
//!
//! Every run seeds its own `ChaCha8Rng`, issues one discarded warm-up
//! learning call, and clears the oracle cache after every learning call so
//! latencies are comparable. A dataset or trial that fails is logged with
//! `tracing::warn!`, recorded as skipped, and the run moves on.

use std::collections::HashSet;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use textprofile::{ClusteringParameters, Constraints, DisjunctsLimit, Oracle, Program, TokenRegistry};
use tracing::{debug, info, warn};

use crate::agreement::{normalized_mutual_information, Partition};
use crate::classification::{evaluate, ClassificationOutcome, QualitySummary};
use crate::config::{ClusteringConfig, EvalPaths, QualityConfig, SimilarityConfig};
use crate::dataset::{load_non_empty, DatasetCatalog};
use crate::error::{DataError, EvalError};
use crate::metrics::{count_as_f64, mean, stddev, Degeneracy, MetricValue, RunningMean};
use crate::report::{
    create_log, ClusteringReport, ConfigurationSummary, DatasetQuality, QualityReport,
    ReportMetadata, SimilarityReport, SkippedItem,
};
use crate::similarity::SimilarityScorer;

/// Strings of the discarded warm-up call.
const WARM_UP: [&str; 2] = [">)#*$&", "969dvb"];

/// Separator between strings in the NMI log.
const JOIN: &str = "  .-.  ";

fn io_err(operation: &'static str) -> impl FnOnce(io::Error) -> EvalError {
    move |e| EvalError::io(operation, &e)
}

fn elapsed_ms(start: Instant) -> u64 {
    u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX)
}

/// `len * fraction` rounded half to even, clamped to `[0, len]`.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn fraction_of(len: usize, fraction: f64) -> usize {
    let n = (count_as_f64(len) * fraction).round_ties_even();
    if n <= 0.0 {
        0
    } else {
        (n as usize).min(len)
    }
}

/// Running NMI and latency for one cluster count.
#[derive(Debug, Clone)]
pub struct ConfigurationRun {
    clusters: usize,
    params: ClusteringParameters,
    trials: usize,
    nmi: RunningMean,
    total_time_ms: u64,
    times_ms: Vec<f64>,
}

impl ConfigurationRun {
    /// Starts an empty run.
    #[must_use]
    pub fn new(clusters: usize, params: ClusteringParameters) -> Self {
        Self {
            clusters,
            params,
            trials: 0,
            nmi: RunningMean::new(),
            total_time_ms: 0,
            times_ms: Vec::new(),
        }
    }

    /// Records a completed trial.
    #[allow(clippy::cast_precision_loss)]
    pub fn record(&mut self, nmi: MetricValue, time_ms: u64) {
        self.trials += 1;
        self.nmi.push(nmi);
        self.total_time_ms = self.total_time_ms.saturating_add(time_ms);
        self.times_ms.push(time_ms as f64);
    }

    /// Records a trial that failed before producing a result.
    pub fn fail(&mut self) {
        self.trials += 1;
    }

    /// Flushes the accumulators into a summary.
    #[must_use]
    pub fn summary(&self) -> ConfigurationSummary {
        let (mean_time_ms, stddev_time_ms) = if self.times_ms.is_empty() {
            let none = MetricValue::Undefined {
                reason: Degeneracy::NoSamples,
            };
            (none, none)
        } else {
            (
                MetricValue::Defined(mean(&self.times_ms)),
                MetricValue::Defined(stddev(&self.times_ms)),
            )
        };
        ConfigurationSummary {
            clusters: self.clusters,
            mu: self.params.mu,
            theta: self.params.theta,
            trials: self.trials,
            scored_trials: self.nmi.count,
            undefined_trials: self.nmi.skipped,
            mean_nmi: self.nmi.mean(),
            total_time_ms: self.total_time_ms,
            mean_time_ms,
            stddev_time_ms,
        }
    }
}

/// Outcome of one clustering trial.
struct Trial {
    nmi: MetricValue,
    time_ms: u64,
}

/// Drives an oracle over the dataset catalog.
pub struct Orchestrator<'a, O: Oracle> {
    oracle: &'a mut O,
    registry: &'a TokenRegistry,
    paths: EvalPaths,
    catalog: DatasetCatalog,
}

impl<'a, O: Oracle> Orchestrator<'a, O> {
    /// Creates an orchestrator over the catalog discovered under the root.
    ///
    /// # Errors
    ///
    /// Returns `DataError::InvalidDirectory` if the dataset directories are
    /// missing.
    pub fn new(
        oracle: &'a mut O,
        registry: &'a TokenRegistry,
        paths: EvalPaths,
    ) -> Result<Self, EvalError> {
        let catalog = DatasetCatalog::discover(&paths.root)?;
        info!(
            domain = catalog.domain.len(),
            clean = catalog.clean.len(),
            "discovered datasets"
        );
        Ok(Self::with_catalog(oracle, registry, paths, catalog))
    }

    /// Creates an orchestrator over an explicit catalog.
    #[must_use]
    pub fn with_catalog(
        oracle: &'a mut O,
        registry: &'a TokenRegistry,
        paths: EvalPaths,
        catalog: DatasetCatalog,
    ) -> Self {
        Self {
            oracle,
            registry,
            paths,
            catalog,
        }
    }

    /// Returns the dataset catalog.
    #[must_use]
    pub fn catalog(&self) -> &DatasetCatalog {
        &self.catalog
    }

    fn short_path(&self, path: &Path) -> String {
        path.strip_prefix(&self.paths.root)
            .unwrap_or(path)
            .display()
            .to_string()
    }

    fn warm_up(&mut self) {
        if let Err(e) = self.oracle.learn_top_k(1, &WARM_UP) {
            debug!(error = %e, "warm-up call failed");
        }
        self.oracle.clear_cache();
    }

    fn learn(&mut self, constraints: &Constraints) -> Result<(Option<O::Program>, u64), EvalError> {
        let start = Instant::now();
        let learned = self.oracle.learn(constraints);
        let time_ms = elapsed_ms(start);
        self.oracle.clear_cache();
        Ok((learned?, time_ms))
    }

    fn base_constraints(&self, params: ClusteringParameters) -> Constraints {
        Constraints::new()
            .with_allowed_tokens(self.registry.default_atoms().clone())
            .with_clustering(params)
    }

    /// Measures how well learned disjuncts recover the datasets strings were
    /// drawn from, for every cluster count in the configured range.
    ///
    /// Writes `logs/NMI-{mu}x{theta}.log` and progress to `out`.
    ///
    /// # Errors
    ///
    /// Returns `EvalError::Io` if the log cannot be written.
    pub fn estimate_clustering(
        &mut self,
        config: &ClusteringConfig,
        out: &mut impl Write,
    ) -> Result<ClusteringReport, EvalError> {
        let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
        self.warm_up();

        let params = config.params;
        let log_path = self
            .paths
            .logs_dir()
            .join(format!("NMI-{}x{}.log", params.mu, params.theta));
        let mut log = create_log(&log_path)?;
        info!(log = %log_path.display(), "clustering estimate");

        write!(
            out,
            "\n[+] Accuracy of recovering N in [{},{}] clusters NMI with (θ={},μ={}) @ {} strings x {} trials ...",
            config.min_clusters,
            config.max_clusters,
            params.theta,
            params.mu,
            config.strings_per_cluster,
            config.trials
        )
        .map_err(io_err("write progress"))?;

        let mut configurations = Vec::new();
        let mut skipped = Vec::new();
        for clusters in config.min_clusters..=config.max_clusters {
            write!(out, "\nN = {clusters}:").map_err(io_err("write progress"))?;
            writeln!(log, "\n\nN = {clusters} ... ").map_err(io_err("write NMI log"))?;

            let mut run = ConfigurationRun::new(clusters, params);
            for trial in 1..=config.trials {
                match self.clustering_trial(clusters, config, &mut rng, &mut log) {
                    Ok(result) => {
                        write!(
                            out,
                            "   {:4.2} ({:3}s)",
                            result.nmi,
                            (result.time_ms + 500) / 1000
                        )
                        .map_err(io_err("write progress"))?;
                        run.record(result.nmi, result.time_ms);
                    }
                    Err(e) => {
                        warn!(clusters, trial, error = %e, "skipping clustering trial");
                        skipped.push(SkippedItem::new(
                            format!("N={clusters} trial {trial}"),
                            e.to_string(),
                        ));
                        run.fail();
                    }
                }
            }

            let summary = run.summary();
            writeln!(log, "\n\nSum(Time) = {}ms", summary.total_time_ms)
                .and_then(|()| writeln!(log, "Avg(Time) = {:.2}ms", summary.mean_time_ms))
                .and_then(|()| writeln!(log, "StdDev(Time) = {:.2}ms", summary.stddev_time_ms))
                .and_then(|()| writeln!(log, "Avg(NMI) = {:4.2}", summary.mean_nmi))
                .and_then(|()| log.flush())
                .map_err(io_err("write NMI log"))?;
            configurations.push(summary);
        }
        writeln!(out).map_err(io_err("write progress"))?;

        Ok(ClusteringReport {
            metadata: ReportMetadata::for_root(&self.paths.root),
            configurations,
            skipped,
        })
    }

    fn clustering_trial(
        &mut self,
        clusters: usize,
        config: &ClusteringConfig,
        rng: &mut ChaCha8Rng,
        log: &mut impl Write,
    ) -> Result<Trial, EvalError> {
        let available = self.catalog.clean.len();
        if available < clusters {
            return Err(DataError::NotEnoughDatasets {
                needed: clusters,
                available,
            }
            .into());
        }

        let mut columns = self.catalog.clean.clone();
        columns.shuffle(rng);
        columns.truncate(clusters);

        let mut data = Vec::with_capacity(clusters);
        for column in &columns {
            let mut seen = HashSet::new();
            let mut strings: Vec<String> = load_non_empty(column)?
                .into_iter()
                .filter(|s| seen.insert(s.clone()))
                .collect();
            strings.shuffle(rng);
            strings.truncate(config.strings_per_cluster);
            data.push(strings);
        }

        writeln!(log, "\n\n{}", "=".repeat(80))
            .and_then(|()| writeln!(log, "Data:"))
            .map_err(io_err("write NMI log"))?;
        for (column, strings) in columns.iter().zip(&data).rev() {
            writeln!(log, "  [#] {} = {}", self.short_path(column), strings.join(JOIN))
                .map_err(io_err("write NMI log"))?;
        }
        log.flush().map_err(io_err("write NMI log"))?;

        let mut positives: Vec<&String> = data.iter().flatten().collect();
        positives.shuffle(rng);
        let limit = u32::try_from(clusters).unwrap_or(u32::MAX);
        let constraints = self
            .base_constraints(config.params)
            .with_positives(positives.into_iter().cloned())
            .with_disjuncts(DisjunctsLimit::exactly(limit));

        let (program, time_ms) = self.learn(&constraints)?;
        let descriptions = program.as_ref().map(Program::describe).unwrap_or_default();

        let truth = Partition::new(data);
        let derived = Partition::group_by(truth.clusters().iter().flatten().cloned(), |s| {
            program.as_ref().and_then(|p| p.matching_disjunct(s))
        });
        let nmi = normalized_mutual_information(&truth, &derived);
        debug!(clusters, %nmi, time_ms, "clustering trial");

        writeln!(log, "\nProfile:\n  [$] {}", descriptions.join("\n  [$] "))
            .and_then(|()| writeln!(log, "\nClusters"))
            .map_err(io_err("write NMI log"))?;
        for cluster in derived.clusters() {
            writeln!(log, "  [=]  {}", cluster.join(JOIN)).map_err(io_err("write NMI log"))?;
        }
        writeln!(log, "\n{nmi:4.2} @ {time_ms:5}ms").map_err(io_err("write NMI log"))?;

        Ok(Trial { nmi, time_ms })
    }

    /// Learns from a fraction of every domain dataset and classifies the
    /// held-out remainder against samples of every other dataset.
    ///
    /// Writes `logs/Quality.{mu}x{theta}.{fraction}.log`, the splits under
    /// `logs/datasets.{fraction}/`, and a progress table to `out`.
    ///
    /// # Errors
    ///
    /// Returns `DataError::NotEnoughDatasets` with fewer than two domain
    /// datasets, or `EvalError::Io` if a log cannot be written.
    pub fn estimate_quality(
        &mut self,
        config: &QualityConfig,
        out: &mut impl Write,
    ) -> Result<QualityReport, EvalError> {
        let domain = self.catalog.domain.clone();
        if domain.len() < 2 {
            return Err(DataError::NotEnoughDatasets {
                needed: 2,
                available: domain.len(),
            }
            .into());
        }

        let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
        self.warm_up();

        let params = config.params;
        let logs = self.paths.logs_dir();
        let log_path = logs.join(format!(
            "Quality.{:.2}x{:.2}.{:.2}.log",
            params.mu, params.theta, config.profile_fraction
        ));
        let splits_dir = logs.join(format!("datasets.{}", config.profile_fraction));
        let mut log = create_log(&log_path)?;
        info!(log = %log_path.display(), datasets = domain.len(), "quality estimate");

        writeln!(out, "  {:>50} => (+VE) - (-VE) =   Δ   | Avg Δ", "FILENAME")
            .and_then(|()| writeln!(out, "{}", "-".repeat(128)))
            .map_err(io_err("write progress"))?;

        let mut datasets = Vec::new();
        let mut skipped = Vec::new();
        let mut summary = QualitySummary::new();
        for (i, path) in domain.iter().enumerate() {
            let short = self.short_path(path);
            match self.quality_dataset(i, path, &domain, config, &mut rng) {
                Ok(Some((entry, split))) => {
                    summary.push(&entry.outcome);
                    write_quality_row(out, &short, &entry.outcome, &summary)
                        .map_err(io_err("write progress"))?;
                    split.write(&splits_dir, i, path)?;
                    write_quality_log(&mut log, &short, &split.profiled, &entry)
                        .map_err(io_err("write quality log"))?;
                    datasets.push(entry);
                }
                Ok(None) => {
                    writeln!(out, "> {short:>50} => ignore: dataset too small")
                        .map_err(io_err("write progress"))?;
                    skipped.push(SkippedItem::new(short, "dataset too small"));
                }
                Err(e) => {
                    warn!(dataset = %short, error = %e, "skipping dataset");
                    skipped.push(SkippedItem::new(short, e.to_string()));
                }
            }
        }

        let report = QualityReport {
            metadata: ReportMetadata::for_root(&self.paths.root),
            profile_fraction: config.profile_fraction,
            mu: params.mu,
            theta: params.theta,
            datasets,
            skipped,
            summary,
            average_score: summary.average_score(),
            precision: summary.precision.mean(),
            recall: summary.recall.mean(),
            f1: summary.f1(),
        };

        write!(log, "> Summary:")
            .and_then(|()| write!(log, "\n  * Average Score = {}", report.average_score))
            .and_then(|()| write!(log, "\n  * Precision = {}", report.precision))
            .and_then(|()| write!(log, "\n  * Recall = {}", report.recall))
            .and_then(|()| write!(log, "\n  * F1 = {}", report.f1))
            .and_then(|()| log.flush())
            .map_err(io_err("write quality log"))?;
        writeln!(
            out,
            "\n> Processed = {}   :   Precision = {}  |  Recall = {}  |  F1 = {}",
            summary.processed, report.precision, report.recall, report.f1
        )
        .map_err(io_err("write progress"))?;

        Ok(report)
    }

    fn quality_dataset(
        &mut self,
        index: usize,
        path: &Path,
        domain: &[PathBuf],
        config: &QualityConfig,
        rng: &mut ChaCha8Rng,
    ) -> Result<Option<(DatasetQuality, Split)>, EvalError> {
        let mut inputs = load_non_empty(path)?;
        inputs.shuffle(rng);

        let profile_size = fraction_of(inputs.len(), config.profile_fraction);
        if profile_size < config.min_profile_size {
            return Ok(None);
        }
        let held_out = inputs.split_off(profile_size);
        let profiled = inputs;

        let share = (held_out.len() / (domain.len() - 1)).max(1);
        let mut should_not_match = Vec::new();
        for other in domain.iter().filter(|other| other.as_path() != path) {
            match load_non_empty(other) {
                Ok(mut strings) => {
                    strings.shuffle(rng);
                    strings.truncate(share);
                    should_not_match.extend(strings);
                }
                Err(e) => {
                    warn!(dataset = %self.short_path(other), error = %e, "skipping mismatch source");
                }
            }
        }
        let mut should_match = held_out;
        should_match.truncate(should_not_match.len());

        let constraints = self
            .base_constraints(config.params)
            .with_positives(profiled.iter().cloned());
        let (program, _) = self.learn(&constraints)?;
        let outcome = evaluate(program.as_ref(), &should_match, &should_not_match);
        debug!(dataset = index, delta = %outcome.delta, "quality dataset");

        let entry = DatasetQuality {
            dataset: self.short_path(path),
            profiled: profiled.len(),
            patterns: program.as_ref().map(Program::describe).unwrap_or_default(),
            outcome,
        };
        Ok(Some((
            entry,
            Split {
                profiled,
                should_match,
                should_not_match,
            },
        )))
    }

    /// Scores same-dataset pairs (ground truth `true`) and cross-dataset
    /// pairs (ground truth `false`) over the clean datasets.
    ///
    /// Appends every record to `logs/Similarity.log`.
    ///
    /// # Errors
    ///
    /// Returns `EvalError::Io` if the log cannot be written.
    pub fn estimate_similarity(
        &mut self,
        config: &SimilarityConfig,
        out: &mut impl Write,
    ) -> Result<SimilarityReport, EvalError> {
        let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
        self.warm_up();

        let log_path = self.paths.logs_dir().join("Similarity.log");
        let mut log = create_log(&log_path)?;
        info!(log = %log_path.display(), "similarity estimate");

        let mut skipped = Vec::new();
        let mut loaded = Vec::new();
        for path in &self.catalog.clean {
            match load_non_empty(path) {
                Ok(strings) => loaded.push(strings),
                Err(e) => {
                    warn!(dataset = %self.short_path(path), error = %e, "skipping dataset");
                    skipped.push(SkippedItem::new(self.short_path(path), e.to_string()));
                }
            }
        }

        let scorer = SimilarityScorer::new(self.registry);
        let mut records = Vec::new();
        let mut similar = RunningMean::new();
        let mut dissimilar = RunningMean::new();
        for (i, inputs) in loaded.iter().enumerate() {
            let progress = 100.0 * count_as_f64(i) / count_as_f64(loaded.len());
            write!(
                out,
                "\r[+] Saving to {}: [{:8} +ve, {:8} -ve] ... {progress:5.2} %",
                log_path.display(),
                similar.count,
                dissimilar.count
            )
            .and_then(|()| out.flush())
            .map_err(io_err("write progress"))?;

            let mut pairs = similar_pairs(inputs, config.sim_count, &mut rng);
            for (_, other) in loaded.iter().enumerate().filter(|(j, _)| *j != i) {
                pairs.extend(dissimilar_pairs(inputs, other, config.dis_count, &mut rng));
            }

            for (ground_truth, a, b) in pairs {
                match scorer.score(&mut *self.oracle, ground_truth, &a, &b) {
                    Ok(record) => {
                        writeln!(log, "{record}").map_err(io_err("write similarity log"))?;
                        let target = if ground_truth { &mut similar } else { &mut dissimilar };
                        target.push(MetricValue::Defined(record.score));
                        records.push(record);
                    }
                    Err(e) => {
                        warn!(a = %a, b = %b, error = %e, "skipping pair");
                        skipped.push(SkippedItem::new(format!("{a:?} / {b:?}"), e.to_string()));
                    }
                }
            }
        }
        log.flush().map_err(io_err("write similarity log"))?;
        writeln!(
            out,
            "\r[+] Saving to {}: [{:8} +ve, {:8} -ve] ... 100 %",
            log_path.display(),
            similar.count,
            dissimilar.count
        )
        .map_err(io_err("write progress"))?;

        Ok(SimilarityReport {
            metadata: ReportMetadata::for_root(&self.paths.root),
            similar_pairs: similar.count,
            dissimilar_pairs: dissimilar.count,
            mean_similar_score: similar.mean(),
            mean_dissimilar_score: dissimilar.mean(),
            records,
            skipped,
        })
    }
}

/// Up to `count` ordered pairs of distinct strings from one dataset.
fn similar_pairs(
    inputs: &[String],
    count: usize,
    rng: &mut ChaCha8Rng,
) -> Vec<(bool, String, String)> {
    let mut first = inputs.to_vec();
    first.shuffle(rng);
    let mut second = inputs.to_vec();
    second.shuffle(rng);

    first
        .iter()
        .flat_map(|a| second.iter().map(move |b| (a, b)))
        .filter(|(a, b)| a != b)
        .take(count)
        .map(|(a, b)| (true, a.clone(), b.clone()))
        .collect()
}

/// `count x count` pairs across two datasets.
fn dissimilar_pairs(
    inputs: &[String],
    other: &[String],
    count: usize,
    rng: &mut ChaCha8Rng,
) -> Vec<(bool, String, String)> {
    let mut theirs = other.to_vec();
    theirs.shuffle(rng);
    theirs.truncate(count);
    let mut ours = inputs.to_vec();
    ours.shuffle(rng);
    ours.truncate(count);

    ours.iter()
        .flat_map(|a| theirs.iter().map(move |b| (false, a.clone(), b.clone())))
        .collect()
}

/// The three pools of one quality dataset.
struct Split {
    profiled: Vec<String>,
    should_match: Vec<String>,
    should_not_match: Vec<String>,
}

impl Split {
    /// Writes `{index}_{stem}.profiled`, `.match` and `.mismatch`.
    fn write(&self, dir: &Path, index: usize, path: &Path) -> Result<(), EvalError> {
        std::fs::create_dir_all(dir).map_err(io_err("create datasets directory"))?;
        let stem = path
            .file_stem()
            .map_or_else(String::new, |s| s.to_string_lossy().into_owned());
        for (extension, pool) in [
            ("profiled", &self.profiled),
            ("match", &self.should_match),
            ("mismatch", &self.should_not_match),
        ] {
            let target = dir.join(format!("{index}_{stem}.{extension}"));
            std::fs::write(&target, pool.join("\n")).map_err(io_err("write dataset split"))?;
        }
        Ok(())
    }
}

fn write_quality_row(
    out: &mut impl Write,
    short: &str,
    outcome: &ClassificationOutcome,
    summary: &QualitySummary,
) -> io::Result<()> {
    writeln!(
        out,
        "> {short:>50} => {:.3} - {:.3} = {:.3} | {:.3}",
        outcome.match_rate,
        outcome.mismatch_rate,
        outcome.delta,
        summary.average_score()
    )
}

fn write_quality_log(
    log: &mut impl Write,
    short: &str,
    profiled: &[String],
    entry: &DatasetQuality,
) -> io::Result<()> {
    writeln!(log, "> {short}\n")?;
    writeln!(log, "  * Profiled Subset of Data:\n    {}\n", profiled.join("\n    "))?;
    writeln!(log, "  * Default Profile:\n    {}\n", entry.patterns.join("\n    "))?;
    writeln!(
        log,
        "  * Result:\n    + Match = {}\n    + Mismatch = {}\n    + Score = {}\n\n- - - - - - - -\n",
        entry.outcome.match_rate, entry.outcome.mismatch_rate, entry.outcome.delta
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::{tempdir, TempDir};
    use textprofile::SignatureLearner;

    fn write_dataset(root: &Path, relative: &str, data: &[String]) {
        let path = root.join(relative);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        let json = serde_json::json!({ "data": data, "results": [] });
        let mut file = std::fs::File::create(path).unwrap();
        file.write_all(json.to_string().as_bytes()).unwrap();
    }

    /// Three syntactically distinct clean datasets plus one hetero dataset.
    fn fixture() -> TempDir {
        let dir = tempdir().unwrap();
        let root = dir.path();
        let dates: Vec<String> = (1..=20).map(|i| format!("2019-{:02}-{:02}", i % 12 + 1, i)).collect();
        let words: Vec<String> = (0..20).map(|i| "abcdefghijklmnopqrstu"[i..=i].repeat(3 + i % 4)).collect();
        let codes: Vec<String> = (0..20).map(|i| format!("ID_{i:04}")).collect();
        write_dataset(root, "tests/homo/dates.json", &dates);
        write_dataset(root, "tests/homo/words.json", &words);
        write_dataset(root, "tests/homo/codes.json", &codes);
        write_dataset(root, "tests/hetero/mixed.json", &[String::new()]);
        dir
    }

    #[test]
    fn fraction_rounds_and_clamps() {
        assert_eq!(fraction_of(10, 0.25), 2);
        assert_eq!(fraction_of(5, 0.5), 2);
        assert_eq!(fraction_of(7, 0.5), 4);
        assert_eq!(fraction_of(10, 0.0), 0);
        assert_eq!(fraction_of(10, 2.0), 10);
        assert_eq!(fraction_of(0, 0.5), 0);
    }

    #[test]
    fn configuration_run_tracks_failures() {
        let mut run = ConfigurationRun::new(3, ClusteringParameters::default());
        run.record(MetricValue::Defined(1.0), 10);
        run.record(MetricValue::Defined(0.5), 30);
        run.fail();

        let summary = run.summary();
        assert_eq!(summary.trials, 3);
        assert_eq!(summary.scored_trials, 2);
        assert_eq!(summary.mean_nmi, MetricValue::Defined(0.75));
        assert_eq!(summary.total_time_ms, 40);
        assert_eq!(summary.mean_time_ms, MetricValue::Defined(20.0));
        let spread = summary.stddev_time_ms.value().unwrap();
        assert!((spread - 200.0_f64.sqrt()).abs() < 1e-9);
    }

    #[test]
    fn configuration_run_without_timings_is_undefined() {
        let mut run = ConfigurationRun::new(2, ClusteringParameters::default());
        run.fail();

        let summary = run.summary();
        assert!(!summary.mean_time_ms.is_defined());
        assert!(!summary.stddev_time_ms.is_defined());
    }

    #[test]
    fn clustering_recovers_distinct_datasets() {
        let dir = fixture();
        let registry = TokenRegistry::new();
        let mut learner = SignatureLearner::new(&registry);
        let mut orchestrator =
            Orchestrator::new(&mut learner, &registry, EvalPaths::new(dir.path())).unwrap();

        let config = ClusteringConfig::default()
            .with_trials(2)
            .with_strings_per_cluster(8)
            .with_cluster_range(2, 4);
        let mut out = Vec::new();
        let report = orchestrator.estimate_clustering(&config, &mut out).unwrap();

        assert_eq!(report.configurations.len(), 3);
        let two = &report.configurations[0];
        assert_eq!(two.scored_trials, 2);
        let nmi = two.mean_nmi.value().unwrap();
        assert!((nmi - 1.0).abs() < 1e-9, "NMI {nmi}");

        // Only three clean datasets exist.
        let four = &report.configurations[2];
        assert_eq!(four.scored_trials, 0);
        assert_eq!(report.skipped.len(), 2);

        let log = std::fs::read_to_string(dir.path().join("logs/NMI-4x1.25.log")).unwrap();
        assert!(log.contains("N = 2 ... "));
        assert!(log.contains("Avg(NMI) = 1.00"));
    }

    #[test]
    fn quality_writes_splits_and_summary() {
        let dir = fixture();
        let registry = TokenRegistry::new();
        let mut learner = SignatureLearner::new(&registry);
        let mut orchestrator =
            Orchestrator::new(&mut learner, &registry, EvalPaths::new(dir.path())).unwrap();

        let mut out = Vec::new();
        let report = orchestrator
            .estimate_quality(&QualityConfig::new(0.5), &mut out)
            .unwrap();

        // mixed.json has no non-empty strings.
        assert_eq!(report.datasets.len(), 3);
        assert_eq!(report.skipped.len(), 1);
        // Three strings from each of the two other readable datasets.
        for entry in &report.datasets {
            assert_eq!(entry.profiled, 10);
            assert_eq!(entry.outcome.should_not_match, 6);
            assert_eq!(entry.outcome.should_match, 6);
        }
        assert!(report.precision.is_defined());

        let dates = report
            .datasets
            .iter()
            .find(|d| d.dataset.ends_with("dates.json"))
            .unwrap();
        assert_eq!(dates.outcome.match_rate, MetricValue::Defined(1.0));
        assert_eq!(dates.outcome.mismatch_rate, MetricValue::Defined(0.0));

        let index = orchestrator
            .catalog()
            .domain
            .iter()
            .position(|p| p.ends_with("dates.json"))
            .unwrap();
        let splits = dir.path().join("logs/datasets.0.5");
        let profiled = std::fs::read_to_string(splits.join(format!("{index}_dates.profiled"))).unwrap();
        assert_eq!(profiled.lines().count(), 10);
        assert!(dir.path().join("logs/Quality.4.00x1.25.0.50.log").exists());
    }

    #[test]
    fn quality_skips_small_datasets() {
        let dir = fixture();
        let registry = TokenRegistry::new();
        let mut learner = SignatureLearner::new(&registry);
        let mut orchestrator =
            Orchestrator::new(&mut learner, &registry, EvalPaths::new(dir.path())).unwrap();

        let mut out = Vec::new();
        let report = orchestrator
            .estimate_quality(&QualityConfig::new(0.2), &mut out)
            .unwrap();
        assert!(report.datasets.is_empty());
        assert!(!report.average_score.is_defined());
        assert!(String::from_utf8(out).unwrap().contains("ignore: dataset too small"));
    }

    #[test]
    fn quality_needs_two_datasets() {
        let dir = tempdir().unwrap();
        write_dataset(dir.path(), "tests/homo/only.json", &["x".to_string()]);
        let registry = TokenRegistry::new();
        let mut learner = SignatureLearner::new(&registry);
        let mut orchestrator =
            Orchestrator::new(&mut learner, &registry, EvalPaths::new(dir.path())).unwrap();

        let result = orchestrator.estimate_quality(&QualityConfig::new(0.5), &mut io::sink());
        assert!(matches!(
            result,
            Err(EvalError::Data(DataError::NotEnoughDatasets { needed: 2, available: 1 }))
        ));
    }

    #[test]
    fn similarity_separates_datasets() {
        let dir = fixture();
        let registry = TokenRegistry::new();
        let mut learner = SignatureLearner::new(&registry);
        let mut orchestrator =
            Orchestrator::new(&mut learner, &registry, EvalPaths::new(dir.path())).unwrap();

        let mut out = Vec::new();
        let report = orchestrator
            .estimate_similarity(&SimilarityConfig::new(4, 2), &mut out)
            .unwrap();

        assert_eq!(report.similar_pairs, 3 * 4);
        assert_eq!(report.dissimilar_pairs, 3 * 2 * 2 * 2);
        assert!(
            report.mean_similar_score.value().unwrap() > report.mean_dissimilar_score.value().unwrap()
        );
        assert!(report.records.iter().all(|r| r.string_a != r.string_b || !r.ground_truth));

        let log = std::fs::read_to_string(dir.path().join("logs/Similarity.log")).unwrap();
        assert_eq!(log.matches("=> \"").count(), 2 * report.records.len());
    }
}
