//! `textprofile-eval`: evaluate a pattern profiler over a dataset root.

use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use textprofile::{ClusteringParameters, SignatureLearner, TokenRegistry, DEFAULT_MU, DEFAULT_THETA};
use textprofile_eval::eta::parse_argument;
use textprofile_eval::{
    compute_eta, logging, profile_dataset, report, run_suite, ClusteringConfig, EtaConfig,
    EvalError, EvalPaths, Orchestrator, ProfileConfig, QualityConfig, SimilarityConfig,
};
use tracing::{error, info};

/// Evaluate a pattern profiler: clustering, quality, similarity and dataset tests
#[derive(Parser)]
#[command(name = "textprofile-eval")]
#[command(author, version, about)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Root directory holding `tests/` and `logs/`
    #[arg(long, global = true, default_value = ".")]
    root: PathBuf,

    /// Vocabulary directory [default: <root>/semantic_atoms]
    #[arg(long, global = true)]
    atoms_dir: Option<PathBuf>,

    /// Print the JSON report instead of the text output
    #[arg(long, global = true)]
    json: bool,

    /// Debug-level diagnostics (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Profile every test case of a dataset file
    Profile(ProfileArgs),

    /// Pairwise dissimilarity of strings and a sample of consistent patterns
    Eta(EtaArgs),

    /// Score same-dataset and cross-dataset string pairs
    Similarity(SimilarityArgs),

    /// Classify held-out strings with programs learned from a fraction of each dataset
    Quality(QualityArgs),

    /// Recover source datasets from learned disjuncts (NMI)
    Clustering(ClusteringArgs),

    /// Run the dataset test suite
    Tests(TestsArgs),
}

#[derive(Args)]
struct ProfileArgs {
    /// Dataset file
    data_file: PathBuf,

    /// Print the learned program
    #[arg(short, long)]
    show_program: bool,

    /// Example strings shown per pattern
    #[arg(short, long, default_value_t = 1)]
    num_examples: usize,
}

#[derive(Args)]
struct EtaArgs {
    /// Strings to compare; `([NULL])` is missing and `([EMPTY])` is ""
    #[arg(required = true, num_args = 2.., allow_hyphen_values = true)]
    strings: Vec<String>,

    /// Sampled patterns to show
    #[arg(short, long, default_value_t = 5)]
    num_candidates: usize,

    /// Sampling seed
    #[arg(long)]
    seed: Option<u64>,
}

#[derive(Args)]
struct SimilarityArgs {
    /// Same-dataset pairs per dataset
    #[arg(short, long)]
    sim_count: usize,

    /// Strings per side for each pair of datasets
    #[arg(short, long)]
    dis_count: usize,
}

#[derive(Args)]
struct QualityArgs {
    /// Fraction of each dataset to learn from, in (0, 1]
    #[arg(value_parser = parse_fraction)]
    profile_fraction: f64,

    /// Merge tolerance θ
    #[arg(short, long, default_value_t = DEFAULT_THETA)]
    theta: f64,

    /// Disjunct allowance μ
    #[arg(short, long, default_value_t = DEFAULT_MU)]
    mu: f64,
}

#[derive(Args)]
struct ClusteringArgs {
    /// Trials per cluster count
    #[arg(short, long, default_value_t = 10)]
    trials: usize,

    /// Strings drawn from each dataset
    #[arg(short, long, default_value_t = 256)]
    strings: usize,

    /// Smallest cluster count
    #[arg(short, long, default_value_t = 2)]
    min: usize,

    /// Largest cluster count
    #[arg(short = 'M', long, default_value_t = 8)]
    max: usize,

    /// Merge tolerance θ
    #[arg(short = 'e', long, default_value_t = DEFAULT_THETA)]
    theta: f64,

    /// Disjunct allowance μ
    #[arg(short = 'u', long, default_value_t = DEFAULT_MU)]
    mu: f64,
}

#[derive(Args)]
struct TestsArgs {
    /// Directories of dataset files [default: tests/homo, tests/hetero and
    /// tests/homo.simple under the root]
    dirs: Vec<PathBuf>,
}

fn parse_fraction(s: &str) -> Result<f64, String> {
    let fraction: f64 = s.parse().map_err(|e| format!("{e}"))?;
    if fraction > 0.0 && fraction <= 1.0 {
        Ok(fraction)
    } else {
        Err(format!("{fraction} is not in (0, 1]"))
    }
}

fn load_registry(paths: &EvalPaths) -> Result<TokenRegistry, EvalError> {
    if paths.atoms_dir.is_dir() {
        let registry = TokenRegistry::with_semantic_atoms(&paths.atoms_dir)?;
        info!(dir = %paths.atoms_dir.display(), "loaded semantic atoms");
        Ok(registry)
    } else {
        info!(dir = %paths.atoms_dir.display(), "no semantic atoms directory");
        Ok(TokenRegistry::new())
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<(), EvalError> {
    let json = report::to_json(value)?;
    writeln!(io::stdout(), "{json}").map_err(|e| EvalError::io("write report", &e))
}

/// Runs the command; `Ok(false)` means the dataset tests failed.
fn run(cli: Cli) -> Result<bool, EvalError> {
    let mut paths = EvalPaths::new(&cli.root);
    if let Some(dir) = &cli.atoms_dir {
        paths = paths.with_atoms_dir(dir);
    }
    let registry = load_registry(&paths)?;
    let mut learner = SignatureLearner::new(&registry);

    let mut out: Box<dyn Write> = if cli.json {
        Box::new(io::sink())
    } else {
        Box::new(io::stdout().lock())
    };

    match cli.command {
        Commands::Profile(args) => {
            let config = ProfileConfig::default()
                .with_show_program(args.show_program)
                .with_num_examples(args.num_examples);
            let report =
                profile_dataset(&mut learner, &registry, &args.data_file, &config, &mut out)?;
            if cli.json {
                print_json(&report)?;
            }
        }
        Commands::Eta(args) => {
            let inputs: Vec<Option<String>> =
                args.strings.iter().map(|s| parse_argument(s)).collect();
            let mut config = EtaConfig::default().with_num_candidates(args.num_candidates);
            if let Some(seed) = args.seed {
                config = config.with_seed(seed);
            }
            let report = compute_eta(&mut learner, &registry, &inputs, &config, &mut out)?;
            if cli.json {
                print_json(&report)?;
            }
        }
        Commands::Similarity(args) => {
            let config = SimilarityConfig::new(args.sim_count, args.dis_count);
            let mut orchestrator = Orchestrator::new(&mut learner, &registry, paths)?;
            let report = orchestrator.estimate_similarity(&config, &mut out)?;
            if cli.json {
                print_json(&report)?;
            }
        }
        Commands::Quality(args) => {
            let config = QualityConfig::new(args.profile_fraction)
                .with_params(ClusteringParameters::new(args.mu, args.theta));
            let mut orchestrator = Orchestrator::new(&mut learner, &registry, paths)?;
            let report = orchestrator.estimate_quality(&config, &mut out)?;
            if cli.json {
                print_json(&report)?;
            }
        }
        Commands::Clustering(args) => {
            let config = ClusteringConfig::default()
                .with_trials(args.trials)
                .with_strings_per_cluster(args.strings)
                .with_cluster_range(args.min, args.max)
                .with_params(ClusteringParameters::new(args.mu, args.theta));
            let mut orchestrator = Orchestrator::new(&mut learner, &registry, paths)?;
            let report = orchestrator.estimate_clustering(&config, &mut out)?;
            if cli.json {
                print_json(&report)?;
            }
        }
        Commands::Tests(args) => {
            let dirs = if args.dirs.is_empty() {
                paths.default_suite_dirs()
            } else {
                args.dirs
            };
            let report = run_suite(&mut learner, &registry, &dirs, &mut out)?;
            if cli.json {
                print_json(&report)?;
            }
            out.flush().map_err(|e| EvalError::io("flush output", &e))?;
            return Ok(report.is_success());
        }
    }

    out.flush().map_err(|e| EvalError::io("flush output", &e))?;
    Ok(true)
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    match run(cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            error!(error = %e, "evaluation failed");
            ExitCode::FAILURE
        }
    }
}
