//! Pairwise dissimilarity of explicit strings, and a sample of the
//! patterns consistent with all of them.

use std::io::Write;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use textprofile::{Oracle, SolutionSpace, TokenRegistry, NULL_PATTERN};
use tracing::{info, warn};

use crate::config::EtaConfig;
use crate::error::EvalError;
use crate::metrics::mean;
use crate::sampler::sample;
use crate::similarity::{combined_description, SimilarityRecord, SimilarityScorer};

/// Command-line spelling of a missing string.
pub const NULL_ARGUMENT: &str = "([NULL])";

/// Command-line spelling of the empty string.
pub const EMPTY_ARGUMENT: &str = "([EMPTY])";

/// Decodes a command-line string: `([NULL])` is missing, `([EMPTY])` is "".
///
/// # Examples
///
/// ```
/// use textprofile_eval::eta::parse_argument;
///
/// assert_eq!(parse_argument("([NULL])"), None);
/// assert_eq!(parse_argument("([EMPTY])").as_deref(), Some(""));
/// assert_eq!(parse_argument("abc").as_deref(), Some("abc"));
/// ```
#[must_use]
pub fn parse_argument(argument: &str) -> Option<String> {
    match argument {
        NULL_ARGUMENT => None,
        EMPTY_ARGUMENT => Some(String::new()),
        s => Some(s.to_string()),
    }
}

/// A sampled pattern and its cost.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    /// Pattern description.
    pub pattern: String,
    /// Pattern cost.
    pub cost: f64,
}

/// Result of an `eta` run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EtaReport {
    /// Missing strings that were skipped.
    pub skipped_inputs: usize,
    /// One record per unordered pair, in input order.
    pub pairs: Vec<SimilarityRecord>,
    /// Mean pairwise cost, for more than two strings.
    pub average_cost: Option<f64>,
    /// Best single pattern over all strings, for more than two strings.
    pub best_pattern: Option<String>,
    /// Number of consistent single patterns.
    pub space_size: u128,
    /// Sampled patterns, ascending by description.
    pub candidates: Vec<Candidate>,
}

/// Scores every pair of `inputs`, then describes the space of patterns
/// consistent with all of them and prints a sample of it.
///
/// `None` entries are skipped with a warning. With no strings left the
/// report is empty and no learning call is made.
///
/// # Errors
///
/// Returns `EvalError::Oracle` if a learning call fails and `EvalError::Io`
/// if `out` fails.
pub fn compute_eta<O: Oracle>(
    oracle: &mut O,
    registry: &TokenRegistry,
    inputs: &[Option<String>],
    config: &EtaConfig,
    out: &mut impl Write,
) -> Result<EtaReport, EvalError> {
    let io = |e| EvalError::io("write eta", &e);

    let strings: Vec<&str> = inputs.iter().filter_map(Option::as_deref).collect();
    let skipped_inputs = inputs.len() - strings.len();
    if skipped_inputs > 0 {
        warn!(skipped = skipped_inputs, "skipping missing strings");
    }
    if strings.is_empty() {
        writeln!(out, "> No strings to compare.").map_err(io)?;
        return Ok(EtaReport {
            skipped_inputs,
            pairs: Vec::new(),
            average_cost: None,
            best_pattern: None,
            space_size: 0,
            candidates: Vec::new(),
        });
    }

    let scorer = SimilarityScorer::new(registry);
    let mut pairs = Vec::new();
    for (i, a) in strings.iter().enumerate() {
        for b in &strings[i + 1..] {
            let record = scorer.score(&mut *oracle, true, a, b)?;
            writeln!(out, "> {{ '{a}' , '{b}' }} => {}", record.pattern).map_err(io)?;
            writeln!(out, "> Pairwise Dissimilarity = {}\n", record.cost).map_err(io)?;
            pairs.push(record);
        }
    }

    let mut average_cost = None;
    let mut best_pattern = None;
    if strings.len() > 2 {
        let costs: Vec<f64> = pairs.iter().map(|r| r.cost).collect();
        let average = mean(&costs);
        writeln!(out, "> Avg. Pairwise Dissimilarity = {average:12.5}").map_err(io)?;
        average_cost = Some(average);

        let learned = oracle.learn_top_k(1, &strings);
        oracle.clear_cache();
        let best = learned?.map(|p| combined_description(&p));
        writeln!(
            out,
            "> Best Overall Pattern = {}",
            best.as_deref().unwrap_or(NULL_PATTERN)
        )
        .map_err(io)?;
        best_pattern = best;
    }

    let learned = oracle.learn_all(&strings);
    oracle.clear_cache();
    let space = learned?;
    let space_size = space.size();
    writeln!(out, "> Total Number of Consistent Patterns = {space_size}.").map_err(io)?;

    let mut candidates = Vec::new();
    if config.num_candidates > 0 {
        let mut rng = config
            .seed
            .map_or_else(ChaCha8Rng::from_entropy, ChaCha8Rng::seed_from_u64);
        let samples = sample(&space, config.num_candidates, &mut rng, &config.sampler);
        info!(sampled = samples.len(), draws = samples.draws(), "sampled patterns");

        writeln!(out, "\n> {} Randomly Selected Patterns:", samples.target()).map_err(io)?;
        for (pattern, cost) in samples.costs() {
            writeln!(out, "  * {cost:12.5} : {pattern}").map_err(io)?;
            candidates.push(Candidate {
                pattern: pattern.to_string(),
                cost,
            });
        }
    }

    Ok(EtaReport {
        skipped_inputs,
        pairs,
        average_cost,
        best_pattern,
        space_size,
        candidates,
    })
}
