//! Classification scoring: how well a learned program separates held-out
//! in-domain strings from out-of-domain strings.

use serde::{Deserialize, Serialize};
use textprofile::Program;

use crate::metrics::{Degeneracy, MetricValue, RunningMean};

/// Result of classifying two pools with one discriminator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClassificationOutcome {
    /// Should-match strings the discriminator accepted.
    pub matches: usize,
    /// Should-not-match strings the discriminator accepted.
    pub mismatches: usize,
    /// Size of the should-match pool, truncated to the should-not-match
    /// pool size.
    pub should_match: usize,
    /// Size of the should-not-match pool.
    pub should_not_match: usize,
    /// `matches / |should_match|`.
    pub match_rate: MetricValue,
    /// `mismatches / |should_not_match|`.
    pub mismatch_rate: MetricValue,
    /// `matches / (matches + mismatches)`.
    pub precision: MetricValue,
    /// `matches / |should_not_match|`.
    pub recall: MetricValue,
    /// Harmonic mean of precision and recall.
    pub f1: MetricValue,
    /// `match_rate - mismatch_rate`.
    pub delta: MetricValue,
}

/// Computes F1 from precision and recall.
///
/// Undefined if either input is undefined or both are zero.
#[must_use]
pub fn f1_score(precision: MetricValue, recall: MetricValue) -> MetricValue {
    match (precision.value(), recall.value()) {
        (Some(p), Some(r)) => MetricValue::ratio(2.0 * p * r, p + r, Degeneracy::ZeroPrecisionRecall),
        (None, _) => precision,
        (_, None) => recall,
    }
}

/// Scores an arbitrary discriminator against the two pools.
///
/// Only the first `|should_not_match|` strings of `should_match` are
/// classified, so recall (measured against the should-not-match pool size)
/// stays within `[0, 1]`.
///
/// # Examples
///
/// ```
/// use textprofile_eval::{evaluate_with, MetricValue};
///
/// let matching = ["1", "2", "3", "4"];
/// let others = ["a", "b", "c", "d"];
/// let outcome = evaluate_with(|s| s.chars().all(|c| c.is_ascii_digit()), &matching, &others);
///
/// assert_eq!(outcome.precision, MetricValue::Defined(1.0));
/// assert_eq!(outcome.mismatch_rate, MetricValue::Defined(0.0));
/// ```
#[must_use]
pub fn evaluate_with<F, S>(run: F, should_match: &[S], should_not_match: &[S]) -> ClassificationOutcome
where
    F: Fn(&str) -> bool,
    S: AsRef<str>,
{
    let should_match = &should_match[..should_match.len().min(should_not_match.len())];
    let matches = should_match.iter().filter(|s| run(s.as_ref())).count();
    let mismatches = should_not_match.iter().filter(|s| run(s.as_ref())).count();

    let match_rate = MetricValue::count_ratio(matches, should_match.len(), Degeneracy::EmptyPool);
    let mismatch_rate =
        MetricValue::count_ratio(mismatches, should_not_match.len(), Degeneracy::EmptyPool);
    let precision = MetricValue::count_ratio(matches, matches + mismatches, Degeneracy::NoMatches);
    let recall = MetricValue::count_ratio(matches, should_not_match.len(), Degeneracy::EmptyPool);
    let delta = match (match_rate.value(), mismatch_rate.value()) {
        (Some(m), Some(n)) => MetricValue::Defined(m - n),
        _ => MetricValue::Undefined {
            reason: Degeneracy::EmptyPool,
        },
    };

    ClassificationOutcome {
        matches,
        mismatches,
        should_match: should_match.len(),
        should_not_match: should_not_match.len(),
        match_rate,
        mismatch_rate,
        precision,
        recall,
        f1: f1_score(precision, recall),
        delta,
    }
}

/// Scores a learned program; an absent program rejects everything.
#[must_use]
pub fn evaluate<P, S>(
    program: Option<&P>,
    should_match: &[S],
    should_not_match: &[S],
) -> ClassificationOutcome
where
    P: Program,
    S: AsRef<str>,
{
    evaluate_with(
        |s| program.is_some_and(|p| p.run(s)),
        should_match,
        should_not_match,
    )
}

/// Aggregate over per-dataset outcomes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct QualitySummary {
    /// Datasets aggregated.
    pub processed: usize,
    /// Running mean of `delta`.
    pub score: RunningMean,
    /// Running mean of precision.
    pub precision: RunningMean,
    /// Running mean of recall.
    pub recall: RunningMean,
}

impl QualitySummary {
    /// Creates an empty summary.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds one dataset's outcome.
    pub fn push(&mut self, outcome: &ClassificationOutcome) {
        self.processed += 1;
        self.score.push(outcome.delta);
        self.precision.push(outcome.precision);
        self.recall.push(outcome.recall);
    }

    /// Mean of the per-dataset scores.
    #[must_use]
    pub fn average_score(&self) -> MetricValue {
        self.score.mean()
    }

    /// F1 over the averaged precision and recall.
    #[must_use]
    pub fn f1(&self) -> MetricValue {
        f1_score(self.precision.mean(), self.recall.mean())
    }
}
