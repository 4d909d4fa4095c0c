//! Pairwise syntactic similarity through inverse pattern cost.

use std::fmt;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use textprofile::{Oracle, OracleError, Program, Token, TokenRegistry, NULL_PATTERN};

/// One scored string pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimilarityRecord {
    /// Whether the pair is expected to be similar.
    pub ground_truth: bool,
    /// Wall-clock synthesis latency.
    pub synthesis_time_ms: u64,
    /// Cost of the learned pattern.
    pub cost: f64,
    /// `1 / score_transform(cost)`.
    pub score: f64,
    /// Description of the learned pattern, or `<NULL>`.
    pub pattern: String,
    /// First string.
    pub string_a: String,
    /// Second string.
    pub string_b: String,
}

impl fmt::Display for SimilarityRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:>5}  |  [{:>5}] @ {:8.5} :: {:>96}\n       => \"{}\"\n       => \"{}\"",
            self.ground_truth,
            self.synthesis_time_ms,
            self.score,
            self.pattern,
            self.string_a,
            self.string_b
        )
    }
}

/// Joins every disjunct description of `program`.
#[must_use]
pub fn combined_description<P: Program>(program: &P) -> String {
    program.describe().join(" | ")
}

/// Scores string pairs with one `learn_top_k(1, [a, b])` call each.
#[derive(Debug, Clone, Copy)]
pub struct SimilarityScorer {
    fallback_cost: f64,
}

impl SimilarityScorer {
    /// Creates a scorer whose no-pattern cost is that of the registry's
    /// match-anything token.
    #[must_use]
    pub fn new(registry: &TokenRegistry) -> Self {
        Self {
            fallback_cost: -registry.any().score(),
        }
    }

    /// Cost charged when the oracle finds no pattern.
    #[must_use]
    pub const fn fallback_cost(&self) -> f64 {
        self.fallback_cost
    }

    /// Scores one pair; the oracle cache is cleared afterwards.
    ///
    /// # Errors
    ///
    /// Returns the oracle's error if the learning call faults.
    pub fn score<O: Oracle>(
        &self,
        oracle: &mut O,
        ground_truth: bool,
        a: &str,
        b: &str,
    ) -> Result<SimilarityRecord, OracleError> {
        let start = Instant::now();
        let learned = oracle.learn_top_k(1, &[a, b]);
        let elapsed = start.elapsed();
        oracle.clear_cache();
        let program = learned?;

        let (cost, pattern) = match &program {
            Some(p) => (p.cost(), combined_description(p)),
            None => (self.fallback_cost, NULL_PATTERN.to_string()),
        };

        Ok(SimilarityRecord {
            ground_truth,
            synthesis_time_ms: u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX),
            cost,
            score: 1.0 / oracle.score_transform(cost),
            pattern,
            string_a: a.to_string(),
            string_b: b.to_string(),
        })
    }
}
