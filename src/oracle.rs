//! Oracle trait definitions: the boundary to pattern-synthesis backends.
//!
//! Evaluation code only ever sees three capabilities of a learned program
//! (`describe`, `run`, and a scalar score), plus the solution-space handle
//! used for sampling. Any synthesis engine can sit behind these traits.

use rand::Rng;

use crate::constants::{DEFAULT_MU, DEFAULT_THETA};
use crate::error::OracleError;
use crate::registry::TokenSet;

/// A learned pattern program.
pub trait Program: std::fmt::Debug {
    /// One description per disjunct, in matching order.
    fn describe(&self) -> Vec<String>;

    /// Index of the first disjunct matching `input`, if any.
    fn matching_disjunct(&self, input: &str) -> Option<usize>;

    /// Returns true if any disjunct matches `input`.
    fn run(&self, input: &str) -> bool {
        self.matching_disjunct(input).is_some()
    }

    /// Ranking feature value; higher is more specific.
    fn score(&self) -> f64;

    /// Cost of the program, the negated feature value.
    fn cost(&self) -> f64 {
        -self.score()
    }
}

/// An implicit set of programs, sampled without being materialized.
pub trait SolutionSpace {
    /// Program type produced by sampling.
    type Program: Program;

    /// Number of programs in the space, saturating at `u128::MAX`.
    fn size(&self) -> u128;

    /// Draws one program uniformly at random, or `None` for an empty space.
    fn sample_one<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<Self::Program>;
}

/// Abstract pattern-synthesis backend.
///
/// All methods are synchronous. Backends may keep a learning cache;
/// [`Oracle::clear_cache`] must reset it so latency measurements of
/// consecutive calls are comparable.
pub trait Oracle {
    /// Program type returned by the backend.
    type Program: Program;

    /// Solution-space type returned by [`Oracle::learn_all`].
    type Space: SolutionSpace<Program = Self::Program>;

    /// Learns the best program consistent with `constraints`.
    ///
    /// Returns `Ok(None)` when no consistent program exists.
    ///
    /// # Errors
    ///
    /// Returns `OracleError` if the request is malformed or the backend faults.
    fn learn(&mut self, constraints: &Constraints) -> Result<Option<Self::Program>, OracleError>;

    /// Learns the best single-pattern program among the top `k` for the
    /// given positive examples.
    ///
    /// # Errors
    ///
    /// Returns `OracleError` if the request is malformed or the backend faults.
    fn learn_top_k(
        &mut self,
        k: usize,
        examples: &[&str],
    ) -> Result<Option<Self::Program>, OracleError>;

    /// Returns the space of all single-pattern programs consistent with the
    /// given positive examples.
    ///
    /// # Errors
    ///
    /// Returns `OracleError` if the request is malformed or the backend faults.
    fn learn_all(&mut self, examples: &[&str]) -> Result<Self::Space, OracleError>;

    /// Clears any learning cache.
    fn clear_cache(&mut self) {}

    /// Monotonic normalization of a cost, shared with the backend's ranking.
    fn score_transform(&self, cost: f64) -> f64 {
        1.0 + cost.max(0.0)
    }
}

/// Bounds on the number of disjuncts of a learned program.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DisjunctsLimit {
    /// Minimum number of disjuncts.
    pub min: u32,
    /// Maximum number of disjuncts.
    pub max: u32,
}

impl DisjunctsLimit {
    /// A limit of exactly `n` disjuncts.
    #[must_use]
    pub const fn exactly(n: u32) -> Self {
        Self { min: n, max: n }
    }

    /// A limit between `min` and `max` disjuncts.
    #[must_use]
    pub const fn between(min: u32, max: u32) -> Self {
        Self { min, max }
    }
}

/// Clustering parameters passed to the backend.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ClusteringParameters {
    /// μ: disjunct budget factor.
    pub mu: f64,
    /// θ: merge tolerance.
    pub theta: f64,
}

impl Default for ClusteringParameters {
    fn default() -> Self {
        Self {
            mu: DEFAULT_MU,
            theta: DEFAULT_THETA,
        }
    }
}

impl ClusteringParameters {
    /// Creates clustering parameters.
    #[must_use]
    pub const fn new(mu: f64, theta: f64) -> Self {
        Self { mu, theta }
    }
}

/// A learning request.
///
/// # Examples
///
/// ```
/// use textprofile::{ClusteringParameters, Constraints, DisjunctsLimit};
///
/// let constraints = Constraints::new()
///     .with_positives(["2019-01-02", "2020-11-30"])
///     .with_disjuncts(DisjunctsLimit::exactly(1))
///     .with_clustering(ClusteringParameters::default());
///
/// assert_eq!(constraints.positives().len(), 2);
/// assert_eq!(constraints.disjuncts(), Some(DisjunctsLimit::exactly(1)));
/// ```
#[derive(Debug, Clone, Default)]
pub struct Constraints {
    positives: Vec<String>,
    disjuncts: Option<DisjunctsLimit>,
    allowed_tokens: Option<TokenSet>,
    clustering: Option<ClusteringParameters>,
}

impl Constraints {
    /// Creates an empty request.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds one positive example.
    #[must_use]
    pub fn with_positive(mut self, example: impl Into<String>) -> Self {
        self.positives.push(example.into());
        self
    }

    /// Adds positive examples.
    #[must_use]
    pub fn with_positives<I, S>(mut self, examples: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.positives.extend(examples.into_iter().map(Into::into));
        self
    }

    /// Sets the disjunct bound.
    #[must_use]
    pub fn with_disjuncts(mut self, limit: DisjunctsLimit) -> Self {
        self.disjuncts = Some(limit);
        self
    }

    /// Sets an optional disjunct bound.
    #[must_use]
    pub fn with_optional_disjuncts(mut self, limit: Option<DisjunctsLimit>) -> Self {
        self.disjuncts = limit;
        self
    }

    /// Restricts learning to the given tokens.
    #[must_use]
    pub fn with_allowed_tokens(mut self, tokens: TokenSet) -> Self {
        self.allowed_tokens = Some(tokens);
        self
    }

    /// Sets clustering parameters.
    #[must_use]
    pub fn with_clustering(mut self, parameters: ClusteringParameters) -> Self {
        self.clustering = Some(parameters);
        self
    }

    /// Returns the positive examples.
    #[must_use]
    pub fn positives(&self) -> &[String] {
        &self.positives
    }

    /// Returns the disjunct bound, if any.
    #[must_use]
    pub const fn disjuncts(&self) -> Option<DisjunctsLimit> {
        self.disjuncts
    }

    /// Returns the allowed tokens, if restricted.
    #[must_use]
    pub const fn allowed_tokens(&self) -> Option<&TokenSet> {
        self.allowed_tokens.as_ref()
    }

    /// Returns the clustering parameters, if set.
    #[must_use]
    pub const fn clustering(&self) -> Option<ClusteringParameters> {
        self.clustering
    }
}
