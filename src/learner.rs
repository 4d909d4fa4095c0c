//! Signature learner: a self-contained reference [`Oracle`].
//!
//! Each example is tokenized into a signature [`Pattern`]. Identical
//! signatures form clusters, which are merged agglomeratively by positional
//! join until the disjunct bound (or the θ/μ criteria) is satisfied.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::error::OracleError;
use crate::oracle::{ClusteringParameters, Constraints, DisjunctsLimit, Oracle, Program};
use crate::registry::{TokenRef, TokenRegistry, TokenSet};
use crate::signature::Pattern;
use crate::space::PatternSpace;

/// Configuration for [`SignatureLearner`].
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LearnerConfig {
    /// Clustering parameters used when a request carries none.
    pub clustering: ClusteringParameters,
    /// Whether the default token set includes the extended atoms.
    pub use_extended: bool,
}

impl Default for LearnerConfig {
    fn default() -> Self {
        Self {
            clustering: ClusteringParameters::default(),
            use_extended: false,
        }
    }
}

impl LearnerConfig {
    /// Sets the fallback clustering parameters.
    #[must_use]
    pub const fn with_clustering(mut self, clustering: ClusteringParameters) -> Self {
        self.clustering = clustering;
        self
    }

    /// Includes the extended atoms in the default token set.
    #[must_use]
    pub const fn with_extended(mut self, use_extended: bool) -> Self {
        self.use_extended = use_extended;
        self
    }
}

/// One disjunct of a [`LearnedProgram`] with the number of examples it was
/// learned from.
#[derive(Debug, Clone)]
pub struct Disjunct {
    pattern: Pattern,
    support: usize,
}

impl Disjunct {
    /// Creates a disjunct.
    #[must_use]
    pub fn new(pattern: Pattern, support: usize) -> Self {
        Self { pattern, support }
    }

    /// Returns the pattern.
    #[must_use]
    pub fn pattern(&self) -> &Pattern {
        &self.pattern
    }

    /// Returns the number of learning examples behind this disjunct.
    #[must_use]
    pub fn support(&self) -> usize {
        self.support
    }
}

/// A disjunction of patterns, tried in order.
#[derive(Debug, Clone)]
pub struct LearnedProgram {
    disjuncts: Vec<Disjunct>,
}

impl LearnedProgram {
    /// Creates a program, ordering disjuncts by score then support, both
    /// descending.
    #[must_use]
    pub fn new(mut disjuncts: Vec<Disjunct>) -> Self {
        disjuncts.sort_by(|a, b| {
            b.pattern
                .score()
                .total_cmp(&a.pattern.score())
                .then_with(|| b.support.cmp(&a.support))
        });
        Self { disjuncts }
    }

    /// Returns the disjuncts in matching order.
    #[must_use]
    pub fn disjuncts(&self) -> &[Disjunct] {
        &self.disjuncts
    }
}

impl Program for LearnedProgram {
    fn describe(&self) -> Vec<String> {
        self.disjuncts.iter().map(|d| d.pattern.describe()).collect()
    }

    fn matching_disjunct(&self, input: &str) -> Option<usize> {
        self.disjuncts.iter().position(|d| d.pattern.matches(input))
    }

    #[allow(clippy::cast_precision_loss)]
    fn score(&self) -> f64 {
        if self.disjuncts.is_empty() {
            return f64::NEG_INFINITY;
        }
        let support: usize = self.disjuncts.iter().map(|d| d.support).sum();
        if support == 0 {
            let total: f64 = self.disjuncts.iter().map(|d| d.pattern.score()).sum();
            total / self.disjuncts.len() as f64
        } else {
            let weighted: f64 = self
                .disjuncts
                .iter()
                .map(|d| d.pattern.score() * d.support as f64)
                .sum();
            weighted / support as f64
        }
    }
}

impl fmt::Display for LearnedProgram {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, disjunct) in self.disjuncts.iter().enumerate() {
            writeln!(
                f,
                "[{i}] {} (score {:.3}, {} examples)",
                disjunct.pattern,
                disjunct.pattern.score(),
                disjunct.support
            )?;
        }
        Ok(())
    }
}

/// How far agglomerative merging may go.
#[derive(Debug, Clone, Copy)]
enum MergeBudget {
    /// Merge only while more than `max` clusters remain.
    Bounded { max: usize },
    /// Merge while above `max`, or while the merged cost stays within
    /// `theta` times the costlier input.
    Auto { max: usize, theta: f64 },
}

impl MergeBudget {
    fn from_constraints(
        limit: Option<DisjunctsLimit>,
        clustering: ClusteringParameters,
        examples: usize,
    ) -> Self {
        match limit {
            Some(limit) => Self::Bounded {
                max: usize::try_from(limit.max.max(1)).unwrap_or(usize::MAX),
            },
            None => {
                #[allow(clippy::cast_precision_loss)]
                let budget = (clustering.mu * ((examples + 1) as f64).log2()).ceil();
                #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
                let max = if budget.is_finite() && budget >= 1.0 {
                    budget as usize
                } else {
                    1
                };
                Self::Auto {
                    max,
                    theta: clustering.theta,
                }
            }
        }
    }

    const fn max(self) -> usize {
        match self {
            Self::Bounded { max } | Self::Auto { max, .. } => max,
        }
    }

    fn accepts(self, clusters: usize, merged: &Pattern, a: &Pattern, b: &Pattern) -> bool {
        if clusters > self.max() {
            return true;
        }
        match self {
            Self::Bounded { .. } => false,
            Self::Auto { theta, .. } => merged.cost() <= theta * a.cost().max(b.cost()),
        }
    }
}

/// Reference pattern learner over a [`TokenRegistry`].
///
/// # Examples
///
/// ```
/// use textprofile::{Constraints, Oracle, Program, SignatureLearner, TokenRegistry};
///
/// let registry = TokenRegistry::new();
/// let mut learner = SignatureLearner::new(&registry);
///
/// let constraints = Constraints::new().with_positives(["2019-01-02", "1999-12-31"]);
/// let program = learner.learn(&constraints).unwrap().unwrap();
///
/// assert_eq!(program.describe(), ["Digit+ · '-' · Digit+ · '-' · Digit+"]);
/// assert!(program.run("2024-06-30"));
/// assert!(!program.run("June 30"));
/// ```
#[derive(Debug)]
pub struct SignatureLearner {
    default_tokens: TokenSet,
    fallback: TokenRef,
    config: LearnerConfig,
    cache: HashMap<String, Pattern>,
    cache_key: String,
}

impl SignatureLearner {
    /// Creates a learner with the registry's default atoms.
    #[must_use]
    pub fn new(registry: &TokenRegistry) -> Self {
        Self::with_config(registry, LearnerConfig::default())
    }

    /// Creates a learner with explicit configuration.
    #[must_use]
    pub fn with_config(registry: &TokenRegistry, config: LearnerConfig) -> Self {
        let default_tokens = if config.use_extended {
            registry
                .default_atoms()
                .iter()
                .chain(registry.extended_atoms().iter())
                .cloned()
                .collect()
        } else {
            registry.default_atoms().clone()
        };
        Self {
            default_tokens,
            fallback: Arc::clone(registry.any()),
            config,
            cache: HashMap::new(),
            cache_key: String::new(),
        }
    }

    /// Returns the configuration.
    #[must_use]
    pub const fn config(&self) -> &LearnerConfig {
        &self.config
    }

    /// Number of cached signatures.
    #[must_use]
    pub fn cached_signatures(&self) -> usize {
        self.cache.len()
    }

    fn signatures(&mut self, examples: &[&str], allowed: &TokenSet) -> Vec<Pattern> {
        let key = token_set_key(allowed);
        if key != self.cache_key {
            self.cache.clear();
            self.cache_key = key;
        }
        examples
            .iter()
            .map(|&example| {
                self.cache
                    .entry(example.to_string())
                    .or_insert_with(|| Pattern::tokenize(example, allowed, &self.fallback))
                    .clone()
            })
            .collect()
    }

    fn cluster(
        &self,
        signatures: Vec<Pattern>,
        allowed: &TokenSet,
        budget: MergeBudget,
    ) -> Vec<Disjunct> {
        let mut clusters: Vec<Disjunct> = Vec::new();
        let mut index: HashMap<String, usize> = HashMap::new();
        for pattern in signatures {
            let description = pattern.describe();
            match index.get(&description) {
                Some(&i) => clusters[i].support += 1,
                None => {
                    index.insert(description, clusters.len());
                    clusters.push(Disjunct::new(pattern, 1));
                }
            }
        }

        // Joins are memoized by cluster id; merged clusters get fresh ids.
        let mut ids: Vec<usize> = (0..clusters.len()).collect();
        let mut next_id = clusters.len();
        let mut joins: HashMap<(usize, usize), Pattern> = HashMap::new();

        while clusters.len() > 1 {
            let mut best: Option<(usize, usize, f64)> = None;
            for i in 0..clusters.len() {
                for j in (i + 1)..clusters.len() {
                    let merged = joins.entry((ids[i], ids[j])).or_insert_with(|| {
                        clusters[i]
                            .pattern
                            .join(&clusters[j].pattern, allowed, &self.fallback)
                    });
                    let score = merged.score();
                    if best.is_none_or(|(_, _, s)| score > s) {
                        best = Some((i, j, score));
                    }
                }
            }
            let Some((i, j, _)) = best else { break };
            let Some(merged) = joins.remove(&(ids[i], ids[j])) else {
                break;
            };
            if !budget.accepts(
                clusters.len(),
                &merged,
                &clusters[i].pattern,
                &clusters[j].pattern,
            ) {
                break;
            }

            let right = clusters.remove(j);
            ids.remove(j);
            let support = clusters[i].support + right.support;
            debug!(
                left = %clusters[i].pattern,
                right = %right.pattern,
                merged = %merged,
                "merged clusters"
            );
            clusters[i] = Disjunct::new(merged, support);
            ids[i] = next_id;
            next_id += 1;
        }

        clusters
    }
}

impl Oracle for SignatureLearner {
    type Program = LearnedProgram;
    type Space = PatternSpace;

    fn learn(&mut self, constraints: &Constraints) -> Result<Option<LearnedProgram>, OracleError> {
        if let Some(limit) = constraints.disjuncts() {
            if limit.min > limit.max {
                return Err(OracleError::invalid_request(format!(
                    "disjunct minimum {} exceeds maximum {}",
                    limit.min, limit.max
                )));
            }
        }
        if constraints.positives().is_empty() {
            return Ok(None);
        }

        let allowed = constraints
            .allowed_tokens()
            .cloned()
            .unwrap_or_else(|| self.default_tokens.clone());
        let examples: Vec<&str> = constraints.positives().iter().map(String::as_str).collect();
        let signatures = self.signatures(&examples, &allowed);

        let budget = MergeBudget::from_constraints(
            constraints.disjuncts(),
            constraints.clustering().unwrap_or(self.config.clustering),
            examples.len(),
        );
        let disjuncts = self.cluster(signatures, &allowed, budget);
        debug!(
            examples = examples.len(),
            disjuncts = disjuncts.len(),
            "learned program"
        );
        Ok(Some(LearnedProgram::new(disjuncts)))
    }

    fn learn_top_k(
        &mut self,
        k: usize,
        examples: &[&str],
    ) -> Result<Option<LearnedProgram>, OracleError> {
        if examples.is_empty() {
            return Err(OracleError::NoExamples);
        }
        if k == 0 {
            return Ok(None);
        }
        let allowed = self.default_tokens.clone();
        let signatures = self.signatures(examples, &allowed);
        let disjuncts = self.cluster(signatures, &allowed, MergeBudget::Bounded { max: 1 });
        Ok(Some(LearnedProgram::new(disjuncts)))
    }

    fn learn_all(&mut self, examples: &[&str]) -> Result<PatternSpace, OracleError> {
        if examples.is_empty() {
            return Err(OracleError::NoExamples);
        }
        let allowed = self.default_tokens.clone();
        let signatures = self.signatures(examples, &allowed);
        Ok(PatternSpace::from_signatures(
            &signatures,
            &allowed,
            &self.fallback,
        ))
    }

    fn clear_cache(&mut self) {
        self.cache.clear();
    }
}

fn token_set_key(tokens: &TokenSet) -> String {
    tokens
        .iter()
        .map(|t| format!("{}\u{1f}{:x}", t.name(), t.score().to_bits()))
        .collect::<Vec<_>>()
        .join("\u{1e}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oracle::SolutionSpace;

    fn learner() -> SignatureLearner {
        SignatureLearner::new(&TokenRegistry::new())
    }

    #[test]
    fn no_positives_learns_nothing() {
        let mut learner = learner();
        assert!(learner.learn(&Constraints::new()).unwrap().is_none());
    }

    #[test]
    fn inverted_disjunct_limit_is_rejected() {
        let mut learner = learner();
        let constraints = Constraints::new()
            .with_positive("a")
            .with_disjuncts(DisjunctsLimit::between(3, 1));
        assert!(matches!(
            learner.learn(&constraints),
            Err(OracleError::InvalidRequest { .. })
        ));
    }

    #[test]
    fn positives_always_match() {
        let mut learner = learner();
        let positives = ["Alice", "bob", "CAROL 3", "d-4", "", "e.f@g.com"];
        let program = learner
            .learn(&Constraints::new().with_positives(positives))
            .unwrap()
            .unwrap();
        for positive in positives {
            assert!(program.run(positive), "{positive} not matched");
        }
    }

    #[test]
    fn disjunct_bound_is_respected() {
        let mut learner = learner();
        let positives = ["12", "ab", "AB", "a-b", "1.2", "x y"];
        for max in 1..=4 {
            let program = learner
                .learn(
                    &Constraints::new()
                        .with_positives(positives)
                        .with_disjuncts(DisjunctsLimit::between(1, max)),
                )
                .unwrap()
                .unwrap();
            assert!(program.disjuncts().len() <= usize::try_from(max).unwrap());
            assert!(positives.iter().all(|p| program.run(p)));
        }
    }

    #[test]
    fn identical_signatures_share_a_disjunct() {
        let mut learner = learner();
        let program = learner
            .learn(&Constraints::new().with_positives(["10", "20", "300"]))
            .unwrap()
            .unwrap();
        assert_eq!(program.describe(), ["Digit+"]);
        assert_eq!(program.disjuncts()[0].support(), 3);
    }

    #[test]
    fn dissimilar_formats_stay_apart() {
        let mut learner = learner();
        let program = learner
            .learn(&Constraints::new().with_positives(["2019-01-02", "hello", "2020-11-30"]))
            .unwrap()
            .unwrap();
        assert_eq!(program.disjuncts().len(), 2);
        assert_eq!(program.matching_disjunct("2021-02-03"), Some(0));
        assert_eq!(program.matching_disjunct("hello"), Some(1));
        assert_eq!(program.matching_disjunct("12:30"), None);
    }

    #[test]
    fn program_score_is_support_weighted() {
        let program = LearnedProgram::new(vec![
            Disjunct::new(Pattern::default(), 3),
            Disjunct::new(
                Pattern::new(vec![Arc::clone(TokenRegistry::new().any())]),
                1,
            ),
        ]);
        // (0 * 3 + -10 * 1) / 4
        assert!((program.score() + 2.5).abs() < 1e-12);
        assert!((program.cost() - 2.5).abs() < 1e-12);
    }

    #[test]
    fn top_k_joins_into_one_pattern() {
        let mut learner = learner();
        let program = learner.learn_top_k(1, &["Ab", "cD"]).unwrap().unwrap();
        assert_eq!(program.describe(), ["Alpha+ · Alpha+"]);
        assert!(learner.learn_top_k(0, &["a"]).unwrap().is_none());
        assert_eq!(learner.learn_top_k(1, &[]).unwrap_err(), OracleError::NoExamples);
    }

    #[test]
    fn cache_fills_and_clears() {
        let mut learner = learner();
        learner.learn_top_k(1, &["a", "b", "a"]).unwrap();
        assert_eq!(learner.cached_signatures(), 2);
        learner.clear_cache();
        assert_eq!(learner.cached_signatures(), 0);
    }

    #[test]
    fn cache_is_dropped_when_tokens_change() {
        let registry = TokenRegistry::new();
        let mut learner = SignatureLearner::new(&registry);
        learner.learn_top_k(1, &["abc"]).unwrap();

        let restricted = registry
            .token_set(false, &["Lower".to_string()], &[])
            .unwrap();
        let program = learner
            .learn(
                &Constraints::new()
                    .with_positive("abc")
                    .with_allowed_tokens(restricted),
            )
            .unwrap()
            .unwrap();
        assert_eq!(program.describe(), ["Alpha+"]);
    }

    #[test]
    fn learn_all_space_contains_joined_candidates() {
        let mut learner = learner();
        let space = learner.learn_all(&["A1", "b2"]).unwrap();
        // Alpha, AlphaDigit, Any for the first position; Digit, AlphaDigit, Any for the second.
        assert_eq!(space.size(), 9);
    }

    #[test]
    fn score_transform_clamps_negative_cost() {
        let learner = learner();
        assert!((learner.score_transform(-3.0) - 1.0).abs() < f64::EPSILON);
        assert!((learner.score_transform(2.0) - 3.0).abs() < f64::EPSILON);
    }
}
