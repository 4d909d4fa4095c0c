//! Bounded, duplicate-free sampling from an implicit solution space.

use std::collections::BTreeMap;

use rand::Rng;
use serde::{Deserialize, Serialize};
use textprofile::{Program, SolutionSpace};
use tracing::{debug, warn};

use crate::similarity::combined_description;

/// Configuration for [`sample`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SamplerConfig {
    /// Maximum number of draws before giving up; `None` draws until the
    /// target is reached.
    pub max_draws: Option<u64>,
}

impl SamplerConfig {
    /// Sets the draw budget.
    #[must_use]
    pub const fn with_max_draws(mut self, max_draws: u64) -> Self {
        self.max_draws = Some(max_draws);
        self
    }
}

/// Distinct programs keyed and ordered by description.
#[derive(Debug, Clone)]
pub struct SampleSet<P> {
    entries: BTreeMap<String, P>,
    target: usize,
    draws: u64,
}

impl<P> SampleSet<P> {
    /// Number of distinct programs collected.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if nothing was collected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Programs with their descriptions, ascending by description.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &P)> {
        self.entries.iter().map(|(d, p)| (d.as_str(), p))
    }

    /// Descriptions in ascending order.
    pub fn descriptions(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Number of distinct programs requested, `min(K, size)`.
    #[must_use]
    pub const fn target(&self) -> usize {
        self.target
    }

    /// Number of draws taken.
    #[must_use]
    pub const fn draws(&self) -> u64 {
        self.draws
    }

    /// Returns true if the target was reached.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.entries.len() >= self.target
    }
}

/// Draws from `space` until `min(k, space.size())` programs with distinct
/// descriptions are collected, or the draw budget runs out.
///
/// # Examples
///
/// ```
/// use rand::SeedableRng;
/// use rand_chacha::ChaCha8Rng;
/// use textprofile::{Oracle, SignatureLearner, SolutionSpace, TokenRegistry};
/// use textprofile_eval::{sample, SamplerConfig};
///
/// let registry = TokenRegistry::new();
/// let mut learner = SignatureLearner::new(&registry);
/// let space = learner.learn_all(&["abc", "123"]).unwrap();
///
/// let mut rng = ChaCha8Rng::seed_from_u64(7);
/// let samples = sample(&space, 2, &mut rng, &SamplerConfig::default());
/// assert_eq!(samples.len(), 2.min(usize::try_from(space.size()).unwrap()));
/// ```
pub fn sample<S, R>(space: &S, k: usize, rng: &mut R, config: &SamplerConfig) -> SampleSet<S::Program>
where
    S: SolutionSpace,
    R: Rng + ?Sized,
{
    let size = space.size();
    let target = usize::try_from(size).map_or(k, |size| size.min(k));
    let mut set = SampleSet {
        entries: BTreeMap::new(),
        target,
        draws: 0,
    };

    while set.entries.len() < target {
        if config.max_draws.is_some_and(|max| set.draws >= max) {
            warn!(
                collected = set.entries.len(),
                target,
                draws = set.draws,
                "draw budget exhausted before reaching target"
            );
            break;
        }
        set.draws += 1;
        let Some(program) = space.sample_one(rng) else {
            break;
        };
        set.entries
            .entry(combined_description(&program))
            .or_insert(program);
    }

    debug!(size, target, draws = set.draws, "sampled solution space");
    set
}

impl<P: Program> SampleSet<P> {
    /// Costs alongside descriptions, ascending by description.
    pub fn costs(&self) -> impl Iterator<Item = (&str, f64)> {
        self.iter().map(|(d, p)| (d, p.cost()))
    }
}
