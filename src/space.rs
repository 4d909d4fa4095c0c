//! The implicit space of single-pattern programs consistent with examples.

use std::sync::Arc;

use rand::Rng;

use crate::learner::{Disjunct, LearnedProgram};
use crate::oracle::SolutionSpace;
use crate::registry::{TokenRef, TokenSet};
use crate::signature::{covering_tokens, Pattern};

/// Per-position token choices; every combination is a consistent pattern.
#[derive(Debug, Clone)]
pub struct PatternSpace {
    positions: Vec<Vec<TokenRef>>,
    support: usize,
}

impl PatternSpace {
    /// Builds the space from example signatures.
    ///
    /// Signatures of differing lengths leave only the fallback pattern.
    #[must_use]
    pub fn from_signatures(
        signatures: &[Pattern],
        allowed: &TokenSet,
        fallback: &TokenRef,
    ) -> Self {
        let support = signatures.len();
        let Some(first) = signatures.first() else {
            return Self {
                positions: Vec::new(),
                support,
            };
        };

        if signatures.iter().any(|s| s.len() != first.len()) {
            return Self {
                positions: vec![vec![Arc::clone(fallback)]],
                support,
            };
        }

        let positions = (0..first.len())
            .map(|position| {
                let column: Vec<&TokenRef> =
                    signatures.iter().map(|s| &s.tokens()[position]).collect();
                covering_tokens(&column, allowed, fallback)
            })
            .collect();
        Self { positions, support }
    }

    /// Per-position candidates, most specific first.
    #[must_use]
    pub fn positions(&self) -> &[Vec<TokenRef>] {
        &self.positions
    }

    /// The most specific pattern in the space.
    #[must_use]
    pub fn best(&self) -> Pattern {
        Pattern::new(
            self.positions
                .iter()
                .filter_map(|candidates| candidates.first().cloned())
                .collect(),
        )
    }
}

impl SolutionSpace for PatternSpace {
    type Program = LearnedProgram;

    fn size(&self) -> u128 {
        if self.support == 0 {
            return 0;
        }
        self.positions.iter().fold(1u128, |size, candidates| {
            size.saturating_mul(candidates.len() as u128)
        })
    }

    fn sample_one<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<LearnedProgram> {
        if self.size() == 0 {
            return None;
        }
        let tokens = self
            .positions
            .iter()
            .map(|candidates| Arc::clone(&candidates[rng.gen_range(0..candidates.len())]))
            .collect();
        Some(LearnedProgram::new(vec![Disjunct::new(
            Pattern::new(tokens),
            self.support,
        )]))
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use super::*;
    use crate::oracle::Program;
    use crate::registry::TokenRegistry;

    fn space(examples: &[&str]) -> PatternSpace {
        let registry = TokenRegistry::new();
        let signatures: Vec<Pattern> = examples
            .iter()
            .map(|e| Pattern::tokenize(e, registry.default_atoms(), registry.any()))
            .collect();
        PatternSpace::from_signatures(&signatures, registry.default_atoms(), registry.any())
    }

    #[test]
    fn empty_examples_give_empty_space() {
        let space = space(&[]);
        assert_eq!(space.size(), 0);
        assert!(space.sample_one(&mut ChaCha8Rng::seed_from_u64(1)).is_none());
    }

    #[test]
    fn empty_strings_give_the_empty_pattern() {
        let space = space(&["", ""]);
        assert_eq!(space.size(), 1);
        let program = space.sample_one(&mut ChaCha8Rng::seed_from_u64(1)).unwrap();
        assert_eq!(program.describe(), [""]);
    }

    #[test]
    fn mismatched_lengths_leave_fallback() {
        let space = space(&["a", "a-b"]);
        assert_eq!(space.size(), 1);
        assert_eq!(space.best().describe(), "Any+");
    }

    #[test]
    fn samples_match_every_example() {
        let examples = ["Ab-12", "cD/34", "Ef.5"];
        let space = space(&examples);
        assert!(space.size() > 1);
        let mut rng = ChaCha8Rng::seed_from_u64(0xf00d);
        for _ in 0..50 {
            let program = space.sample_one(&mut rng).unwrap();
            for example in examples {
                assert!(program.run(example), "{:?} rejects {example}", program.describe());
            }
        }
    }

    #[test]
    fn best_pattern_is_least_general() {
        let space = space(&["1-2", "3-4"]);
        assert_eq!(space.best().describe(), "Digit+ · '-' · Digit+");
    }
}
