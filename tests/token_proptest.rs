//! Property-based tests for token matching, tokenization, and learning.
//!
//! Random vocabularies and strings are generated and the basic contracts of
//! tokens and learned programs are checked against them.

use proptest::prelude::*;

use textprofile::{
    Constraints, DisjunctsLimit, Oracle, Pattern, PrefixToken, Program, SignatureLearner, Token,
    TokenRegistry,
};

/// Strategies for generating vocabularies and example strings.
mod strategies {
    use super::*;

    /// A non-empty ASCII word.
    pub fn word() -> impl Strategy<Value = String> {
        "[a-zA-Z]{1,8}"
    }

    /// A vocabulary without the empty entry.
    pub fn vocabulary() -> impl Strategy<Value = Vec<String>> {
        prop::collection::vec(word(), 1..16)
    }

    /// A short ASCII string mixing classes and punctuation.
    pub fn sample() -> impl Strategy<Value = String> {
        "[a-zA-Z0-9 .,/@-]{0,12}"
    }

    /// A small set of example strings.
    pub fn samples() -> impl Strategy<Value = Vec<String>> {
        prop::collection::vec(sample(), 1..8)
    }
}

mod prefix_token_tests {
    use super::strategies::*;
    use super::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(500))]

        #[test]
        fn empty_target_never_matches(vocab in vocabulary(), case_sensitive in any::<bool>()) {
            let token = PrefixToken::new("V", &vocab, case_sensitive);
            prop_assert_eq!(token.prefix_match_length(""), 0);
        }

        #[test]
        fn match_is_bounded_by_target(vocab in vocabulary(), target in sample()) {
            let token = PrefixToken::new("V", &vocab, true);
            prop_assert!(token.prefix_match_length(&target) <= target.chars().count());
        }

        #[test]
        fn vocabulary_entries_match_themselves(
            vocab in vocabulary(),
            index in any::<prop::sample::Index>(),
            suffix in sample(),
        ) {
            let token = PrefixToken::new("V", &vocab, true);
            let entry = index.get(&vocab);
            let target = format!("{entry}{suffix}");
            prop_assert!(token.prefix_match_length(&target) >= entry.chars().count());
        }

        #[test]
        fn case_insensitive_ignores_ascii_case(vocab in vocabulary(), target in sample()) {
            let token = PrefixToken::new("V", &vocab, false);
            prop_assert_eq!(
                token.prefix_match_length(&target.to_ascii_uppercase()),
                token.prefix_match_length(&target.to_ascii_lowercase())
            );
        }

        #[test]
        fn score_is_negative_entries_over_chars(vocab in vocabulary()) {
            let token = PrefixToken::new("V", &vocab, true);
            prop_assert!(token.score() < 0.0);
            prop_assert!(token.score() >= -1.0);
        }
    }
}

mod pattern_tests {
    use super::strategies::*;
    use super::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(500))]

        #[test]
        fn signature_matches_its_string(s in sample()) {
            let registry = TokenRegistry::new();
            let pattern = Pattern::tokenize(&s, registry.default_atoms(), registry.any());
            prop_assert!(pattern.matches(&s), "{} rejects {:?}", pattern, s);
        }

        #[test]
        fn signature_matches_arbitrary_unicode(s in "\\PC{0,10}") {
            let registry = TokenRegistry::new();
            let pattern = Pattern::tokenize(&s, registry.default_atoms(), registry.any());
            prop_assert!(pattern.matches(&s), "{} rejects {:?}", pattern, s);
        }

        #[test]
        fn join_matches_both_inputs(a in sample(), b in sample()) {
            let registry = TokenRegistry::new();
            let tokens = registry.default_atoms();
            let left = Pattern::tokenize(&a, tokens, registry.any());
            let right = Pattern::tokenize(&b, tokens, registry.any());
            let joined = left.join(&right, tokens, registry.any());
            prop_assert!(joined.matches(&a));
            prop_assert!(joined.matches(&b));
            prop_assert!(joined.score() <= left.score().max(right.score()));
        }
    }
}

mod learner_tests {
    use super::strategies::*;
    use super::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        #[test]
        fn positives_always_match(examples in samples()) {
            let mut learner = SignatureLearner::new(&TokenRegistry::new());
            let program = learner
                .learn(&Constraints::new().with_positives(&examples))
                .unwrap()
                .unwrap();
            for example in &examples {
                prop_assert!(program.run(example), "{:?} rejects {:?}", program.describe(), example);
            }
        }

        #[test]
        fn disjunct_bound_is_respected(examples in samples(), max in 1u32..4) {
            let mut learner = SignatureLearner::new(&TokenRegistry::new());
            let program = learner
                .learn(
                    &Constraints::new()
                        .with_positives(&examples)
                        .with_disjuncts(DisjunctsLimit::between(1, max)),
                )
                .unwrap()
                .unwrap();
            prop_assert!(program.describe().len() <= max as usize);
            for example in &examples {
                prop_assert!(program.run(example));
            }
        }
    }
}
