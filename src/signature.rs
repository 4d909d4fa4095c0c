//! Token-sequence patterns: tokenization, matching and generalization.

use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use crate::constants::DESCRIPTION_SEPARATOR;
use crate::registry::{TokenRef, TokenSet};
use crate::token::{same_token, ConstantToken};

/// A sequence of tokens matching a whole string.
///
/// # Examples
///
/// ```
/// use textprofile::{Pattern, TokenRegistry};
///
/// let registry = TokenRegistry::new();
/// let tokens = registry.default_atoms();
///
/// let pattern = Pattern::tokenize("2019-01-02", tokens, registry.any());
/// assert_eq!(pattern.describe(), "Digit+ · '-' · Digit+ · '-' · Digit+");
/// assert!(pattern.matches("1999-12-31"));
/// assert!(!pattern.matches("1999/12/31"));
/// ```
#[derive(Clone, Default)]
pub struct Pattern {
    tokens: Vec<TokenRef>,
}

impl Pattern {
    /// Creates a pattern from tokens.
    #[must_use]
    pub fn new(tokens: Vec<TokenRef>) -> Self {
        Self { tokens }
    }

    /// Returns the tokens.
    #[must_use]
    pub fn tokens(&self) -> &[TokenRef] {
        &self.tokens
    }

    /// Returns the number of tokens.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// Returns true for the empty pattern (matches only the empty string).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Mean token score; the empty pattern scores 0.
    #[must_use]
    pub fn score(&self) -> f64 {
        if self.tokens.is_empty() {
            return 0.0;
        }
        let total: f64 = self.tokens.iter().map(|t| t.score()).sum();
        #[allow(clippy::cast_precision_loss)]
        let count = self.tokens.len() as f64;
        total / count
    }

    /// Negated score.
    #[must_use]
    pub fn cost(&self) -> f64 {
        -self.score()
    }

    /// Token descriptions joined by the description separator.
    #[must_use]
    pub fn describe(&self) -> String {
        self.tokens
            .iter()
            .map(|t| t.description())
            .collect::<Vec<_>>()
            .join(DESCRIPTION_SEPARATOR)
    }

    /// Greedily tokenizes `input`.
    ///
    /// At each position, vocabulary and regex tokens that match take
    /// precedence (highest score, then longest match); otherwise a
    /// non-alphanumeric character becomes a literal; otherwise the
    /// highest-scoring character-class run wins. `fallback` covers whatever
    /// nothing else matches.
    #[must_use]
    pub fn tokenize(input: &str, allowed: &TokenSet, fallback: &TokenRef) -> Self {
        let mut tokens = Vec::new();
        let mut rest = input;

        while let Some(first) = rest.chars().next() {
            let semantic = best_match(rest, allowed.iter().filter(|t| !t.is_repeatable()));
            let chosen = semantic.or_else(|| {
                if first.is_alphabetic() || first.is_ascii_digit() {
                    best_match(rest, allowed.iter().filter(|t| t.is_repeatable()))
                } else {
                    let literal: TokenRef = Arc::new(ConstantToken::new(first.to_string()));
                    Some((literal, 1))
                }
            });
            let (token, length) =
                chosen.unwrap_or_else(|| (Arc::clone(fallback), rest.chars().count()));

            let consumed = rest
                .char_indices()
                .nth(length)
                .map_or(rest.len(), |(offset, _)| offset);
            tokens.push(token);
            rest = &rest[consumed..];
        }

        Self { tokens }
    }

    /// Returns true if the pattern matches the whole of `input`.
    ///
    /// Repeatable tokens may consume any non-empty prefix of their longest
    /// match; other tokens consume exactly their longest match.
    #[must_use]
    pub fn matches(&self, input: &str) -> bool {
        let offsets: Vec<usize> = input
            .char_indices()
            .map(|(offset, _)| offset)
            .chain(std::iter::once(input.len()))
            .collect();
        let end = offsets.len() - 1;

        let mut reachable = vec![false; end + 1];
        reachable[0] = true;

        for token in &self.tokens {
            let mut next = vec![false; end + 1];
            let mut any = false;
            for position in (0..=end).filter(|&p| reachable[p]) {
                let longest = token.prefix_match_length(&input[offsets[position]..]);
                if token.allows_empty() {
                    next[position] = true;
                    any = true;
                }
                if token.is_repeatable() {
                    for length in 1..=longest {
                        next[position + length] = true;
                        any = true;
                    }
                } else if longest > 0 {
                    next[position + longest] = true;
                    any = true;
                }
            }
            if !any {
                return false;
            }
            reachable = next;
        }

        reachable[end]
    }

    /// Least general pattern matching everything both patterns match.
    ///
    /// Patterns of different lengths generalize to `fallback` alone.
    #[must_use]
    pub fn join(&self, other: &Self, allowed: &TokenSet, fallback: &TokenRef) -> Self {
        if self.tokens.len() != other.tokens.len() {
            return Self::new(vec![Arc::clone(fallback)]);
        }
        let tokens = self
            .tokens
            .iter()
            .zip(&other.tokens)
            .map(|(a, b)| {
                if same_token(a.as_ref(), b.as_ref()) {
                    Arc::clone(a)
                } else {
                    covering_tokens(&[a, b], allowed, fallback)
                        .into_iter()
                        .next()
                        .unwrap_or_else(|| Arc::clone(fallback))
                }
            })
            .collect();
        Self { tokens }
    }
}

impl fmt::Debug for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Pattern").field(&self.describe()).finish()
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.describe())
    }
}

/// Every token able to stand in for all of `column`, most specific first.
///
/// When the column holds one token repeated, that token leads the list.
/// Other candidates are repeatable tokens from `allowed` (or `fallback`)
/// covering each column entry.
pub(crate) fn covering_tokens(
    column: &[&TokenRef],
    allowed: &TokenSet,
    fallback: &TokenRef,
) -> Vec<TokenRef> {
    let mut candidates: Vec<TokenRef> = Vec::new();
    let push = |candidates: &mut Vec<TokenRef>, token: &TokenRef| {
        if !candidates
            .iter()
            .any(|c| same_token(c.as_ref(), token.as_ref()))
        {
            candidates.push(Arc::clone(token));
        }
    };

    if let Some(first) = column.first() {
        if column
            .iter()
            .all(|t| same_token(t.as_ref(), first.as_ref()))
        {
            push(&mut candidates, first);
        }
    }

    for token in allowed.iter().chain(std::iter::once(fallback)) {
        if token.is_repeatable() && column.iter().all(|t| token.covers(t.as_ref())) {
            push(&mut candidates, token);
        }
    }

    candidates.sort_by(|a, b| b.score().total_cmp(&a.score()));
    candidates
}

fn best_match<'a, I>(target: &str, tokens: I) -> Option<(TokenRef, usize)>
where
    I: Iterator<Item = &'a TokenRef>,
{
    let mut best: Option<(TokenRef, usize)> = None;
    for token in tokens {
        let length = token.prefix_match_length(target);
        if length == 0 {
            continue;
        }
        let better = match &best {
            None => true,
            Some((current, current_length)) => match token.score().total_cmp(&current.score()) {
                Ordering::Greater => true,
                Ordering::Equal => length > *current_length,
                Ordering::Less => false,
            },
        };
        if better {
            best = Some((Arc::clone(token), length));
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::TokenRegistry;
    use crate::token::PrefixToken;

    fn tokenize(input: &str) -> Pattern {
        let registry = TokenRegistry::new();
        Pattern::tokenize(input, registry.default_atoms(), registry.any())
    }

    #[test]
    fn tokenize_splits_classes_and_literals() {
        assert_eq!(
            tokenize("Hello World").describe(),
            "Upper+ · Lower+ · ' ' · Upper+ · Lower+"
        );
        assert_eq!(tokenize("A1").describe(), "Upper+ · Digit+");
        assert_eq!(tokenize("").describe(), "");
        assert!(tokenize("").is_empty());
    }

    #[test]
    fn vocabulary_tokens_take_precedence() {
        let registry = TokenRegistry::new().with_extended(Arc::new(PrefixToken::new(
            "<Month>",
            ["Jan", "Feb"],
            false,
        )));
        let allowed = registry.token_set(true, &[], &[]).unwrap();
        let pattern = Pattern::tokenize("feb 2", &allowed, registry.any());
        assert_eq!(pattern.describe(), "<Month> · ' ' · Digit+");
        assert!(pattern.matches("JAN 31"));
        assert!(!pattern.matches("Mar 31"));
    }

    #[test]
    fn tokenized_pattern_matches_its_input() {
        for input in ["a", "ab-12", "  x", "ÄÖÜ", "x@y.com", "(555) 123"] {
            assert!(tokenize(input).matches(input), "{input}");
        }
    }

    #[test]
    fn empty_pattern_matches_only_empty_string() {
        let empty = Pattern::default();
        assert!(empty.matches(""));
        assert!(!empty.matches("a"));
        assert!((empty.score() - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn join_generalizes_positionally() {
        let registry = TokenRegistry::new();
        let allowed = registry.default_atoms();
        let a = tokenize("AB12");
        let b = tokenize("cd34");
        let joined = a.join(&b, allowed, registry.any());
        assert_eq!(joined.describe(), "Alpha+ · Digit+");
        assert!(joined.matches("AB12"));
        assert!(joined.matches("cd34"));
        assert!(joined.matches("Zz0"));
    }

    #[test]
    fn join_of_literals_uses_punctuation_class() {
        let registry = TokenRegistry::new();
        let a = tokenize("1-2");
        let b = tokenize("1/2");
        let joined = a.join(&b, registry.default_atoms(), registry.any());
        assert_eq!(joined.describe(), "Digit+ · Punct+ · Digit+");
    }

    #[test]
    fn join_of_different_lengths_falls_back() {
        let registry = TokenRegistry::new();
        let a = tokenize("abc");
        let b = tokenize("");
        let joined = a.join(&b, registry.default_atoms(), registry.any());
        assert_eq!(joined.describe(), "Any+");
        assert!(joined.matches("abc"));
        assert!(joined.matches(""));
    }

    #[test]
    fn score_is_mean_of_token_scores() {
        // Upper+ (-2.0), Lower+ (-2.0)
        let pattern = tokenize("Ab");
        assert!((pattern.score() + 2.0).abs() < f64::EPSILON);
        assert!((pattern.cost() - 2.0).abs() < f64::EPSILON);
    }

    #[test]
    fn covering_tokens_are_ordered_by_specificity() {
        let registry = TokenRegistry::new();
        let upper = registry.default_atoms().get("Upper").unwrap();
        let lower = registry.default_atoms().get("Lower").unwrap();
        let names: Vec<String> =
            covering_tokens(&[upper, lower], registry.default_atoms(), registry.any())
                .iter()
                .map(|t| t.name().to_string())
                .collect();
        assert_eq!(names, ["Alpha", "AlphaDigit", "Any"]);
    }
}
