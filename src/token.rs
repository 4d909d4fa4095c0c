//! Tokens: the elementary matchable units patterns are built from.
//!
//! Every token answers one question, "how many characters at the start of
//! this string do you match?", and carries a fixed score. Higher (less
//! negative) scores mean more specific tokens.

use std::fmt;
use std::hash::{Hash, Hasher};

use regex::Regex;

use crate::constants::CONSTANT_SCORE;
use crate::error::TokenError;
use crate::trie::PrefixTrie;

/// A matchable unit with a name, a description, and a fixed score.
pub trait Token: fmt::Debug + Send + Sync {
    /// Unique name of the token within a token set.
    fn name(&self) -> &str;

    /// Human-readable description used when describing patterns.
    fn description(&self) -> &str {
        self.name()
    }

    /// Specificity score; more general tokens score lower.
    fn score(&self) -> f64;

    /// Number of characters at the start of `target` matched by this token,
    /// or 0 when the token does not match there.
    fn prefix_match_length(&self, target: &str) -> usize;

    /// Whether the token also matches every shorter non-empty prefix of its
    /// longest match (character-class runs do; vocabularies do not).
    fn is_repeatable(&self) -> bool {
        false
    }

    /// Whether the token may match zero characters.
    fn allows_empty(&self) -> bool {
        false
    }

    /// The smallest built-in character class containing everything this
    /// token can match, when one is known.
    fn char_class(&self) -> Option<CharClass> {
        None
    }

    /// Whether every string matched by `other` is also matched by `self`.
    fn covers(&self, other: &dyn Token) -> bool {
        same_token(self, other)
    }
}

/// Token identity: equal names and bitwise-equal scores.
#[must_use]
pub fn same_token<A, B>(a: &A, b: &B) -> bool
where
    A: Token + ?Sized,
    B: Token + ?Sized,
{
    a.name() == b.name() && a.score().to_bits() == b.score().to_bits()
}

/// Built-in character classes, ordered roughly from specific to general.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CharClass {
    /// ASCII digits.
    Digit,
    /// Lowercase letters.
    Lower,
    /// Uppercase letters.
    Upper,
    /// Whitespace.
    Space,
    /// ASCII punctuation.
    Punct,
    /// Any alphabetic character.
    Alpha,
    /// Alphabetic characters and ASCII digits.
    AlphaDigit,
    /// Any character.
    Any,
}

impl CharClass {
    /// All classes, most specific first.
    pub const ALL: [Self; 8] = [
        Self::Digit,
        Self::Lower,
        Self::Upper,
        Self::Space,
        Self::Punct,
        Self::Alpha,
        Self::AlphaDigit,
        Self::Any,
    ];

    /// Returns true if `c` belongs to this class.
    #[must_use]
    pub fn contains(self, c: char) -> bool {
        match self {
            Self::Digit => c.is_ascii_digit(),
            Self::Lower => c.is_lowercase(),
            Self::Upper => c.is_uppercase(),
            Self::Space => c.is_whitespace(),
            Self::Punct => c.is_ascii_punctuation(),
            Self::Alpha => c.is_alphabetic(),
            Self::AlphaDigit => c.is_alphabetic() || c.is_ascii_digit(),
            Self::Any => true,
        }
    }

    /// Returns true if every character of `other` also belongs to `self`.
    #[must_use]
    pub fn includes(self, other: Self) -> bool {
        match (self, other) {
            (a, b) if a == b => true,
            (Self::Any, _) => true,
            (Self::Alpha, Self::Lower | Self::Upper) => true,
            (Self::AlphaDigit, Self::Lower | Self::Upper | Self::Alpha | Self::Digit) => true,
            _ => false,
        }
    }

    /// The most specific class containing every character of `s`.
    #[must_use]
    pub fn smallest_containing(s: &str) -> Self {
        Self::ALL
            .into_iter()
            .find(|class| s.chars().all(|c| class.contains(c)))
            .unwrap_or(Self::Any)
    }

    /// Token name of the class.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Digit => "Digit",
            Self::Lower => "Lower",
            Self::Upper => "Upper",
            Self::Space => "Space",
            Self::Punct => "Punct",
            Self::Alpha => "Alpha",
            Self::AlphaDigit => "AlphaDigit",
            Self::Any => "Any",
        }
    }

    /// Description of a one-or-more run of the class.
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::Digit => "Digit+",
            Self::Lower => "Lower+",
            Self::Upper => "Upper+",
            Self::Space => "Space+",
            Self::Punct => "Punct+",
            Self::Alpha => "Alpha+",
            Self::AlphaDigit => "AlphaDigit+",
            Self::Any => "Any+",
        }
    }

    /// Default score of a run of the class.
    #[must_use]
    pub const fn default_score(self) -> f64 {
        match self {
            Self::Space => -1.0,
            Self::Digit => -1.5,
            Self::Lower | Self::Upper => -2.0,
            Self::Punct => -2.5,
            Self::Alpha => -3.0,
            Self::AlphaDigit => -4.0,
            Self::Any => -10.0,
        }
    }
}

impl fmt::Display for CharClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A maximal run of characters from one [`CharClass`].
///
/// The `Any` class additionally matches the empty string.
#[derive(Debug, Clone, PartialEq)]
pub struct CharClassToken {
    class: CharClass,
    score: f64,
}

impl CharClassToken {
    /// Creates a run token with the class's default score.
    #[must_use]
    pub const fn new(class: CharClass) -> Self {
        Self {
            class,
            score: class.default_score(),
        }
    }

    /// Creates a run token with an explicit score.
    #[must_use]
    pub const fn with_score(class: CharClass, score: f64) -> Self {
        Self { class, score }
    }

    /// Returns the character class.
    #[must_use]
    pub const fn class(&self) -> CharClass {
        self.class
    }
}

impl Token for CharClassToken {
    fn name(&self) -> &str {
        self.class.name()
    }

    fn description(&self) -> &str {
        self.class.description()
    }

    fn score(&self) -> f64 {
        self.score
    }

    fn prefix_match_length(&self, target: &str) -> usize {
        target.chars().take_while(|&c| self.class.contains(c)).count()
    }

    fn is_repeatable(&self) -> bool {
        true
    }

    fn allows_empty(&self) -> bool {
        self.class == CharClass::Any
    }

    fn char_class(&self) -> Option<CharClass> {
        Some(self.class)
    }

    fn covers(&self, other: &dyn Token) -> bool {
        if self.class == CharClass::Any {
            return true;
        }
        other
            .char_class()
            .is_some_and(|class| self.class.includes(class))
    }
}

/// A literal string.
#[derive(Debug, Clone, PartialEq)]
pub struct ConstantToken {
    literal: String,
    description: String,
    class: CharClass,
}

impl ConstantToken {
    /// Creates a literal token.
    #[must_use]
    pub fn new(literal: impl Into<String>) -> Self {
        let literal = literal.into();
        let description = format!("'{literal}'");
        let class = CharClass::smallest_containing(&literal);
        Self {
            literal,
            description,
            class,
        }
    }

    /// Returns the literal.
    #[must_use]
    pub fn literal(&self) -> &str {
        &self.literal
    }
}

impl Token for ConstantToken {
    fn name(&self) -> &str {
        &self.literal
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn score(&self) -> f64 {
        CONSTANT_SCORE
    }

    fn prefix_match_length(&self, target: &str) -> usize {
        if !self.literal.is_empty() && target.starts_with(&self.literal) {
            self.literal.chars().count()
        } else {
            0
        }
    }

    fn char_class(&self) -> Option<CharClass> {
        Some(self.class)
    }
}

/// A regular expression anchored at the start of the target.
#[derive(Debug, Clone)]
pub struct RegexToken {
    name: String,
    pattern: String,
    regex: Regex,
    score: f64,
}

impl RegexToken {
    /// Compiles a regex token.
    ///
    /// # Errors
    ///
    /// Returns `TokenError::InvalidRegex` if the pattern does not compile.
    pub fn new(
        name: impl Into<String>,
        pattern: impl Into<String>,
        score: f64,
    ) -> Result<Self, TokenError> {
        let name = name.into();
        let pattern = pattern.into();
        let regex = Regex::new(&format!("^(?:{pattern})")).map_err(|e| TokenError::InvalidRegex {
            name: name.clone(),
            pattern: pattern.clone(),
            message: e.to_string(),
        })?;
        Ok(Self {
            name,
            pattern,
            regex,
            score,
        })
    }

    /// Returns the source pattern (without the start anchor).
    #[must_use]
    pub fn pattern(&self) -> &str {
        &self.pattern
    }
}

impl Token for RegexToken {
    fn name(&self) -> &str {
        &self.name
    }

    fn score(&self) -> f64 {
        self.score
    }

    fn prefix_match_length(&self, target: &str) -> usize {
        self.regex
            .find(target)
            .map_or(0, |m| m.as_str().chars().count())
    }
}

impl PartialEq for RegexToken {
    fn eq(&self, other: &Self) -> bool {
        same_token(self, other)
    }
}

/// A vocabulary of strings matched by longest prefix.
///
/// Score is `-|vocabulary| / Σ len(entry)`, fixed at construction. Two
/// prefix tokens are equal when their names and scores are equal; the
/// vocabularies themselves are not compared.
///
/// # Examples
///
/// ```
/// use textprofile::{PrefixToken, Token};
///
/// let token = PrefixToken::new("<Ab>", ["ab", "abc"], true);
/// assert_eq!(token.prefix_match_length("abcd"), 3);
/// assert_eq!(token.prefix_match_length("ABCD"), 0);
///
/// let folded = PrefixToken::new("<Ab>", ["ab", "abc"], false);
/// assert_eq!(folded.prefix_match_length("ABxy"), 2);
/// ```
#[derive(Debug, Clone)]
pub struct PrefixToken {
    name: String,
    trie: PrefixTrie,
    score: f64,
    case_sensitive: bool,
}

impl PrefixToken {
    /// Builds a token over `vocabulary`.
    ///
    /// When `case_sensitive` is false, entries and targets are compared
    /// uppercased. An empty vocabulary yields a token that never matches,
    /// with a score of negative infinity.
    #[must_use]
    pub fn new<I, S>(name: impl Into<String>, vocabulary: I, case_sensitive: bool) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut trie = PrefixTrie::new();
        let mut count: u32 = 0;
        let mut total_length: u32 = 0;
        for entry in vocabulary {
            let entry = entry.as_ref();
            count = count.saturating_add(1);
            total_length =
                total_length.saturating_add(u32::try_from(entry.chars().count()).unwrap_or(u32::MAX));
            if case_sensitive {
                trie.insert(entry.chars(), entry);
            } else {
                trie.insert(entry.chars().map(fold_case), entry);
            }
        }

        let score = if total_length == 0 {
            f64::NEG_INFINITY
        } else {
            -f64::from(count) / f64::from(total_length)
        };

        Self {
            name: name.into(),
            trie,
            score,
            case_sensitive,
        }
    }

    /// Returns whether comparisons are case sensitive.
    #[must_use]
    pub const fn case_sensitive(&self) -> bool {
        self.case_sensitive
    }

    /// Returns the number of distinct (folded) vocabulary keys.
    #[must_use]
    pub fn vocabulary_size(&self) -> usize {
        self.trie.len()
    }

    /// Returns the original vocabulary entry matched at the start of
    /// `target`, if any.
    #[must_use]
    pub fn longest_match(&self, target: &str) -> Option<&str> {
        if self.case_sensitive {
            self.trie.longest_prefix(target.chars())
        } else {
            self.trie.longest_prefix(target.chars().map(fold_case))
        }
    }
}

impl Token for PrefixToken {
    fn name(&self) -> &str {
        &self.name
    }

    fn score(&self) -> f64 {
        self.score
    }

    fn prefix_match_length(&self, target: &str) -> usize {
        self.longest_match(target)
            .map_or(0, |entry| entry.chars().count())
    }
}

impl PartialEq for PrefixToken {
    fn eq(&self, other: &Self) -> bool {
        same_token(self, other)
    }
}

impl Eq for PrefixToken {}

impl Hash for PrefixToken {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
        self.score.to_bits().hash(state);
    }
}

impl fmt::Display for PrefixToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Uppercases one character, keeping it unchanged when its uppercase form
/// is not a single character, so folded keys keep their length.
fn fold_case(c: char) -> char {
    let mut upper = c.to_uppercase();
    match (upper.next(), upper.next()) {
        (Some(u), None) => u,
        _ => c,
    }
}
