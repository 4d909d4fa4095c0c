//! Token vocabularies, pattern programs, and the oracle boundary for
//! evaluating pattern-profiling engines.
//!
//! A *pattern profiler* learns, from a set of strings, a small disjunction of
//! token-sequence patterns describing them. This crate provides the pieces
//! every evaluation needs regardless of which engine does the learning:
//!
//! - **Tokens**: character-class runs, literals, anchored regexes, and
//!   vocabulary tokens backed by a longest-prefix trie.
//! - **Registry**: the immutable token universe (default atoms, extended
//!   atoms, semantic vocabularies loaded from disk) and per-request token sets.
//! - **Oracle traits**: [`Oracle`], [`Program`], and [`SolutionSpace`], the
//!   only surface evaluation code sees.
//! - **Signature learner**: a self-contained reference [`Oracle`].
//!
//! # Quick Start
//!
//! ```rust
//! use textprofile::{Constraints, Oracle, Program, SignatureLearner, TokenRegistry};
//!
//! let registry = TokenRegistry::new();
//! let mut learner = SignatureLearner::new(&registry);
//!
//! let program = learner
//!     .learn(&Constraints::new().with_positives(["(425) 555-0100", "(206) 555-0199"]))
//!     .unwrap()
//!     .expect("a program for two phone numbers");
//!
//! assert!(program.run("(360) 555-0123"));
//! assert!(!program.run("360.555.0123"));
//! ```
//!
//! # Vocabulary Tokens
//!
//! ```rust
//! use textprofile::{PrefixToken, Token};
//!
//! let months = PrefixToken::new("Month", ["Jan", "Feb", "Mar"], false);
//! assert_eq!(months.prefix_match_length("feb 14"), 3);
//! assert_eq!(months.prefix_match_length("Apr 1"), 0);
//! ```
//!
//! # Default Scores
//!
//! | Token | Score |
//! |-------|-------|
//! | Literal | -0.5 |
//! | `Space+` | -1.0 |
//! | `Digit+` | -1.5 |
//! | `Lower+`, `Upper+` | -2.0 |
//! | `Punct+` | -2.5 |
//! | `Alpha+` | -3.0 |
//! | `AlphaDigit+` | -4.0 |
//! | `<EMail>`, `<PhoneNum>`, `<URL>` | -5.0 |
//! | `Any+` | -10.0 |
//! | Vocabulary of n entries, c total chars | -n/c |

#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

mod constants;
mod error;
mod learner;
mod oracle;
pub mod prelude;
mod registry;
mod signature;
mod space;
mod token;
mod trie;

pub use constants::{
    CASE_EXTENSION, CONSTANT_SCORE, DEFAULT_MU, DEFAULT_THETA, DESCRIPTION_SEPARATOR,
    EXTENDED_REGEX_SCORE, NOCASE_EXTENSION, NULL_PATTERN,
};
pub use error::{OracleError, TokenError};
pub use learner::{Disjunct, LearnedProgram, LearnerConfig, SignatureLearner};
pub use oracle::{ClusteringParameters, Constraints, DisjunctsLimit, Oracle, Program, SolutionSpace};
pub use registry::{RegexTokenSpec, TokenRef, TokenRegistry, TokenSet};
pub use signature::Pattern;
pub use space::PatternSpace;
pub use token::{same_token, CharClass, CharClassToken, ConstantToken, PrefixToken, RegexToken, Token};
pub use trie::PrefixTrie;
