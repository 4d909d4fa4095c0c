//! Convenient re-exports for glob imports.
//!
//! ```rust
//! use textprofile::prelude::*;
//!
//! let registry = TokenRegistry::new();
//! let mut learner = SignatureLearner::new(&registry);
//! let program = learner.learn_top_k(1, &["ab", "cd"]).unwrap().unwrap();
//! assert!(program.run("xyz"));
//! ```
//!
//! Concrete token types are left out; they are only needed when building
//! custom vocabularies.

pub use crate::{
    // Oracle boundary
    ClusteringParameters, Constraints, DisjunctsLimit, Oracle, Program, SolutionSpace,
    // Tokens
    RegexTokenSpec, Token, TokenRef, TokenRegistry, TokenSet,
    // Reference backend
    LearnedProgram, LearnerConfig, Pattern, PatternSpace, SignatureLearner,
    // Errors
    OracleError, TokenError,
    // Constants
    DEFAULT_MU, DEFAULT_THETA, NULL_PATTERN,
};
