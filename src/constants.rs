//! Constants shared by learners and evaluators.

/// Default θ clustering parameter (merge tolerance of the learner).
pub const DEFAULT_THETA: f64 = 1.25;

/// Default μ clustering parameter (disjunct budget factor of the learner).
pub const DEFAULT_MU: f64 = 4.0;

/// Separator placed between token descriptions inside one disjunct.
pub const DESCRIPTION_SEPARATOR: &str = " \u{b7} ";

/// Pattern text reported when an oracle returns no program.
pub const NULL_PATTERN: &str = "<NULL>";

/// Feature value of a literal (constant) token.
pub const CONSTANT_SCORE: f64 = -0.5;

/// Feature value shared by the built-in extended regex atoms.
pub const EXTENDED_REGEX_SCORE: f64 = -5.0;

/// File extension of case-insensitive semantic atom vocabularies.
pub const NOCASE_EXTENSION: &str = "nocase";

/// File extension of case-sensitive semantic atom vocabularies.
pub const CASE_EXTENSION: &str = "case";
