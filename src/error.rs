//! Error types for token construction and oracle calls.

use std::fmt;

/// Errors raised while building tokens or token registries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenError {
    /// A regex token pattern failed to compile.
    InvalidRegex {
        /// Name of the token being built.
        name: String,
        /// The offending pattern.
        pattern: String,
        /// Message from the regex compiler.
        message: String,
    },
    /// A vocabulary file or directory could not be read.
    ReadFailed {
        /// Path that failed.
        path: String,
        /// Error message.
        message: String,
    },
    /// A vocabulary file has no usable file stem to name the token after.
    UnnamedVocabulary {
        /// Path of the vocabulary file.
        path: String,
    },
    /// A vocabulary file has no entries.
    EmptyVocabulary {
        /// Path of the vocabulary file.
        path: String,
    },
}

impl fmt::Display for TokenError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidRegex {
                name,
                pattern,
                message,
            } => {
                write!(f, "token '{name}' has invalid regex '{pattern}': {message}")
            }
            Self::ReadFailed { path, message } => {
                write!(f, "failed to read token vocabulary '{path}': {message}")
            }
            Self::UnnamedVocabulary { path } => {
                write!(f, "vocabulary file '{path}' has no file stem to name the token")
            }
            Self::EmptyVocabulary { path } => write!(f, "vocabulary file '{path}' has no entries"),
        }
    }
}

impl std::error::Error for TokenError {}

/// Errors raised by an oracle while learning.
///
/// "No pattern found" is not an error: oracles report it as `Ok(None)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OracleError {
    /// The request carried no examples to learn from.
    NoExamples,
    /// The learning request was malformed.
    InvalidRequest {
        /// Reason the request was rejected.
        reason: String,
    },
    /// The backend faulted while learning.
    Backend {
        /// The operation that failed.
        operation: String,
        /// Error message.
        message: String,
    },
}

impl fmt::Display for OracleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoExamples => write!(f, "learning request has no examples"),
            Self::InvalidRequest { reason } => write!(f, "invalid learning request: {reason}"),
            Self::Backend { operation, message } => {
                write!(f, "oracle failure during {operation}: {message}")
            }
        }
    }
}

impl std::error::Error for OracleError {}

impl OracleError {
    /// Creates an `InvalidRequest` error.
    #[must_use]
    pub fn invalid_request(reason: impl Into<String>) -> Self {
        Self::InvalidRequest {
            reason: reason.into(),
        }
    }

    /// Creates a `Backend` error.
    #[must_use]
    pub fn backend(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Backend {
            operation: operation.into(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_error_display_names_the_token() {
        let err = TokenError::InvalidRegex {
            name: "<Zip>".to_string(),
            pattern: "[0-9".to_string(),
            message: "unclosed class".to_string(),
        };
        let text = err.to_string();
        assert!(text.contains("<Zip>"));
        assert!(text.contains("[0-9"));
    }

    #[test]
    fn oracle_error_constructors() {
        assert_eq!(
            OracleError::invalid_request("k must be positive"),
            OracleError::InvalidRequest {
                reason: "k must be positive".to_string()
            }
        );
        let err = OracleError::backend("learn", "engine crashed");
        assert_eq!(err.to_string(), "oracle failure during learn: engine crashed");
    }
}
