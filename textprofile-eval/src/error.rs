//! Custom error types for the eval crate.

use std::fmt;

use textprofile::{OracleError, TokenError};

/// Top-level error type for the eval crate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EvalError {
    /// Error loading or validating a dataset.
    Data(DataError),
    /// Error building the token set for a test case.
    Token(TokenError),
    /// The oracle faulted or rejected a request.
    Oracle(OracleError),
    /// I/O error (for file operations).
    Io {
        /// The operation that failed.
        operation: String,
        /// Error message.
        message: String,
    },
    /// JSON serialization/deserialization error.
    Json {
        /// Context where error occurred.
        context: String,
        /// Error message.
        message: String,
    },
}

impl EvalError {
    /// Builds an I/O error for `operation`.
    #[must_use]
    pub fn io(operation: impl Into<String>, error: &std::io::Error) -> Self {
        Self::Io {
            operation: operation.into(),
            message: error.to_string(),
        }
    }
}

impl fmt::Display for EvalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Data(e) => write!(f, "data error: {e}"),
            Self::Token(e) => write!(f, "token error: {e}"),
            Self::Oracle(e) => write!(f, "oracle error: {e}"),
            Self::Io { operation, message } => {
                write!(f, "I/O error during {operation}: {message}")
            }
            Self::Json { context, message } => {
                write!(f, "JSON error in {context}: {message}")
            }
        }
    }
}

impl std::error::Error for EvalError {}

/// Error loading datasets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataError {
    /// Dataset file not found.
    FileNotFound {
        /// Path that was not found.
        path: String,
    },
    /// Failed to read a file.
    ReadFailed {
        /// Path to the file.
        path: String,
        /// Error message.
        message: String,
    },
    /// The file is not a valid dataset.
    Malformed {
        /// Path to the file.
        path: String,
        /// Error message from `serde_json`.
        message: String,
    },
    /// The dataset holds no non-empty strings.
    EmptyData {
        /// Path to the file.
        path: String,
    },
    /// Directory not found or not a directory.
    InvalidDirectory {
        /// Path that was invalid.
        path: String,
    },
    /// Fewer datasets are available than the run needs.
    NotEnoughDatasets {
        /// Datasets needed.
        needed: usize,
        /// Datasets found.
        available: usize,
    },
}

impl fmt::Display for DataError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FileNotFound { path } => write!(f, "dataset file not found: '{path}'"),
            Self::ReadFailed { path, message } => {
                write!(f, "failed to read '{path}': {message}")
            }
            Self::Malformed { path, message } => {
                write!(f, "malformed dataset '{path}': {message}")
            }
            Self::EmptyData { path } => write!(f, "dataset '{path}' has no non-empty strings"),
            Self::InvalidDirectory { path } => {
                write!(f, "invalid directory: '{path}' is not a directory or does not exist")
            }
            Self::NotEnoughDatasets { needed, available } => {
                write!(f, "need {needed} datasets, found {available}")
            }
        }
    }
}

impl std::error::Error for DataError {}

impl From<DataError> for EvalError {
    fn from(e: DataError) -> Self {
        Self::Data(e)
    }
}

impl From<TokenError> for EvalError {
    fn from(e: TokenError) -> Self {
        Self::Token(e)
    }
}

impl From<OracleError> for EvalError {
    fn from(e: OracleError) -> Self {
        Self::Oracle(e)
    }
}

impl From<serde_json::Error> for EvalError {
    fn from(e: serde_json::Error) -> Self {
        Self::Json {
            context: "report".to_string(),
            message: e.to_string(),
        }
    }
}
