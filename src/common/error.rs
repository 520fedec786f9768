//! Error types for the case runner
//!
//! Every failure a test case can report is an [`Error`]. [`Error::kind`]
//! tells a broken descriptor apart from a wrong result, so test authors can
//! see at a glance which side needs fixing.

use std::fmt;
use std::io;
use std::time::Duration;

use serde_json::Value;
use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the case runner
#[derive(Error, Debug)]
pub enum Error {
    // === Discovery Errors ===
    #[error("Cannot scan cases directory '{path}': {reason}")]
    Discovery { path: String, reason: String },

    // === Descriptor Errors ===
    #[error("Failed to read file '{path}': {error}")]
    FileRead { path: String, error: String },

    #[error("Failed to parse test case '{path}': {reason}")]
    Parse { path: String, reason: String },

    // === Assertion Errors ===
    #[error(
        "Test assertion failed for '{key}': expected {expected}, got {}",
        display_actual(.actual.as_ref())
    )]
    FieldMismatch {
        key: String,
        expected: Value,
        /// `None` when the result has no such field
        actual: Option<Value>,
    },

    #[error("Test assertion failed: {0}")]
    TestAssertion(String),

    // === Configuration Errors ===
    #[error("Unhandled rule type: {0}")]
    UnknownRuleType(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid runner options: {0}")]
    ConfigParse(String),

    // === Execution Errors ===
    #[error("Test function did not finish within {0:?}")]
    Timeout(Duration),

    #[error("Test function failed: {0}")]
    TestFunction(String),

    #[error("{failed} of {total} test cases failed")]
    SuiteFailed { failed: usize, total: usize },

    // === Test Function Errors ===
    // Only built by `?` inside caller test functions
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

fn display_actual(actual: Option<&Value>) -> String {
    match actual {
        Some(value) => value.to_string(),
        None => "undefined".to_string(),
    }
}

/// Coarse classification of an [`Error`], used when reporting case outcomes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Discovery,
    Parse,
    Assertion,
    Configuration,
    Timeout,
    Execution,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::Discovery => write!(f, "discovery"),
            FailureKind::Parse => write!(f, "parse"),
            FailureKind::Assertion => write!(f, "assertion"),
            FailureKind::Configuration => write!(f, "configuration"),
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::Execution => write!(f, "execution"),
        }
    }
}

impl Error {
    /// Create a field mismatch error
    pub fn field_mismatch(key: &str, expected: &Value, actual: Option<&Value>) -> Self {
        Self::FieldMismatch {
            key: key.to_string(),
            expected: expected.clone(),
            actual: actual.cloned(),
        }
    }

    /// Create a test function error from anything displayable
    ///
    /// Test functions use this to surface failures of the system under test.
    pub fn test_function(err: impl fmt::Display) -> Self {
        Self::TestFunction(err.to_string())
    }

    /// Create a parse error for a descriptor file
    pub fn parse(path: &std::path::Path, reason: impl fmt::Display) -> Self {
        Self::Parse {
            path: path.display().to_string(),
            reason: reason.to_string(),
        }
    }

    /// Classify this error
    pub fn kind(&self) -> FailureKind {
        match self {
            Error::Discovery { .. } => FailureKind::Discovery,
            Error::FileRead { .. } | Error::Parse { .. } => FailureKind::Parse,
            Error::FieldMismatch { .. } | Error::TestAssertion(_) | Error::SuiteFailed { .. } => {
                FailureKind::Assertion
            }
            Error::UnknownRuleType(_) | Error::Config(_) | Error::ConfigParse(_) => {
                FailureKind::Configuration
            }
            Error::Timeout(_) => FailureKind::Timeout,
            Error::TestFunction(_) | Error::Io(_) | Error::Json(_) => FailureKind::Execution,
        }
    }

    /// Whether this error means the result did not meet an expectation
    pub fn is_assertion(&self) -> bool {
        self.kind() == FailureKind::Assertion
    }

    /// Whether this error means the descriptor or runner setup is malformed
    pub fn is_configuration(&self) -> bool {
        self.kind() == FailureKind::Configuration
    }
}
